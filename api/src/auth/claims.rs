use db::models::user::Role;
use serde::{Deserialize, Serialize};
use services::gate::Actor;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    pub role: Role,
}

/// The authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.0.sub, self.0.role)
    }
}
