pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use db::models::user::Role;
use jsonwebtoken::{EncodingKey, Header, encode};
use util::config;

/// Generates a JWT and its expiry timestamp (RFC 3339) for a given user.
pub fn generate_jwt(user_id: i64, role: Role) -> Result<(String, String), jsonwebtoken::errors::Error> {
    // Capped at one year.
    let minutes = config::jwt_duration_minutes().min(525_600) as i64;
    let expiry = Utc::now() + Duration::minutes(minutes);

    let claims = Claims {
        sub: user_id,
        exp: expiry.timestamp() as usize,
        role,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )?;

    Ok((token, expiry.to_rfc3339()))
}
