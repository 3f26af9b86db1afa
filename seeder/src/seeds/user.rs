use crate::seed::{SeedFuture, Seeder};
use crate::seeds::PASSWORD;
use db::models::user::Role;
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sea_orm::DatabaseConnection;
use services::AppError;
use services::user_service::{RegisterUser, UserService};

pub struct UserSeeder;

const FIXED: [(&str, &str, &str, &str, Role); 4] = [
    ("admin@example.com", "Ada", "Admin", "u00000001", Role::Admin),
    ("instructor@example.com", "Ivan", "Instructor", "u00000002", Role::Instructor),
    ("lecturer@example.com", "Lena", "Lecturer", "u00000003", Role::Instructor),
    ("student@example.com", "Sam", "Student", "u00000004", Role::Student),
];

async fn register(db: &DatabaseConnection, input: RegisterUser, role: Role) -> Result<(), AppError> {
    match UserService::register(db, input, role).await {
        Ok(user) => {
            log::debug!("Created {} {}", user.role, user.email);
            Ok(())
        }
        // Already seeded.
        Err(AppError::Conflict(msg)) => {
            log::debug!("Skipped user: {msg}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

impl Seeder for UserSeeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a> {
        Box::pin(async move {
            for (email, first, last, number, role) in FIXED {
                let input = RegisterUser {
                    email: email.to_string(),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    student_number: number.to_string(),
                    password: PASSWORD.to_string(),
                    confirm_password: PASSWORD.to_string(),
                };
                register(db, input, role).await?;
            }

            let mut rng = StdRng::from_entropy();
            for _ in 0..10 {
                let input = RegisterUser {
                    email: SafeEmail().fake(),
                    first_name: FirstName().fake(),
                    last_name: LastName().fake(),
                    student_number: format!("u{:08}", rng.gen_range(10_000_000..100_000_000u32)),
                    password: PASSWORD.to_string(),
                    confirm_password: PASSWORD.to_string(),
                };
                register(db, input, Role::Student).await?;
            }

            Ok(())
        })
    }
}
