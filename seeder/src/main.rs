use crate::seed::{Seeder, run_seeder};
use crate::seeds::{course::CourseSeeder, enrollment::EnrollmentSeeder, user::UserSeeder};
use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use std::process::ExitCode;
use util::config;

mod seed;
mod seeds;

#[tokio::main]
async fn main() -> ExitCode {
    let log_level = std::env::var("SEED_LOG_LEVEL").unwrap_or_else(|_| "info".into());
    if let Err(e) = common::logger::init_logger(&log_level, None) {
        eprintln!("Failed to initialise logger: {e}");
        return ExitCode::FAILURE;
    }
    log::info!("Seeding {} ({})", config::database_path(), config::env());

    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            log::error!("Failed to connect to database: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = Migrator::up(&db, None).await {
        log::error!("Migration failed: {e}");
        return ExitCode::FAILURE;
    }

    for (seeder, name) in [
        (Box::new(UserSeeder) as Box<dyn Seeder + Send + Sync>, "User"),
        (Box::new(CourseSeeder), "Course"),
        (Box::new(EnrollmentSeeder), "Enrollment"),
    ] {
        if !run_seeder(&*seeder, name, &db).await {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
