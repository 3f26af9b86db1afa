use colored::*;
use sea_orm::DatabaseConnection;
use services::AppError;
use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::time::Instant;

const STATUS_COLUMN: usize = 80;

pub type SeedFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'a>>;

pub trait Seeder {
    fn seed<'a>(&'a self, db: &'a DatabaseConnection) -> SeedFuture<'a>;
}

/// Runs one seeder with a dotted status line. Returns whether it succeeded.
pub async fn run_seeder<S: Seeder + ?Sized>(seeder: &S, name: &str, db: &DatabaseConnection) -> bool {
    let base_msg = format!("Seeding {}", name.bold());
    let dots = ".".repeat(STATUS_COLUMN.saturating_sub(base_msg.len()));
    print!("{}{} ", base_msg, dots);
    io::stdout().flush().ok();

    let start = Instant::now();
    match seeder.seed(db).await {
        Ok(()) => {
            let time_str = format!("({:.2?})", start.elapsed()).dimmed();
            println!("{} {}", "done".green(), time_str);
            true
        }
        Err(e) => {
            println!("{}", "failed".red());
            log::error!("{name} seeder failed: {e}");
            false
        }
    }
}
