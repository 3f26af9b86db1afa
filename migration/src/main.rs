use std::{fs, path::Path, process};

use colored::*;
use util::config;

mod runner;

#[tokio::main]
async fn main() {
    let db_path = config::database_path();
    let url = format!("sqlite://{}?mode=rwc", db_path);
    let mode = std::env::args().nth(1);

    match mode.as_deref() {
        Some("clean") => {
            remove_db_file(&db_path);
            remove_storage(&config::storage_root());
            return;
        }
        Some("fresh") => {
            remove_db_file(&db_path);
            remove_storage(&config::storage_root());
        }
        _ => {}
    }

    if let Err(e) = create_db_dir(&db_path) {
        eprintln!("{} {}", "Failed to create DB directory:".red(), e);
        process::exit(1);
    }
    if let Err(e) = runner::run_all_migrations(&url).await {
        eprintln!("{} {}", "Migration failed:".red(), e);
        process::exit(1);
    }
}

fn remove_db_file(path: &str) {
    let db_path = Path::new(path);
    if !db_path.exists() {
        println!("DB file does not exist: {}", db_path.display());
        return;
    }
    match fs::remove_file(db_path) {
        Ok(()) => println!("Deleted DB: {}", db_path.display()),
        Err(e) => eprintln!("Failed to delete {}: {}", db_path.display(), e),
    }
}

fn remove_storage(root: &str) {
    let storage_path = Path::new(root);
    if !storage_path.exists() {
        println!("Media storage does not exist: {}", storage_path.display());
        return;
    }
    match fs::remove_dir_all(storage_path) {
        Ok(()) => println!("Deleted media storage: {}", storage_path.display()),
        Err(e) => eprintln!("Failed to delete {}: {}", storage_path.display(), e),
    }
}

fn create_db_dir(path: &str) -> std::io::Result<()> {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
