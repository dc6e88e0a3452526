pub mod employee;
pub mod export;
pub mod init;
pub mod publication;
pub mod serve;

use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use pubtrack::db::Database;
use pubtrack::models::{EmployeeDto, PublicationDto, PublicationKind};
use pubtrack::{Error, Result};

/// Open an existing database; refuses to create one implicitly.
pub fn open_db(db_path: &Path) -> Result<Database> {
    if !db_path.exists() {
        return Err(Error::NotInitialized(db_path.to_path_buf()));
    }
    Database::open(db_path)
}

/// Format a publication kind as a colored string.
pub fn format_kind(kind: PublicationKind) -> String {
    match kind {
        PublicationKind::Article => "article".green().to_string(),
        PublicationKind::Book => "book".cyan().to_string(),
        PublicationKind::Chapter => "chapter".blue().to_string(),
        PublicationKind::ConferencePaper => "conference".magenta().to_string(),
        PublicationKind::Thesis => "thesis".yellow().to_string(),
        PublicationKind::Other => "other".bright_black().to_string(),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max - 3).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

/// Print a list of publications as a table or JSON.
pub fn print_publications(publications: &[PublicationDto], json: bool) -> Result<()> {
    if json {
        return print_json(publications);
    }

    if publications.is_empty() {
        println!("No publications found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<6} {:<12} {:<50} AUTHORS",
        "ID", "YEAR", "KIND", "TITLE"
    );
    println!("{}", "-".repeat(96));
    for p in publications {
        let authors = p
            .authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<6} {:<6} {:<12} {:<50} {}",
            p.id,
            p.year,
            format_kind(p.kind),
            truncate(&p.title, 48),
            authors,
        );
    }
    Ok(())
}

/// Print a list of employees as a table or JSON.
pub fn print_employees(employees: &[EmployeeDto], json: bool) -> Result<()> {
    if json {
        return print_json(employees);
    }

    if employees.is_empty() {
        println!("No employees found.");
        return Ok(());
    }

    println!("{:<6} {:<30} {:<30} POSITION", "ID", "NAME", "EMAIL");
    println!("{}", "-".repeat(80));
    for e in employees {
        println!(
            "{:<6} {:<30} {:<30} {}",
            e.id,
            truncate(&format!("{} {}", e.first_name, e.last_name), 28),
            e.email.as_deref().unwrap_or("-"),
            e.position.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
