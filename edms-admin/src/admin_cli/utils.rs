use std::io::{self, Write};

use diesel::{prelude::*, sqlite::SqliteConnection};
use dotenvy::dotenv;
use edms_api::orm::{run_pending_migrations, set_foreign_keys};
use regex::Regex;

/// Opens the database named by `DATABASE_URL`, enables foreign keys and
/// brings the schema up to date.
pub fn establish_connection() -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let mut conn = SqliteConnection::establish(&database_url)?;
    set_foreign_keys(&mut conn)?;
    run_pending_migrations(&mut conn).map_err(|e| format!("Failed to run migrations: {}", e))?;
    Ok(conn)
}

/// Keeps the items whose key matches `search_term`, as a regex unless
/// `fixed_string` is set. No term keeps everything.
pub fn filter_by_term<T>(
    items: Vec<T>,
    search_term: Option<&str>,
    fixed_string: bool,
    key: impl Fn(&T) -> &str,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let Some(term) = search_term else {
        return Ok(items);
    };

    if fixed_string {
        Ok(items.into_iter().filter(|item| key(item).contains(term)).collect())
    } else {
        let regex =
            Regex::new(term).map_err(|e| format!("Invalid regex pattern '{}': {}", term, e))?;
        Ok(items.into_iter().filter(|item| regex.is_match(key(item))).collect())
    }
}

/// Asks a yes/no question on stdin. Anything but `y` or `yes` is a no.
pub fn confirm(prompt: &str) -> Result<bool, Box<dyn std::error::Error>> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
