use diesel::sqlite::SqliteConnection;
use edms_api::admin_init_fairing::DefaultAdmin;
use edms_api::orm::user::get_user_by_username;
use edms_api::seed::{DEMO_ADMIN_USERNAME, DEMO_USER_PASSWORD, DEMO_USER_USERNAME, seed_demo_data};

use crate::admin_cli::user_commands::describe_user;

/// Loads the demo sites, devices and users into an empty database. The demo
/// admin gets `EDMS_DEFAULT_PASSWORD` (or `admin`) if it has to be created.
pub fn seed_impl(conn: &mut SqliteConnection) -> Result<bool, Box<dyn std::error::Error>> {
    let admin = DefaultAdmin::from_env();
    let seeded = seed_demo_data(conn, &admin.password)?;

    if !seeded {
        println!("Database already has sites; demo data not loaded.");
        return Ok(false);
    }

    println!("Demo data loaded. Accounts:");
    for username in [DEMO_ADMIN_USERNAME, DEMO_USER_USERNAME] {
        if let Some(user) = get_user_by_username(conn, username)? {
            describe_user(conn, user.id)?;
        }
    }
    println!("The demo user's password is '{}'.", DEMO_USER_PASSWORD);
    Ok(true)
}
