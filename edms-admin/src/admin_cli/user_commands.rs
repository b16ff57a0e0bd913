use std::io::{self, Write};

use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use edms_api::orm::login::hash_password;
use edms_api::orm::user::{
    count_user_inspections, delete_user, get_user_by_username, get_user_with_roles, insert_user,
    list_users_with_roles, update_password_hash, username_or_email_taken,
};
use edms_api::orm::user_role::assign_user_role_by_name;
use edms_api::validation::{MIN_PASSWORD_LEN, validate_user_fields};
use rpassword::read_password;

use crate::admin_cli::utils::{confirm, filter_by_term};

#[derive(Subcommand)]
pub enum UserAction {
    #[command(about = "Add a new user")]
    Add {
        #[arg(short, long, help = "Username (3-20 letters, numbers or underscores)")]
        username: String,
        #[arg(short, long, help = "Email address")]
        email: String,
        #[arg(short, long, help = "Password (will be prompted securely if not provided)")]
        password: Option<String>,
        #[arg(short, long, default_value = "user", help = "Role: admin or user")]
        role: String,
    },
    #[command(about = "Change a user's password")]
    Passwd {
        #[arg(help = "Username")]
        username: String,
        #[arg(short, long, help = "New password (will be prompted securely if not provided)")]
        password: Option<String>,
    },
    #[command(about = "List users, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
    },
    #[command(about = "Remove users matching search term")]
    Rm {
        #[arg(help = "Search term to match usernames for removal (regex by default, use -F for fixed string)")]
        search_term: String,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

pub fn handle_user_command_with_conn(
    conn: &mut SqliteConnection,
    action: UserAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserAction::Add { username, email, password, role } => {
            let password = match password {
                Some(p) => p,
                None => prompt_for_password()?,
            };
            add_user_impl(conn, &username, &email, &password, &role)?;
        }
        UserAction::Passwd { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_for_password()?,
            };
            change_password_impl(conn, &username, &password)?;
        }
        UserAction::Ls { search_term, fixed_string } => {
            list_users_impl(conn, search_term, fixed_string)?;
        }
        UserAction::Rm { search_term, fixed_string, yes } => {
            remove_users_impl(conn, search_term, fixed_string, yes)?;
        }
    }
    Ok(())
}

pub fn add_user_impl(
    conn: &mut SqliteConnection,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<i32, Box<dyn std::error::Error>> {
    validate_user_fields(username, email, password, role)?;
    if username_or_email_taken(conn, username, email)? {
        return Err("Username or email already exists".into());
    }

    let password_hash =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e))?;
    let created_user = insert_user(conn, username, email, password_hash, false)?;
    assign_user_role_by_name(conn, created_user.id, role)?;

    println!("User created successfully!");
    println!("ID: {}", created_user.id);
    println!("Username: {}", created_user.username);
    println!("Email: {}", created_user.email);
    println!("Role: {}", role);

    Ok(created_user.id)
}

pub fn change_password_impl(
    conn: &mut SqliteConnection,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LEN).into());
    }
    let user = get_user_by_username(conn, username)?
        .ok_or_else(|| format!("User '{}' not found", username))?;

    let password_hash =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e))?;
    update_password_hash(conn, user.id, password_hash)?;

    println!("Password changed successfully for user: {}", username);
    Ok(())
}

pub fn list_users_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let users = list_users_with_roles(conn)?;
    let filtered_users =
        filter_by_term(users, search_term.as_deref(), fixed_string, |u| u.username.as_str())?;

    if filtered_users.is_empty() {
        println!("No users found.");
    } else {
        println!("Users:");
        for user in filtered_users {
            let roles: Vec<&str> = user.roles.iter().map(|r| r.name.as_str()).collect();
            println!(
                "  ID: {}, Username: {}, Email: {}, Roles: {}{}",
                user.id,
                user.username,
                user.email,
                roles.join(","),
                if user.default_admin { " (default admin)" } else { "" }
            );
        }
    }

    Ok(())
}

/// Removes matching users. The default administrator and users with
/// recorded inspections are reported and left in place.
pub fn remove_users_impl(
    conn: &mut SqliteConnection,
    search_term: String,
    fixed_string: bool,
    yes: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    let users = list_users_with_roles(conn)?;
    let matching_users =
        filter_by_term(users, Some(&search_term), fixed_string, |u| u.username.as_str())?;

    if matching_users.is_empty() {
        println!("No users found matching the search term.");
        return Ok(0);
    }

    println!("Found {} user(s) matching the search term:", matching_users.len());
    for user in &matching_users {
        println!("  ID: {}, Username: {}, Email: {}", user.id, user.username, user.email);
    }

    if !yes && !confirm(&format!("Are you sure you want to delete these {} user(s)?", matching_users.len()))? {
        println!("Operation cancelled.");
        return Ok(0);
    }

    let mut deleted_count = 0;
    let mut errors = Vec::new();

    for user in matching_users {
        if user.default_admin {
            errors.push(format!("Refusing to delete the default administrator '{}'", user.username));
            continue;
        }
        match count_user_inspections(conn, user.id) {
            Ok(0) => {}
            Ok(n) => {
                errors.push(format!(
                    "User {} (ID: {}) has {} recorded inspection(s)",
                    user.username, user.id, n
                ));
                continue;
            }
            Err(e) => {
                errors.push(format!("Failed to check user {} (ID: {}): {}", user.username, user.id, e));
                continue;
            }
        }

        match delete_user(conn, user.id) {
            Ok(rows_affected) => {
                if rows_affected > 0 {
                    deleted_count += 1;
                    println!("Deleted user: {} (ID: {})", user.username, user.id);
                }
            }
            Err(e) => {
                errors.push(format!("Failed to delete user {} (ID: {}): {}", user.username, user.id, e));
            }
        }
    }

    println!("Successfully deleted {} user(s).", deleted_count);

    if !errors.is_empty() {
        println!("Errors encountered:");
        for error in errors {
            println!("  {}", error);
        }
        return Err("Some deletions failed".into());
    }

    Ok(deleted_count)
}

pub fn prompt_for_password() -> Result<String, Box<dyn std::error::Error>> {
    print!("Enter new password: ");
    io::stdout().flush()?;
    let password = read_password()?;

    if password.is_empty() {
        return Err("Password cannot be empty".into());
    }

    print!("Confirm new password: ");
    io::stdout().flush()?;
    let confirm_password = read_password()?;

    if password != confirm_password {
        return Err("Passwords do not match".into());
    }

    Ok(password)
}

/// Prints the user and their roles; used after `seed` to show who can log in.
pub fn describe_user(conn: &mut SqliteConnection, user_id: i32) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(user) = get_user_with_roles(conn, user_id)? {
        let roles: Vec<&str> = user.roles.iter().map(|r| r.name.as_str()).collect();
        println!("  {} <{}> [{}]", user.username, user.email, roles.join(","));
    }
    Ok(())
}

#[cfg(all(test, feature = "test-staging"))]
mod tests {
    use super::*;
    use edms_api::orm::login::verify_password;
    use edms_api::orm::testing::setup_test_db;
    use edms_api::orm::user_role::get_user_roles;

    #[test]
    fn test_add_user_assigns_role() {
        let mut conn = setup_test_db();
        let id = add_user_impl(&mut conn, "inspector_9", "i9@example.com", "Password1!", "user").unwrap();

        let user = get_user_by_username(&mut conn, "inspector_9").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(!user.default_admin);
        let roles = get_user_roles(&mut conn, id).unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "user");
    }

    #[test]
    fn test_add_user_rejections() {
        let mut conn = setup_test_db();
        add_user_impl(&mut conn, "taken_name", "taken@example.com", "Password1!", "admin").unwrap();

        let err = add_user_impl(&mut conn, "taken_name", "other@example.com", "Password1!", "user")
            .unwrap_err();
        assert_eq!(err.to_string(), "Username or email already exists");

        let err = add_user_impl(&mut conn, "fine_name", "x@example.com", "short", "user").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters");

        let err = add_user_impl(&mut conn, "fine_name", "x@example.com", "Password1!", "root").unwrap_err();
        assert_eq!(err.to_string(), "Role must be 'admin' or 'user'");
    }

    #[test]
    fn test_change_password() {
        let mut conn = setup_test_db();
        add_user_impl(&mut conn, "rotating", "r@example.com", "Password1!", "user").unwrap();

        change_password_impl(&mut conn, "rotating", "NewPassword2@").unwrap();
        let user = get_user_by_username(&mut conn, "rotating").unwrap().unwrap();
        assert!(verify_password("NewPassword2@", &user.password_hash));
        assert!(!verify_password("Password1!", &user.password_hash));

        assert!(change_password_impl(&mut conn, "nobody", "Password1!").is_err());
        assert!(change_password_impl(&mut conn, "rotating", "short").is_err());
    }

    #[test]
    fn test_remove_users() {
        let mut conn = setup_test_db();
        add_user_impl(&mut conn, "temp_one", "t1@example.com", "Password1!", "user").unwrap();
        add_user_impl(&mut conn, "temp_two", "t2@example.com", "Password1!", "user").unwrap();
        add_user_impl(&mut conn, "keeper", "k@example.com", "Password1!", "user").unwrap();

        let deleted = remove_users_impl(&mut conn, "^temp_".to_string(), false, true).unwrap();
        assert_eq!(deleted, 2);
        assert!(get_user_by_username(&mut conn, "temp_one").unwrap().is_none());
        assert!(get_user_by_username(&mut conn, "keeper").unwrap().is_some());

        let deleted = remove_users_impl(&mut conn, "nomatch".to_string(), true, true).unwrap();
        assert_eq!(deleted, 0);
    }

    #[test]
    fn test_remove_refuses_default_admin() {
        let mut conn = setup_test_db();
        let hash = hash_password("admin").unwrap();
        insert_user(&mut conn, "admin1", "admin@example.com", hash, true).unwrap();

        assert!(remove_users_impl(&mut conn, "admin1".to_string(), true, true).is_err());
        assert!(get_user_by_username(&mut conn, "admin1").unwrap().is_some());
    }
}
