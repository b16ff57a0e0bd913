use diesel::prelude::*;
use dotenvy::dotenv;
use rocket::fairing::AdHoc;

use crate::models::User;
use crate::orm::DbConn;
use crate::orm::login::hash_password;
use crate::orm::user::{get_user_by_username, insert_user};
use crate::orm::user_role::{assign_user_role_by_name, user_has_role};
use crate::session_guards::ADMIN_ROLE;

/// Credentials of the administrator created on first start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl DefaultAdmin {
    /// Reads `EDMS_DEFAULT_USERNAME`, `EDMS_DEFAULT_PASSWORD` and
    /// `EDMS_DEFAULT_EMAIL`, falling back to `admin1` / `admin` /
    /// `admin@example.com`.
    pub fn from_env() -> Self {
        DefaultAdmin {
            username: std::env::var("EDMS_DEFAULT_USERNAME").unwrap_or_else(|_| "admin1".to_string()),
            password: std::env::var("EDMS_DEFAULT_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
            email: std::env::var("EDMS_DEFAULT_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
        }
    }
}

/// Creates the default administrator if it does not exist yet.
pub fn admin_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Admin User Initialization", |rocket| async {
        dotenv().ok();

        let Some(conn) = DbConn::get_one(&rocket).await else {
            error!("[admin-init] ERROR: Could not get DB connection.");
            return Err(rocket);
        };

        let admin = DefaultAdmin::from_env();
        match conn.run(move |c| ensure_default_admin(c, &admin)).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                error!("[admin-init] FATAL: Admin user creation failed: {:?}", e);
                Err(rocket)
            }
        }
    })
}

#[derive(Debug)]
pub enum AdminInitError {
    Database(diesel::result::Error),
    Hash(argon2::password_hash::Error),
}

impl From<diesel::result::Error> for AdminInitError {
    fn from(e: diesel::result::Error) -> Self {
        AdminInitError::Database(e)
    }
}

/// Makes sure the default administrator exists and holds the admin role.
/// An existing account keeps its password.
pub fn ensure_default_admin(
    c: &mut SqliteConnection,
    admin: &DefaultAdmin,
) -> Result<User, AdminInitError> {
    let user = match get_user_by_username(c, &admin.username)? {
        Some(existing) => {
            info!("[admin-init] Admin user '{}' already exists", admin.username);
            existing
        }
        None => {
            let passhash = hash_password(&admin.password).map_err(AdminInitError::Hash)?;
            let created = insert_user(c, &admin.username, &admin.email, passhash, true)?;
            info!("[admin-init] Created admin user: '{}'", admin.username);
            created
        }
    };

    if !user_has_role(c, user.id, ADMIN_ROLE)? {
        assign_user_role_by_name(c, user.id, ADMIN_ROLE)?;
        info!("[admin-init] Assigned role '{}' to user '{}'", ADMIN_ROLE, admin.username);
    }

    Ok(user)
}
