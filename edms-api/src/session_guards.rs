//! Session-cookie authentication and role checks for Rocket routes.
//!
//! ```rust,ignore
//! #[get("/whoami")]
//! fn whoami(user: AuthenticatedUser) -> String {
//!     format!("{} ({})", user.user.username, user.role_names().join(", "))
//! }
//!
//! #[delete("/user/<id>")]
//! fn remove(id: i32, admin: AdminUser) { /* admin only */ }
//! ```

use chrono::Utc;
use diesel::prelude::*;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::DbConn;
use crate::models::{Role, Session, User};
use crate::orm::login::SESSION_COOKIE;
use crate::orm::user_role::get_user_roles;
use crate::schema::{sessions, users};

/// Guard for routes that need a logged-in user.
///
/// Succeeds when the `session` cookie names a session that is neither
/// revoked nor expired, whose user still exists and holds at least one
/// role. Otherwise the request fails with 401.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    pub roles: Vec<Role>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(session_cookie) = request.cookies().get(SESSION_COOKIE) else {
            return Outcome::Error((Status::Unauthorized, ()));
        };
        let session_id = session_cookie.value().to_string();

        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let lookup = db
            .run(move |conn| -> QueryResult<Option<(User, Vec<Role>)>> {
                let session = sessions::table
                    .filter(sessions::id.eq(&session_id))
                    .filter(sessions::revoked.eq(false))
                    .filter(
                        sessions::expires_at
                            .is_null()
                            .or(sessions::expires_at.gt(Utc::now().naive_utc())),
                    )
                    .select(Session::as_select())
                    .first(conn)
                    .optional()?;
                let Some(session) = session else {
                    return Ok(None);
                };

                let user = users::table
                    .filter(users::id.eq(session.user_id))
                    .select(User::as_select())
                    .first(conn)
                    .optional()?;
                let Some(user) = user else {
                    return Ok(None);
                };

                let roles = get_user_roles(conn, user.id)?;
                Ok(Some((user, roles)))
            })
            .await;

        match lookup {
            Ok(Some((user, roles))) if !roles.is_empty() => {
                Outcome::Success(AuthenticatedUser { user, roles })
            }
            Ok(_) => Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error while authenticating session: {:?}", e);
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

impl AuthenticatedUser {
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|r| r.name == role_name)
    }

    pub fn has_any_role(&self, role_names: &[&str]) -> bool {
        role_names.iter().any(|required| self.has_role(required))
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Declares a guard that admits only users holding `$role`; authenticated
/// users without it get 403.
macro_rules! create_role_guard {
    ($name:ident, $role:expr) => {
        #[derive(Debug)]
        pub struct $name {
            pub user: User,
            pub roles: Vec<Role>,
        }

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = ();

            async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                let auth_user = match AuthenticatedUser::from_request(request).await {
                    Outcome::Success(user) => user,
                    Outcome::Error(e) => return Outcome::Error(e),
                    Outcome::Forward(f) => return Outcome::Forward(f),
                };

                if auth_user.has_role($role) {
                    Outcome::Success($name { user: auth_user.user, roles: auth_user.roles })
                } else {
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
        }
    };
}

pub const ADMIN_ROLE: &str = "admin";
pub const USER_ROLE: &str = "user";

// Site, building, room, device type, device and user management
create_role_guard!(AdminUser, ADMIN_ROLE);
