//! Login, logout and the current principal.

use rocket::Route;
use rocket::http::{Cookie, CookieJar, Status};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::response::{ApiError, api_error, internal_error};
use crate::models::UserWithRoles;
use crate::orm::DbConn;
use crate::orm::login::{SESSION_COOKIE, process_login};
use crate::orm::logout::revoke_session;
use crate::orm::user_role::get_user_roles;
use crate::session_guards::AuthenticatedUser;

/// Credentials posted to `/api/login`.
#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login endpoint.
///
/// - **URL:** `/api/login`
/// - **Method:** `POST`
/// - **Authentication:** None
///
/// On success sets the HTTP-only `session` cookie and returns the user with
/// their roles. Wrong credentials give 401 `{"error":"Invalid credentials"}`;
/// a blank username or password gives 400.
///
/// The body is taken with plain `Json` so credentials are never logged.
#[post("/login", data = "<login>")]
pub async fn login(
    db: DbConn,
    cookies: &CookieJar<'_>,
    login: Json<LoginRequest>,
) -> Result<Json<UserWithRoles>, ApiError> {
    let user = process_login(&db, cookies, &login).await.map_err(|status| {
        if status == Status::Unauthorized {
            warn!("Failed login for '{}'", login.username);
            api_error(Status::Unauthorized, "Invalid credentials")
        } else if status == Status::BadRequest {
            api_error(Status::BadRequest, "Username and password are required")
        } else {
            api_error(status, "Login failed")
        }
    })?;
    info!("User '{}' logged in", user.username);

    let user_id = user.id;
    let roles = db
        .run(move |conn| get_user_roles(conn, user_id))
        .await
        .map_err(|e| internal_error("Error loading user roles", e))?;

    Ok(Json(UserWithRoles::new(user, roles)))
}

/// Logout endpoint.
///
/// - **URL:** `/api/logout`
/// - **Method:** `POST`
///
/// Revokes the session named by the cookie, if any, and clears the cookie.
/// Always answers 200.
#[post("/logout")]
pub async fn logout(db: DbConn, cookies: &CookieJar<'_>) -> Status {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        if let Err(e) = revoke_session(&db, &token).await {
            error!("Failed to revoke session: {}", e);
        }
    }
    cookies.remove(Cookie::from(SESSION_COOKIE));
    Status::Ok
}

/// Returns the logged-in user and their roles.
#[get("/hello")]
pub fn hello(auth: AuthenticatedUser) -> Json<UserWithRoles> {
    Json(UserWithRoles::new(auth.user, auth.roles))
}

pub fn routes() -> Vec<Route> {
    routes![login, logout, hello]
}
