//! API endpoints for managing users.
//!
//! # Authorization Rules
//! - Only admins can list, create and delete users
//! - The default administrator cannot be deleted, nor can an admin delete
//!   their own account

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::response::{ApiError, api_error, internal_error};
use crate::models::UserWithRoles;
use crate::orm::DbConn;
use crate::orm::login::hash_password;
use crate::orm::user::{
    count_user_inspections, delete_user, get_user, get_user_with_roles, insert_user,
    list_users_with_roles, username_or_email_taken,
};
use crate::orm::user_role::assign_user_role_by_name;
use crate::session_guards::AdminUser;
use crate::validation::validate_user_fields;

type Rejectable<T> = Result<Result<T, ApiError>, diesel::result::Error>;

/// Body of a new account. `password` is plain text and is hashed before it
/// is stored, so this body is never logged.
#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// `admin` or `user`
    pub role: String,
}

/// List Users endpoint.
///
/// - **URL:** `/api/user`
/// - **Method:** `GET`
/// - **Authorization:** admin
///
/// Every user with their roles, ordered by username. Password hashes are
/// never part of the response.
#[get("/user")]
pub async fn list_users(db: DbConn, _admin: AdminUser) -> Result<Json<Vec<UserWithRoles>>, ApiError> {
    db.run(list_users_with_roles)
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching users", e))
}

/// Create User endpoint.
///
/// - **URL:** `/api/user`
/// - **Method:** `POST`
/// - **Authorization:** admin
///
/// ```json
/// {
///   "username": "inspector_2",
///   "email": "inspector2@example.com",
///   "password": "Password1!",
///   "role": "user"
/// }
/// ```
///
/// 201 with the new user; 400 for invalid fields, 409 when the username or
/// email is already in use.
#[post("/user", data = "<request>")]
pub async fn create_user(
    db: DbConn,
    admin: AdminUser,
    request: Json<CreateUserRequest>,
) -> Result<status::Created<Json<UserWithRoles>>, ApiError> {
    let request = request.into_inner();
    validate_user_fields(&request.username, &request.email, &request.password, &request.role)
        .map_err(|e| api_error(Status::BadRequest, e.to_string()))?;
    let password_hash = hash_password(&request.password)
        .map_err(|e| internal_error("Error hashing password", e))?;

    let CreateUserRequest { username, email, role, .. } = request;
    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<UserWithRoles> {
                if username_or_email_taken(conn, &username, &email)? {
                    return Ok(Err(api_error(
                        Status::Conflict,
                        "Username or email already exists",
                    )));
                }
                let user = insert_user(conn, &username, &email, password_hash, false)?;
                assign_user_role_by_name(conn, user.id, &role)?;
                get_user_with_roles(conn, user.id)?
                    .map(Ok)
                    .ok_or(diesel::result::Error::NotFound)
            })
        })
        .await
        .map_err(|e| internal_error("Error creating user", e))?;

    let user = result?;
    info!("Admin '{}' created user '{}'", admin.user.username, user.username);
    Ok(status::Created::new(format!("/api/user/{}", user.id)).body(Json(user)))
}

/// Delete User endpoint.
///
/// - **URL:** `/api/user/<id>`
/// - **Method:** `DELETE`
/// - **Authorization:** admin
///
/// 204 on success. 403 for the default administrator or the caller's own
/// account, 404 when missing, 409 when the user has recorded inspections.
#[delete("/user/<id>")]
pub async fn remove_user(db: DbConn, admin: AdminUser, id: i32) -> Result<Status, ApiError> {
    if id == admin.user.id {
        return Err(api_error(Status::Forbidden, "You cannot delete your own account"));
    }

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<String> {
                let Some(user) = get_user(conn, id)? else {
                    return Ok(Err(api_error(Status::NotFound, "User not found")));
                };
                if user.default_admin {
                    return Ok(Err(api_error(
                        Status::Forbidden,
                        "The default administrator cannot be deleted",
                    )));
                }
                if count_user_inspections(conn, id)? > 0 {
                    return Ok(Err(api_error(
                        Status::Conflict,
                        "Cannot delete user with recorded inspections",
                    )));
                }
                delete_user(conn, id)?;
                Ok(Ok(user.username))
            })
        })
        .await
        .map_err(|e| internal_error("Error deleting user", e))?;

    let username = result?;
    info!("Admin '{}' deleted user '{}'", admin.user.username, username);
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![list_users, create_user, remove_user]
}
