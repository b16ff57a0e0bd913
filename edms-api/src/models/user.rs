use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::Role;
use crate::schema::users;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String, // Will be unique
    pub email: String,    // Will be unique
    pub password_hash: String,
    pub default_admin: bool,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub default_admin: bool,
}

/// User as exposed over the API: never carries the password hash.
#[derive(Deserialize, Debug, Serialize, TS)]
#[ts(export)]
pub struct UserWithRoles {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub default_admin: bool,
    pub roles: Vec<Role>,
}

impl UserWithRoles {
    pub fn new(user: User, roles: Vec<Role>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            default_admin: user.default_admin,
            roles,
        }
    }
}
