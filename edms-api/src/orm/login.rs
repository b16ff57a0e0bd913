//! Credential checks and session creation.
//!
//! Login functions are written against [`DbRunner`] so they can be driven by
//! the pooled `DbConn` in production and by `FakeDbConn` in unit tests.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use diesel::prelude::*;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use uuid::Uuid;

use crate::DbConn;
use crate::models::{NewSession, User};
#[cfg(any(test, feature = "test-staging"))]
use crate::orm::testing::FakeDbConn;
use crate::schema::{sessions, users};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Anything that can run a closure against a SQLite connection.
pub trait DbRunner {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static;
}

impl DbRunner for DbConn {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        DbConn::run(self, f)
    }
}

#[cfg(any(test, feature = "test-staging"))]
impl<'a> DbRunner for FakeDbConn<'a> {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        FakeDbConn::run(self, f)
    }
}

fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Looks a user up by username.
pub async fn find_user_by_username<D: DbRunner>(
    db: &D,
    username: &str,
) -> Result<Option<User>, Status> {
    let username = username.to_owned();
    db.run(move |conn| {
        users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(conn)
            .optional()
    })
    .await
    .map_err(|e| {
        error!("Failed to look up user: {}", e);
        Status::InternalServerError
    })
}

/// Checks `password` against an Argon2 hash. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Inserts a new session row for `user_id` and returns its token.
pub async fn create_and_store_session<D: DbRunner>(db: &D, user_id: i32) -> Result<String, Status> {
    let session_token = generate_session_token();

    let new_session = NewSession {
        id: session_token.clone(),
        user_id,
        created_at: Utc::now().naive_utc(),
        expires_at: None,
        revoked: false,
    };

    db.run(move |conn| {
        diesel::insert_into(sessions::table)
            .values(&new_session)
            .execute(conn)
    })
    .await
    .map_err(|e| {
        error!("Failed to store session: {}", e);
        Status::InternalServerError
    })?;

    Ok(session_token)
}

/// Builds the session cookie. It is only marked `Secure` outside tests so
/// the local test client can send it back.
pub fn session_cookie(session_token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_token.to_string()))
        .http_only(true)
        .secure(!cfg!(any(test, feature = "test-staging")))
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Verifies credentials, opens a session and sets the cookie.
///
/// Unknown usernames and wrong passwords both yield `Unauthorized`; blank
/// credentials yield `BadRequest`.
pub async fn process_login<D: DbRunner>(
    db: &D,
    cookies: &CookieJar<'_>,
    login: &crate::api::login::LoginRequest,
) -> Result<User, Status> {
    if login.username.trim().is_empty() || login.password.is_empty() {
        return Err(Status::BadRequest);
    }

    let Some(user) = find_user_by_username(db, login.username.trim()).await? else {
        return Err(Status::Unauthorized);
    };

    if !verify_password(&login.password, &user.password_hash) {
        return Err(Status::Unauthorized);
    }

    let session_token = create_and_store_session(db, user.id).await?;
    cookies.add(session_cookie(&session_token));

    Ok(user)
}

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}
