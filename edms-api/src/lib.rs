#[macro_use]
extern crate rocket;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use rocket::figment::value::Map;
use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::fs::{FileServer, Options};
use rocket::request::Request;
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Rocket};

pub mod admin_init_fairing;
pub mod api;
pub mod config;
pub mod device_dates;
pub mod inspection_rules;
pub mod logged_json;
pub mod models;
pub mod orm;
pub use orm::DbConn;
pub mod schema;
pub mod seed;
pub mod session_guards;
pub mod site_maps;
pub mod validation;

#[cfg(test)]
pub mod generate_types;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[catch(401)]
fn unauthorized(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Unauthorized",
        "path": req.uri().path().to_string(),
        "status": 401
    }))
}

#[catch(403)]
fn forbidden(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Forbidden",
        "path": req.uri().path().to_string(),
        "status": 403
    }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Not Found",
        "path": req.uri().path().to_string(),
        "status": 404
    }))
}

#[catch(422)]
fn unprocessable_entity(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Unprocessable Entity",
        "path": req.uri().path().to_string(),
        "status": 422
    }))
}

#[catch(500)]
fn internal_server_error(req: &Request) -> Json<Value> {
    Json(json!({
        "error": "Internal Server Error",
        "path": req.uri().path().to_string(),
        "status": 500
    }))
}

#[catch(default)]
fn default_catcher(status: rocket::http::Status, req: &Request) -> Json<Value> {
    Json(json!({
        "error": status.reason().unwrap_or("Unknown Error"),
        "path": req.uri().path().to_string(),
        "status": status.code
    }))
}

/// Mounts the API under `/api` and registers the JSON catchers.
pub fn mount_api_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/api", api::routes()).register(
        "/",
        catchers![
            unauthorized,
            forbidden,
            not_found,
            unprocessable_entity,
            internal_server_error,
            default_catcher
        ],
    )
}

fn log_rocket_info(rocket: &Rocket<Build>) {
    let figment = rocket.figment();

    if let Ok(address) = figment.extract_inner::<String>("address") {
        info!("Rocket is running at: {}", address);
    }

    if let Ok(port) = figment.extract_inner::<u16>("port") {
        info!("Rocket is listening on port: {}", port);
    }

    match figment.extract_inner::<Map<String, Value>>("databases.sqlite_db") {
        Ok(db_config) => {
            if let Some(Value::String(url)) = db_config.get("url") {
                info!("Database URL: {}", url);
            } else {
                warn!("Database URL not found in configuration");
            }
        }
        Err(e) => {
            warn!("Failed to extract database configuration: {}", e);
        }
    }
}

/// Builds the server from `Rocket.toml`, `ROCKET_*`, `DATABASE_URL` and
/// `EDMS_STATIC_DIR`.
///
/// Tests do not go through here; they use `orm::testing::test_rocket()`
/// with its in-memory database.
pub fn rocket() -> Rocket<Build> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let static_dir = std::env::var("EDMS_STATIC_DIR").unwrap_or_else(|_| "static".to_string());

    let figment = Figment::from(rocket::Config::default())
        .merge(Toml::file("Rocket.toml").nested())
        .merge(Env::prefixed("ROCKET_").global())
        .merge(("databases.sqlite_db.url", database_url))
        .merge(("static_dir", static_dir.clone()));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(orm::set_foreign_keys_fairing())
        .attach(orm::run_migrations_fairing())
        .attach(admin_init_fairing::admin_init_fairing())
        .attach(config::config_fairing());

    log_rocket_info(&rocket);

    // The site map directory is created on ignite, after this mount.
    let files = FileServer::new(static_dir, Options::Missing | Options::NormalizeDirs).rank(10);
    mount_api_routes(rocket).mount("/static", files)
}
