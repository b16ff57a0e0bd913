use diesel::connection::SimpleConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rocket::fairing::AdHoc;
use rocket_sync_db_pools::{database, diesel};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[database("sqlite_db")]
pub struct DbConn(diesel::SqliteConnection);

/// Turns on SQLite foreign key enforcement for this connection.
///
/// SQLite ships with foreign keys off; without this the containment
/// hierarchy (site > building > room > device) is not enforced at all.
pub fn set_foreign_keys(conn: &mut diesel::SqliteConnection) -> diesel::QueryResult<()> {
    conn.batch_execute("PRAGMA foreign_keys = ON")
}

/// Fairing that enables foreign keys when Rocket ignites.
pub fn set_foreign_keys_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Set Foreign Keys", |rocket| async {
        let Some(conn) = DbConn::get_one(&rocket).await else {
            error!("No database connection available to enable foreign keys");
            return Err(rocket);
        };
        match conn.run(set_foreign_keys).await {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("Failed to enable foreign keys: {}", e);
                Err(rocket)
            }
        }
    })
}

/// Applies every embedded migration that has not run yet.
pub fn run_pending_migrations(
    conn: &mut diesel::SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Fairing that brings the schema up to date on ignition. Ignition fails if
/// a migration does.
pub fn run_migrations_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Diesel Migrations", |rocket| async {
        let Some(conn) = DbConn::get_one(&rocket).await else {
            error!("No database connection available for migrations");
            return Err(rocket);
        };
        match conn.run(|c| run_pending_migrations(c).map_err(|e| e.to_string())).await {
            Ok(()) => {
                info!("Database migrations applied");
                Ok(rocket)
            }
            Err(e) => {
                error!("Failed to run pending migrations: {}", e);
                Err(rocket)
            }
        }
    })
}
