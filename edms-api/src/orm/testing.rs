use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rocket::figment::{
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket, fairing::AdHoc};
use std::path::PathBuf;
use uuid::Uuid;

use super::db::{DbConn, run_pending_migrations, set_foreign_keys};
use crate::admin_init_fairing::admin_init_fairing;
use crate::models::{Device, NewBuilding, NewDevice, NewRoom, NewSite};
use crate::orm::building::insert_building;
use crate::orm::device::insert_device;
use crate::orm::device_type::{get_device_type_by_name, insert_device_type};
use crate::orm::room::insert_room;
use crate::orm::site::insert_site;
use crate::schema::{buildings, sites};
use crate::seed::seed_demo_data;

/// Password given to `admin1` in test instances.
pub const TEST_ADMIN_PASSWORD: &str = "admin";

/// Configures SQLite for speed over durability. Only for tests.
fn set_sqlite_test_pragmas(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(
        r#"
        PRAGMA synchronous = OFF;
        PRAGMA journal_mode = OFF;
        "#,
    )
}

fn set_sqlite_test_pragmas_fairing() -> AdHoc {
    AdHoc::on_ignite("Set SQLite Test Pragmas", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test pragmas");
        conn.run(set_sqlite_test_pragmas)
            .await
            .expect("Failed to set SQLite PRAGMAs");
        rocket
    })
}

/// Loads the demo data set so every API test starts from the same rows.
fn test_data_init_fairing() -> AdHoc {
    AdHoc::on_ignite("Test Data Initialization", |rocket| async {
        let conn = DbConn::get_one(&rocket)
            .await
            .expect("database connection for test data initialization");

        conn.run(|c| match seed_demo_data(c, TEST_ADMIN_PASSWORD) {
            Ok(_) => info!("[test-data-init] Test data initialization completed"),
            Err(e) => error!("[test-data-init] ERROR: Failed to create test data: {:?}", e),
        })
        .await;

        rocket
    })
}

/// Fresh static directory with an empty `site_maps/` inside.
fn test_static_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("edms_static_{}", Uuid::new_v4()));
    std::fs::create_dir_all(dir.join(crate::site_maps::SITE_MAPS_DIR))
        .expect("Failed to create test static directory");
    dir
}

/// Creates a Rocket instance backed by its own in-memory SQLite database
/// and its own temporary static directory.
///
/// The instance has migrations applied, the default administrator
/// (`admin1` / `admin`) and the demo data loaded, and all API routes
/// mounted.
pub fn test_rocket() -> Rocket<Build> {
    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };
    let databases = map!["sqlite_db" => db_config];

    let static_dir = test_static_dir();
    let figment = rocket::Config::figment()
        .merge(("databases", databases))
        .merge(("static_dir", static_dir.to_string_lossy().to_string()));

    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(super::db::set_foreign_keys_fairing())
        .attach(set_sqlite_test_pragmas_fairing())
        .attach(super::db::run_migrations_fairing())
        .attach(admin_init_fairing())
        .attach(test_data_init_fairing())
        .attach(crate::config::config_fairing());

    crate::mount_api_routes(rocket)
}

/// Synchronous in-memory database with foreign keys on and every
/// migration applied. Each call returns an independent database.
pub fn setup_test_db() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .expect("Failed to create in-memory SQLite database");
    set_foreign_keys(&mut conn).expect("Failed to enable foreign keys");
    run_pending_migrations(&mut conn).expect("Failed to run migrations");
    conn
}

/// Wraps a synchronous connection so it can stand in for `DbConn` in code
/// written against [`DbRunner`](crate::orm::login::DbRunner).
pub struct FakeDbConn<'a>(pub &'a mut SqliteConnection);

impl<'a> FakeDbConn<'a> {
    pub async fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        // Safety: the wrapper holds the only borrow of the connection and
        // the closure runs to completion before this returns.
        unsafe {
            let conn_ptr = self.0 as *const SqliteConnection as *mut SqliteConnection;
            f(&mut *conn_ptr)
        }
    }
}

pub fn setup_test_dbconn<'a>(conn: &'a mut SqliteConnection) -> FakeDbConn<'a> {
    FakeDbConn(conn)
}

/// Finds or creates `site_name > building_code > room_code` and returns
/// the three ids.
pub fn insert_test_location(
    conn: &mut SqliteConnection,
    site_name: &str,
    building_code: &str,
    room_code: &str,
) -> (i32, i32, i32) {
    let site_id = match sites::table
        .filter(sites::name.eq(site_name))
        .select(sites::id)
        .first::<i32>(conn)
        .optional()
        .expect("site lookup")
    {
        Some(id) => id,
        None => {
            insert_site(
                conn,
                NewSite {
                    name: site_name.to_string(),
                    address: format!("1 {} Road", site_name),
                    map_image_path: None,
                },
            )
            .expect("insert test site")
            .id
        }
    };

    let building_id = match buildings::table
        .filter(buildings::site_id.eq(site_id))
        .filter(buildings::code.eq(building_code))
        .select(buildings::id)
        .first::<i32>(conn)
        .optional()
        .expect("building lookup")
    {
        Some(id) => id,
        None => {
            insert_building(conn, NewBuilding { site_id, code: building_code.to_string() })
                .expect("insert test building")
                .id
        }
    };

    let room = insert_room(conn, NewRoom { building_id, code: room_code.to_string() })
        .expect("insert test room");

    (site_id, building_id, room.id)
}

/// Inserts an Active device of type "Test Device Type" into `room_id`.
pub fn insert_test_device(conn: &mut SqliteConnection, room_id: i32) -> Device {
    let device_type = match get_device_type_by_name(conn, "Test Device Type").expect("device type lookup") {
        Some(existing) => existing,
        None => insert_device_type(conn, "Test Device Type").expect("insert test device type"),
    };

    insert_device(
        conn,
        &NewDevice {
            device_type_id: device_type.id,
            extinguisher_type_id: None,
            room_id,
            serial_number: Some(format!("TEST-{}", Uuid::new_v4().simple())),
            manufacture_date: None,
            description: Some("Test device".to_string()),
            size: None,
            status: Some("Active".to_string()),
        },
    )
    .expect("insert test device")
}
