//! Demo data: two EIT campuses with a handful of fire extinguishers and
//! their first inspections.

use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;
use thiserror::Error;

use crate::admin_init_fairing::{AdminInitError, DefaultAdmin, ensure_default_admin};
use crate::models::{InspectionChecklist, NewBuilding, NewDevice, NewInspection, NewRoom, NewSite};
use crate::orm::building::insert_building;
use crate::orm::device::insert_device;
use crate::orm::device_type::insert_device_type;
use crate::orm::extinguisher_type::insert_extinguisher_type;
use crate::orm::login::hash_password;
use crate::orm::room::insert_room;
use crate::orm::site::insert_site;
use crate::orm::user::{get_user_by_username, insert_user};
use crate::orm::user_role::assign_user_role_by_name;
use crate::schema::{inspections, sites};
use crate::session_guards::USER_ROLE;

pub const DEMO_ADMIN_USERNAME: &str = "admin1";
pub const DEMO_USER_USERNAME: &str = "user12";
pub const DEMO_USER_PASSWORD: &str = "Password1!";

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("database error while seeding: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("could not hash a demo password: {0}")]
    Hash(argon2::password_hash::Error),
}

impl From<AdminInitError> for SeedError {
    fn from(e: AdminInitError) -> Self {
        match e {
            AdminInitError::Database(e) => SeedError::Database(e),
            AdminInitError::Hash(e) => SeedError::Hash(e),
        }
    }
}

fn demo_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid demo date")
}

/// Loads the demo rows. Does nothing and returns `false` when any site
/// already exists. `admin_password` is used only if `admin1` has to be
/// created.
///
/// The demo inspections are inserted as history: they do not pass through
/// the status rule, so the device statuses stay exactly as listed here.
pub fn seed_demo_data(conn: &mut SqliteConnection, admin_password: &str) -> Result<bool, SeedError> {
    conn.immediate_transaction(|conn| {
        let existing_sites: i64 = sites::table.count().get_result(conn)?;
        if existing_sites > 0 {
            info!("[seed] Sites already present; skipping demo data");
            return Ok(false);
        }

        let admin = ensure_default_admin(
            conn,
            &DefaultAdmin {
                username: DEMO_ADMIN_USERNAME.to_string(),
                password: admin_password.to_string(),
                email: "admin@email.com".to_string(),
            },
        )?;

        if get_user_by_username(conn, DEMO_USER_USERNAME)?.is_none() {
            let hash = hash_password(DEMO_USER_PASSWORD).map_err(SeedError::Hash)?;
            let user = insert_user(conn, DEMO_USER_USERNAME, "user@email.com", hash, false)?;
            assign_user_role_by_name(conn, user.id, USER_ROLE)?;
        }

        let taradale = insert_site(
            conn,
            NewSite {
                name: "EIT Taradale".to_string(),
                address: "501 Gloucester Street, Taradale, Napier 4112".to_string(),
                map_image_path: None,
            },
        )?;
        let hastings = insert_site(
            conn,
            NewSite {
                name: "EIT Hastings".to_string(),
                address: "416 Heretaunga Street West, Hastings 4122".to_string(),
                map_image_path: Some("/static/site_maps/EIT_Hastings.png".to_string()),
            },
        )?;

        let building_a = insert_building(conn, NewBuilding { site_id: taradale.id, code: "A".to_string() })?;
        let building_b = insert_building(conn, NewBuilding { site_id: taradale.id, code: "B".to_string() })?;
        let building_main =
            insert_building(conn, NewBuilding { site_id: hastings.id, code: "Main".to_string() })?;

        let room_a1 = insert_room(conn, NewRoom { building_id: building_a.id, code: "A1".to_string() })?;
        let room_b1 = insert_room(conn, NewRoom { building_id: building_b.id, code: "B1".to_string() })?;
        let room_main =
            insert_room(conn, NewRoom { building_id: building_main.id, code: "Main Room".to_string() })?;

        let co2 = insert_extinguisher_type(conn, "CO2")?;
        let water = insert_extinguisher_type(conn, "Water")?;
        let dry = insert_extinguisher_type(conn, "Dry")?;
        let extinguisher = insert_device_type(conn, "Fire Extinguisher")?;

        let demo_devices = [
            (co2.id, room_a1.id, "SN00001", true, "Test Fire Extinguisher 1", "Active"),
            (water.id, room_b1.id, "SN00002", true, "Test Fire Extinguisher 2", "Inspection Failed"),
            (dry.id, room_a1.id, "SN00003", false, "Test Fire Extinguisher 3", "Inactive"),
            (co2.id, room_main.id, "SN00004", true, "Hastings Main Room Fire Extinguisher", "Active"),
        ];

        let mut device_ids = Vec::with_capacity(demo_devices.len());
        for (extinguisher_type_id, room_id, serial, inspected, description, status) in demo_devices {
            let device = insert_device(
                conn,
                &NewDevice {
                    device_type_id: extinguisher.id,
                    extinguisher_type_id: Some(extinguisher_type_id),
                    room_id,
                    serial_number: Some(serial.to_string()),
                    manufacture_date: Some(demo_date()),
                    description: Some(description.to_string()),
                    size: Some("5kg".to_string()),
                    status: Some(status.to_string()),
                },
            )?;
            if inspected {
                diesel::update(crate::schema::devices::table.find(device.id))
                    .set(crate::schema::devices::last_inspection_date.eq(Some(demo_date())))
                    .execute(conn)?;
            }
            device_ids.push(device.id);
        }

        let partial = InspectionChecklist {
            is_conspicuous: Some(true),
            is_accessible: None,
            is_assigned_location: Some(true),
            is_sign_visible: None,
            is_anti_tamper_device_intact: Some(true),
            is_support_bracket_secure: None,
            are_operating_instructions_clear: None,
            is_maintenance_tag_attached: Some(true),
            is_no_external_damage: Some(true),
            is_replaced: None,
            are_maintenance_records_complete: Some(true),
            work_order_required: Some(true),
        };
        let demo_inspections = [
            (device_ids[0], InspectionChecklist::all_passed(), "Passed"),
            (device_ids[1], InspectionChecklist::all_passed(), "Failed"),
            (device_ids[2], partial, "Failed"),
        ];

        let inspection_date = demo_date();
        for (device_id, checklist, outcome) in demo_inspections {
            let mut row = NewInspection::new(
                device_id,
                admin.id,
                inspection_date,
                checklist,
                outcome.to_string(),
                Some("No notes".to_string()),
            );
            row.created_at = inspection_date.and_time(NaiveTime::MIN);
            diesel::insert_into(inspections::table).values(&row).execute(conn)?;
        }

        info!("[seed] Demo data loaded");
        Ok(true)
    })
}
