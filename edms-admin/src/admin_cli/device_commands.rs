use chrono::{Local, NaiveDate};
use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use edms_api::inspection_rules::{StatusOverrideError, validate_status_override};
use edms_api::models::DeviceDetail;
use edms_api::orm::device::{
    SweptDevice, get_all_devices, get_device_by_id, sweep_overdue_devices, update_device_status,
};

#[derive(Subcommand)]
pub enum DeviceAction {
    #[command(about = "List devices with their location and derived dates")]
    Ls {
        #[arg(short = 's', long = "site", help = "Filter by site ID")]
        site_id: Option<i32>,
        #[arg(short = 'b', long = "building", help = "Filter by building code")]
        building: Option<String>,
    },
    #[command(about = "Set a device status by hand (Inspection Due or Expired)")]
    Status {
        #[arg(help = "Device ID")]
        id: i32,
        #[arg(help = "New status")]
        status: String,
    },
    #[command(about = "Mark expired and inspection-overdue devices")]
    Sweep {
        #[arg(long, help = "Date to sweep as of (YYYY-MM-DD, defaults to today)")]
        date: Option<String>,
    },
}

pub fn handle_device_command_with_conn(
    conn: &mut SqliteConnection,
    action: DeviceAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DeviceAction::Ls { site_id, building } => {
            device_ls_impl(conn, site_id, building)?;
        }
        DeviceAction::Status { id, status } => {
            device_status_impl(conn, id, &status)?;
        }
        DeviceAction::Sweep { date } => {
            let today = match date {
                Some(d) => parse_date(&d)?,
                None => Local::now().date_naive(),
            };
            device_sweep_impl(conn, today)?;
        }
    }
    Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}', expected YYYY-MM-DD: {}", input, e).into())
}

fn show(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn device_ls_impl(
    conn: &mut SqliteConnection,
    site_id: Option<i32>,
    building: Option<String>,
) -> Result<Vec<DeviceDetail>, Box<dyn std::error::Error>> {
    let devices = get_all_devices(conn, site_id, building.as_deref())?;

    if devices.is_empty() {
        println!("No devices found.");
    } else {
        println!("Devices:");
        for device in &devices {
            println!(
                "  ID: {}, Type: {}, Serial: {}, Location: {} / {} / {}, Status: {}",
                device.id,
                device.device_type_name,
                device.serial_number.as_deref().unwrap_or("-"),
                device.site_name,
                device.building_code,
                device.room_code,
                device.status.as_deref().unwrap_or("-")
            );
            println!(
                "    Last inspection: {}, Next inspection: {}, Expires: {}",
                show(device.last_inspection_date),
                show(device.next_inspection_date),
                show(device.expiry_date)
            );
        }
    }

    Ok(devices)
}

pub fn device_status_impl(
    conn: &mut SqliteConnection,
    device_id: i32,
    status: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = validate_status_override(status)?;
    if get_device_by_id(conn, device_id)?.is_none() {
        return Err(StatusOverrideError::DeviceNotFound.into());
    }

    update_device_status(conn, device_id, status)?;
    println!("Device {} status set to '{}'", device_id, status);
    Ok(())
}

pub fn device_sweep_impl(
    conn: &mut SqliteConnection,
    today: NaiveDate,
) -> Result<Vec<SweptDevice>, Box<dyn std::error::Error>> {
    let swept = sweep_overdue_devices(conn, today)?;

    if swept.is_empty() {
        println!("No overdue devices as of {}.", today);
    } else {
        println!("Updated {} device(s) as of {}:", swept.len(), today);
        for change in &swept {
            println!(
                "  Device {}: {} -> {}",
                change.device_id,
                change.previous_status.as_deref().unwrap_or("-"),
                change.new_status
            );
        }
    }

    Ok(swept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-31").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert!(parse_date("31/03/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[cfg(feature = "test-staging")]
    mod with_db {
        use super::super::*;
        use diesel::prelude::*;
        use edms_api::orm::testing::{insert_test_device, insert_test_location, setup_test_db};

        fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d).unwrap()
        }

        #[test]
        fn test_device_ls_filters() {
            let mut conn = setup_test_db();
            let (site_a, _, room_a) = insert_test_location(&mut conn, "Site A", "North", "N1");
            let (_, _, room_b) = insert_test_location(&mut conn, "Site B", "South", "S1");
            insert_test_device(&mut conn, room_a);
            insert_test_device(&mut conn, room_b);

            assert_eq!(device_ls_impl(&mut conn, None, None).unwrap().len(), 2);
            assert_eq!(device_ls_impl(&mut conn, Some(site_a), None).unwrap().len(), 1);
            let south = device_ls_impl(&mut conn, None, Some("South".to_string())).unwrap();
            assert_eq!(south.len(), 1);
            assert_eq!(south[0].site_name, "Site B");
        }

        #[test]
        fn test_device_status_override() {
            let mut conn = setup_test_db();
            let (_, _, room) = insert_test_location(&mut conn, "Site A", "North", "N1");
            let device = insert_test_device(&mut conn, room);

            device_status_impl(&mut conn, device.id, "Expired").unwrap();
            let stored = get_device_by_id(&mut conn, device.id).unwrap().unwrap();
            assert_eq!(stored.status.as_deref(), Some("Expired"));

            let err = device_status_impl(&mut conn, device.id, "Active").unwrap_err();
            assert_eq!(err.to_string(), "Invalid status");
            let err = device_status_impl(&mut conn, 9999, "Expired").unwrap_err();
            assert_eq!(err.to_string(), "Device not found");
        }

        #[test]
        fn test_device_sweep() {
            let mut conn = setup_test_db();
            let (_, _, room) = insert_test_location(&mut conn, "Site A", "North", "N1");
            let device = insert_test_device(&mut conn, room);
            let undated = insert_test_device(&mut conn, room);
            {
                use edms_api::schema::devices;
                diesel::update(devices::table.filter(devices::id.eq(device.id)))
                    .set((
                        devices::manufacture_date.eq(Some(ymd(2020, 1, 1))),
                        devices::last_inspection_date.eq(Some(ymd(2024, 1, 1))),
                    ))
                    .execute(&mut conn)
                    .unwrap();
            }

            assert!(device_sweep_impl(&mut conn, ymd(2024, 3, 31)).unwrap().is_empty());

            let swept = device_sweep_impl(&mut conn, ymd(2024, 4, 1)).unwrap();
            assert_eq!(swept.len(), 1);
            assert_eq!(swept[0].device_id, device.id);
            assert_eq!(swept[0].new_status, "Inspection Due");

            // Expiry applies to any non-inactive status
            let swept = device_sweep_impl(&mut conn, ymd(2025, 1, 1)).unwrap();
            assert_eq!(swept.len(), 1);
            assert_eq!(swept[0].previous_status.as_deref(), Some("Inspection Due"));
            assert_eq!(swept[0].new_status, "Expired");

            // Undated devices are never swept and nothing is left to change
            assert!(device_sweep_impl(&mut conn, ymd(2025, 1, 1)).unwrap().is_empty());
            let stored = get_device_by_id(&mut conn, undated.id).unwrap().unwrap();
            assert_eq!(stored.status.as_deref(), Some("Active"));
        }
    }
}
