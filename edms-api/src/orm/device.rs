//! Device persistence: listing with location context, validated writes and
//! status changes made outside the inspection flow.

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::device_dates::{expiry_date, next_inspection_due};
use crate::inspection_rules::{STATUS_ACTIVE, STATUS_EXPIRED, STATUS_INACTIVE, overdue_status};
use crate::models::{Device, DeviceContext, DeviceDetail, NewDevice};
use crate::orm::last_insert_rowid;
use crate::schema::{buildings, device_types, devices, extinguisher_types, rooms, sites};
use crate::validation::DeviceValidationError;

type DeviceRow = (Device, String, i32, String, i32, String, String, Option<String>);

fn into_detail(row: DeviceRow) -> DeviceDetail {
    let (
        device,
        room_code,
        building_id,
        building_code,
        site_id,
        site_name,
        device_type_name,
        extinguisher_type_name,
    ) = row;
    DeviceDetail::new(
        device,
        DeviceContext {
            device_type_name,
            extinguisher_type_name,
            room_code,
            building_id,
            building_code,
            site_id,
            site_name,
        },
    )
}

/// Lists devices with their location and type names, filtered by site id
/// and/or building code. Each row carries the derived expiry and
/// next-inspection dates.
pub fn get_all_devices(
    conn: &mut SqliteConnection,
    site_filter: Option<i32>,
    building_filter: Option<&str>,
) -> Result<Vec<DeviceDetail>, diesel::result::Error> {
    let mut query = devices::table
        .inner_join(rooms::table.inner_join(buildings::table.inner_join(sites::table)))
        .inner_join(device_types::table)
        .left_join(extinguisher_types::table)
        .select((
            Device::as_select(),
            rooms::code,
            buildings::id,
            buildings::code,
            sites::id,
            sites::name,
            device_types::name,
            extinguisher_types::name.nullable(),
        ))
        .order(devices::id.asc())
        .into_boxed();

    if let Some(site) = site_filter {
        query = query.filter(sites::id.eq(site));
    }
    if let Some(code) = building_filter {
        query = query.filter(buildings::code.eq(code.to_string()));
    }

    let rows: Vec<DeviceRow> = query.load(conn)?;
    Ok(rows.into_iter().map(into_detail).collect())
}

/// Fetches one device with the same join context and derived dates as the
/// listing.
pub fn get_device_detail(
    conn: &mut SqliteConnection,
    device_id: i32,
) -> Result<Option<DeviceDetail>, diesel::result::Error> {
    let row: Option<DeviceRow> = devices::table
        .inner_join(rooms::table.inner_join(buildings::table.inner_join(sites::table)))
        .inner_join(device_types::table)
        .left_join(extinguisher_types::table)
        .filter(devices::id.eq(device_id))
        .select((
            Device::as_select(),
            rooms::code,
            buildings::id,
            buildings::code,
            sites::id,
            sites::name,
            device_types::name,
            extinguisher_types::name.nullable(),
        ))
        .first(conn)
        .optional()?;
    Ok(row.map(into_detail))
}

pub fn get_device_by_id(
    conn: &mut SqliteConnection,
    device_id: i32,
) -> Result<Option<Device>, diesel::result::Error> {
    devices::table
        .filter(devices::id.eq(device_id))
        .select(Device::as_select())
        .first(conn)
        .optional()
}

/// Reports the first referenced room, device type or extinguisher type that
/// does not exist.
pub fn find_missing_reference(
    conn: &mut SqliteConnection,
    device: &NewDevice,
) -> Result<Option<DeviceValidationError>, diesel::result::Error> {
    let room_count: i64 = rooms::table
        .filter(rooms::id.eq(device.room_id))
        .count()
        .get_result(conn)?;
    if room_count == 0 {
        return Ok(Some(DeviceValidationError::RoomDoesNotExist));
    }

    let type_count: i64 = device_types::table
        .filter(device_types::id.eq(device.device_type_id))
        .count()
        .get_result(conn)?;
    if type_count == 0 {
        return Ok(Some(DeviceValidationError::DeviceTypeDoesNotExist));
    }

    if let Some(extinguisher_type_id) = device.extinguisher_type_id {
        let count: i64 = extinguisher_types::table
            .filter(extinguisher_types::id.eq(extinguisher_type_id))
            .count()
            .get_result(conn)?;
        if count == 0 {
            return Ok(Some(DeviceValidationError::ExtinguisherTypeDoesNotExist));
        }
    }

    Ok(None)
}

pub fn insert_device(conn: &mut SqliteConnection, new_device: &NewDevice) -> Result<Device, diesel::result::Error> {
    diesel::insert_into(devices::table).values(new_device).execute(conn)?;
    let last_id = last_insert_rowid(conn)?;

    devices::table
        .filter(devices::id.eq(last_id))
        .select(Device::as_select())
        .first(conn)
}

/// Replaces every editable column of a device. The last-inspection date is
/// not an editable column and is left as stored. Returns the rows updated.
pub fn update_device(
    conn: &mut SqliteConnection,
    device_id: i32,
    changes: &NewDevice,
) -> Result<usize, diesel::result::Error> {
    diesel::update(devices::table.filter(devices::id.eq(device_id)))
        .set(changes)
        .execute(conn)
}

/// Deletes a device. Fails with a foreign key violation while inspections
/// still reference it.
pub fn delete_device(conn: &mut SqliteConnection, device_id: i32) -> Result<usize, diesel::result::Error> {
    diesel::delete(devices::table.filter(devices::id.eq(device_id))).execute(conn)
}

pub fn count_device_inspections(
    conn: &mut SqliteConnection,
    device_id: i32,
) -> Result<i64, diesel::result::Error> {
    use crate::schema::inspections;
    inspections::table
        .filter(inspections::device_id.eq(device_id))
        .count()
        .get_result(conn)
}

/// Sets the status column alone. Returns the rows updated.
pub fn update_device_status(
    conn: &mut SqliteConnection,
    device_id: i32,
    new_status: &str,
) -> Result<usize, diesel::result::Error> {
    diesel::update(devices::table.filter(devices::id.eq(device_id)))
        .set(devices::status.eq(new_status))
        .execute(conn)
}

/// A status change made by [`sweep_overdue_devices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweptDevice {
    pub device_id: i32,
    pub previous_status: Option<String>,
    pub new_status: &'static str,
}

/// Marks devices that are past expiry as "Expired" and active devices that
/// are past their next inspection as "Inspection Due". Inactive devices are
/// skipped. Runs in one transaction.
pub fn sweep_overdue_devices(
    conn: &mut SqliteConnection,
    today: NaiveDate,
) -> Result<Vec<SweptDevice>, diesel::result::Error> {
    conn.immediate_transaction(|conn| {
        let all: Vec<Device> = devices::table
            .order(devices::id.asc())
            .select(Device::as_select())
            .load(conn)?;

        let mut swept = Vec::new();
        for device in all {
            let current = device.status.as_deref();
            if current == Some(STATUS_INACTIVE) {
                continue;
            }

            let Some(target) = overdue_status(
                expiry_date(device.manufacture_date),
                next_inspection_due(device.last_inspection_date),
                today,
            ) else {
                continue;
            };

            let applies = if target == STATUS_EXPIRED {
                current != Some(STATUS_EXPIRED)
            } else {
                current == Some(STATUS_ACTIVE)
            };
            if !applies {
                continue;
            }

            update_device_status(conn, device.id, target)?;
            swept.push(SweptDevice {
                device_id: device.id,
                previous_status: device.status,
                new_status: target,
            });
        }
        Ok(swept)
    })
}
