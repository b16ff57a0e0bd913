//! Inspection persistence. Recording an inspection and applying its effect
//! on the device happen in one immediate transaction, so concurrent
//! inspections of the same device are serialized by SQLite's write lock.

use diesel::prelude::*;

use crate::inspection_rules::{StatusTransition, decide_transition};
use crate::models::{Device, Inspection, NewInspection};
use crate::orm::last_insert_rowid;
use crate::schema::{devices, inspections};

/// Result of recording an inspection.
#[derive(Debug, Clone)]
pub struct RecordedInspection {
    pub inspection: Inspection,
    pub transition: StatusTransition,
}

/// Inserts an inspection and applies the status transition rule to its
/// device. Returns `Ok(None)` without writing anything if the device does
/// not exist.
pub fn record_inspection(
    conn: &mut SqliteConnection,
    new_inspection: NewInspection,
) -> Result<Option<RecordedInspection>, diesel::result::Error> {
    conn.immediate_transaction(|conn| {
        let device: Option<Device> = devices::table
            .filter(devices::id.eq(new_inspection.device_id))
            .select(Device::as_select())
            .first(conn)
            .optional()?;
        let Some(device) = device else {
            return Ok(None);
        };

        diesel::insert_into(inspections::table)
            .values(&new_inspection)
            .execute(conn)?;
        let inspection_id = last_insert_rowid(conn)?;

        let transition = decide_transition(
            device.last_inspection_date,
            new_inspection.inspection_date,
            &new_inspection.outcome,
        );

        match &transition {
            StatusTransition::Apply { last_inspection_date, status: Some(new_status) } => {
                diesel::update(devices::table.filter(devices::id.eq(device.id)))
                    .set((
                        devices::last_inspection_date.eq(Some(*last_inspection_date)),
                        devices::status.eq(Some(new_status.as_str())),
                    ))
                    .execute(conn)?;
                info!(
                    "Inspection {} set device {} to '{}' as of {}",
                    inspection_id, device.id, new_status, last_inspection_date
                );
            }
            StatusTransition::Apply { last_inspection_date, status: None } => {
                diesel::update(devices::table.filter(devices::id.eq(device.id)))
                    .set(devices::last_inspection_date.eq(Some(*last_inspection_date)))
                    .execute(conn)?;
                info!(
                    "Inspection {} moved device {} last inspection to {}",
                    inspection_id, device.id, last_inspection_date
                );
            }
            StatusTransition::Stale => {
                info!(
                    "Inspection {} is not newer than device {}'s last inspection; status unchanged",
                    inspection_id, device.id
                );
            }
        }

        let inspection = inspections::table
            .filter(inspections::id.eq(inspection_id))
            .select(Inspection::as_select())
            .first(conn)?;

        Ok(Some(RecordedInspection { inspection, transition }))
    })
}

/// Inspections of a device, newest inspection date first.
pub fn get_inspections_for_device(
    conn: &mut SqliteConnection,
    device_id: i32,
) -> Result<Vec<Inspection>, diesel::result::Error> {
    inspections::table
        .filter(inspections::device_id.eq(device_id))
        .order((inspections::inspection_date.desc(), inspections::id.desc()))
        .select(Inspection::as_select())
        .load(conn)
}

pub fn get_inspection_by_id(
    conn: &mut SqliteConnection,
    inspection_id: i32,
) -> Result<Option<Inspection>, diesel::result::Error> {
    inspections::table
        .filter(inspections::id.eq(inspection_id))
        .select(Inspection::as_select())
        .first(conn)
        .optional()
}
