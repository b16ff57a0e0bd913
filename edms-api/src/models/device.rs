use chrono::NaiveDate;
use diesel::{AsChangeset, Associations, Identifiable, Insertable, Queryable, Selectable};
use rocket::FromForm;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::device_dates::{expiry_date, next_inspection_due};
use crate::schema::devices;

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Serialize,
    Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::room::Room))]
#[diesel(belongs_to(crate::models::device_type::DeviceType))]
#[diesel(table_name = devices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Device {
    pub id: i32,
    pub device_type_id: i32,
    pub extinguisher_type_id: Option<i32>,
    pub room_id: i32,
    pub serial_number: Option<String>,
    #[ts(type = "string | null")]
    pub manufacture_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub last_inspection_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub status: Option<String>,
}

/// A device that passed input validation, ready to be inserted or to
/// replace the editable columns of an existing row.
///
/// `last_inspection_date` is deliberately absent: it is only ever written
/// by the inspection rule.
#[derive(Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = devices)]
#[diesel(treat_none_as_null = true)]
pub struct NewDevice {
    pub device_type_id: i32,
    pub extinguisher_type_id: Option<i32>,
    pub room_id: i32,
    pub serial_number: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub status: Option<String>,
}

/// Raw, string-typed device fields as submitted by the dashboard form or
/// the JSON edit dialog. Empty strings mean "not provided".
#[derive(Deserialize, Serialize, Debug, Clone, Default, FromForm, TS)]
#[ts(export)]
pub struct DeviceInput {
    #[field(default = String::new())]
    #[serde(default)]
    pub room_id: String,
    #[field(name = "emergency_device_type")]
    #[field(default = String::new())]
    #[serde(default, rename = "emergency_device_type")]
    pub device_type_id: String,
    #[field(name = "extinguisher_type")]
    #[field(default = String::new())]
    #[serde(default, rename = "extinguisher_type")]
    pub extinguisher_type_id: String,
    #[field(default = String::new())]
    #[serde(default)]
    pub serial_number: String,
    #[field(default = String::new())]
    #[serde(default)]
    pub manufacture_date: String,
    #[field(default = String::new())]
    #[serde(default)]
    pub size: String,
    #[field(default = String::new())]
    #[serde(default)]
    pub description: String,
    #[field(default = String::new())]
    #[serde(default)]
    pub status: String,
}

/// Device joined with its full location and type names, plus the derived
/// display dates. Returned by both the listing and the single fetch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeviceDetail {
    pub id: i32,
    pub device_type_id: i32,
    pub device_type_name: String,
    pub extinguisher_type_id: Option<i32>,
    pub extinguisher_type_name: Option<String>,
    pub room_id: i32,
    pub room_code: String,
    pub building_id: i32,
    pub building_code: String,
    pub site_id: i32,
    pub site_name: String,
    pub serial_number: Option<String>,
    #[ts(type = "string | null")]
    pub manufacture_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub last_inspection_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub expiry_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub next_inspection_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub status: Option<String>,
}

/// Location and type names joined onto a device row.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub device_type_name: String,
    pub extinguisher_type_name: Option<String>,
    pub room_code: String,
    pub building_id: i32,
    pub building_code: String,
    pub site_id: i32,
    pub site_name: String,
}

impl DeviceDetail {
    pub fn new(device: Device, context: DeviceContext) -> Self {
        DeviceDetail {
            id: device.id,
            device_type_id: device.device_type_id,
            device_type_name: context.device_type_name,
            extinguisher_type_id: device.extinguisher_type_id,
            extinguisher_type_name: context.extinguisher_type_name,
            room_id: device.room_id,
            room_code: context.room_code,
            building_id: context.building_id,
            building_code: context.building_code,
            site_id: context.site_id,
            site_name: context.site_name,
            serial_number: device.serial_number,
            manufacture_date: device.manufacture_date,
            last_inspection_date: device.last_inspection_date,
            expiry_date: expiry_date(device.manufacture_date),
            next_inspection_date: next_inspection_due(device.last_inspection_date),
            description: device.description,
            size: device.size,
            status: device.status,
        }
    }
}
