use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::device_types;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = device_types)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct DeviceType {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = device_types)]
pub struct NewDeviceType {
    pub name: String,
}
