use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::Building;
use crate::schema::rooms;

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(Building))]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Room {
    pub id: i32,
    pub building_id: i32,
    pub code: String,
}

#[derive(Insertable)]
#[diesel(table_name = rooms)]
pub struct NewRoom {
    pub building_id: i32,
    pub code: String,
}

// Listing row joined with its building and site
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomWithLocation {
    pub id: i32,
    pub code: String,
    pub building_id: i32,
    pub building_code: String,
    pub site_id: i32,
    pub site_name: String,
}
