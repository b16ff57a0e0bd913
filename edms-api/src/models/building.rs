use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::Site;
use crate::schema::buildings;

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(Site))]
#[diesel(table_name = buildings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Building {
    pub id: i32,
    pub site_id: i32,
    pub code: String,
}

#[derive(Insertable)]
#[diesel(table_name = buildings)]
pub struct NewBuilding {
    pub site_id: i32,
    pub code: String,
}

// Listing row joined with its site
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BuildingWithSite {
    pub id: i32,
    pub code: String,
    pub site_id: i32,
    pub site_name: String,
}
