use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::extinguisher_types;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = extinguisher_types)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct ExtinguisherType {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = extinguisher_types)]
pub struct NewExtinguisherType {
    pub name: String,
}
