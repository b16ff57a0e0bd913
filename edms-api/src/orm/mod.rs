use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

pub mod building;
mod db;
pub mod device;
pub mod device_type;
pub mod extinguisher_type;
pub mod inspection;
pub mod login;
pub mod logout;
pub mod role;
pub mod room;
pub mod site;
#[cfg(any(test, feature = "test-staging"))]
pub mod testing;
pub mod user;
pub mod user_role;

pub use db::*;

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Id of the row most recently inserted on this connection.
pub(crate) fn last_insert_rowid(conn: &mut SqliteConnection) -> Result<i32, diesel::result::Error> {
    let row = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?;
    Ok(row.last_insert_rowid as i32)
}
