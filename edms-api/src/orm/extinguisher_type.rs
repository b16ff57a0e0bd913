use diesel::prelude::*;

use crate::models::{ExtinguisherType, NewExtinguisherType};
use crate::orm::last_insert_rowid;

/// Gets all extinguisher types ordered by name.
pub fn get_all_extinguisher_types(
    conn: &mut SqliteConnection,
) -> Result<Vec<ExtinguisherType>, diesel::result::Error> {
    use crate::schema::extinguisher_types::dsl::*;
    extinguisher_types
        .order(name.asc())
        .select(ExtinguisherType::as_select())
        .load(conn)
}

pub fn get_extinguisher_type_by_id(
    conn: &mut SqliteConnection,
    type_id: i32,
) -> Result<Option<ExtinguisherType>, diesel::result::Error> {
    use crate::schema::extinguisher_types::dsl::*;
    extinguisher_types
        .filter(id.eq(type_id))
        .select(ExtinguisherType::as_select())
        .first(conn)
        .optional()
}

pub fn insert_extinguisher_type(
    conn: &mut SqliteConnection,
    type_name: &str,
) -> Result<ExtinguisherType, diesel::result::Error> {
    use crate::schema::extinguisher_types::dsl::*;

    diesel::insert_into(extinguisher_types)
        .values(&NewExtinguisherType { name: type_name.to_string() })
        .execute(conn)?;
    let last_id = last_insert_rowid(conn)?;

    extinguisher_types
        .filter(id.eq(last_id))
        .select(ExtinguisherType::as_select())
        .first(conn)
}
