use diesel::prelude::*;

use crate::models::{Building, BuildingWithSite, NewBuilding};
use crate::orm::last_insert_rowid;

/// Lists buildings with their site name, ordered by building code.
pub fn get_buildings(
    conn: &mut SqliteConnection,
    site_filter: Option<i32>,
) -> Result<Vec<BuildingWithSite>, diesel::result::Error> {
    use crate::schema::{buildings, sites};

    let mut query = buildings::table
        .inner_join(sites::table)
        .select((buildings::id, buildings::code, sites::id, sites::name))
        .order((buildings::code.asc(), buildings::id.asc()))
        .into_boxed();
    if let Some(site) = site_filter {
        query = query.filter(buildings::site_id.eq(site));
    }

    let rows: Vec<(i32, String, i32, String)> = query.load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(id, code, site_id, site_name)| BuildingWithSite { id, code, site_id, site_name })
        .collect())
}

pub fn get_building_by_id(
    conn: &mut SqliteConnection,
    building_id: i32,
) -> Result<Option<Building>, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;
    buildings
        .filter(id.eq(building_id))
        .select(Building::as_select())
        .first(conn)
        .optional()
}

/// True when another building of the same site already uses `building_code`.
pub fn building_code_taken(
    conn: &mut SqliteConnection,
    parent_site_id: i32,
    building_code: &str,
    except_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;

    let mut query = buildings
        .filter(site_id.eq(parent_site_id))
        .filter(code.eq(building_code))
        .into_boxed();
    if let Some(except) = except_id {
        query = query.filter(id.ne(except));
    }
    let count: i64 = query.count().get_result(conn)?;
    Ok(count > 0)
}

pub fn insert_building(
    conn: &mut SqliteConnection,
    new_building: NewBuilding,
) -> Result<Building, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;

    diesel::insert_into(buildings).values(&new_building).execute(conn)?;
    let last_id = last_insert_rowid(conn)?;

    buildings.filter(id.eq(last_id)).select(Building::as_select()).first(conn)
}

/// Renames a building. Returns the rows updated.
pub fn update_building_code(
    conn: &mut SqliteConnection,
    building_id: i32,
    new_code: &str,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;
    diesel::update(buildings.filter(id.eq(building_id)))
        .set(code.eq(new_code))
        .execute(conn)
}

pub fn count_building_rooms(
    conn: &mut SqliteConnection,
    building_id: i32,
) -> Result<i64, diesel::result::Error> {
    use crate::schema::rooms;
    rooms::table
        .filter(rooms::building_id.eq(building_id))
        .count()
        .get_result(conn)
}

pub fn delete_building(
    conn: &mut SqliteConnection,
    building_id: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::buildings::dsl::*;
    diesel::delete(buildings.filter(id.eq(building_id))).execute(conn)
}
