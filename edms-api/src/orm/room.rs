use diesel::prelude::*;

use crate::models::{NewRoom, Room, RoomWithLocation};
use crate::orm::last_insert_rowid;

/// Lists rooms with their building and site, ordered by site name, building
/// code and room code.
pub fn get_rooms(
    conn: &mut SqliteConnection,
    building_filter: Option<i32>,
) -> Result<Vec<RoomWithLocation>, diesel::result::Error> {
    use crate::schema::{buildings, rooms, sites};

    let mut query = rooms::table
        .inner_join(buildings::table.inner_join(sites::table))
        .select((rooms::id, rooms::code, buildings::id, buildings::code, sites::id, sites::name))
        .order((sites::name.asc(), buildings::code.asc(), rooms::code.asc()))
        .into_boxed();
    if let Some(building) = building_filter {
        query = query.filter(rooms::building_id.eq(building));
    }

    let rows: Vec<(i32, String, i32, String, i32, String)> = query.load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(id, code, building_id, building_code, site_id, site_name)| RoomWithLocation {
            id,
            code,
            building_id,
            building_code,
            site_id,
            site_name,
        })
        .collect())
}

pub fn get_room_by_id(
    conn: &mut SqliteConnection,
    room_id: i32,
) -> Result<Option<Room>, diesel::result::Error> {
    use crate::schema::rooms::dsl::*;
    rooms.filter(id.eq(room_id)).select(Room::as_select()).first(conn).optional()
}

/// True when another room of the same building already uses `room_code`.
pub fn room_code_taken(
    conn: &mut SqliteConnection,
    parent_building_id: i32,
    room_code: &str,
    except_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::rooms::dsl::*;

    let mut query = rooms
        .filter(building_id.eq(parent_building_id))
        .filter(code.eq(room_code))
        .into_boxed();
    if let Some(except) = except_id {
        query = query.filter(id.ne(except));
    }
    let count: i64 = query.count().get_result(conn)?;
    Ok(count > 0)
}

pub fn insert_room(conn: &mut SqliteConnection, new_room: NewRoom) -> Result<Room, diesel::result::Error> {
    use crate::schema::rooms::dsl::*;

    diesel::insert_into(rooms).values(&new_room).execute(conn)?;
    let last_id = last_insert_rowid(conn)?;

    rooms.filter(id.eq(last_id)).select(Room::as_select()).first(conn)
}

pub fn update_room_code(
    conn: &mut SqliteConnection,
    room_id: i32,
    new_code: &str,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::rooms::dsl::*;
    diesel::update(rooms.filter(id.eq(room_id)))
        .set(code.eq(new_code))
        .execute(conn)
}

pub fn count_room_devices(conn: &mut SqliteConnection, room_id: i32) -> Result<i64, diesel::result::Error> {
    use crate::schema::devices;
    devices::table
        .filter(devices::room_id.eq(room_id))
        .count()
        .get_result(conn)
}

pub fn delete_room(conn: &mut SqliteConnection, room_id: i32) -> Result<usize, diesel::result::Error> {
    use crate::schema::rooms::dsl::*;
    diesel::delete(rooms.filter(id.eq(room_id))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{insert_test_device, insert_test_location, setup_test_db};

    #[test]
    fn test_list_rooms_with_location() {
        let mut conn = setup_test_db();
        let (site_id, building_id, room_id) = insert_test_location(&mut conn, "North", "A", "A1");
        insert_room(&mut conn, NewRoom { building_id, code: "A0".to_string() }).unwrap();

        let listed = get_rooms(&mut conn, Some(building_id)).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].code, "A0");
        assert_eq!(listed[1].id, room_id);
        assert_eq!(listed[1].building_code, "A");
        assert_eq!(listed[1].site_id, site_id);
        assert_eq!(listed[1].site_name, "North");

        assert!(get_rooms(&mut conn, Some(building_id + 50)).unwrap().is_empty());
    }

    #[test]
    fn test_room_codes_unique_per_building() {
        let mut conn = setup_test_db();
        let (_, building_id, room_id) = insert_test_location(&mut conn, "North", "A", "A1");

        assert!(room_code_taken(&mut conn, building_id, "A1", None).unwrap());
        assert!(!room_code_taken(&mut conn, building_id, "A1", Some(room_id)).unwrap());
        assert_eq!(update_room_code(&mut conn, room_id, "A2").unwrap(), 1);
        assert_eq!(get_room_by_id(&mut conn, room_id).unwrap().unwrap().code, "A2");
    }

    #[test]
    fn test_count_room_devices() {
        let mut conn = setup_test_db();
        let (_, _, room_id) = insert_test_location(&mut conn, "North", "A", "A1");
        assert_eq!(count_room_devices(&mut conn, room_id).unwrap(), 0);

        insert_test_device(&mut conn, room_id);
        assert_eq!(count_room_devices(&mut conn, room_id).unwrap(), 1);
        assert!(delete_room(&mut conn, room_id).is_err());
    }
}
