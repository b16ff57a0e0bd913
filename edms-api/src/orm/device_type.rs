use diesel::prelude::*;

use crate::models::{DeviceType, NewDeviceType};
use crate::orm::last_insert_rowid;

/// Gets all device types ordered by name.
pub fn get_all_device_types(conn: &mut SqliteConnection) -> Result<Vec<DeviceType>, diesel::result::Error> {
    use crate::schema::device_types::dsl::*;
    device_types.order(name.asc()).select(DeviceType::as_select()).load(conn)
}

pub fn get_device_type_by_id(
    conn: &mut SqliteConnection,
    type_id: i32,
) -> Result<Option<DeviceType>, diesel::result::Error> {
    use crate::schema::device_types::dsl::*;
    device_types
        .filter(id.eq(type_id))
        .select(DeviceType::as_select())
        .first(conn)
        .optional()
}

pub fn get_device_type_by_name(
    conn: &mut SqliteConnection,
    type_name: &str,
) -> Result<Option<DeviceType>, diesel::result::Error> {
    use crate::schema::device_types::dsl::*;
    device_types
        .filter(name.eq(type_name))
        .select(DeviceType::as_select())
        .first(conn)
        .optional()
}

pub fn device_type_name_taken(
    conn: &mut SqliteConnection,
    type_name: &str,
    except_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::device_types::dsl::*;

    let mut query = device_types.filter(name.eq(type_name)).into_boxed();
    if let Some(except) = except_id {
        query = query.filter(id.ne(except));
    }
    let count: i64 = query.count().get_result(conn)?;
    Ok(count > 0)
}

pub fn insert_device_type(
    conn: &mut SqliteConnection,
    type_name: &str,
) -> Result<DeviceType, diesel::result::Error> {
    use crate::schema::device_types::dsl::*;

    diesel::insert_into(device_types)
        .values(&NewDeviceType { name: type_name.to_string() })
        .execute(conn)?;
    let last_id = last_insert_rowid(conn)?;

    device_types.filter(id.eq(last_id)).select(DeviceType::as_select()).first(conn)
}

pub fn rename_device_type(
    conn: &mut SqliteConnection,
    type_id: i32,
    new_name: &str,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::device_types::dsl::*;
    diesel::update(device_types.filter(id.eq(type_id)))
        .set(name.eq(new_name))
        .execute(conn)
}

/// Number of devices of the given type.
pub fn count_devices_of_type(conn: &mut SqliteConnection, type_id: i32) -> Result<i64, diesel::result::Error> {
    use crate::schema::devices;
    devices::table
        .filter(devices::device_type_id.eq(type_id))
        .count()
        .get_result(conn)
}

pub fn delete_device_type(conn: &mut SqliteConnection, type_id: i32) -> Result<usize, diesel::result::Error> {
    use crate::schema::device_types::dsl::*;
    diesel::delete(device_types.filter(id.eq(type_id))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::setup_test_db;

    #[test]
    fn test_device_type_crud() {
        let mut conn = setup_test_db();
        insert_device_type(&mut conn, "Fire Extinguisher").unwrap();
        let blanket = insert_device_type(&mut conn, "Fire Blanket").unwrap();

        let all = get_all_device_types(&mut conn).unwrap();
        assert_eq!(all[0].name, "Fire Blanket");
        assert_eq!(all[1].name, "Fire Extinguisher");

        assert!(device_type_name_taken(&mut conn, "Fire Blanket", None).unwrap());
        assert!(!device_type_name_taken(&mut conn, "Fire Blanket", Some(blanket.id)).unwrap());

        assert_eq!(rename_device_type(&mut conn, blanket.id, "Smoke Alarm").unwrap(), 1);
        assert_eq!(
            get_device_type_by_id(&mut conn, blanket.id).unwrap().unwrap().name,
            "Smoke Alarm"
        );
        assert!(get_device_type_by_name(&mut conn, "Smoke Alarm").unwrap().is_some());

        assert_eq!(count_devices_of_type(&mut conn, blanket.id).unwrap(), 0);
        assert_eq!(delete_device_type(&mut conn, blanket.id).unwrap(), 1);
        assert!(get_device_type_by_id(&mut conn, blanket.id).unwrap().is_none());
    }
}
