use diesel::prelude::*;

use crate::models::{NewSite, Site};
use crate::orm::last_insert_rowid;
use crate::site_maps::SiteMapStore;

/// Gets all sites ordered by name.
pub fn get_all_sites(conn: &mut SqliteConnection) -> Result<Vec<Site>, diesel::result::Error> {
    use crate::schema::sites::dsl::*;
    sites.order(name.asc()).select(Site::as_select()).load(conn)
}

pub fn get_site_by_id(
    conn: &mut SqliteConnection,
    site_id: i32,
) -> Result<Option<Site>, diesel::result::Error> {
    use crate::schema::sites::dsl::*;
    sites.filter(id.eq(site_id)).select(Site::as_select()).first(conn).optional()
}

/// True when a site other than `except_id` already carries `site_name`.
/// Comparison is case sensitive.
pub fn site_name_taken(
    conn: &mut SqliteConnection,
    site_name: &str,
    except_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::sites::dsl::*;

    let mut query = sites.filter(name.eq(site_name)).into_boxed();
    if let Some(except) = except_id {
        query = query.filter(id.ne(except));
    }
    let count: i64 = query.count().get_result(conn)?;
    Ok(count > 0)
}

/// True when a site other than `except_id` stores `path` as its map.
pub fn site_map_path_taken(
    conn: &mut SqliteConnection,
    path: &str,
    except_id: Option<i32>,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::sites::dsl::*;

    let mut query = sites.filter(map_image_path.eq(path)).into_boxed();
    if let Some(except) = except_id {
        query = query.filter(id.ne(except));
    }
    let count: i64 = query.count().get_result(conn)?;
    Ok(count > 0)
}

/// First map file name for `site_name` that no site other than
/// `except_id` already points at.
pub fn free_map_file_name(
    conn: &mut SqliteConnection,
    site_name: &str,
    ext: &str,
    except_id: Option<i32>,
) -> Result<String, diesel::result::Error> {
    let mut attempt = 0;
    loop {
        let file_name = SiteMapStore::file_name(site_name, ext, attempt);
        if !site_map_path_taken(conn, &SiteMapStore::public_path(&file_name), except_id)? {
            return Ok(file_name);
        }
        attempt += 1;
    }
}

pub fn insert_site(conn: &mut SqliteConnection, new_site: NewSite) -> Result<Site, diesel::result::Error> {
    use crate::schema::sites::dsl::*;

    diesel::insert_into(sites).values(&new_site).execute(conn)?;
    let last_id = last_insert_rowid(conn)?;

    sites.filter(id.eq(last_id)).select(Site::as_select()).first(conn)
}

/// Overwrites name, address and map path. Returns the rows updated.
pub fn update_site(conn: &mut SqliteConnection, site: &Site) -> Result<usize, diesel::result::Error> {
    use crate::schema::sites::dsl::*;
    diesel::update(sites.filter(id.eq(site.id))).set(site).execute(conn)
}

pub fn delete_site(conn: &mut SqliteConnection, site_id: i32) -> Result<usize, diesel::result::Error> {
    use crate::schema::sites::dsl::*;
    diesel::delete(sites.filter(id.eq(site_id))).execute(conn)
}

/// What still hangs off a site and blocks its deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteDependents {
    Devices,
    Rooms,
    Buildings,
}

impl SiteDependents {
    pub fn message(&self) -> &'static str {
        match self {
            SiteDependents::Devices => "Cannot delete site with associated emergency devices",
            SiteDependents::Rooms => "Cannot delete site with associated rooms",
            SiteDependents::Buildings => "Cannot delete site with associated buildings",
        }
    }
}

/// Finds the first kind of record still referencing the site, checking
/// devices, then rooms, then buildings.
pub fn find_site_dependents(
    conn: &mut SqliteConnection,
    site_id: i32,
) -> Result<Option<SiteDependents>, diesel::result::Error> {
    use crate::schema::{buildings, devices, rooms};

    let device_count: i64 = devices::table
        .inner_join(rooms::table.inner_join(buildings::table))
        .filter(buildings::site_id.eq(site_id))
        .count()
        .get_result(conn)?;
    if device_count > 0 {
        return Ok(Some(SiteDependents::Devices));
    }

    let room_count: i64 = rooms::table
        .inner_join(buildings::table)
        .filter(buildings::site_id.eq(site_id))
        .count()
        .get_result(conn)?;
    if room_count > 0 {
        return Ok(Some(SiteDependents::Rooms));
    }

    let building_count: i64 = buildings::table
        .filter(buildings::site_id.eq(site_id))
        .count()
        .get_result(conn)?;
    if building_count > 0 {
        return Ok(Some(SiteDependents::Buildings));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBuilding, NewRoom};
    use crate::orm::building::insert_building;
    use crate::orm::room::insert_room;
    use crate::orm::testing::{insert_test_device, setup_test_db};

    fn new_site(site_name: &str) -> NewSite {
        NewSite {
            name: site_name.to_string(),
            address: "1 Test Road".to_string(),
            map_image_path: None,
        }
    }

    #[test]
    fn test_insert_and_list_sites_by_name() {
        let mut conn = setup_test_db();
        insert_site(&mut conn, new_site("Zeta")).unwrap();
        let alpha = insert_site(&mut conn, new_site("Alpha")).unwrap();

        let all = get_all_sites(&mut conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Alpha");
        assert_eq!(get_site_by_id(&mut conn, alpha.id).unwrap().unwrap().name, "Alpha");
        assert!(get_site_by_id(&mut conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_site_name_taken_ignores_edited_site() {
        let mut conn = setup_test_db();
        let site = insert_site(&mut conn, new_site("Campus")).unwrap();

        assert!(site_name_taken(&mut conn, "Campus", None).unwrap());
        assert!(!site_name_taken(&mut conn, "Campus", Some(site.id)).unwrap());
        assert!(!site_name_taken(&mut conn, "campus", None).unwrap());
    }

    #[test]
    fn test_free_map_file_name_skips_other_sites_maps() {
        let mut conn = setup_test_db();
        let first = insert_site(
            &mut conn,
            NewSite {
                map_image_path: Some("/static/site_maps/North_Campus.png".to_string()),
                ..new_site("North Campus")
            },
        )
        .unwrap();

        assert!(site_map_path_taken(&mut conn, "/static/site_maps/North_Campus.png", None).unwrap());
        assert!(
            !site_map_path_taken(&mut conn, "/static/site_maps/North_Campus.png", Some(first.id))
                .unwrap()
        );

        // Another name that sanitizes the same way gets a suffixed file
        assert_eq!(
            free_map_file_name(&mut conn, "North_Campus", ".png", None).unwrap(),
            "North_Campus_2.png"
        );
        // The owner keeps its own file, and other extensions are free
        assert_eq!(
            free_map_file_name(&mut conn, "North Campus", ".png", Some(first.id)).unwrap(),
            "North_Campus.png"
        );
        assert_eq!(
            free_map_file_name(&mut conn, "North_Campus", ".jpg", None).unwrap(),
            "North_Campus.jpg"
        );

        insert_site(
            &mut conn,
            NewSite {
                map_image_path: Some("/static/site_maps/North_Campus_2.png".to_string()),
                ..new_site("North_Campus")
            },
        )
        .unwrap();
        assert_eq!(
            free_map_file_name(&mut conn, "North-Campus!", ".png", None).unwrap(),
            "North-Campus.png"
        );
        assert_eq!(
            free_map_file_name(&mut conn, "North Campus!", ".png", None).unwrap(),
            "North_Campus_3.png"
        );
    }

    #[test]
    fn test_update_site_clears_map_path() {
        let mut conn = setup_test_db();
        let mut site = insert_site(
            &mut conn,
            NewSite {
                map_image_path: Some("/static/site_maps/Campus.png".to_string()),
                ..new_site("Campus")
            },
        )
        .unwrap();

        site.name = "Campus North".to_string();
        site.map_image_path = None;
        assert_eq!(update_site(&mut conn, &site).unwrap(), 1);

        let stored = get_site_by_id(&mut conn, site.id).unwrap().unwrap();
        assert_eq!(stored.name, "Campus North");
        assert_eq!(stored.map_image_path, None);
    }

    #[test]
    fn test_dependents_are_reported_in_order() {
        let mut conn = setup_test_db();
        let site = insert_site(&mut conn, new_site("Campus")).unwrap();
        assert_eq!(find_site_dependents(&mut conn, site.id).unwrap(), None);

        let building =
            insert_building(&mut conn, NewBuilding { site_id: site.id, code: "A".to_string() })
                .unwrap();
        assert_eq!(
            find_site_dependents(&mut conn, site.id).unwrap(),
            Some(SiteDependents::Buildings)
        );

        let room =
            insert_room(&mut conn, NewRoom { building_id: building.id, code: "A1".to_string() })
                .unwrap();
        assert_eq!(find_site_dependents(&mut conn, site.id).unwrap(), Some(SiteDependents::Rooms));

        insert_test_device(&mut conn, room.id);
        assert_eq!(
            find_site_dependents(&mut conn, site.id).unwrap(),
            Some(SiteDependents::Devices)
        );
    }
}
