//! API endpoints for site management.
//!
//! Sites are edited from the admin page with multipart forms that may carry
//! a map image. Form endpoints answer with a redirect back to `/admin`;
//! deletion answers with a [`RedirectResponse`](crate::api::response::RedirectResponse).
//!
//! # Authorization Rules
//! - Any logged-in user can list and read sites
//! - Only admins can create, edit or delete them

use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::{Route, State};
use rocket::form::Form;

use crate::api::response::{ApiError, Page, Redirected, api_error, internal_error, redirect_err, redirect_ok};
use crate::config::EdmsConfig;
use crate::models::{NewSite, Site};
use crate::orm::DbConn;
use crate::orm::site::{
    SiteDependents, delete_site, find_site_dependents, free_map_file_name, get_all_sites,
    get_site_by_id, insert_site, site_name_taken, update_site,
};
use crate::session_guards::{AdminUser, AuthenticatedUser};
use crate::site_maps::{SiteMapError, SiteMapStore, allowed_extension, stored_extension};
use crate::validation::validate_site_fields;

const SITE_NAME_EXISTS: &str = "Site name already exists";

#[derive(FromForm)]
pub struct AddSiteForm<'r> {
    #[field(name = "addSiteName")]
    #[field(default = String::new())]
    pub name: String,
    #[field(name = "addSiteAddress")]
    #[field(default = String::new())]
    pub address: String,
    #[field(name = "siteMapImgInput")]
    pub map: Option<TempFile<'r>>,
}

#[derive(FromForm)]
pub struct EditSiteForm<'r> {
    #[field(name = "editSiteName")]
    #[field(default = String::new())]
    pub name: String,
    #[field(name = "editSiteAddress")]
    #[field(default = String::new())]
    pub address: String,
    #[field(name = "siteMapImgInput")]
    pub map: Option<TempFile<'r>>,
}

fn admin_error(message: &str) -> Redirect {
    Redirect::to(Page::Admin.error_url(message))
}

/// The uploaded map, if the form carried a non-empty file, with its
/// checked extension.
fn uploaded_map<'a, 'r>(
    map: &'a mut Option<TempFile<'r>>,
) -> Result<Option<(&'a mut TempFile<'r>, String)>, SiteMapError> {
    match map {
        Some(file) if file.len() > 0 => {
            let raw_name = file
                .raw_name()
                .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string())
                .unwrap_or_default();
            let ext = allowed_extension(&raw_name)?;
            Ok(Some((file, ext)))
        }
        _ => Ok(None),
    }
}

/// Writes an upload into the store as `file_name` and returns its public
/// path.
async fn store_upload(
    store: &SiteMapStore,
    file: &mut TempFile<'_>,
    file_name: &str,
) -> Result<String, ApiError> {
    file.move_copy_to(store.disk_path(file_name))
        .await
        .map_err(|e| internal_error("Error saving site map image", e))?;
    Ok(SiteMapStore::public_path(file_name))
}

/// List Sites endpoint.
///
/// - **URL:** `/api/site`
/// - **Method:** `GET`
/// - **Authentication:** Required
///
/// All sites ordered by name.
#[get("/site")]
pub async fn list_sites(db: DbConn, _auth: AuthenticatedUser) -> Result<Json<Vec<Site>>, ApiError> {
    db.run(get_all_sites)
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching data", e))
}

#[get("/site/<id>")]
pub async fn get_site(db: DbConn, _auth: AuthenticatedUser, id: i32) -> Result<Json<Site>, ApiError> {
    match db.run(move |conn| get_site_by_id(conn, id)).await {
        Ok(Some(site)) => Ok(Json(site)),
        Ok(None) => Err(api_error(Status::NotFound, "Site not found")),
        Err(e) => Err(internal_error("Error fetching data", e)),
    }
}

/// Create Site endpoint.
///
/// - **URL:** `/api/site`
/// - **Method:** `POST`, `multipart/form-data`
/// - **Authorization:** admin
///
/// Fields `addSiteName`, `addSiteAddress` and optionally `siteMapImgInput`.
/// Redirects to `/admin?message=Site added successfully` or
/// `/admin?error=<reason>`.
#[post("/site", data = "<form>")]
pub async fn create_site(
    db: DbConn,
    _admin: AdminUser,
    config: &State<EdmsConfig>,
    mut form: Form<AddSiteForm<'_>>,
) -> Result<Redirect, ApiError> {
    let (name, address) = match validate_site_fields(&form.name, &form.address) {
        Ok(fields) => fields,
        Err(e) => return Ok(admin_error(&e.to_string())),
    };
    let upload = match uploaded_map(&mut form.map) {
        Ok(upload) => upload,
        Err(e) => return Ok(admin_error(&e.to_string())),
    };

    let lookup = name.clone();
    let upload_ext = upload.as_ref().map(|(_, ext)| ext.clone());
    let (taken, map_file) = db
        .run(move |conn| -> Result<_, diesel::result::Error> {
            let taken = site_name_taken(conn, &lookup, None)?;
            let map_file = match upload_ext {
                Some(ext) => Some(free_map_file_name(conn, &lookup, &ext, None)?),
                None => None,
            };
            Ok((taken, map_file))
        })
        .await
        .map_err(|e| internal_error("Database error", e))?;
    if taken {
        return Ok(admin_error(SITE_NAME_EXISTS));
    }

    let store = config.site_maps();
    let map_image_path = match (upload, map_file) {
        (Some((file, _)), Some(file_name)) => Some(store_upload(&store, file, &file_name).await?),
        _ => None,
    };

    let written = map_image_path.clone();
    let new_site = NewSite { name, address, map_image_path };
    match db.run(move |conn| insert_site(conn, new_site)).await {
        Ok(site) => {
            info!("Added site {} '{}'", site.id, site.name);
            Ok(Redirect::found(Page::Admin.message_url("Site added successfully")))
        }
        Err(e) => {
            if let Some(path) = written {
                store.discard(&path);
            }
            Err(internal_error("Error saving site", e))
        }
    }
}

/// What an edit did to the map file, so it can be undone.
enum MapChange {
    Kept,
    Uploaded { path: String, replaced: Option<String> },
    Renamed { from: String, to: String },
}

/// Edit Site endpoint.
///
/// - **URL:** `/api/site/<id>/edit`
/// - **Method:** `POST`, `multipart/form-data`
/// - **Authorization:** admin
///
/// Fields `editSiteName`, `editSiteAddress` and optionally
/// `siteMapImgInput`. A new image replaces the old one; renaming a site
/// without an upload renames its image file. If the database update fails
/// the file changes are undone.
#[post("/site/<id>/edit", data = "<form>")]
pub async fn edit_site(
    db: DbConn,
    _admin: AdminUser,
    config: &State<EdmsConfig>,
    id: i32,
    mut form: Form<EditSiteForm<'_>>,
) -> Result<Redirect, ApiError> {
    let (name, address) = match validate_site_fields(&form.name, &form.address) {
        Ok(fields) => fields,
        Err(e) => return Ok(admin_error(&e.to_string())),
    };
    let upload = match uploaded_map(&mut form.map) {
        Ok(upload) => upload,
        Err(e) => return Ok(admin_error(&e.to_string())),
    };

    let lookup = name.clone();
    let (existing, taken) = db
        .run(move |conn| -> Result<_, diesel::result::Error> {
            Ok((get_site_by_id(conn, id)?, site_name_taken(conn, &lookup, Some(id))?))
        })
        .await
        .map_err(|e| internal_error("Error fetching site", e))?;
    let Some(existing) = existing else {
        return Ok(admin_error("Site not found"));
    };
    if taken {
        return Ok(admin_error(SITE_NAME_EXISTS));
    }

    // A file name no other site's map uses, for an upload or a rename
    let wanted_ext = match (&upload, &existing.map_image_path) {
        (Some((_, ext)), _) => Some(ext.clone()),
        (None, Some(current)) if name != existing.name => Some(stored_extension(current)),
        (None, _) => None,
    };
    let map_file = match wanted_ext {
        Some(ext) => {
            let lookup = name.clone();
            let file_name = db
                .run(move |conn| free_map_file_name(conn, &lookup, &ext, Some(id)))
                .await
                .map_err(|e| internal_error("Error fetching site", e))?;
            Some(file_name)
        }
        None => None,
    };

    let store = config.site_maps();
    let change = match (upload, existing.map_image_path.clone(), map_file) {
        (Some((file, _)), replaced, Some(file_name)) => MapChange::Uploaded {
            path: store_upload(&store, file, &file_name).await?,
            replaced,
        },
        (None, Some(current), Some(file_name)) => {
            let renamed = store
                .rename_to(&current, &file_name)
                .map_err(|e| internal_error("Error renaming image", e))?;
            MapChange::Renamed { from: current, to: renamed }
        }
        _ => MapChange::Kept,
    };

    let map_image_path = match &change {
        MapChange::Kept => existing.map_image_path.clone(),
        MapChange::Uploaded { path, .. } => Some(path.clone()),
        MapChange::Renamed { to, .. } => Some(to.clone()),
    };
    let updated = Site { id, name, address, map_image_path };

    match db.run(move |conn| update_site(conn, &updated)).await {
        Ok(_) => {
            if let MapChange::Uploaded { path, replaced: Some(old) } = &change {
                if old != path {
                    if let Err(e) = store.remove(old) {
                        warn!("Could not remove replaced site map {}: {}", old, e);
                    }
                }
            }
            info!("Updated site {}", id);
            Ok(Redirect::found(Page::Admin.message_url("Site updated successfully")))
        }
        Err(e) => {
            match &change {
                MapChange::Uploaded { path, replaced } if replaced.as_ref() != Some(path) => {
                    store.discard(path)
                }
                MapChange::Renamed { from, to } => store.revert_rename(to, from),
                _ => {}
            }
            Err(internal_error("Error saving site", e))
        }
    }
}

/// Delete Site endpoint.
///
/// - **URL:** `/api/site/<id>`
/// - **Method:** `DELETE`
/// - **Authorization:** admin
///
/// Refused with 409 while the site still has devices, rooms or buildings
/// (checked in that order). On success the map image is removed too.
///
/// **Refused (HTTP 409):**
/// ```json
/// {
///   "error": "Cannot delete site with associated rooms",
///   "redirectURL": "/admin?error=Cannot%20delete%20site%20with%20associated%20rooms"
/// }
/// ```
#[delete("/site/<id>")]
pub async fn remove_site(
    db: DbConn,
    _admin: AdminUser,
    config: &State<EdmsConfig>,
    id: i32,
) -> Redirected {
    enum Removal {
        Deleted(Site),
        Missing,
        Blocked(SiteDependents),
    }

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Removal, diesel::result::Error> {
                let Some(site) = get_site_by_id(conn, id)? else {
                    return Ok(Removal::Missing);
                };
                if let Some(dependents) = find_site_dependents(conn, id)? {
                    return Ok(Removal::Blocked(dependents));
                }
                delete_site(conn, id)?;
                Ok(Removal::Deleted(site))
            })
        })
        .await;

    match result {
        Ok(Removal::Deleted(site)) => {
            info!("Deleted site {} '{}'", site.id, site.name);
            if let Some(path) = site.map_image_path {
                if let Err(e) = config.site_maps().remove(&path) {
                    error!("Error deleting site map image {}: {}", path, e);
                    return redirect_err(
                        Status::InternalServerError,
                        Page::Admin,
                        "Error deleting site map image",
                    );
                }
            }
            redirect_ok(Page::Admin, "Site deleted successfully")
        }
        Ok(Removal::Missing) => redirect_err(Status::NotFound, Page::Admin, "Site not found"),
        Ok(Removal::Blocked(dependents)) => {
            redirect_err(Status::Conflict, Page::Admin, dependents.message())
        }
        Err(e) => {
            error!("Error deleting site {}: {}", id, e);
            redirect_err(Status::InternalServerError, Page::Admin, "Error deleting site")
        }
    }
}

pub fn routes() -> Vec<Route> {
    routes![list_sites, get_site, create_site, edit_site, remove_site]
}
