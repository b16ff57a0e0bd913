//! Device type endpoints.

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::response::{ApiError, api_error, internal_error};
use crate::logged_json::LoggedJson;
use crate::models::DeviceType;
use crate::orm::DbConn;
use crate::orm::device_type::{
    count_devices_of_type, delete_device_type, device_type_name_taken, get_all_device_types,
    get_device_type_by_id, insert_device_type, rename_device_type,
};
use crate::session_guards::{AdminUser, AuthenticatedUser};
use crate::validation::validate_device_type_name;

type Rejectable<T> = Result<Result<T, ApiError>, diesel::result::Error>;

/// Body of both create and rename.
#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct DeviceTypeRequest {
    pub name: String,
}

fn name_conflict() -> ApiError {
    api_error(Status::Conflict, "Device type already exists")
}

/// All device types ordered by name.
#[get("/emergency-device-type")]
pub async fn list_device_types(
    db: DbConn,
    _auth: AuthenticatedUser,
) -> Result<Json<Vec<DeviceType>>, ApiError> {
    db.run(get_all_device_types)
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching device types", e))
}

/// Create Device Type endpoint.
///
/// - **URL:** `/api/emergency-device-type`
/// - **Method:** `POST`, body `{"name": "Fire Blanket"}`
/// - **Authorization:** admin
///
/// 201 with the new type, 400 for a blank or overlong name, 409 for a
/// duplicate.
#[post("/emergency-device-type", data = "<request>")]
pub async fn create_device_type(
    db: DbConn,
    _admin: AdminUser,
    request: LoggedJson<DeviceTypeRequest>,
) -> Result<status::Created<Json<DeviceType>>, ApiError> {
    let name = validate_device_type_name(&request.name)
        .map_err(|msg| api_error(Status::BadRequest, msg))?;

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<DeviceType> {
                if device_type_name_taken(conn, &name, None)? {
                    return Ok(Err(name_conflict()));
                }
                insert_device_type(conn, &name).map(Ok)
            })
        })
        .await
        .map_err(|e| internal_error("Error adding device type", e))?;

    let device_type = result?;
    info!("Added device type {} '{}'", device_type.id, device_type.name);
    Ok(status::Created::new(format!("/api/emergency-device-type/{}", device_type.id))
        .body(Json(device_type)))
}

#[put("/emergency-device-type/<id>", data = "<request>")]
pub async fn update_device_type(
    db: DbConn,
    _admin: AdminUser,
    id: i32,
    request: LoggedJson<DeviceTypeRequest>,
) -> Result<Json<DeviceType>, ApiError> {
    let name = validate_device_type_name(&request.name)
        .map_err(|msg| api_error(Status::BadRequest, msg))?;

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<DeviceType> {
                if get_device_type_by_id(conn, id)?.is_none() {
                    return Ok(Err(api_error(Status::NotFound, "Device type not found")));
                }
                if device_type_name_taken(conn, &name, Some(id))? {
                    return Ok(Err(name_conflict()));
                }
                rename_device_type(conn, id, &name)?;
                Ok(Ok(DeviceType { id, name }))
            })
        })
        .await
        .map_err(|e| internal_error("Error updating device type", e))?;

    let device_type = result?;
    info!("Renamed device type {} to '{}'", device_type.id, device_type.name);
    Ok(Json(device_type))
}

/// Delete Device Type endpoint. 409 while devices are of this type.
#[delete("/emergency-device-type/<id>")]
pub async fn remove_device_type(
    db: DbConn,
    _admin: AdminUser,
    id: i32,
) -> Result<Status, ApiError> {
    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<()> {
                if get_device_type_by_id(conn, id)?.is_none() {
                    return Ok(Err(api_error(Status::NotFound, "Device type not found")));
                }
                if count_devices_of_type(conn, id)? > 0 {
                    return Ok(Err(api_error(
                        Status::Conflict,
                        "Cannot delete device type with associated devices",
                    )));
                }
                delete_device_type(conn, id)?;
                Ok(Ok(()))
            })
        })
        .await
        .map_err(|e| internal_error("Error deleting device type", e))?;

    result?;
    info!("Deleted device type {}", id);
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![list_device_types, create_device_type, update_device_type, remove_device_type]
}
