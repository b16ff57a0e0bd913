//! Emergency device endpoints.
//!
//! Reads are open to every logged-in user. Creating, editing and deleting
//! devices needs the admin role; the manual status override is open to any
//! logged-in user but only accepts the statuses the inspection rule never
//! sets itself.

use chrono::Local;
use rocket::Route;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::{Redirect, status};
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::response::{
    ApiError, Page, RedirectResponse, Redirected, api_error, internal_error, redirect_err,
    redirect_ok,
};
use crate::inspection_rules::{StatusOverrideError, validate_status_override};
use crate::logged_json::LoggedJson;
use crate::models::{Device, DeviceDetail, DeviceInput, NewDevice};
use crate::orm::DbConn;
use crate::orm::device::{
    count_device_inspections, delete_device, find_missing_reference, get_all_devices,
    get_device_by_id, get_device_detail, insert_device, update_device, update_device_status,
};
use crate::session_guards::{AdminUser, AuthenticatedUser};
use crate::validation::{DeviceValidationError, validate_device};

type JsonBody<'r, T> = Result<LoggedJson<T>, rocket::serde::json::Error<'r>>;

type Checked<T> = Result<Result<T, DeviceValidationError>, diesel::result::Error>;

type Override = Result<Result<&'static str, StatusOverrideError>, diesel::result::Error>;

/// Body of the status override.
#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

fn parse_device_id(raw: &str) -> Result<i32, Redirected> {
    raw.parse::<i32>()
        .map_err(|_| redirect_err(Status::BadRequest, Page::Dashboard, "Invalid device ID"))
}

fn validation_message(e: &DeviceValidationError) -> String {
    format!("Error validating device: {}", e)
}

/// Validates `input` and checks that everything it references exists.
fn check_device(conn: &mut diesel::SqliteConnection, input: &DeviceInput) -> Checked<NewDevice> {
    let new_device = match validate_device(input, Local::now().date_naive()) {
        Ok(device) => device,
        Err(e) => return Ok(Err(e)),
    };
    match find_missing_reference(conn, &new_device)? {
        Some(missing) => Ok(Err(missing)),
        None => Ok(Ok(new_device)),
    }
}

/// List Devices endpoint.
///
/// - **URL:** `/api/emergency-device?site_id=<id>&building_code=<code>`
/// - **Method:** `GET`
/// - **Authentication:** Required
///
/// Both filters are optional; an empty or unparseable `site_id` and an
/// empty `building_code` are ignored. Every row carries its site, building,
/// room and type names plus the derived `expiry_date` and
/// `next_inspection_date`.
#[get("/emergency-device?<site_id>&<building_code>")]
pub async fn list_devices(
    db: DbConn,
    _auth: AuthenticatedUser,
    site_id: Option<i32>,
    building_code: Option<String>,
) -> Result<Json<Vec<DeviceDetail>>, ApiError> {
    let building_code = building_code.filter(|code| !code.is_empty());
    db.run(move |conn| get_all_devices(conn, site_id, building_code.as_deref()))
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching data", e))
}

/// Get Device endpoint.
///
/// - **URL:** `/api/emergency-device/<id>`
/// - **Method:** `GET`
/// - **Authentication:** Required
///
/// Same shape as a listing row. 404 when the device does not exist.
#[get("/emergency-device/<id>")]
pub async fn get_device(
    db: DbConn,
    _auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<DeviceDetail>, ApiError> {
    match db.run(move |conn| get_device_detail(conn, id)).await {
        Ok(Some(device)) => Ok(Json(device)),
        Ok(None) => Err(api_error(Status::NotFound, "Device not found")),
        Err(e) => Err(internal_error("Error fetching data", e)),
    }
}

/// Create Device endpoint (dashboard form).
///
/// - **URL:** `/api/emergency-device`
/// - **Method:** `POST`, `application/x-www-form-urlencoded`
/// - **Authorization:** admin
///
/// Always answers with a redirect to the dashboard carrying either
/// `message=Device added successfully` or `error=<reason>`.
#[post("/emergency-device", data = "<input>")]
pub async fn create_device(db: DbConn, _admin: AdminUser, input: Form<DeviceInput>) -> Redirect {
    let input = input.into_inner();
    info!("Device form: {:?}", input);

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Checked<Device> {
                match check_device(conn, &input)? {
                    Ok(new_device) => insert_device(conn, &new_device).map(Ok),
                    Err(e) => Ok(Err(e)),
                }
            })
        })
        .await;

    match result {
        Ok(Ok(device)) => {
            info!("Added device {}", device.id);
            Redirect::found(Page::Dashboard.message_url("Device added successfully"))
        }
        Ok(Err(e)) => {
            warn!("Rejected device: {}", e);
            Redirect::to(Page::Dashboard.error_url(&validation_message(&e)))
        }
        Err(e) => {
            error!("Error adding device: {}", e);
            Redirect::to(Page::Dashboard.error_url("Error adding device"))
        }
    }
}

/// Update Device endpoint (edit dialog).
///
/// - **URL:** `/api/emergency-device/<id>`
/// - **Method:** `PUT`, JSON body with the same fields as the create form
/// - **Authorization:** admin
///
/// Every editable field is revalidated and replaced; the last-inspection
/// date is left alone.
///
/// **Success (HTTP 200):**
/// ```json
/// {"message": "Device updated successfully", "redirectURL": "/dashboard?message=Device%20updated%20successfully"}
/// ```
///
/// **Validation failure (HTTP 400):**
/// ```json
/// {"error": "Error validating device: room is required", "redirectURL": "/dashboard?error=room%20is%20required"}
/// ```
#[put("/emergency-device/<id>", data = "<input>")]
pub async fn edit_device(
    db: DbConn,
    _admin: AdminUser,
    id: &str,
    input: JsonBody<'_, DeviceInput>,
) -> Redirected {
    let input = match input {
        Ok(input) => input.into_inner(),
        Err(e) => {
            warn!("Invalid device body: {:?}", e);
            return redirect_err(Status::BadRequest, Page::Dashboard, "Invalid request body");
        }
    };
    let device_id = match parse_device_id(id) {
        Ok(device_id) => device_id,
        Err(response) => return response,
    };

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Checked<usize> {
                match check_device(conn, &input)? {
                    Ok(changes) => update_device(conn, device_id, &changes).map(Ok),
                    Err(e) => Ok(Err(e)),
                }
            })
        })
        .await;

    match result {
        Ok(Ok(0)) => redirect_err(Status::NotFound, Page::Dashboard, "Device not found"),
        Ok(Ok(_)) => {
            info!("Updated device {}", device_id);
            redirect_ok(Page::Dashboard, "Device updated successfully")
        }
        Ok(Err(e)) => {
            warn!("Rejected edit of device {}: {}", device_id, e);
            let reason = e.to_string();
            status::Custom(
                Status::BadRequest,
                Json(RedirectResponse::Failure {
                    error: validation_message(&e),
                    redirect_url: Page::Dashboard.error_url(&reason),
                }),
            )
        }
        Err(e) => {
            error!("Error updating device {}: {}", device_id, e);
            redirect_err(Status::InternalServerError, Page::Dashboard, "Error updating device")
        }
    }
}

/// Delete Device endpoint.
///
/// - **URL:** `/api/emergency-device/<id>`
/// - **Method:** `DELETE`
/// - **Authorization:** admin
///
/// A device with recorded inspections cannot be deleted (409).
#[delete("/emergency-device/<id>")]
pub async fn remove_device(db: DbConn, _admin: AdminUser, id: &str) -> Redirected {
    let device_id = match parse_device_id(id) {
        Ok(device_id) => device_id,
        Err(response) => return response,
    };

    enum Removal {
        Deleted,
        Missing,
        HasInspections,
    }

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Removal, diesel::result::Error> {
                if get_device_by_id(conn, device_id)?.is_none() {
                    return Ok(Removal::Missing);
                }
                if count_device_inspections(conn, device_id)? > 0 {
                    return Ok(Removal::HasInspections);
                }
                delete_device(conn, device_id)?;
                Ok(Removal::Deleted)
            })
        })
        .await;

    match result {
        Ok(Removal::Deleted) => {
            info!("Deleted device {}", device_id);
            redirect_ok(Page::Dashboard, "Device deleted successfully")
        }
        Ok(Removal::Missing) => redirect_err(Status::NotFound, Page::Dashboard, "Device not found"),
        Ok(Removal::HasInspections) => redirect_err(
            Status::Conflict,
            Page::Dashboard,
            "Cannot delete device with recorded inspections",
        ),
        Err(e) => {
            error!("Error deleting device {}: {}", device_id, e);
            redirect_err(Status::InternalServerError, Page::Dashboard, "Error deleting device")
        }
    }
}

/// Device Status Override endpoint.
///
/// - **URL:** `/api/emergency-device/<id>/status`
/// - **Method:** `PUT`, body `{"status": "Inspection Due" | "Expired"}`
/// - **Authentication:** Required
///
/// Checks run in this order: body (400), id (400), device exists (404),
/// status present (400 `Status is required`), status allowed
/// (400 `Invalid status`).
#[put("/emergency-device/<id>/status", data = "<request>")]
pub async fn set_device_status(
    db: DbConn,
    auth: AuthenticatedUser,
    id: &str,
    request: JsonBody<'_, StatusRequest>,
) -> Redirected {
    let request = match request {
        Ok(request) => request.into_inner(),
        Err(e) => {
            warn!("Invalid status body: {:?}", e);
            return redirect_err(Status::BadRequest, Page::Dashboard, "Invalid request body");
        }
    };
    let device_id = match parse_device_id(id) {
        Ok(device_id) => device_id,
        Err(response) => return response,
    };

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Override {
                if get_device_by_id(conn, device_id)?.is_none() {
                    return Ok(Err(StatusOverrideError::DeviceNotFound));
                }
                let status = match validate_status_override(&request.status) {
                    Ok(status) => status,
                    Err(e) => return Ok(Err(e)),
                };
                update_device_status(conn, device_id, status)?;
                Ok(Ok(status))
            })
        })
        .await;

    match result {
        Ok(Ok(status)) => {
            info!(
                "User '{}' set device {} to '{}'",
                auth.user.username, device_id, status
            );
            redirect_ok(Page::Dashboard, "Device status updated successfully")
        }
        Ok(Err(e @ StatusOverrideError::DeviceNotFound)) => {
            redirect_err(Status::NotFound, Page::Dashboard, &e.to_string())
        }
        Ok(Err(e)) => redirect_err(Status::BadRequest, Page::Dashboard, &e.to_string()),
        Err(e) => {
            error!("Failed to update status of device {}: {}", device_id, e);
            redirect_err(
                Status::InternalServerError,
                Page::Dashboard,
                "Failed to update device status",
            )
        }
    }
}

pub fn routes() -> Vec<Route> {
    routes![
        list_devices,
        get_device,
        create_device,
        edit_device,
        remove_device,
        set_device_status
    ]
}
