//! Inspection endpoints.
//!
//! Recording an inspection also applies its effect on the device status;
//! see [`record_inspection`].

use chrono::{Local, NaiveDate};
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::response::{ApiError, api_error, internal_error};
use crate::inspection_rules::{InspectionOutcome, StatusTransition};
use crate::logged_json::LoggedJson;
use crate::models::{Inspection, InspectionChecklist, NewInspection};
use crate::orm::DbConn;
use crate::orm::inspection::{get_inspection_by_id, get_inspections_for_device, record_inspection};
use crate::session_guards::AuthenticatedUser;

/// Body of a new inspection. Checklist items sit at the top level next to
/// the other fields.
#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct InspectionRequest {
    pub device_id: i32,
    /// `YYYY-MM-DD`
    pub inspection_date: String,
    #[serde(flatten)]
    pub checklist: InspectionChecklist,
    pub outcome: InspectionOutcome,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, TS)]
#[ts(export)]
pub struct InspectionRecorded {
    pub inspection: Inspection,
    /// False when an inspection with the same or a later date was already
    /// on record, in which case the device was left as it was.
    pub device_updated: bool,
}

/// Record Inspection endpoint.
///
/// - **URL:** `/api/inspection`
/// - **Method:** `POST`
/// - **Authentication:** Required; the caller is recorded as the inspector
///
/// ```json
/// {
///   "device_id": 1,
///   "inspection_date": "2024-02-01",
///   "is_conspicuous": true,
///   "is_accessible": false,
///   "outcome": "Failed",
///   "notes": "Bracket loose"
/// }
/// ```
///
/// Answers 201 with the stored inspection. A malformed or future date
/// gives 400, an unknown device 404.
#[post("/inspection", data = "<request>")]
pub async fn create_inspection(
    db: DbConn,
    auth: AuthenticatedUser,
    request: LoggedJson<InspectionRequest>,
) -> Result<status::Created<Json<InspectionRecorded>>, ApiError> {
    let request = request.into_inner();

    let inspection_date = NaiveDate::parse_from_str(&request.inspection_date, "%Y-%m-%d")
        .map_err(|_| api_error(Status::BadRequest, "Invalid inspection date format"))?;
    if inspection_date > Local::now().date_naive() {
        return Err(api_error(Status::BadRequest, "Inspection date cannot be in the future"));
    }

    let new_inspection = NewInspection::new(
        request.device_id,
        auth.user.id,
        inspection_date,
        request.checklist,
        request.outcome.as_str().to_string(),
        request.notes.filter(|notes| !notes.is_empty()),
    );

    match db.run(move |conn| record_inspection(conn, new_inspection)).await {
        Ok(Some(recorded)) => {
            let location = format!("/api/inspection/{}", recorded.inspection.id);
            Ok(status::Created::new(location).body(Json(InspectionRecorded {
                device_updated: recorded.transition != StatusTransition::Stale,
                inspection: recorded.inspection,
            })))
        }
        Ok(None) => Err(api_error(Status::NotFound, "Device not found")),
        Err(e) => Err(internal_error("Error recording inspection", e)),
    }
}

/// Inspections of one device, newest first.
#[get("/inspection?<device_id>")]
pub async fn list_inspections(
    db: DbConn,
    _auth: AuthenticatedUser,
    device_id: i32,
) -> Result<Json<Vec<Inspection>>, ApiError> {
    db.run(move |conn| get_inspections_for_device(conn, device_id))
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching inspections", e))
}

#[get("/inspection/<id>")]
pub async fn get_inspection(
    db: DbConn,
    _auth: AuthenticatedUser,
    id: i32,
) -> Result<Json<Inspection>, ApiError> {
    match db.run(move |conn| get_inspection_by_id(conn, id)).await {
        Ok(Some(inspection)) => Ok(Json(inspection)),
        Ok(None) => Err(api_error(Status::NotFound, "Inspection not found")),
        Err(e) => Err(internal_error("Error fetching inspection", e)),
    }
}

pub fn routes() -> Vec<Route> {
    routes![create_inspection, list_inspections, get_inspection]
}
