//! Building endpoints.
//!
//! Building codes are unique within their site. A building cannot be
//! deleted while rooms still belong to it.

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::response::{ApiError, api_error, internal_error};
use crate::logged_json::LoggedJson;
use crate::models::{Building, BuildingWithSite, NewBuilding};
use crate::orm::DbConn;
use crate::orm::building::{
    building_code_taken, count_building_rooms, delete_building, get_building_by_id, get_buildings,
    insert_building, update_building_code,
};
use crate::orm::site::get_site_by_id;
use crate::session_guards::{AdminUser, AuthenticatedUser};
use crate::validation::validate_code;

type Rejectable<T> = Result<Result<T, ApiError>, diesel::result::Error>;

#[derive(FromForm)]
pub struct BuildingFilter {
    #[field(name = "siteId")]
    pub site_id: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct CreateBuildingRequest {
    pub site_id: i32,
    pub building_code: String,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct UpdateBuildingRequest {
    pub building_code: String,
}

fn code_conflict() -> ApiError {
    api_error(Status::Conflict, "Building code already exists for this site")
}

/// List Buildings endpoint.
///
/// - **URL:** `/api/building?siteId=<id>`
/// - **Method:** `GET`
/// - **Authentication:** Required
///
/// Buildings with their site name, ordered by code. `siteId` is optional.
#[get("/building?<filter..>")]
pub async fn list_buildings(
    db: DbConn,
    _auth: AuthenticatedUser,
    filter: BuildingFilter,
) -> Result<Json<Vec<BuildingWithSite>>, ApiError> {
    db.run(move |conn| get_buildings(conn, filter.site_id))
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching buildings", e))
}

/// Create Building endpoint.
///
/// - **URL:** `/api/building`
/// - **Method:** `POST`
/// - **Authorization:** admin
///
/// ```json
/// { "site_id": 1, "building_code": "C" }
/// ```
///
/// 201 with the new building; 404 for an unknown site, 409 when the code is
/// already used at that site.
#[post("/building", data = "<request>")]
pub async fn create_building(
    db: DbConn,
    _admin: AdminUser,
    request: LoggedJson<CreateBuildingRequest>,
) -> Result<status::Created<Json<Building>>, ApiError> {
    let request = request.into_inner();
    let code = validate_code("Building", &request.building_code)
        .map_err(|msg| api_error(Status::BadRequest, msg))?;
    let site_id = request.site_id;

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<Building> {
                if get_site_by_id(conn, site_id)?.is_none() {
                    return Ok(Err(api_error(Status::NotFound, "Site not found")));
                }
                if building_code_taken(conn, site_id, &code, None)? {
                    return Ok(Err(code_conflict()));
                }
                insert_building(conn, NewBuilding { site_id, code }).map(Ok)
            })
        })
        .await
        .map_err(|e| internal_error("Error adding building", e))?;

    let building = result?;
    info!("Added building {} '{}' to site {}", building.id, building.code, building.site_id);
    Ok(status::Created::new(format!("/api/building/{}", building.id)).body(Json(building)))
}

/// Update Building endpoint. Renames the building.
#[put("/building/<id>", data = "<request>")]
pub async fn update_building(
    db: DbConn,
    _admin: AdminUser,
    id: i32,
    request: LoggedJson<UpdateBuildingRequest>,
) -> Result<Json<Building>, ApiError> {
    let code = validate_code("Building", &request.building_code)
        .map_err(|msg| api_error(Status::BadRequest, msg))?;

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<Building> {
                let Some(building) = get_building_by_id(conn, id)? else {
                    return Ok(Err(api_error(Status::NotFound, "Building not found")));
                };
                if building_code_taken(conn, building.site_id, &code, Some(id))? {
                    return Ok(Err(code_conflict()));
                }
                update_building_code(conn, id, &code)?;
                Ok(Ok(Building { code, ..building }))
            })
        })
        .await
        .map_err(|e| internal_error("Error updating building", e))?;

    let building = result?;
    info!("Renamed building {} to '{}'", building.id, building.code);
    Ok(Json(building))
}

/// Delete Building endpoint.
///
/// 204 on success, 404 when missing, 409 while rooms belong to it.
#[delete("/building/<id>")]
pub async fn remove_building(db: DbConn, _admin: AdminUser, id: i32) -> Result<Status, ApiError> {
    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<()> {
                if get_building_by_id(conn, id)?.is_none() {
                    return Ok(Err(api_error(Status::NotFound, "Building not found")));
                }
                if count_building_rooms(conn, id)? > 0 {
                    return Ok(Err(api_error(
                        Status::Conflict,
                        "Cannot delete building with associated rooms",
                    )));
                }
                delete_building(conn, id)?;
                Ok(Ok(()))
            })
        })
        .await
        .map_err(|e| internal_error("Error deleting building", e))?;

    result?;
    info!("Deleted building {}", id);
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![list_buildings, create_building, update_building, remove_building]
}
