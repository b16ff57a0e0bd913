//! Room endpoints.
//!
//! Room codes are unique within their building. A room cannot be deleted
//! while devices are located in it.

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::response::{ApiError, api_error, internal_error};
use crate::logged_json::LoggedJson;
use crate::models::{NewRoom, Room, RoomWithLocation};
use crate::orm::DbConn;
use crate::orm::building::get_building_by_id;
use crate::orm::room::{
    count_room_devices, delete_room, get_room_by_id, get_rooms, insert_room, room_code_taken,
    update_room_code,
};
use crate::session_guards::{AdminUser, AuthenticatedUser};
use crate::validation::validate_code;

type Rejectable<T> = Result<Result<T, ApiError>, diesel::result::Error>;

#[derive(FromForm)]
pub struct RoomFilter {
    #[field(name = "buildingId")]
    pub building_id: Option<i32>,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct CreateRoomRequest {
    pub building_id: i32,
    pub room_code: String,
}

#[derive(Deserialize, Serialize, Debug, TS)]
#[ts(export)]
pub struct UpdateRoomRequest {
    pub room_code: String,
}

fn code_conflict() -> ApiError {
    api_error(Status::Conflict, "Room code already exists for this building")
}

/// List Rooms endpoint.
///
/// - **URL:** `/api/room?buildingId=<id>`
/// - **Method:** `GET`
/// - **Authentication:** Required
///
/// Each room carries its building code and site name.
#[get("/room?<filter..>")]
pub async fn list_rooms(
    db: DbConn,
    _auth: AuthenticatedUser,
    filter: RoomFilter,
) -> Result<Json<Vec<RoomWithLocation>>, ApiError> {
    db.run(move |conn| get_rooms(conn, filter.building_id))
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching rooms", e))
}

/// Create Room endpoint.
///
/// - **URL:** `/api/room`
/// - **Method:** `POST`
/// - **Authorization:** admin
///
/// ```json
/// { "building_id": 2, "room_code": "B2" }
/// ```
#[post("/room", data = "<request>")]
pub async fn create_room(
    db: DbConn,
    _admin: AdminUser,
    request: LoggedJson<CreateRoomRequest>,
) -> Result<status::Created<Json<Room>>, ApiError> {
    let request = request.into_inner();
    let code = validate_code("Room", &request.room_code)
        .map_err(|msg| api_error(Status::BadRequest, msg))?;
    let building_id = request.building_id;

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<Room> {
                if get_building_by_id(conn, building_id)?.is_none() {
                    return Ok(Err(api_error(Status::NotFound, "Building not found")));
                }
                if room_code_taken(conn, building_id, &code, None)? {
                    return Ok(Err(code_conflict()));
                }
                insert_room(conn, NewRoom { building_id, code }).map(Ok)
            })
        })
        .await
        .map_err(|e| internal_error("Error adding room", e))?;

    let room = result?;
    info!("Added room {} '{}' to building {}", room.id, room.code, room.building_id);
    Ok(status::Created::new(format!("/api/room/{}", room.id)).body(Json(room)))
}

#[put("/room/<id>", data = "<request>")]
pub async fn update_room(
    db: DbConn,
    _admin: AdminUser,
    id: i32,
    request: LoggedJson<UpdateRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    let code = validate_code("Room", &request.room_code)
        .map_err(|msg| api_error(Status::BadRequest, msg))?;

    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<Room> {
                let Some(room) = get_room_by_id(conn, id)? else {
                    return Ok(Err(api_error(Status::NotFound, "Room not found")));
                };
                if room_code_taken(conn, room.building_id, &code, Some(id))? {
                    return Ok(Err(code_conflict()));
                }
                update_room_code(conn, id, &code)?;
                Ok(Ok(Room { code, ..room }))
            })
        })
        .await
        .map_err(|e| internal_error("Error updating room", e))?;

    let room = result?;
    info!("Renamed room {} to '{}'", room.id, room.code);
    Ok(Json(room))
}

/// Delete Room endpoint. 409 while devices are located in the room.
#[delete("/room/<id>")]
pub async fn remove_room(db: DbConn, _admin: AdminUser, id: i32) -> Result<Status, ApiError> {
    let result = db
        .run(move |conn| {
            conn.immediate_transaction(|conn| -> Rejectable<()> {
                if get_room_by_id(conn, id)?.is_none() {
                    return Ok(Err(api_error(Status::NotFound, "Room not found")));
                }
                if count_room_devices(conn, id)? > 0 {
                    return Ok(Err(api_error(
                        Status::Conflict,
                        "Cannot delete room with associated devices",
                    )));
                }
                delete_room(conn, id)?;
                Ok(Ok(()))
            })
        })
        .await
        .map_err(|e| internal_error("Error deleting room", e))?;

    result?;
    info!("Deleted room {}", id);
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![list_rooms, create_room, update_room, remove_room]
}
