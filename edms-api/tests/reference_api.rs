//! Buildings, rooms, device types and extinguisher types.

#![cfg(feature = "test-staging")]

#[macro_use]
extern crate time_test;

use edms_api::models::{
    Building, BuildingWithSite, DeviceType, ExtinguisherType, Room, RoomWithLocation,
};
use edms_api::orm::testing::test_rocket;
use rocket::http::{Cookie, Status};
use rocket::local::asynchronous::Client;
use rocket::tokio;
use serde_json::json;

async fn login(client: &Client, username: &str, password: &str) -> Cookie<'static> {
    let response = client
        .post("/api/login")
        .json(&json!({ "username": username, "password": password }))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    response
        .cookies()
        .get("session")
        .expect("Session cookie should be set")
        .clone()
        .into_owned()
}

async fn error_of(response: rocket::local::asynchronous::LocalResponse<'_>) -> String {
    let body: serde_json::Value = response.into_json().await.expect("error body");
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_list_buildings_by_site() {
    let client = Client::untracked(test_rocket()).await.unwrap();
    let cookie = login(&client, "user12", "Password1!").await;

    let response = client.get("/api/building").cookie(cookie.clone()).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let all: Vec<BuildingWithSite> = response.into_json().await.unwrap();
    assert_eq!(all.len(), 3);

    let taradale = all.iter().find(|b| b.site_name == "EIT Taradale").unwrap().site_id;
    let response = client
        .get(format!("/api/building?siteId={}", taradale))
        .cookie(cookie)
        .dispatch()
        .await;
    let buildings: Vec<BuildingWithSite> = response.into_json().await.unwrap();
    let codes: Vec<&str> = buildings.iter().map(|b| b.code.as_str()).collect();
    assert_eq!(codes, vec!["A", "B"]);
}

#[tokio::test]
async fn test_building_lifecycle() {
    let client = Client::untracked(test_rocket()).await.unwrap();
    time_test!("test_building_lifecycle");
    let cookie = login(&client, "admin1", "admin").await;

    let response = client
        .post("/api/building")
        .cookie(cookie.clone())
        .json(&json!({ "site_id": 1, "building_code": " C " }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let location = response.headers().get_one("Location").unwrap().to_string();
    let building: Building = response.into_json().await.unwrap();
    assert_eq!(building.code, "C");
    assert_eq!(location, format!("/api/building/{}", building.id));

    // Codes are unique per site, not globally
    let response = client
        .post("/api/building")
        .cookie(cookie.clone())
        .json(&json!({ "site_id": 1, "building_code": "A" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    assert_eq!(error_of(response).await, "Building code already exists for this site");

    let response = client
        .post("/api/building")
        .cookie(cookie.clone())
        .json(&json!({ "site_id": 2, "building_code": "A" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);

    let response = client
        .put(format!("/api/building/{}", building.id))
        .cookie(cookie.clone())
        .json(&json!({ "building_code": "B" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client
        .put(format!("/api/building/{}", building.id))
        .cookie(cookie.clone())
        .json(&json!({ "building_code": "Annex" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let renamed: Building = response.into_json().await.unwrap();
    assert_eq!(renamed.code, "Annex");
    assert_eq!(renamed.site_id, 1);

    let response = client
        .delete(format!("/api/building/{}", building.id))
        .cookie(cookie.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client
        .delete(format!("/api/building/{}", building.id))
        .cookie(cookie)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn test_building_rejections() {
    let client = Client::untracked(test_rocket()).await.unwrap();
    let cookie = login(&client, "admin1", "admin").await;

    let response = client
        .post("/api/building")
        .cookie(cookie.clone())
        .json(&json!({ "site_id": 1, "building_code": "   " }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "Building code is required");

    let response = client
        .post("/api/building")
        .cookie(cookie.clone())
        .json(&json!({ "site_id": 9999, "building_code": "Z" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(error_of(response).await, "Site not found");

    let response = client
        .put("/api/building/9999")
        .cookie(cookie.clone())
        .json(&json!({ "building_code": "Z" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    // Building A still has room A1
    let response = client.get("/api/building?siteId=1").cookie(cookie.clone()).dispatch().await;
    let buildings: Vec<BuildingWithSite> = response.into_json().await.unwrap();
    let a = buildings.iter().find(|b| b.code == "A").unwrap();
    let response = client
        .delete(format!("/api/building/{}", a.id))
        .cookie(cookie)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    assert_eq!(error_of(response).await, "Cannot delete building with associated rooms");
}

#[tokio::test]
async fn test_room_lifecycle() {
    let client = Client::untracked(test_rocket()).await.unwrap();
    time_test!("test_room_lifecycle");
    let cookie = login(&client, "admin1", "admin").await;

    let response = client.get("/api/room").cookie(cookie.clone()).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let rooms: Vec<RoomWithLocation> = response.into_json().await.unwrap();
    assert_eq!(rooms.len(), 3);
    let a1 = rooms.iter().find(|r| r.code == "A1").unwrap();
    assert_eq!(a1.building_code, "A");
    assert_eq!(a1.site_name, "EIT Taradale");

    let response = client
        .get(format!("/api/room?buildingId={}", a1.building_id))
        .cookie(cookie.clone())
        .dispatch()
        .await;
    let in_a: Vec<RoomWithLocation> = response.into_json().await.unwrap();
    assert_eq!(in_a.len(), 1);

    let response = client
        .post("/api/room")
        .cookie(cookie.clone())
        .json(&json!({ "building_id": a1.building_id, "room_code": "A2" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let room: Room = response.into_json().await.unwrap();
    assert_eq!(room.code, "A2");

    let response = client
        .post("/api/room")
        .cookie(cookie.clone())
        .json(&json!({ "building_id": a1.building_id, "room_code": "A1" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    assert_eq!(error_of(response).await, "Room code already exists for this building");

    let response = client
        .post("/api/room")
        .cookie(cookie.clone())
        .json(&json!({ "building_id": 9999, "room_code": "X1" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(error_of(response).await, "Building not found");

    let response = client
        .put(format!("/api/room/{}", room.id))
        .cookie(cookie.clone())
        .json(&json!({ "room_code": "A2-North" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let renamed: Room = response.into_json().await.unwrap();
    assert_eq!(renamed.code, "A2-North");

    // A1 holds devices
    let response = client
        .delete(format!("/api/room/{}", a1.id))
        .cookie(cookie.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    assert_eq!(error_of(response).await, "Cannot delete room with associated devices");

    let response = client
        .delete(format!("/api/room/{}", room.id))
        .cookie(cookie.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client.delete("/api/room/9999").cookie(cookie).dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(error_of(response).await, "Room not found");
}

#[tokio::test]
async fn test_device_type_lifecycle() {
    let client = Client::untracked(test_rocket()).await.unwrap();
    time_test!("test_device_type_lifecycle");
    let cookie = login(&client, "admin1", "admin").await;

    let response = client.get("/api/emergency-device-type").cookie(cookie.clone()).dispatch().await;
    let types: Vec<DeviceType> = response.into_json().await.unwrap();
    let extinguisher = types.iter().find(|t| t.name == "Fire Extinguisher").unwrap().clone();

    let response = client
        .post("/api/emergency-device-type")
        .cookie(cookie.clone())
        .json(&json!({ "name": "Fire Blanket" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let blanket: DeviceType = response.into_json().await.unwrap();

    let response = client
        .post("/api/emergency-device-type")
        .cookie(cookie.clone())
        .json(&json!({ "name": "Fire Blanket" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    assert_eq!(error_of(response).await, "Device type already exists");

    let response = client
        .post("/api/emergency-device-type")
        .cookie(cookie.clone())
        .json(&json!({ "name": "" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(error_of(response).await, "Device type name is required");

    let response = client
        .put(format!("/api/emergency-device-type/{}", blanket.id))
        .cookie(cookie.clone())
        .json(&json!({ "name": "Fire Extinguisher" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client
        .put(format!("/api/emergency-device-type/{}", blanket.id))
        .cookie(cookie.clone())
        .json(&json!({ "name": "Smoke Alarm" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let renamed: DeviceType = response.into_json().await.unwrap();
    assert_eq!(renamed.name, "Smoke Alarm");

    let response = client
        .delete(format!("/api/emergency-device-type/{}", extinguisher.id))
        .cookie(cookie.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    assert_eq!(error_of(response).await, "Cannot delete device type with associated devices");

    let response = client
        .delete(format!("/api/emergency-device-type/{}", blanket.id))
        .cookie(cookie.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client
        .put(format!("/api/emergency-device-type/{}", blanket.id))
        .cookie(cookie)
        .json(&json!({ "name": "Anything" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    assert_eq!(error_of(response).await, "Device type not found");
}

#[tokio::test]
async fn test_list_extinguisher_types() {
    let client = Client::untracked(test_rocket()).await.unwrap();
    let cookie = login(&client, "user12", "Password1!").await;

    let response = client.get("/api/extinguisher-type").cookie(cookie).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let types: Vec<ExtinguisherType> = response.into_json().await.unwrap();
    let mut names: Vec<String> = types.into_iter().map(|t| t.name).collect();
    names.sort();
    assert_eq!(names, vec!["CO2", "Dry", "Water"]);

    let response = client.get("/api/extinguisher-type").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}
