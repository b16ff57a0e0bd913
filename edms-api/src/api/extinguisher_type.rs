//! Extinguisher types are reference data; the API only lists them.

use rocket::Route;
use rocket::serde::json::Json;

use crate::api::response::{ApiError, internal_error};
use crate::models::ExtinguisherType;
use crate::orm::DbConn;
use crate::orm::extinguisher_type::get_all_extinguisher_types;
use crate::session_guards::AuthenticatedUser;

#[get("/extinguisher-type")]
pub async fn list_extinguisher_types(
    db: DbConn,
    _auth: AuthenticatedUser,
) -> Result<Json<Vec<ExtinguisherType>>, ApiError> {
    db.run(get_all_extinguisher_types)
        .await
        .map(Json)
        .map_err(|e| internal_error("Error fetching extinguisher types", e))
}

pub fn routes() -> Vec<Route> {
    routes![list_extinguisher_types]
}
