pub mod building;
pub mod device;
pub mod device_type;
pub mod extinguisher_type;
pub mod inspection;
pub mod login;
pub mod response;
pub mod room;
pub mod site;
pub mod status;
pub mod user;

use rocket::Route;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(building::routes());
    routes.extend(device::routes());
    routes.extend(device_type::routes());
    routes.extend(extinguisher_type::routes());
    routes.extend(inspection::routes());
    routes.extend(login::routes());
    routes.extend(room::routes());
    routes.extend(site::routes());
    routes.extend(status::routes());
    routes.extend(user::routes());
    routes
}
