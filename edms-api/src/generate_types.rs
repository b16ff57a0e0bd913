//! TypeScript type generation module.
//!
//! Exports TypeScript definitions for the structs annotated with
//! `#[ts(export)]`. Runs as a test so the bindings stay in step with the
//! API types.

#[cfg(test)]
mod tests {
    use std::{env, path::Path};

    use ts_rs::TS;

    #[test]
    fn generate_typescript_types() {
        // Output directory, in order of preference:
        // 1. EDMS_TS_OUTPUT_DIR
        // 2. ../../web/src/types/generated (if its parent exists)
        // 3. ../ts-bindings
        let output_dir_str = if let Ok(env_dir) = env::var("EDMS_TS_OUTPUT_DIR") {
            println!("Using TypeScript output directory from EDMS_TS_OUTPUT_DIR: {}", env_dir);
            env_dir
        } else {
            let web_dir = "../../web/src/types/generated";
            let fallback_dir = "../ts-bindings";

            if Path::new(web_dir).parent().unwrap_or(Path::new("")).exists() {
                println!("Using web project directory: {}", web_dir);
                web_dir.to_string()
            } else {
                println!("Using fallback directory: {}", fallback_dir);
                fallback_dir.to_string()
            }
        };

        let output_dir = Path::new(&output_dir_str);

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).expect("Failed to create output directory");
        }

        // Remove old .ts files so renamed or deleted types leave nothing behind
        println!("Cleaning old TypeScript files from {:?}", output_dir);
        for entry in std::fs::read_dir(output_dir).expect("Failed to read output directory") {
            let entry = entry.expect("Failed to read directory entry");
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                std::fs::remove_file(&path).unwrap_or_else(|_| panic!("Failed to remove {:?}", path));
            }
        }

        unsafe {
            env::set_var("TS_RS_EXPORT_DIR", output_dir);
        }

        use crate::{
            api::{
                building::{CreateBuildingRequest, UpdateBuildingRequest},
                device::StatusRequest,
                device_type::DeviceTypeRequest,
                inspection::{InspectionRecorded, InspectionRequest},
                login::LoginRequest,
                response::{ErrorResponse, RedirectResponse},
                room::{CreateRoomRequest, UpdateRoomRequest},
                status::HealthStatus,
                user::CreateUserRequest,
            },
            inspection_rules::InspectionOutcome,
            models::*,
        };

        // Models
        Site::export().expect("Failed to export Site type");
        Building::export().expect("Failed to export Building type");
        BuildingWithSite::export().expect("Failed to export BuildingWithSite type");
        Room::export().expect("Failed to export Room type");
        RoomWithLocation::export().expect("Failed to export RoomWithLocation type");
        DeviceType::export().expect("Failed to export DeviceType type");
        ExtinguisherType::export().expect("Failed to export ExtinguisherType type");
        Device::export().expect("Failed to export Device type");
        DeviceInput::export().expect("Failed to export DeviceInput type");
        DeviceDetail::export().expect("Failed to export DeviceDetail type");
        Inspection::export().expect("Failed to export Inspection type");
        InspectionChecklist::export().expect("Failed to export InspectionChecklist type");
        InspectionOutcome::export().expect("Failed to export InspectionOutcome type");
        Role::export().expect("Failed to export Role type");
        UserWithRoles::export().expect("Failed to export UserWithRoles type");

        // Shared responses
        ErrorResponse::export().expect("Failed to export ErrorResponse type");
        RedirectResponse::export().expect("Failed to export RedirectResponse type");
        HealthStatus::export().expect("Failed to export HealthStatus type");

        // Request bodies
        LoginRequest::export().expect("Failed to export LoginRequest type");
        StatusRequest::export().expect("Failed to export StatusRequest type");
        InspectionRequest::export().expect("Failed to export InspectionRequest type");
        InspectionRecorded::export().expect("Failed to export InspectionRecorded type");
        CreateBuildingRequest::export().expect("Failed to export CreateBuildingRequest type");
        UpdateBuildingRequest::export().expect("Failed to export UpdateBuildingRequest type");
        CreateRoomRequest::export().expect("Failed to export CreateRoomRequest type");
        UpdateRoomRequest::export().expect("Failed to export UpdateRoomRequest type");
        DeviceTypeRequest::export().expect("Failed to export DeviceTypeRequest type");
        CreateUserRequest::export().expect("Failed to export CreateUserRequest type");

        println!("TypeScript types generated successfully in {:?}", output_dir);
    }
}
