pub mod building;
pub mod device;
pub mod device_type;
pub mod extinguisher_type;
pub mod inspection;
pub mod role;
pub mod room;
pub mod session;
pub mod site;
pub mod user;
pub mod user_role;

// Re-export models for easier access
pub use building::*;
pub use device::*;
pub use device_type::*;
pub use extinguisher_type::*;
pub use inspection::*;
pub use role::*;
pub use room::*;
pub use session::*;
pub use site::*;
pub use user::*;
pub use user_role::*;
