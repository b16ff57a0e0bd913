pub mod device_commands;
pub mod seed_commands;
pub mod site_commands;
pub mod user_commands;
pub mod utils;
