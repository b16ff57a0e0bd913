//! Application settings read from Rocket's figment.

use std::path::PathBuf;

use rocket::fairing::AdHoc;
use serde::Deserialize;

use crate::site_maps::SiteMapStore;

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Settings beyond Rocket's own. `static_dir` comes from the figment key
/// of the same name, which `rocket()` fills from `EDMS_STATIC_DIR`.
#[derive(Debug, Clone, Deserialize)]
pub struct EdmsConfig {
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl EdmsConfig {
    pub fn site_maps(&self) -> SiteMapStore {
        SiteMapStore::new(&self.static_dir)
    }
}

/// Extracts [`EdmsConfig`] into managed state and makes sure the site map
/// directory exists.
pub fn config_fairing() -> AdHoc {
    AdHoc::try_on_ignite("EDMS Config", |rocket| async {
        let config: EdmsConfig = match rocket.figment().extract() {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid EDMS configuration: {}", e);
                return Err(rocket);
            }
        };

        if let Err(e) = config.site_maps().ensure_dir() {
            error!("Could not create site map directory: {}", e);
            return Err(rocket);
        }
        info!("Static files served from {}", config.static_dir.display());

        Ok(rocket.manage(config))
    })
}
