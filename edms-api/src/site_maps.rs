//! On-disk store for uploaded site map images.
//!
//! Images live in `<static dir>/site_maps/` and are named after the site
//! they belong to. The database stores the public path
//! (`/static/site_maps/<file>`), which is what [`SiteMapStore`] accepts back.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const SITE_MAPS_DIR: &str = "site_maps";
pub const PUBLIC_PREFIX: &str = "/static/site_maps/";
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".svg"];

#[derive(Error, Debug)]
pub enum SiteMapError {
    #[error("Invalid file type. Allowed types: jpg, jpeg, png, gif, svg")]
    InvalidFileType,
    #[error("stored map path is outside the site map directory: {0}")]
    ForeignPath(String),
    #[error("site map file operation failed: {0}")]
    Io(#[from] io::Error),
}

/// Reduces a site name to a file stem: spaces become underscores and
/// anything outside `[A-Za-z0-9_-]` is dropped.
pub fn sanitize_site_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Lowercased extension (with the dot) of an uploaded file name, if it is
/// one of the accepted image types.
pub fn allowed_extension(file_name: &str) -> Result<String, SiteMapError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .ok_or(SiteMapError::InvalidFileType)?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(SiteMapError::InvalidFileType)
    }
}

/// Extension (with the dot) of a stored public path.
pub fn stored_extension(public_path: &str) -> String {
    Path::new(public_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct SiteMapStore {
    dir: PathBuf,
}

impl SiteMapStore {
    pub fn new(static_dir: &Path) -> Self {
        SiteMapStore { dir: static_dir.join(SITE_MAPS_DIR) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), SiteMapError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// File name for a site's map. Attempt 0 is the sanitized site name;
    /// later attempts append `_2`, `_3`, ... so two names that sanitize
    /// alike ("North Campus", "North_Campus") get separate files.
    pub fn file_name(site_name: &str, ext: &str, attempt: u32) -> String {
        let stem = sanitize_site_name(site_name);
        if attempt == 0 {
            format!("{}{}", stem, ext)
        } else {
            format!("{}_{}{}", stem, attempt + 1, ext)
        }
    }

    pub fn public_path(file_name: &str) -> String {
        format!("{}{}", PUBLIC_PREFIX, file_name)
    }

    pub fn disk_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Resolves a stored public path to a file in the store. Paths that do
    /// not name a plain file directly inside the store are refused.
    pub fn resolve(&self, public_path: &str) -> Result<PathBuf, SiteMapError> {
        let file_name = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .filter(|f| !f.is_empty() && !f.contains('/') && !f.contains('\\') && *f != ".." && *f != ".")
            .ok_or_else(|| SiteMapError::ForeignPath(public_path.to_string()))?;
        Ok(self.disk_path(file_name))
    }

    /// Deletes a stored map. A file that is already gone is not an error.
    pub fn remove(&self, public_path: &str) -> Result<(), SiteMapError> {
        let path = self.resolve(public_path)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Site map {} was already missing", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Renames a stored map to `new_file`, which the caller has checked is
    /// not another site's map. Returns the new public path. A map whose
    /// file is already gone only gets the new path.
    pub fn rename_to(&self, public_path: &str, new_file: &str) -> Result<String, SiteMapError> {
        let from = self.resolve(public_path)?;
        let new_public = Self::public_path(new_file);
        if new_public == public_path {
            return Ok(new_public);
        }
        if !from.exists() {
            warn!("Site map {} is missing; recording the new name only", from.display());
            return Ok(new_public);
        }
        std::fs::rename(&from, self.disk_path(new_file))?;
        Ok(new_public)
    }

    /// Undoes [`rename_to`](Self::rename_to) after a failed
    /// database update. Failures are logged, not returned.
    pub fn revert_rename(&self, renamed_public: &str, original_public: &str) {
        if renamed_public == original_public {
            return;
        }
        let result = self
            .resolve(renamed_public)
            .and_then(|from| Ok((from, self.resolve(original_public)?)))
            .and_then(|(from, to)| std::fs::rename(from, to).map_err(SiteMapError::from));
        if let Err(e) = result {
            error!("Could not restore site map {}: {}", original_public, e);
        }
    }

    /// Removes a freshly written map after a failed database update.
    /// Failures are logged, not returned.
    pub fn discard(&self, public_path: &str) {
        if let Err(e) = self.remove(public_path) {
            error!("Could not remove orphaned site map {}: {}", public_path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (SiteMapStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("edms_site_maps_{}", uuid::Uuid::new_v4()));
        let store = SiteMapStore::new(&root);
        store.ensure_dir().unwrap();
        (store, root)
    }

    #[test]
    fn test_sanitize_site_name() {
        assert_eq!(sanitize_site_name("EIT Hastings"), "EIT_Hastings");
        assert_eq!(sanitize_site_name("North-Campus_2"), "North-Campus_2");
        assert_eq!(sanitize_site_name("a/../b c!"), "ab_c");
    }

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("map.PNG").unwrap(), ".png");
        assert_eq!(allowed_extension("floor.plan.jpeg").unwrap(), ".jpeg");
        assert_eq!(allowed_extension("vector.svg").unwrap(), ".svg");
        assert!(matches!(allowed_extension("notes.txt"), Err(SiteMapError::InvalidFileType)));
        assert!(matches!(allowed_extension("noext"), Err(SiteMapError::InvalidFileType)));
    }

    #[test]
    fn test_paths() {
        let store = SiteMapStore::new(Path::new("static"));
        let file = SiteMapStore::file_name("EIT Hastings", ".png", 0);
        assert_eq!(file, "EIT_Hastings.png");
        assert_eq!(SiteMapStore::file_name("EIT Hastings", ".png", 1), "EIT_Hastings_2.png");
        assert_eq!(stored_extension("/static/site_maps/EIT_Hastings.svg"), ".svg");
        assert_eq!(SiteMapStore::public_path(&file), "/static/site_maps/EIT_Hastings.png");
        assert_eq!(
            store.resolve("/static/site_maps/EIT_Hastings.png").unwrap(),
            Path::new("static").join("site_maps").join("EIT_Hastings.png")
        );
    }

    #[test]
    fn test_resolve_refuses_foreign_paths() {
        let store = SiteMapStore::new(Path::new("static"));
        for bad in ["/etc/passwd", "/static/site_maps/../secret", "/static/site_maps/", "/static/site_maps/.."] {
            assert!(matches!(store.resolve(bad), Err(SiteMapError::ForeignPath(_))), "{}", bad);
        }
    }

    #[test]
    fn test_rename_and_revert() {
        let (store, root) = temp_store();
        std::fs::write(store.disk_path("Old_Name.png"), b"png").unwrap();

        let renamed = store.rename_to("/static/site_maps/Old_Name.png", "New_Name.png").unwrap();
        assert_eq!(renamed, "/static/site_maps/New_Name.png");
        assert!(store.disk_path("New_Name.png").exists());
        assert!(!store.disk_path("Old_Name.png").exists());

        store.revert_rename(&renamed, "/static/site_maps/Old_Name.png");
        assert!(store.disk_path("Old_Name.png").exists());
        assert!(!store.disk_path("New_Name.png").exists());

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_rename_of_missing_file_only_moves_path() {
        let (store, root) = temp_store();
        let renamed = store.rename_to("/static/site_maps/Ghost.svg", "Ghost_Town.svg").unwrap();
        assert_eq!(renamed, "/static/site_maps/Ghost_Town.svg");
        assert!(!store.disk_path("Ghost_Town.svg").exists());
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_remove_tolerates_missing_file() {
        let (store, root) = temp_store();
        std::fs::write(store.disk_path("Gone.gif"), b"gif").unwrap();

        store.remove("/static/site_maps/Gone.gif").unwrap();
        assert!(!store.disk_path("Gone.gif").exists());
        store.remove("/static/site_maps/Gone.gif").unwrap();

        std::fs::remove_dir_all(root).unwrap();
    }
}
