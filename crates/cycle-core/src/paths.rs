use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CYCLES_DIR: &str = ".cycles";
pub const CONFIG_FILE: &str = ".cycles/config.yaml";
pub const DEFAULT_DATABASE: &str = "cycles.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn cycles_dir(root: &Path) -> PathBuf {
    root.join(CYCLES_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Database files are resolved inside `.cycles/` unless given absolutely.
pub fn database_path(root: &Path, database: &str) -> PathBuf {
    let db = Path::new(database);
    if db.is_absolute() {
        db.to_path_buf()
    } else {
        cycles_dir(root).join(db)
    }
}
