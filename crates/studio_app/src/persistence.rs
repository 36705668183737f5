//! Access-key storage that survives between runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use studio_engine::AtomicFileWriter;
use studio_logging::{studio_error, studio_info, studio_warn};

const STATE_FILENAME: &str = ".tool_studio_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    access_key: Option<String>,
}

pub fn load_access_key(state_dir: &Path) -> Option<String> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            studio_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            studio_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    state.access_key.filter(|key| !key.trim().is_empty())
}

pub fn save_access_key(state_dir: &Path, access_key: &str) {
    let state = PersistedState {
        access_key: Some(access_key.to_string()),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            studio_error!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(state_dir.to_path_buf());
    match writer.write(STATE_FILENAME, content.as_bytes()) {
        Ok(path) => studio_info!("Stored access key in {:?}", path),
        Err(err) => studio_error!("Failed to write persisted state to {:?}: {}", state_dir, err),
    }
}

/// A key from the page wins and is stored; otherwise the stored key is reused.
pub fn resolve_access_key(state_dir: &Path, from_page: Option<&str>) -> Option<String> {
    match from_page.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) => {
            save_access_key(state_dir, key);
            Some(key.to_string())
        }
        None => load_access_key(state_dir),
    }
}
