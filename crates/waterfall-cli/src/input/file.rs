use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use waterfall_core::api::CalculateRequest;

/// Read a request file. `.yaml`/`.yml` files are parsed as YAML, anything
/// else as JSON.
pub fn read_request(path: &str) -> Result<CalculateRequest, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        read_yaml(&canonical)
    } else {
        read_json(&canonical)
    }
}

/// Read a JSON file and deserialise into a typed struct.
fn read_json<T: DeserializeOwned>(canonical: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a YAML file and deserialise into a typed struct.
fn read_yaml<T: DeserializeOwned>(canonical: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Resolve the path against the working directory and check it is a file.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
