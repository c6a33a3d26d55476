//! Static asset loading
//!
//! Images and other files shipped next to the data are resolved relative to
//! an asset root. Paths that would leave the root are refused.

use std::fs;
use std::path::{Component, Path, PathBuf};
use log::debug;

use crate::error::{Result, StoreError};

/// Resolve `relative` under `root` without leaving it
pub fn resolve_asset(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || relative.as_os_str().is_empty() {
        return Err(StoreError::AssetNotFound(format!(
            "{} is not a path inside {}",
            relative.display(),
            root.display()
        )));
    }
    Ok(root.join(relative))
}

/// Read an asset's bytes
pub fn load_asset(root: &Path, relative: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = resolve_asset(root, relative)?;
    if !path.is_file() {
        return Err(StoreError::AssetNotFound(path.display().to_string()));
    }
    let bytes = fs::read(&path)?;
    debug!("Loaded asset {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}
