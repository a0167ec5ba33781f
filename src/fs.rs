//! Filesystem helpers.

use std::path::Path;

use eyre::Context;

/// Create `path` (and any missing parents) unless it already exists.
pub fn create_dir_if_not_exists<P: AsRef<Path>>(path: P) -> eyre::Result<()> {
    let path: &Path = path.as_ref();

    if !path.exists() {
        std::fs::create_dir_all(path)
            .wrap_err_with(|| format!("Error creating directory {:?}", path))?;
    }

    Ok(())
}

/// Write `contents` to `path`, creating its parent directory first.
pub async fn write_file<P: AsRef<Path>>(path: P, contents: impl AsRef<[u8]>) -> eyre::Result<()> {
    let path: &Path = path.as_ref();

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_if_not_exists(parent)?;
    }

    tokio::fs::write(path, contents)
        .await
        .wrap_err_with(|| format!("Error writing file {:?}", path))
}
