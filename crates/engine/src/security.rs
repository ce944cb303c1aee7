use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub fn ensure_owner_only_file(path: &Path) -> Result<()> {
    set_mode_if_needed(path, 0o600)
}

pub fn ensure_owner_only_dir(path: &Path) -> Result<()> {
    set_mode_if_needed(path, 0o700)
}

/// Create `path` (and parents) and restrict it to the owner.
pub fn create_private_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory `{}`", path.display()))?;
    ensure_owner_only_dir(path)
}

#[cfg(unix)]
fn set_mode_if_needed(path: &Path, wanted: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if !path.exists() {
        return Ok(());
    }

    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to read metadata for `{}`", path.display()))?;
    let mode = metadata.permissions().mode() & 0o777;
    if mode != wanted {
        fs::set_permissions(path, fs::Permissions::from_mode(wanted))
            .with_context(|| format!("failed to set owner-only mode on `{}`", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode_if_needed(path: &Path, _wanted: u32) -> Result<()> {
    let _ = path;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn mode(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn tightens_file_and_dir_modes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("polysync.db");
        fs::write(&file, b"x").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

        ensure_owner_only_file(&file).unwrap();
        ensure_owner_only_dir(dir.path()).unwrap();
        assert_eq!(mode(&file), 0o600);
        assert_eq!(mode(dir.path()), 0o700);
    }

    #[test]
    fn missing_paths_are_ignored() {
        let dir = TempDir::new().unwrap();
        ensure_owner_only_file(&dir.path().join("absent")).unwrap();
    }

    #[test]
    fn create_private_dir_makes_parents() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        create_private_dir(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(mode(&nested), 0o700);
    }
}
