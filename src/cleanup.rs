use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 86_400;

/// Remove uploaded screenshots older than the retention window.
///
/// Runs best-effort before each extraction to keep user uploads from
/// lingering on disk. Every failure is logged and swallowed; the sweep
/// never affects the request that triggered it.
pub fn delete_old_uploads(directory: &Path, retention_days: u64) {
    let Some(cutoff) =
        SystemTime::now().checked_sub(Duration::from_secs(retention_days * SECONDS_PER_DAY))
    else {
        log::warn!("Retention window of {retention_days} days is out of range, skipping sweep");
        return;
    };
    sweep_older_than(directory, cutoff);
}

fn sweep_older_than(directory: &Path, cutoff: SystemTime) {
    if !directory.exists() {
        log::debug!("Upload directory not found: {}", directory.display());
        return;
    }

    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Upload sweep failed to read {}: {e}", directory.display());
            return;
        }
    };

    let mut deleted = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if modified < cutoff {
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("Removed stale upload: {}", path.display());
                    deleted += 1;
                }
                Err(e) => log::warn!("Failed to remove {}: {e}", path.display()),
            }
        }
    }

    if deleted > 0 {
        log::info!("Removed {deleted} stale uploads from {}", directory.display());
    } else {
        log::debug!("No old uploads to remove");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn test_missing_directory_is_a_noop() {
        delete_old_uploads(Path::new("/nonexistent/uploads"), 1);
    }

    #[test]
    fn test_fresh_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recent.png");
        File::create(&path).unwrap().write_all(b"img").unwrap();

        delete_old_uploads(dir.path(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_files_older_than_cutoff_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.png");
        File::create(&path).unwrap().write_all(b"img").unwrap();

        // A cutoff in the future makes the just-created file "old".
        let future = SystemTime::now() + Duration::from_secs(3600);
        sweep_older_than(dir.path(), future);
        assert!(!path.exists());
    }

    #[test]
    fn test_subdirectories_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("keep");
        fs::create_dir(&sub).unwrap();

        let future = SystemTime::now() + Duration::from_secs(3600);
        sweep_older_than(dir.path(), future);
        assert!(sub.exists());
    }
}
