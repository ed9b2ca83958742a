//! Hot-reload bookkeeping for shader and texture files.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::config::AssetReload;

#[derive(Debug)]
struct Watched {
    path: PathBuf,
    /// `None` while the file is missing or its mtime is unavailable.
    modified: Option<SystemTime>,
}

/// Decides when assets should be rebuilt from disk.
#[derive(Debug)]
pub struct ReloadTracker {
    files: Vec<Watched>,
    primed: bool,
}

impl ReloadTracker {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let files = paths
            .into_iter()
            .map(|path| Watched { modified: mtime(&path), path })
            .collect();
        Self { files, primed: false }
    }

    /// True on the first call, then according to `policy`.
    pub fn should_reload(&mut self, policy: AssetReload) -> bool {
        if !self.primed {
            self.primed = true;
            self.refresh();
            return true;
        }

        match policy {
            AssetReload::Once => false,
            AssetReload::EveryFrame => true,
            AssetReload::OnChange => self.refresh(),
        }
    }

    /// Re-reads every mtime; returns whether any changed.
    fn refresh(&mut self) -> bool {
        let mut changed = false;
        for file in &mut self.files {
            let now = mtime(&file.path);
            if now != file.modified {
                log::info!("{} changed on disk", file.path.display());
                file.modified = now;
                changed = true;
            }
        }
        changed
    }
}

fn mtime(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn scratch_file(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("prism-assets-{tag}-{}.wgsl", std::process::id()));
        std::fs::write(&path, "// v1").unwrap();
        set_mtime(&path, 1_000);
        path
    }

    fn set_mtime(path: &std::path::Path, secs: u64) {
        let f = File::options().write(true).open(path).unwrap();
        f.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    #[test]
    fn first_call_always_reloads() {
        for policy in [AssetReload::Once, AssetReload::EveryFrame, AssetReload::OnChange] {
            let mut tracker = ReloadTracker::new(Vec::<PathBuf>::new());
            assert!(tracker.should_reload(policy));
        }
    }

    #[test]
    fn once_never_reloads_again() {
        let path = scratch_file("once");
        let mut tracker = ReloadTracker::new([path.clone()]);
        assert!(tracker.should_reload(AssetReload::Once));
        set_mtime(&path, 2_000);
        assert!(!tracker.should_reload(AssetReload::Once));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn every_frame_always_reloads() {
        let mut tracker = ReloadTracker::new(Vec::<PathBuf>::new());
        tracker.should_reload(AssetReload::EveryFrame);
        assert!(tracker.should_reload(AssetReload::EveryFrame));
        assert!(tracker.should_reload(AssetReload::EveryFrame));
    }

    #[test]
    fn on_change_fires_once_per_modification() {
        let path = scratch_file("change");
        let mut tracker = ReloadTracker::new([path.clone()]);
        assert!(tracker.should_reload(AssetReload::OnChange));
        assert!(!tracker.should_reload(AssetReload::OnChange));

        set_mtime(&path, 2_000);
        assert!(tracker.should_reload(AssetReload::OnChange));
        assert!(!tracker.should_reload(AssetReload::OnChange));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn deleted_and_recreated_files_count_as_changes() {
        let path = scratch_file("delete");
        let mut tracker = ReloadTracker::new([path.clone()]);
        tracker.should_reload(AssetReload::OnChange);

        std::fs::remove_file(&path).unwrap();
        assert!(tracker.should_reload(AssetReload::OnChange));
        assert!(!tracker.should_reload(AssetReload::OnChange));

        std::fs::write(&path, "// v2").unwrap();
        assert!(tracker.should_reload(AssetReload::OnChange));
        std::fs::remove_file(&path).unwrap();
    }
}
