use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use super::settings::{AnnotatorSettings, SettingsHandle};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Polls a JSON settings file and pushes changes into a [`SettingsHandle`].
///
/// A reload happens whenever the file's modification time changes. Files that
/// fail to parse are logged and skipped, so the last good values stay live.
/// The polling thread stops when the watcher is dropped.
pub struct SettingsWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SettingsWatcher {
    pub fn spawn(path: PathBuf, settings: SettingsHandle) -> Self {
        Self::with_interval(path, settings, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(path: PathBuf, settings: SettingsHandle, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let mut last_seen = modified_time(&path);

        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                thread::sleep(interval);
                let current = modified_time(&path);
                if current.is_none() || current == last_seen {
                    continue;
                }
                last_seen = current;
                reload(&path, &settings);
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SettingsWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn reload(path: &Path, settings: &SettingsHandle) {
    match AnnotatorSettings::load(path) {
        Ok(loaded) => {
            log::info!(
                "Settings reloaded: blur {:.2}, enhance {}",
                loaded.blur_amount,
                loaded.enhance_details
            );
            settings.update(loaded);
        }
        Err(e) => log::warn!("Ignoring settings change: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Instant;

    const FAST: Duration = Duration::from_millis(10);

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(FAST);
        }
        false
    }

    /// Rewrites the file until its mtime differs from `before`; coarse
    /// filesystem timestamps can otherwise hide a quick second write.
    fn rewrite(path: &Path, settings: &AnnotatorSettings) {
        let before = modified_time(path);
        loop {
            settings.save(path).unwrap();
            if modified_time(path) != before {
                return;
            }
            thread::sleep(FAST);
        }
    }

    #[test]
    fn test_file_change_updates_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        AnnotatorSettings::new(0.5, false).save(&path).unwrap();

        let handle = SettingsHandle::new(AnnotatorSettings::new(0.5, false));
        let _watcher = SettingsWatcher::with_interval(path.clone(), handle.clone(), FAST);

        rewrite(&path, &AnnotatorSettings::new(2.5, true));

        assert!(wait_for(|| handle.snapshot().enhance_details));
        assert_relative_eq!(handle.snapshot().blur_amount, 2.5);
    }

    #[test]
    fn test_invalid_file_keeps_last_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        AnnotatorSettings::new(1.0, false).save(&path).unwrap();

        let handle = SettingsHandle::new(AnnotatorSettings::new(1.5, true));
        let _watcher = SettingsWatcher::with_interval(path.clone(), handle.clone(), FAST);

        let before = modified_time(&path);
        while modified_time(&path) == before {
            fs::write(&path, "{ not json").unwrap();
            thread::sleep(FAST);
        }
        thread::sleep(FAST * 5);

        assert_eq!(handle.snapshot(), AnnotatorSettings::new(1.5, true));
    }

    #[test]
    fn test_missing_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let handle = SettingsHandle::new(AnnotatorSettings::default());
        let mut watcher =
            SettingsWatcher::with_interval(dir.path().join("absent.json"), handle.clone(), FAST);
        thread::sleep(FAST * 3);
        watcher.stop();
        assert_eq!(handle.snapshot(), AnnotatorSettings::default());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = SettingsWatcher::with_interval(
            dir.path().join("settings.json"),
            SettingsHandle::default(),
            FAST,
        );
        watcher.stop();
        watcher.stop();
        assert!(watcher.handle.is_none());
    }
}
