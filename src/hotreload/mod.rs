//! Hot reload of the encounter tuning file.
//!
//! A [`ConfigWatcher`] watches the tuning file's directory through `notify`
//! and hands back each newly validated [`EncounterConfig`] from [`poll`].
//! Invalid files are rejected and the previous config stays current. The host
//! applies a reloaded config with `Encounter::apply_config`, so it takes effect
//! at the next restart.
//!
//! [`poll`]: ConfigWatcher::poll

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Mutex;
use thiserror::Error;

use crate::encounter::config::{ConfigError, EncounterConfig};

#[derive(Debug, Error)]
pub enum HotReloadError {
    #[error("initial tuning could not be loaded")]
    Config(#[from] ConfigError),

    #[error("failed to watch {path}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Reload bookkeeping
#[derive(Debug, Clone, Default)]
pub struct HotReloadState {
    pub enabled: bool,
    pub watched_file: Option<PathBuf>,
    pub reload_count: u32,
    pub rejected_count: u32,
    pub last_reload_success: bool,
    pub last_error: Option<String>,
}

/// Watches one tuning file.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    receiver: Mutex<Receiver<notify::Result<Event>>>,
    state: HotReloadState,
    current: EncounterConfig,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("state", &self.state)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl ConfigWatcher {
    /// Load `path` once and start watching its directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, HotReloadError> {
        let path = path.into();
        let current = EncounterConfig::load(&path)?;

        let (tx, rx) = channel();
        let watch_err = |source| HotReloadError::Watch {
            path: path.clone(),
            source,
        };
        let mut watcher = notify::recommended_watcher(tx).map_err(watch_err)?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_err)?;

        tracing::info!(target: "arena_core::hotreload", path = %path.display(), "watching tuning file");
        Ok(Self {
            _watcher: watcher,
            receiver: Mutex::new(rx),
            state: HotReloadState {
                enabled: true,
                watched_file: Some(path),
                ..HotReloadState::default()
            },
            current,
        })
    }

    /// Drain pending filesystem events; returns the newest config that
    /// loaded and validated, if any.
    pub fn poll(&mut self) -> Option<EncounterConfig> {
        let pending: Vec<_> = match self.receiver.get_mut() {
            Ok(rx) => rx.try_iter().collect(),
            Err(_) => return None,
        };
        let mut reloaded = None;
        for result in pending {
            if let Some(config) = self.process(result) {
                reloaded = Some(config);
            }
        }
        reloaded
    }

    /// Handle one watcher message.
    pub fn process(&mut self, result: notify::Result<Event>) -> Option<EncounterConfig> {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(target: "arena_core::hotreload", "file watcher error: {e}");
                return None;
            }
        };
        let path = self.state.watched_file.clone()?;
        if !is_config_modify_event(&event, &path) {
            return None;
        }
        reload_config(&path, &mut self.state).map(|config| {
            self.current = config.clone();
            config
        })
    }

    pub fn current(&self) -> &EncounterConfig {
        &self.current
    }

    pub fn state(&self) -> &HotReloadState {
        &self.state
    }

    pub fn status(&self) -> HotReloadStatus {
        HotReloadStatus::from_state(&self.state)
    }
}

/// Whether `event` creates or modifies the watched file.
pub fn is_config_modify_event(event: &Event, watched: &Path) -> bool {
    let Some(name) = watched.file_name() else {
        return false;
    };
    let relevant = event.kind.is_modify() || matches!(event.kind, EventKind::Create(_));
    relevant && event.paths.iter().any(|p| p.file_name() == Some(name))
}

/// Load and validate `path`, recording the result in `state`.
pub fn reload_config(path: &Path, state: &mut HotReloadState) -> Option<EncounterConfig> {
    match EncounterConfig::load(path) {
        Ok(config) => {
            state.reload_count += 1;
            state.last_reload_success = true;
            state.last_error = None;
            tracing::info!(
                target: "arena_core::hotreload",
                count = state.reload_count,
                seed = config.seed,
                "tuning reloaded"
            );
            Some(config)
        }
        Err(e) => {
            state.rejected_count += 1;
            state.last_reload_success = false;
            state.last_error = Some(e.to_string());
            tracing::warn!(target: "arena_core::hotreload", "tuning rejected, keeping previous: {e}");
            None
        }
    }
}

/// Reload status for hosts
#[derive(Debug, Serialize, Deserialize)]
pub struct HotReloadStatus {
    pub enabled: bool,
    pub watched_file: Option<String>,
    pub reload_count: u32,
    pub rejected_count: u32,
    pub last_reload_success: bool,
    pub last_error: Option<String>,
}

impl HotReloadStatus {
    pub fn from_state(state: &HotReloadState) -> Self {
        Self {
            enabled: state.enabled,
            watched_file: state.watched_file.as_ref().map(|p| p.display().to_string()),
            reload_count: state.reload_count,
            rejected_count: state.rejected_count,
            last_reload_success: state.last_reload_success,
            last_error: state.last_error.clone(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind};

    fn modify_event(path: &Path) -> Event {
        Event {
            kind: EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            paths: vec![path.to_path_buf()],
            attrs: Default::default(),
        }
    }

    fn write_tuning(path: &Path, body: &str) {
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn test_is_config_modify_event() {
        let watched = PathBuf::from("config/tuning.ron");
        assert!(is_config_modify_event(&modify_event(&watched), &watched));

        let create = Event {
            kind: EventKind::Create(CreateKind::File),
            paths: vec![PathBuf::from("/abs/config/tuning.ron")],
            attrs: Default::default(),
        };
        assert!(is_config_modify_event(&create, &watched));

        let other = modify_event(Path::new("config/other.ron"));
        assert!(!is_config_modify_event(&other, &watched));

        let removed = Event {
            kind: EventKind::Remove(notify::event::RemoveKind::File),
            paths: vec![watched.clone()],
            attrs: Default::default(),
        };
        assert!(!is_config_modify_event(&removed, &watched));
    }

    #[test]
    fn test_reload_valid_then_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuning.ron");
        write_tuning(&path, "(seed: 1)");

        let mut watcher = ConfigWatcher::new(&path).unwrap();
        assert_eq!(watcher.current().seed, 1);

        write_tuning(&path, "(seed: 2, player: (max_health: 3))");
        let config = watcher.process(Ok(modify_event(&path))).unwrap();
        assert_eq!(config.seed, 2);
        assert_eq!(config.player.max_health, 3);
        assert_eq!(watcher.state().reload_count, 1);

        write_tuning(&path, "(player: (max_health: 0))");
        assert!(watcher.process(Ok(modify_event(&path))).is_none());
        assert_eq!(watcher.current().seed, 2);
        assert!(!watcher.state().last_reload_success);
        assert_eq!(watcher.state().rejected_count, 1);
    }

    #[test]
    fn test_initial_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ron");
        assert!(matches!(
            ConfigWatcher::new(&path),
            Err(HotReloadError::Config(ConfigError::Io { .. }))
        ));
    }

    #[test]
    fn test_status_json() {
        let state = HotReloadState {
            enabled: true,
            watched_file: Some(PathBuf::from("config/tuning.ron")),
            reload_count: 3,
            rejected_count: 1,
            last_reload_success: false,
            last_error: Some("invalid configuration".into()),
        };
        let json = HotReloadStatus::from_state(&state).to_json();
        assert!(json.contains("\"reload_count\":3"));
        let restored = HotReloadStatus::from_json(&json).unwrap();
        assert_eq!(restored.rejected_count, 1);
        assert_eq!(restored.watched_file.as_deref(), Some("config/tuning.ron"));
    }
}
