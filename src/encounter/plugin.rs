//! Bevy host adapter.
//!
//! The encounter itself knows nothing about Bevy; this plugin owns it as a
//! resource, feeds it keyboard state and frame time, and republishes its
//! presentation events as Bevy events.

use bevy::prelude::*;
use std::path::PathBuf;

use super::config::{EncounterConfig, StageConfig};
use super::Encounter;
use crate::events::EncounterEvent;
use crate::hotreload::ConfigWatcher;
use crate::input::{KeyState, LogicalKey};
use crate::logging::LoggingPlugin;

pub struct EncounterPlugin {
    pub stage: StageConfig,
    pub config: EncounterConfig,
    /// Tuning file to watch for hot reload
    pub tuning_path: Option<PathBuf>,
}

impl Default for EncounterPlugin {
    fn default() -> Self {
        Self {
            stage: StageConfig::default(),
            config: EncounterConfig::default(),
            tuning_path: None,
        }
    }
}

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<LoggingPlugin>() {
            app.add_plugins(LoggingPlugin::default());
        }

        let mut config = self.config.clone();
        if let Some(path) = &self.tuning_path {
            match ConfigWatcher::new(path) {
                Ok(watcher) => {
                    config = watcher.current().clone();
                    app.insert_resource(TuningWatcher(watcher));
                }
                Err(e) => {
                    tracing::warn!(target: "arena_core::encounter", "hot reload disabled: {e}");
                }
            }
        }

        app.insert_resource(EncounterResource(Encounter::with_config(
            self.stage.clone(),
            config,
        )))
        .init_resource::<KeyBindings>()
        .add_event::<EncounterEvent>()
        .add_systems(Update, (poll_tuning, tick_encounter).chain());
    }
}

#[derive(Resource, Debug)]
pub struct EncounterResource(pub Encounter);

#[derive(Resource, Debug)]
pub struct TuningWatcher(pub ConfigWatcher);

/// Physical keys mapped onto each logical key
#[derive(Resource, Debug, Clone)]
pub struct KeyBindings {
    pub bindings: Vec<(LogicalKey, KeyCode)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            bindings: vec![
                (LogicalKey::Up, KeyCode::ArrowUp),
                (LogicalKey::Down, KeyCode::ArrowDown),
                (LogicalKey::Left, KeyCode::ArrowLeft),
                (LogicalKey::Right, KeyCode::ArrowRight),
                (LogicalKey::Dash, KeyCode::KeyX),
                (LogicalKey::Attack, KeyCode::KeyZ),
                (LogicalKey::Start, KeyCode::Enter),
                (LogicalKey::Supermove, KeyCode::KeyC),
            ],
        }
    }
}

impl KeyBindings {
    /// Logical key state from the held physical keys.
    pub fn resolve(&self, keyboard: &ButtonInput<KeyCode>) -> KeyState {
        let mut keys = KeyState::none();
        for &(key, code) in &self.bindings {
            if keyboard.pressed(code) {
                keys.set(key, true);
            }
        }
        keys
    }
}

fn tick_encounter(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    bindings: Res<KeyBindings>,
    time: Res<Time>,
    mut encounter: ResMut<EncounterResource>,
    mut events: EventWriter<EncounterEvent>,
) {
    let keys = keyboard
        .map(|k| bindings.resolve(&k))
        .unwrap_or_else(KeyState::none);
    encounter.0.on_tick(time.delta_secs(), &keys);
    events.send_batch(encounter.0.drain_events());
}

fn poll_tuning(watcher: Option<ResMut<TuningWatcher>>, mut encounter: ResMut<EncounterResource>) {
    let Some(mut watcher) = watcher else {
        return;
    };
    if let Some(config) = watcher.0.poll() {
        encounter.0.apply_config(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<ButtonInput<KeyCode>>()
            .add_plugins(EncounterPlugin {
                stage: StageConfig::stage2(),
                ..EncounterPlugin::default()
            });
        app
    }

    #[test]
    fn test_default_bindings() {
        let mut keyboard = ButtonInput::<KeyCode>::default();
        keyboard.press(KeyCode::KeyZ);
        keyboard.press(KeyCode::ArrowLeft);
        let keys = KeyBindings::default().resolve(&keyboard);
        assert_eq!(
            keys.mask(),
            LogicalKey::Attack.bit() | LogicalKey::Left.bit()
        );
    }

    #[test]
    fn test_enter_starts_fight() {
        let mut app = test_app();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Enter);
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(16));
        app.update();

        let encounter = app.world().resource::<EncounterResource>();
        assert!(encounter.0.inputs_enabled());
        assert!(!app.world().resource::<Events<EncounterEvent>>().is_empty());
    }
}
