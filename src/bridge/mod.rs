//! FFI bridge: C ABI for non-Rust hosts.
//!
//! An encounter lives behind an opaque pointer created by
//! `arena_encounter_new` and released by `arena_encounter_free`. Structured
//! data crosses the boundary as JSON; every `*mut c_char` returned here must be
//! released with `free_string`. Null handles are ignored and produce the
//! function's neutral value.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde::Serialize;

use crate::balance;
use crate::boss::AttackTable;
use crate::encounter::{Encounter, EncounterConfig, Outcome, StageConfig};
use crate::input::KeyState;
use crate::logging;

// ========================
// Helpers
// ========================

fn json_to_cstring<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

fn parse_cstr(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_owned()) }
}

/// Run `f` on the encounter behind `ptr`, or return `default` for null.
fn with_encounter<R>(ptr: *mut Encounter, default: R, f: impl FnOnce(&mut Encounter) -> R) -> R {
    match unsafe { ptr.as_mut() } {
        Some(encounter) => f(encounter),
        None => default,
    }
}

fn flag(b: bool) -> u32 {
    u32::from(b)
}

// ========================
// C-ABI: Core
// ========================

#[no_mangle]
pub extern "C" fn get_version() -> *mut c_char {
    CString::new(env!("CARGO_PKG_VERSION"))
        .unwrap_or_default()
        .into_raw()
}

/// Free a string allocated by Rust.
/// `ptr` must come from a prior call into this library, or be null.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            drop(CString::from_raw(ptr));
        }
    }
}

// ========================
// C-ABI: Logging
// ========================

#[no_mangle]
pub extern "C" fn logging_get_default_config() -> *mut c_char {
    json_to_cstring(&logging::TracingConfig::default())
}

/// Install the subscriber from a JSON `TracingConfig`; null uses defaults.
#[no_mangle]
pub extern "C" fn logging_init(config_json: *const c_char) {
    let config = parse_cstr(config_json)
        .and_then(|json| logging::TracingConfig::from_json(&json))
        .unwrap_or_default();
    logging::init_tracing(&config);
}

/// Log for the host (0=Trace, 1=Debug, 2=Info, 3=Warn, 4=Error).
#[no_mangle]
pub extern "C" fn logging_log_message(level: u32, system: *const c_char, message: *const c_char) {
    let (Some(system), Some(message)) = (parse_cstr(system), parse_cstr(message)) else {
        return;
    };
    logging::log_host(logging::LogLevel::from_id(level), &system, &message);
}

// ========================
// C-ABI: Stages and tuning
// ========================

/// JSON of a bundled stage ("stage1" or "stage2"), or null.
#[no_mangle]
pub extern "C" fn arena_stage_preset(name: *const c_char) -> *mut c_char {
    match parse_cstr(name).and_then(|n| StageConfig::preset(&n)) {
        Some(stage) => json_to_cstring(&stage),
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub extern "C" fn arena_default_tuning() -> *mut c_char {
    json_to_cstring(&EncounterConfig::default())
}

// ========================
// C-ABI: Encounter lifecycle
// ========================

/// Create an encounter from a stage JSON (null for the default stage).
/// Returns null when the stage fails to parse or validate.
#[no_mangle]
pub extern "C" fn arena_encounter_new(stage_json: *const c_char, seed: u64) -> *mut Encounter {
    let stage = match parse_cstr(stage_json) {
        None => StageConfig::default(),
        Some(json) => match StageConfig::from_json(&json) {
            Ok(stage) => stage,
            Err(e) => {
                tracing::warn!(target: "arena_core::bridge", "rejected stage: {e}");
                return std::ptr::null_mut();
            }
        },
    };
    let encounter = Encounter::with_config(stage, EncounterConfig::with_seed(seed));
    Box::into_raw(Box::new(encounter))
}

/// Release an encounter created by `arena_encounter_new`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn arena_encounter_free(ptr: *mut Encounter) {
    if !ptr.is_null() {
        unsafe {
            drop(Box::from_raw(ptr));
        }
    }
}

/// Start key equivalent. Returns 1 when a fight began.
#[no_mangle]
pub extern "C" fn arena_encounter_start(ptr: *mut Encounter) -> u32 {
    with_encounter(ptr, 0, |e| flag(e.begin_fight()))
}

#[no_mangle]
pub extern "C" fn arena_encounter_restart(ptr: *mut Encounter) {
    with_encounter(ptr, (), |e| e.restart());
}

/// Advance by `dt` seconds with the keys in `key_mask` held
/// (bit order: up, down, left, right, dash, attack, start, supermove).
#[no_mangle]
pub extern "C" fn arena_encounter_tick(ptr: *mut Encounter, dt: f32, key_mask: u32) {
    if !dt.is_finite() || dt < 0.0 {
        return;
    }
    with_encounter(ptr, (), |e| e.on_tick(dt, &KeyState::from_mask(key_mask)));
}

/// Queue tuning JSON for the next restart. Returns 1 when accepted.
#[no_mangle]
pub extern "C" fn arena_encounter_apply_config(ptr: *mut Encounter, config_json: *const c_char) -> u32 {
    let Some(json) = parse_cstr(config_json) else {
        return 0;
    };
    let config = match serde_json::from_str::<EncounterConfig>(&json) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(target: "arena_core::bridge", "rejected tuning: {e}");
            return 0;
        }
    };
    if let Err(e) = config.validate() {
        tracing::warn!(target: "arena_core::bridge", "rejected tuning: {e}");
        return 0;
    }
    with_encounter(ptr, 0, |e| {
        e.apply_config(config);
        1
    })
}

// ========================
// C-ABI: Encounter queries
// ========================

#[no_mangle]
pub extern "C" fn arena_encounter_snapshot(ptr: *mut Encounter) -> *mut c_char {
    with_encounter(ptr, std::ptr::null_mut(), |e| json_to_cstring(&e.snapshot()))
}

/// Presentation events since the last drain, as a JSON array.
#[no_mangle]
pub extern "C" fn arena_encounter_drain_events(ptr: *mut Encounter) -> *mut c_char {
    with_encounter(ptr, std::ptr::null_mut(), |e| {
        json_to_cstring(&e.drain_events())
    })
}

#[no_mangle]
pub extern "C" fn arena_player_health(ptr: *mut Encounter) -> u32 {
    with_encounter(ptr, 0, |e| u32::from(e.player_health()))
}

#[no_mangle]
pub extern "C" fn arena_player_tension(ptr: *mut Encounter) -> u32 {
    with_encounter(ptr, 0, |e| e.player_tension())
}

#[no_mangle]
pub extern "C" fn arena_boss_health_percent(ptr: *mut Encounter) -> u32 {
    with_encounter(ptr, 0, |e| e.boss_health_percent())
}

/// 0 = unresolved, 1 = won, 2 = lost
#[no_mangle]
pub extern "C" fn arena_encounter_outcome(ptr: *mut Encounter) -> u32 {
    with_encounter(ptr, 0, |e| match e.outcome() {
        Outcome::Unresolved => 0,
        Outcome::Won => 1,
        Outcome::Lost => 2,
    })
}

#[no_mangle]
pub extern "C" fn arena_is_input_locked(ptr: *mut Encounter) -> u32 {
    with_encounter(ptr, 0, |e| flag(e.is_input_locked()))
}

// ========================
// C-ABI: Host triggers
// ========================

#[no_mangle]
pub extern "C" fn arena_increment_shield(ptr: *mut Encounter) {
    with_encounter(ptr, (), |e| e.increment_shield());
}

/// Returns 1 when the supermove started.
#[no_mangle]
pub extern "C" fn arena_activate_supermove(ptr: *mut Encounter) -> u32 {
    with_encounter(ptr, 0, |e| flag(e.activate_supermove()))
}

#[no_mangle]
pub extern "C" fn arena_lock_input_for_supermove(ptr: *mut Encounter) {
    with_encounter(ptr, (), |e| e.lock_input_for_supermove());
}

// ========================
// C-ABI: Balance
// ========================

/// Sample each default attack-table row and return the frequencies as JSON.
#[no_mangle]
pub extern "C" fn arena_attack_distribution(samples: u64, seed: u64) -> *mut c_char {
    let rows = balance::sample_attack_distribution(&AttackTable::default(), samples, seed);
    json_to_cstring(&rows)
}
