//! Runtime Parameter Store
//!
//! ## Overview
//!
//! A fixed table of named float parameters, owned by the system manager.
//! The ground station reads and writes it over the telemetry link; writes
//! to live parameters are forwarded to the owning manager as a
//! [`ConfigUpdate`](crate::events::ConfigUpdate) so the change takes
//! effect on its next tick.
//!
//! The table is fixed at build time. There is no dynamic registration and
//! no persistence; defaults are compiled in and a reboot restores them.
//!
//! ## Ownership
//!
//! Each entry names the manager that consumes it. `reboot_required`
//! entries are stored but not forwarded; they only matter to the next
//! boot's driver init.

use crate::events::ParamKey;

/// Manager that consumes a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOwner {
    /// Applied by the attitude manager's config drain
    Attitude,
    /// Read by telemetry link setup
    Telemetry,
}

/// One parameter table entry
#[derive(Debug, Clone, Copy)]
pub struct Param {
    /// Key as it appears on the wire
    pub key: ParamKey,
    /// Current value
    pub value: f32,
    /// Manager that consumes this entry
    pub owner: ParamOwner,
    /// `true` when the value only applies at the next boot
    pub reboot_required: bool,
}

impl Param {
    const fn new(key: &str, value: f32, owner: ParamOwner, reboot_required: bool) -> Self {
        Self {
            key: ParamKey::from_static(key),
            value,
            owner,
            reboot_required,
        }
    }
}

/// Number of parameters in the table
pub const PARAM_COUNT: usize = 5;

/// Compiled-in defaults
const DEFAULTS: [Param; PARAM_COUNT] = [
    Param::new("baud_rate", 57_600.0, ParamOwner::Telemetry, true),
    Param::new("p", 100.0, ParamOwner::Attitude, false),
    Param::new("i", 25.0, ParamOwner::Attitude, false),
    Param::new("d", 10.0, ParamOwner::Attitude, false),
    Param::new("yaw_mix", 0.0, ParamOwner::Attitude, false),
];

/// Fixed parameter table with by-key and by-index access
#[derive(Debug, Clone)]
pub struct ParamStore {
    entries: [Param; PARAM_COUNT],
}

impl ParamStore {
    /// Table at its compiled-in defaults
    pub const fn new() -> Self {
        Self { entries: DEFAULTS }
    }

    /// Number of entries; also the streamed `count` field
    pub const fn count(&self) -> u16 {
        PARAM_COUNT as u16
    }

    /// Entry by table index
    pub fn get(&self, index: usize) -> Option<&Param> {
        self.entries.get(index)
    }

    /// Index of `key`, or `None` for an unknown key
    pub fn find(&self, key: &ParamKey) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == *key)
    }

    /// Write `value` to the entry named `key`
    ///
    /// Returns the index and the updated entry so the caller can build
    /// the confirmation event and owner notification from one lookup.
    /// `None` leaves the table untouched.
    pub fn write(&mut self, key: &ParamKey, value: f32) -> Option<(usize, Param)> {
        let index = self.find(key)?;
        self.entries[index].value = value;
        Some((index, self.entries[index]))
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}
