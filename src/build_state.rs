//! Build lifecycle states that template content is keyed on

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TemplateError};

/// A discrete point in a CI build's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildState {
    Started,
    ChangesLoaded,
    Cancelled,
    BeforeFinished,
    /// Umbrella state covering every finished build, never notified on its own
    Finished,
    Success,
    Failure,
    Fixed,
    StillFailing,
    ResponsibilityChanged,
}

const ALL_STATES: [BuildState; 10] = [
    BuildState::Started,
    BuildState::ChangesLoaded,
    BuildState::Cancelled,
    BuildState::BeforeFinished,
    BuildState::Finished,
    BuildState::Success,
    BuildState::Failure,
    BuildState::Fixed,
    BuildState::StillFailing,
    BuildState::ResponsibilityChanged,
];

impl BuildState {
    /// Machine name used verbatim in identifiers and request paths
    pub fn short_name(self) -> &'static str {
        match self {
            BuildState::Started => "started",
            BuildState::ChangesLoaded => "changesLoaded",
            BuildState::Cancelled => "cancelled",
            BuildState::BeforeFinished => "beforeFinished",
            BuildState::Finished => "finished",
            BuildState::Success => "success",
            BuildState::Failure => "failure",
            BuildState::Fixed => "fixed",
            BuildState::StillFailing => "stillFailing",
            BuildState::ResponsibilityChanged => "responsibilityChanged",
        }
    }

    pub fn notify_eligible(self) -> bool {
        !matches!(self, BuildState::Finished)
    }

    /// Finds a state by its case-sensitive short name.
    pub fn lookup(short_name: &str) -> Result<BuildState> {
        ALL_STATES
            .iter()
            .copied()
            .find(|state| state.short_name() == short_name)
            .ok_or_else(|| TemplateError::InvalidBuildState(short_name.to_string()))
    }
}

/// Every state in catalog order.
pub fn all_states() -> &'static [BuildState] {
    &ALL_STATES
}

/// The subsequence of states that outbound notifications are sent for.
pub fn notify_eligible_states() -> Vec<BuildState> {
    ALL_STATES
        .iter()
        .copied()
        .filter(|state| state.notify_eligible())
        .collect()
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for BuildState {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        BuildState::lookup(s)
    }
}

impl Serialize for BuildState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_name())
    }
}

impl<'de> Deserialize<'de> for BuildState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        BuildState::lookup(&name).map_err(serde::de::Error::custom)
    }
}

/// Catalog entry as exposed over the API
#[derive(Debug, Clone, Serialize)]
pub struct BuildStateDescriptor {
    pub short_name: &'static str,
    pub notify_eligible: bool,
}

impl From<BuildState> for BuildStateDescriptor {
    fn from(state: BuildState) -> Self {
        Self {
            short_name: state.short_name(),
            notify_eligible: state.notify_eligible(),
        }
    }
}
