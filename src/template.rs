//! Template definitions, their items and per-state content

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::build_state::BuildState;
use crate::error::{Result, TemplateError};

/// Payload text for one (item, state) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateContent {
    text: String,
}

impl TemplateContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Which of the two content sequences of an item to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Ordinary,
    /// Content used when the triggering build is on a non-default branch
    Branch,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Ordinary => f.write_str("ordinary"),
            ContentKind::Branch => f.write_str("branch"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ordinary" => Ok(ContentKind::Ordinary),
            "branch" => Ok(ContentKind::Branch),
            other => Err(TemplateError::InvalidPath(format!(
                "unknown content kind '{}', expected 'ordinary' or 'branch'",
                other
            ))),
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Content configured for a single build state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Build state short name, checked against the catalog on registration
    pub state: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub content: TemplateContent,
}

impl StateEntry {
    pub fn new(state: BuildState, content: impl Into<String>) -> Self {
        Self {
            state: state.short_name().to_string(),
            enabled: true,
            content: TemplateContent::new(content),
        }
    }
}

/// One payload-format unit inside a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub id: u32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub states: Vec<StateEntry>,
    #[serde(default)]
    pub branch_states: Vec<StateEntry>,
}

impl TemplateItem {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            enabled: true,
            states: Vec::new(),
            branch_states: Vec::new(),
        }
    }

    /// Builder-style setter, replacing any existing entry for the state.
    pub fn with_content(mut self, state: BuildState, kind: ContentKind, text: &str) -> Self {
        let entries = match kind {
            ContentKind::Ordinary => &mut self.states,
            ContentKind::Branch => &mut self.branch_states,
        };
        entries.retain(|entry| entry.state != state.short_name());
        entries.push(StateEntry::new(state, text));
        self
    }

    pub fn entries(&self, kind: ContentKind) -> &[StateEntry] {
        match kind {
            ContentKind::Ordinary => &self.states,
            ContentKind::Branch => &self.branch_states,
        }
    }

    pub fn entry_for(&self, state: BuildState, kind: ContentKind) -> Option<&StateEntry> {
        self.entries(kind)
            .iter()
            .find(|entry| entry.state == state.short_name())
    }

    pub fn content_for(&self, state: BuildState, kind: ContentKind) -> Option<&TemplateContent> {
        self.entry_for(state, kind).map(|entry| &entry.content)
    }

    fn validate(&self, template_id: &str) -> Result<()> {
        for kind in [ContentKind::Ordinary, ContentKind::Branch] {
            let mut seen = HashSet::new();
            for entry in self.entries(kind) {
                BuildState::lookup(&entry.state).map_err(|_| {
                    TemplateError::invalid(
                        template_id,
                        format!("item {} uses unknown build state '{}'", self.id, entry.state),
                    )
                })?;
                if !seen.insert(entry.state.as_str()) {
                    return Err(TemplateError::invalid(
                        template_id,
                        format!(
                            "item {} has more than one {} entry for state '{}'",
                            self.id, kind, entry.state
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// A named template made of one or more items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// Missing ids deserialize as empty and are rejected by `validate`
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Payload format the content is written in, e.g. "json" or "xml"
    #[serde(default)]
    pub format: String,
    /// Display ordering hint; higher ranks are listed first by consumers
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

impl TemplateDefinition {
    pub fn new(id: impl Into<String>, description: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            format: format.into(),
            rank: 0,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: TemplateItem) -> Self {
        self.items.push(item);
        self
    }

    /// Linear scan; templates hold a handful of items at most.
    pub fn item(&self, item_id: u32) -> Option<&TemplateItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Checks the constraints a definition must meet before registration.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TemplateError::invalid(&self.id, "template id is empty"));
        }
        if self.items.is_empty() {
            return Err(TemplateError::invalid(&self.id, "template has no items"));
        }

        let mut item_ids = HashSet::new();
        for item in &self.items {
            if !item_ids.insert(item.id) {
                return Err(TemplateError::invalid(
                    &self.id,
                    format!("duplicate item id {}", item.id),
                ));
            }
            item.validate(&self.id)?;
        }
        Ok(())
    }

    /// SHA-256 of the canonical JSON form, hex encoded. Equal fingerprints
    /// mean equal definitions.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }
}
