//! Resolution of template paths against the registry
//!
//! A path walks template id, item id, build state and content kind, in that
//! order. Resolution stops at the first segment that cannot be resolved and
//! never writes to the registry.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::build_state::BuildState;
use crate::error::{Result, TemplateError};
use crate::registry::TemplateRegistry;
use crate::template::{ContentKind, TemplateDefinition, TemplateItem};

/// Identifier path of 1 to 4 segments.
///
/// Segments are kept as given and only interpreted during resolution, once
/// every segment above them has resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePath {
    template_id: String,
    item: Option<String>,
    state: Option<String>,
    kind: Option<String>,
}

impl TemplatePath {
    pub fn template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            item: None,
            state: None,
            kind: None,
        }
    }

    pub fn item(mut self, item_id: impl ToString) -> Self {
        self.item = Some(item_id.to_string());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn kind(mut self, kind: impl ToString) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }
}

/// Segments are separated by `/` since template ids may contain dots,
/// e.g. `slack.com-compact/1/fixed/branch`.
impl FromStr for TemplatePath {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<&str> = s.trim_matches('/').split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(TemplateError::InvalidPath(format!("empty segment in '{}'", s)));
        }
        if segments.len() > 4 {
            return Err(TemplateError::InvalidPath(format!(
                "'{}' has {} segments, at most 4 are allowed",
                s,
                segments.len()
            )));
        }

        let mut path = TemplatePath::template(segments[0]);
        path.item = segments.get(1).map(|item| item.to_string());
        path.state = segments.get(2).map(|state| state.to_string());
        path.kind = segments.get(3).map(|kind| kind.to_string());
        Ok(path)
    }
}

impl fmt::Display for TemplatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template_id)?;
        for segment in [&self.item, &self.state, &self.kind].into_iter().flatten() {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Parses an item id segment.
pub fn parse_item_id(raw: &str) -> Result<u32> {
    raw.parse::<u32>()
        .map_err(|_| TemplateError::InvalidPath(format!("item id '{}' is not a number", raw)))
}

fn missing_segment(path: &TemplatePath, segment: &str, needed: &str) -> TemplateError {
    TemplateError::InvalidPath(format!(
        "'{}' gives a {} without a {}",
        path, segment, needed
    ))
}

/// Answer to "what text does this item show for this state"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLookup {
    Configured(String),
    /// The state is valid but the item has no content of this kind for it
    NotConfigured {
        template_id: String,
        item_id: u32,
        state: BuildState,
        kind: ContentKind,
    },
}

impl ContentLookup {
    pub fn is_configured(&self) -> bool {
        matches!(self, ContentLookup::Configured(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ContentLookup::Configured(text) => Some(text),
            ContentLookup::NotConfigured { .. } => None,
        }
    }

    /// Converts the negative result into `ContentNotConfigured`.
    pub fn into_text(self) -> Result<String> {
        match self {
            ContentLookup::Configured(text) => Ok(text),
            ContentLookup::NotConfigured {
                template_id,
                item_id,
                state,
                kind,
            } => Err(TemplateError::ContentNotConfigured {
                template_id,
                item_id,
                state: state.short_name().to_string(),
                kind,
            }),
        }
    }
}

/// Summary of one build state for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStateInfo {
    #[serde(rename = "type")]
    pub state_type: String,
    pub enabled: bool,
    pub content_present: bool,
    pub branch_content_present: bool,
}

/// Listing returned for the collection of templates
#[derive(Debug, Clone, Serialize)]
pub struct TemplateListing {
    pub count: usize,
    pub templates: Vec<Arc<TemplateDefinition>>,
}

/// Output shape, chosen by how many path segments were supplied
#[derive(Debug, Clone)]
pub enum Resolved {
    Template(Arc<TemplateDefinition>),
    Item(TemplateItem),
    BuildState(BuildStateInfo),
    Content(ContentLookup),
}

/// Read-only query layer over a registry
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    registry: &'a TemplateRegistry,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn list_templates(&self) -> TemplateListing {
        let templates = self.registry.all();
        TemplateListing {
            count: templates.len(),
            templates,
        }
    }

    pub fn get_template(&self, template_id: &str) -> Result<Arc<TemplateDefinition>> {
        self.registry.find_by_id(template_id)
    }

    pub fn get_template_item(&self, template_id: &str, item_id: u32) -> Result<TemplateItem> {
        let definition = self.get_template(template_id)?;
        find_item(&definition, item_id).cloned()
    }

    pub fn item_content_for_state(
        &self,
        template_id: &str,
        item_id: u32,
        state: &str,
        kind: ContentKind,
    ) -> Result<ContentLookup> {
        let definition = self.get_template(template_id)?;
        let item = find_item(&definition, item_id)?;
        let state = BuildState::lookup(state)?;
        Ok(content_lookup(&definition, item, state, kind))
    }

    pub fn build_state_info(
        &self,
        template_id: &str,
        item_id: u32,
        state: &str,
    ) -> Result<BuildStateInfo> {
        let definition = self.get_template(template_id)?;
        let item = find_item(&definition, item_id)?;
        let state = BuildState::lookup(state)?;
        Ok(state_info(item, state))
    }

    /// Walks the path top-down, failing at the shallowest unresolved segment.
    /// A segment supplied below a missing one is rejected, never ignored.
    pub fn resolve(&self, path: &TemplatePath) -> Result<Resolved> {
        let definition = self.get_template(&path.template_id)?;
        let Some(item_id) = path.item.as_deref() else {
            if path.state.is_some() {
                return Err(missing_segment(path, "build state", "template item"));
            }
            if path.kind.is_some() {
                return Err(missing_segment(path, "content kind", "template item"));
            }
            return Ok(Resolved::Template(definition));
        };
        let item = find_item(&definition, parse_item_id(item_id)?)?;
        let Some(state) = path.state.as_deref() else {
            if path.kind.is_some() {
                return Err(missing_segment(path, "content kind", "build state"));
            }
            return Ok(Resolved::Item(item.clone()));
        };
        let state = BuildState::lookup(state)?;
        match path.kind.as_deref() {
            None => Ok(Resolved::BuildState(state_info(item, state))),
            Some(kind) => {
                let kind: ContentKind = kind.parse()?;
                Ok(Resolved::Content(content_lookup(&definition, item, state, kind)))
            }
        }
    }
}

fn find_item(definition: &TemplateDefinition, item_id: u32) -> Result<&TemplateItem> {
    definition.item(item_id).ok_or_else(|| TemplateError::ItemNotFound {
        template_id: definition.id.clone(),
        item_id,
    })
}

fn content_lookup(
    definition: &TemplateDefinition,
    item: &TemplateItem,
    state: BuildState,
    kind: ContentKind,
) -> ContentLookup {
    match item.content_for(state, kind) {
        Some(content) => ContentLookup::Configured(content.text().to_string()),
        None => ContentLookup::NotConfigured {
            template_id: definition.id.clone(),
            item_id: item.id,
            state,
            kind,
        },
    }
}

fn state_info(item: &TemplateItem, state: BuildState) -> BuildStateInfo {
    let ordinary = item.entry_for(state, ContentKind::Ordinary);
    let branch = item.entry_for(state, ContentKind::Branch);
    let any_enabled = ordinary.into_iter().chain(branch).any(|entry| entry.enabled);

    BuildStateInfo {
        state_type: state.short_name().to_string(),
        enabled: item.enabled && any_enabled,
        content_present: ordinary.is_some(),
        branch_content_present: branch.is_some(),
    }
}
