//! Process-wide store of registered templates
//!
//! The registry is the only writer of template definitions. Definitions are
//! copied in and kept behind `Arc` snapshots, so readers always hold either the
//! complete old version of a template or the complete new one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::error::{Result, TemplateError};
use crate::source::DefinitionSource;
use crate::template::TemplateDefinition;

/// A definition together with its registration metadata
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredTemplate {
    pub definition: Arc<TemplateDefinition>,
    pub fingerprint: String,
    /// Starts at 1 and increases each time the content is replaced
    pub revision: u32,
    pub registered_at: DateTime<Utc>,
}

/// What a single registration did to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "outcome")]
pub enum RegisterOutcome {
    Added,
    Replaced { revision: u32 },
    /// Same fingerprint as the stored definition
    Unchanged,
}

/// A definition rejected during a bulk registration
#[derive(Debug)]
pub struct RegistrationFailure {
    pub id: String,
    pub error: TemplateError,
}

/// Result of `register_many`: every definition is reported, none aborts the batch
#[derive(Debug, Default)]
pub struct BulkRegistration {
    pub registered: Vec<(String, RegisterOutcome)>,
    pub failures: Vec<RegistrationFailure>,
}

impl BulkRegistration {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Default)]
struct RegistryTable {
    order: Vec<String>,
    entries: HashMap<String, RegisteredTemplate>,
}

impl RegistryTable {
    fn insert(&mut self, definition: TemplateDefinition, fingerprint: String) -> RegisterOutcome {
        let now = Utc::now();
        match self.entries.get_mut(&definition.id) {
            Some(existing) if existing.fingerprint == fingerprint => RegisterOutcome::Unchanged,
            Some(existing) => {
                existing.revision += 1;
                existing.fingerprint = fingerprint;
                existing.registered_at = now;
                existing.definition = Arc::new(definition);
                RegisterOutcome::Replaced {
                    revision: existing.revision,
                }
            }
            None => {
                self.order.push(definition.id.clone());
                self.entries.insert(
                    definition.id.clone(),
                    RegisteredTemplate {
                        definition: Arc::new(definition),
                        fingerprint,
                        revision: 1,
                        registered_at: now,
                    },
                );
                RegisterOutcome::Added
            }
        }
    }
}

/// Single source of truth mapping template id to definition
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    table: RwLock<RegistryTable>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write swaps whole entries, so a poisoned lock still guards a
    // consistent table.
    fn read(&self) -> RwLockReadGuard<'_, RegistryTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn prepare(definition: TemplateDefinition) -> Result<(TemplateDefinition, String)> {
        definition.validate()?;
        let fingerprint = definition.fingerprint()?;
        Ok((definition, fingerprint))
    }

    /// Validates and registers one definition, replacing any entry with the same id.
    pub fn register_from_definition(&self, definition: TemplateDefinition) -> Result<RegisterOutcome> {
        let (definition, fingerprint) = Self::prepare(definition)?;
        let id = definition.id.clone();
        let outcome = self.write().insert(definition, fingerprint);
        log_outcome(&id, outcome);
        Ok(outcome)
    }

    /// Registers each definition independently. Invalid definitions are
    /// collected as failures; the valid ones are committed together under one
    /// write lock.
    pub fn register_many<I>(&self, definitions: I) -> BulkRegistration
    where
        I: IntoIterator<Item = TemplateDefinition>,
    {
        let mut report = BulkRegistration::default();
        let mut prepared = Vec::new();

        for definition in definitions {
            let id = definition.id.clone();
            match Self::prepare(definition) {
                Ok(ready) => prepared.push(ready),
                Err(error) => {
                    warn!("Skipping template '{}': {}", id, error);
                    report.failures.push(RegistrationFailure { id, error });
                }
            }
        }

        {
            let mut table = self.write();
            for (definition, fingerprint) in prepared {
                let id = definition.id.clone();
                let outcome = table.insert(definition, fingerprint);
                report.registered.push((id, outcome));
            }
        }

        for (id, outcome) in &report.registered {
            log_outcome(id, *outcome);
        }
        info!(
            "Bulk registration finished: {} registered, {} rejected",
            report.registered.len(),
            report.failures.len()
        );
        report
    }

    /// Pulls raw definitions from a source and registers them.
    pub fn load_from(&self, source: &dyn DefinitionSource) -> Result<BulkRegistration> {
        let definitions = source.load_definitions()?;
        debug!(
            "Loaded {} template definitions from {}",
            definitions.len(),
            source.describe()
        );
        Ok(self.register_many(definitions))
    }

    pub fn count(&self) -> usize {
        self.read().entries.len()
    }

    /// All definitions in registration order.
    pub fn all(&self) -> Vec<Arc<TemplateDefinition>> {
        let table = self.read();
        table
            .order
            .iter()
            .filter_map(|id| table.entries.get(id))
            .map(|entry| Arc::clone(&entry.definition))
            .collect()
    }

    pub fn find_by_id(&self, id: &str) -> Result<Arc<TemplateDefinition>> {
        self.read()
            .entries
            .get(id)
            .map(|entry| Arc::clone(&entry.definition))
            .ok_or_else(|| TemplateError::TemplateNotFound(id.to_string()))
    }

    pub fn entry(&self, id: &str) -> Result<RegisteredTemplate> {
        self.read()
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| TemplateError::TemplateNotFound(id.to_string()))
    }
}

fn log_outcome(id: &str, outcome: RegisterOutcome) {
    match outcome {
        RegisterOutcome::Added => info!("Registered template '{}'", id),
        RegisterOutcome::Replaced { revision } => {
            info!("Replaced template '{}' (revision {})", id, revision)
        }
        RegisterOutcome::Unchanged => debug!("Template '{}' unchanged, skipping", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_state::BuildState;
    use crate::template::{ContentKind, TemplateItem};
    use std::thread;

    fn definition(id: &str, text: &str) -> TemplateDefinition {
        TemplateDefinition::new(id, "test template", "json").with_item(
            TemplateItem::new(1).with_content(BuildState::Success, ContentKind::Ordinary, text),
        )
    }

    #[test]
    fn empty_registry() {
        let registry = TemplateRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.all().is_empty());
        assert!(matches!(
            registry.find_by_id("missing"),
            Err(TemplateError::TemplateNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn register_and_find() {
        let registry = TemplateRegistry::new();
        let outcome = registry
            .register_from_definition(definition("testXMLtemplate", "body"))
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::Added);
        assert_eq!(registry.count(), 1);

        let found = registry.find_by_id("testXMLtemplate").unwrap();
        assert_eq!(*found, definition("testXMLtemplate", "body"));
    }

    #[test]
    fn reregistering_replaces_wholesale() {
        let registry = TemplateRegistry::new();
        registry.register_from_definition(definition("X", "first")).unwrap();
        let outcome = registry.register_from_definition(definition("X", "second")).unwrap();

        assert_eq!(outcome, RegisterOutcome::Replaced { revision: 2 });
        assert_eq!(registry.count(), 1);
        let found = registry.find_by_id("X").unwrap();
        assert_eq!(found.items[0].states[0].content.text(), "second");
    }

    #[test]
    fn identical_reregistration_is_unchanged() {
        let registry = TemplateRegistry::new();
        registry.register_from_definition(definition("X", "same")).unwrap();
        let before = registry.entry("X").unwrap();
        let outcome = registry.register_from_definition(definition("X", "same")).unwrap();

        assert_eq!(outcome, RegisterOutcome::Unchanged);
        let after = registry.entry("X").unwrap();
        assert_eq!(after.revision, 1);
        assert_eq!(after.registered_at, before.registered_at);
    }

    #[test]
    fn invalid_definition_is_not_registered() {
        let registry = TemplateRegistry::new();
        let result = registry.register_from_definition(TemplateDefinition::new("", "", "json"));
        assert!(matches!(result, Err(TemplateError::InvalidDefinition { .. })));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn replacement_keeps_registration_order() {
        let registry = TemplateRegistry::new();
        registry.register_from_definition(definition("a", "1")).unwrap();
        registry.register_from_definition(definition("b", "1")).unwrap();
        registry.register_from_definition(definition("a", "2")).unwrap();

        let ids: Vec<_> = registry.all().iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn register_many_collects_failures() {
        let registry = TemplateRegistry::new();
        let report = registry.register_many(vec![
            definition("one", "1"),
            TemplateDefinition::new("broken", "no items", "json"),
            definition("two", "2"),
        ]);

        assert_eq!(report.registered.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "broken");
        assert!(!report.is_clean());
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn load_from_in_memory_source() {
        let registry = TemplateRegistry::new();
        let source = vec![definition("a", "1"), definition("a", "2"), definition("b", "1")];
        let report = registry.load_from(&source).unwrap();

        assert_eq!(
            report.registered,
            vec![
                ("a".to_string(), RegisterOutcome::Added),
                ("a".to_string(), RegisterOutcome::Replaced { revision: 2 }),
                ("b".to_string(), RegisterOutcome::Added),
            ]
        );
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn readers_never_see_partial_definitions() {
        let registry = Arc::new(TemplateRegistry::new());
        let versioned = |n: usize| {
            let text = format!("v{}", n);
            TemplateDefinition::new("live", "", "json")
                .with_item(
                    TemplateItem::new(1).with_content(BuildState::Fixed, ContentKind::Ordinary, &text),
                )
                .with_item(
                    TemplateItem::new(2).with_content(BuildState::Fixed, ContentKind::Ordinary, &text),
                )
        };
        registry.register_from_definition(versioned(0)).unwrap();

        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for n in 1..200 {
                    registry.register_from_definition(versioned(n)).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let def = registry.find_by_id("live").unwrap();
                        assert_eq!(def.items.len(), 2);
                        assert_eq!(def.items[0].states[0].content, def.items[1].states[0].content);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.entry("live").unwrap().revision, 200);
    }
}
