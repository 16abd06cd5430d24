//! Built-in templates registered at startup
//!
//! Every seed is plain data; `build_definition` is the only constructor.

use tracing::{info, warn};

use crate::build_state::BuildState;
use crate::registry::{BulkRegistration, TemplateRegistry};
use crate::template::{ContentKind, TemplateDefinition, TemplateItem};

/// Declarative description of a built-in template
#[derive(Debug, Clone, Copy)]
pub struct SeedTemplate {
    pub id: &'static str,
    pub description: &'static str,
    pub format: &'static str,
    pub rank: i32,
    pub items: &'static [SeedItem],
}

/// One item of a seed: the same content is used for every listed state
#[derive(Debug, Clone, Copy)]
pub struct SeedItem {
    pub id: u32,
    pub states: &'static [BuildState],
    pub content: &'static str,
    pub branch_content: Option<&'static str>,
}

const NOTIFY_STATES: &[BuildState] = &[
    BuildState::Started,
    BuildState::ChangesLoaded,
    BuildState::Cancelled,
    BuildState::BeforeFinished,
    BuildState::Success,
    BuildState::Failure,
    BuildState::Fixed,
    BuildState::StillFailing,
    BuildState::ResponsibilityChanged,
];

const RESULT_STATES: &[BuildState] = &[
    BuildState::Success,
    BuildState::Failure,
    BuildState::Fixed,
    BuildState::StillFailing,
];

const PROGRESS_STATES: &[BuildState] = &[
    BuildState::Started,
    BuildState::ChangesLoaded,
    BuildState::Cancelled,
    BuildState::BeforeFinished,
];

const GENERIC_JSON: &str = r##"{
  "buildStatus": "${buildStatus}",
  "buildResult": "${buildResult}",
  "notifyType": "${notifyType}",
  "buildName": "${buildName}",
  "projectName": "${projectName}",
  "buildNumber": "${buildNumber}",
  "buildStatusUrl": "${buildStatusUrl}"
}"##;

const GENERIC_JSON_BRANCH: &str = r##"{
  "buildStatus": "${buildStatus}",
  "buildResult": "${buildResult}",
  "notifyType": "${notifyType}",
  "buildName": "${buildName}",
  "projectName": "${projectName}",
  "buildNumber": "${buildNumber}",
  "branchName": "${branchDisplayName}",
  "buildStatusUrl": "${buildStatusUrl}"
}"##;

const GENERIC_XML: &str = r##"<build>
  <buildStatus>${buildStatus}</buildStatus>
  <buildResult>${buildResult}</buildResult>
  <notifyType>${notifyType}</notifyType>
  <buildName>${buildName}</buildName>
  <buildNumber>${buildNumber}</buildNumber>
  <buildStatusUrl>${buildStatusUrl}</buildStatusUrl>
</build>"##;

const ELASTICSEARCH: &str = r##"{
  "build_name": "${buildName}",
  "build_number": "${buildNumber}",
  "build_result": "${buildResult}",
  "notify_type": "${notifyType}",
  "project_id": "${projectExternalId}",
  "build_type_id": "${buildExternalTypeId}",
  "@timestamp": "${currentTime}"
}"##;

const ELASTICSEARCH_BRANCH: &str = r##"{
  "build_name": "${buildName}",
  "build_number": "${buildNumber}",
  "build_result": "${buildResult}",
  "notify_type": "${notifyType}",
  "project_id": "${projectExternalId}",
  "build_type_id": "${buildExternalTypeId}",
  "branch_name": "${branchName}",
  "branch_is_default": ${branchIsDefault},
  "@timestamp": "${currentTime}"
}"##;

const FLOWDOCK: &str = r##"{
  "event": "activity",
  "author": { "name": "CI Server" },
  "title": "${buildResult} : ${buildName} #${buildNumber}",
  "external_thread_id": "${buildExternalTypeId}",
  "thread": { "title": "${buildName}", "status": { "value": "${buildResult}" } }
}"##;

const FLOWDOCK_BRANCH: &str = r##"{
  "event": "activity",
  "author": { "name": "CI Server" },
  "title": "${buildResult} : ${buildName} [${branchDisplayName}] #${buildNumber}",
  "external_thread_id": "${buildExternalTypeId}-${branchName}",
  "thread": { "title": "${buildName} [${branchDisplayName}]", "status": { "value": "${buildResult}" } }
}"##;

const SLACK_PROGRESS: &str = r##"{
  "username": "CI",
  "attachments": [{
    "fallback": "${buildName} #${buildNumber} ${notifyType}",
    "color": "#cccccc",
    "text": "<${buildStatusUrl}|${buildName} #${buildNumber}> ${notifyType}"
  }]
}"##;

const SLACK_RESULT: &str = r##"{
  "username": "CI",
  "attachments": [{
    "fallback": "${buildName} #${buildNumber} ${buildResult}",
    "color": "${buildResultColour}",
    "text": "<${buildStatusUrl}|${buildName} #${buildNumber}> ${buildResult}"
  }]
}"##;

const SLACK_RESULT_BRANCH: &str = r##"{
  "username": "CI",
  "attachments": [{
    "fallback": "${buildName} [${branchDisplayName}] #${buildNumber} ${buildResult}",
    "color": "${buildResultColour}",
    "text": "<${buildStatusUrl}|${buildName} [${branchDisplayName}] #${buildNumber}> ${buildResult}"
  }]
}"##;

pub const SEED_TEMPLATES: &[SeedTemplate] = &[
    SeedTemplate {
        id: "generic-json",
        description: "Generic JSON payload",
        format: "json",
        rank: 100,
        items: &[SeedItem {
            id: 1,
            states: NOTIFY_STATES,
            content: GENERIC_JSON,
            branch_content: Some(GENERIC_JSON_BRANCH),
        }],
    },
    SeedTemplate {
        id: "generic-xml",
        description: "Generic XML payload",
        format: "xml",
        rank: 90,
        items: &[SeedItem {
            id: 1,
            states: NOTIFY_STATES,
            content: GENERIC_XML,
            branch_content: None,
        }],
    },
    SeedTemplate {
        id: "elasticsearch",
        description: "Elasticsearch document",
        format: "json",
        rank: 50,
        items: &[SeedItem {
            id: 1,
            states: NOTIFY_STATES,
            content: ELASTICSEARCH,
            branch_content: Some(ELASTICSEARCH_BRANCH),
        }],
    },
    SeedTemplate {
        id: "flowdock",
        description: "Flowdock thread activity",
        format: "json",
        rank: 40,
        items: &[SeedItem {
            id: 1,
            states: RESULT_STATES,
            content: FLOWDOCK,
            branch_content: Some(FLOWDOCK_BRANCH),
        }],
    },
    SeedTemplate {
        id: "slack.com-compact",
        description: "Slack.com compact notification",
        format: "json",
        rank: 60,
        items: &[
            SeedItem {
                id: 1,
                states: PROGRESS_STATES,
                content: SLACK_PROGRESS,
                branch_content: None,
            },
            SeedItem {
                id: 2,
                states: RESULT_STATES,
                content: SLACK_RESULT,
                branch_content: Some(SLACK_RESULT_BRANCH),
            },
        ],
    },
];

/// Turns a seed record into a full definition.
pub fn build_definition(seed: &SeedTemplate) -> TemplateDefinition {
    let mut definition = TemplateDefinition::new(seed.id, seed.description, seed.format);
    definition.rank = seed.rank;

    for seed_item in seed.items {
        let mut item = TemplateItem::new(seed_item.id);
        for state in seed_item.states {
            item = item.with_content(*state, ContentKind::Ordinary, seed_item.content);
            if let Some(branch) = seed_item.branch_content {
                item = item.with_content(*state, ContentKind::Branch, branch);
            }
        }
        definition = definition.with_item(item);
    }
    definition
}

pub fn find_seed(id: &str) -> Option<&'static SeedTemplate> {
    SEED_TEMPLATES.iter().find(|seed| seed.id == id)
}

/// Registers one built-in template by id. Returns false for unknown ids.
pub fn register_seed(registry: &TemplateRegistry, id: &str) -> bool {
    let Some(seed) = find_seed(id) else {
        warn!("No built-in template named '{}'", id);
        return false;
    };
    match registry.register_from_definition(build_definition(seed)) {
        Ok(_) => true,
        Err(e) => {
            warn!("Built-in template '{}' was rejected: {}", id, e);
            false
        }
    }
}

/// Registers every built-in template.
pub fn register_seeds(registry: &TemplateRegistry) -> BulkRegistration {
    let report = registry.register_many(SEED_TEMPLATES.iter().map(build_definition));
    info!("Registered {} built-in templates", report.registered.len());
    report
}
