//! Loading raw template definitions from outside the process

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TemplateError};
use crate::template::TemplateDefinition;

/// Anything that can produce template definitions for the registry.
///
/// Definitions returned here are unvalidated; the registry checks them.
pub trait DefinitionSource {
    fn load_definitions(&self) -> Result<Vec<TemplateDefinition>>;

    /// Human readable name used in log lines
    fn describe(&self) -> String;
}

/// On-disk layout: a list of `[[template]]` tables (or a `"template"` array in JSON)
#[derive(Debug, Deserialize)]
struct TemplatesFile {
    #[serde(default)]
    template: Vec<TemplateDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileFormat {
    Toml,
    Json,
}

/// Template definitions stored in a TOML or JSON file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn format(&self) -> FileFormat {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        }
    }

    /// `load_definitions` for async callers, reading through `tokio::fs`.
    pub async fn load_definitions_async(&self) -> Result<Vec<TemplateDefinition>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.read_error(e))?;
        parse_definitions(&contents, self.format())
    }

    fn read_error(&self, e: std::io::Error) -> TemplateError {
        TemplateError::ConfigError(format!(
            "Failed to read templates file '{}': {}",
            self.path.display(),
            e
        ))
    }
}

impl DefinitionSource for FileSource {
    fn load_definitions(&self) -> Result<Vec<TemplateDefinition>> {
        let contents = fs::read_to_string(&self.path).map_err(|e| self.read_error(e))?;
        parse_definitions(&contents, self.format())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse_definitions(contents: &str, format: FileFormat) -> Result<Vec<TemplateDefinition>> {
    let file: TemplatesFile = match format {
        FileFormat::Toml => toml::from_str(contents)?,
        FileFormat::Json => serde_json::from_str(contents)?,
    };
    Ok(file.template)
}

/// Definitions already held in memory, e.g. built by another component
impl DefinitionSource for Vec<TemplateDefinition> {
    fn load_definitions(&self) -> Result<Vec<TemplateDefinition>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory definitions", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_TEMPLATES: &str = r#"
[[template]]
id = "testXMLtemplate"
description = "Test XML template"
format = "xml"

[[template.items]]
id = 1

[[template.items.states]]
state = "fixed"
content = "<build state=\"fixed\"/>"

[[template.items.branch_states]]
state = "fixed"
enabled = false
content = "<build state=\"fixed\" branch=\"${branchName}\"/>"
"#;

    #[test]
    fn parses_toml_layout() {
        let defs = parse_definitions(TOML_TEMPLATES, FileFormat::Toml).unwrap();
        assert_eq!(defs.len(), 1);
        let def = &defs[0];
        assert_eq!(def.id, "testXMLtemplate");
        assert_eq!(def.rank, 0);
        let item = &def.items[0];
        assert!(item.enabled);
        assert!(item.states[0].enabled);
        assert!(!item.branch_states[0].enabled);
        assert_eq!(item.states[0].content.text(), "<build state=\"fixed\"/>");
    }

    #[test]
    fn parses_json_layout() {
        let json = r#"{"template": [{"id": "j", "items": [{"id": 3, "states": [
            {"state": "success", "content": "{}"}]}]}]}"#;
        let defs = parse_definitions(json, FileFormat::Json).unwrap();
        assert_eq!(defs[0].items[0].id, 3);
        assert!(defs[0].items[0].branch_states.is_empty());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_definitions("[[template]\nid=", FileFormat::Toml).unwrap_err();
        assert!(matches!(err, TemplateError::TomlParseError(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_definitions("{\"template\": [", FileFormat::Json).unwrap_err();
        assert!(matches!(err, TemplateError::JsonParseError(_)));
    }

    #[test]
    fn record_without_id_still_parses() {
        let toml = "[[template]]\ndescription = \"no id\"\n\n[[template.items]]\nid = 1\n";
        let defs = parse_definitions(toml, FileFormat::Toml).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].id, "");
        assert!(matches!(
            defs[0].validate(),
            Err(TemplateError::InvalidDefinition { .. })
        ));
    }

    #[tokio::test]
    async fn async_load_matches_sync_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("templates.toml");
        fs::write(&path, TOML_TEMPLATES).unwrap();
        let source = FileSource::new(&path);

        let sync = source.load_definitions().unwrap();
        let async_defs = source.load_definitions_async().await.unwrap();
        assert_eq!(sync, async_defs);

        let missing = FileSource::new(dir.path().join("absent.toml"));
        assert!(matches!(
            missing.load_definitions_async().await,
            Err(TemplateError::ConfigError(_))
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let source = FileSource::new("/nonexistent/templates.toml");
        assert!(!source.exists());
        assert!(matches!(
            source.load_definitions(),
            Err(TemplateError::ConfigError(_))
        ));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(FileSource::new("a.JSON").format(), FileFormat::Json);
        assert_eq!(FileSource::new("a.toml").format(), FileFormat::Toml);
        assert_eq!(FileSource::new("templates").format(), FileFormat::Toml);
    }
}
