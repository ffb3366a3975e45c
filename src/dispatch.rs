//! Format dispatch: text and files in, validation results out
//!
//! Read and parse failures short-circuit into a single error; only a
//! successfully parsed document reaches the validator.

use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::pointer;
use crate::registry::SchemaRegistry;
use crate::validate::{validate, ValidateOptions, ValidationError, ValidationResult};

/// Input text encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Json,
    Yaml,
}

impl Encoding {
    /// `.yaml` / `.yml` files are YAML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    fn parse(self, text: &str) -> Result<Value, String> {
        match self {
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Yaml => write!(f, "YAML"),
        }
    }
}

/// Parse `text` and validate it
///
/// JSON text doubles as the localization source; YAML errors carry no
/// location.
pub fn validate_text(
    registry: &SchemaRegistry,
    text: &str,
    encoding: Encoding,
    options: &ValidateOptions<'_>,
) -> ValidationResult {
    let document = match encoding.parse(text) {
        Ok(document) => document,
        Err(reason) => {
            debug!(%encoding, %reason, "document failed to parse");
            let error = ValidationError::new(pointer::ROOT, "parse", format!("Invalid {}: {}", encoding, reason));
            return finish(ValidationResult::failure(error), options, None);
        }
    };

    let options = ValidateOptions {
        source_text: match encoding {
            Encoding::Json => Some(text),
            Encoding::Yaml => None,
        },
        ..*options
    };
    validate(registry, &document, &options)
}

/// Read `path` and validate it, choosing the parser by extension
pub fn validate_path(registry: &SchemaRegistry, path: &Path, options: &ValidateOptions<'_>) -> ValidationResult {
    validate_path_as(registry, path, Encoding::from_path(path), options)
}

/// Read `path` and validate it as `encoding`, whatever its extension
pub fn validate_path_as(
    registry: &SchemaRegistry,
    path: &Path,
    encoding: Encoding,
    options: &ValidateOptions<'_>,
) -> ValidationResult {
    match fs::read_to_string(path) {
        Ok(text) => validate_text(registry, &text, encoding, options),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "document could not be read");
            let error = ValidationError::new(
                pointer::ROOT,
                "file",
                format!("Failed to read file: {}: {}", path.display(), e),
            );
            finish(ValidationResult::failure(error), options, None)
        }
    }
}

fn finish(result: ValidationResult, options: &ValidateOptions<'_>, source: Option<&str>) -> ValidationResult {
    if options.pretty {
        result.with_pretty(source)
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{ "type": "Document", "title": [], "children": [] }"#;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::embedded().unwrap()
    }

    #[test]
    fn test_encoding_from_path() {
        assert_eq!(Encoding::from_path(Path::new("doc.yaml")), Encoding::Yaml);
        assert_eq!(Encoding::from_path(Path::new("doc.YML")), Encoding::Yaml);
        assert_eq!(Encoding::from_path(Path::new("doc.json")), Encoding::Json);
        assert_eq!(Encoding::from_path(Path::new("doc.txt")), Encoding::Json);
        assert_eq!(Encoding::from_path(Path::new("doc")), Encoding::Json);
    }

    #[test]
    fn test_valid_json_text() {
        let result = validate_text(&registry(), VALID, Encoding::Json, &ValidateOptions::new());
        assert!(result.valid);
    }

    #[test]
    fn test_malformed_json() {
        let result = validate_text(&registry(), "{ not valid json", Encoding::Json, &ValidateOptions::new());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].keyword, "parse");
        assert!(result.errors[0].message.starts_with("Invalid JSON: "));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = validate_text(&registry(), "type: [unclosed", Encoding::Yaml, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].keyword, "parse");
        assert!(result.errors[0].message.starts_with("Invalid YAML: "));
    }

    #[test]
    fn test_yaml_errors_not_localized() {
        let text = "type: Document\ntitle: []\n";
        let result = validate_text(&registry(), text, Encoding::Yaml, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].params["missingProperty"], "children");
        assert!(result.errors[0].location.is_none());
    }

    #[test]
    fn test_json_errors_localized() {
        let text = "{\n  \"type\": \"Document\",\n  \"title\": [],\n  \"children\": [{ \"type\": \"Code\" }]\n}";
        let result = validate_text(&registry(), text, Encoding::Json, &ValidateOptions::new());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "/children/0");
        let location = result.errors[0].location.unwrap();
        assert_eq!((location.line, location.column), (4, 16));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_path(
            &registry(),
            Path::new("/definitely/not/here.json"),
            &ValidateOptions::new().with_pretty(true),
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].keyword, "file");
        assert!(result.errors[0].message.contains("Failed to read file"));
        assert!(result.pretty_output.unwrap().contains("[file]"));
    }

    #[test]
    fn test_path_dispatch() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "type: Document\ntitle: []\nchildren: []").unwrap();
        assert!(validate_path(&registry(), file.path(), &ValidateOptions::new()).valid);

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", VALID).unwrap();
        assert!(validate_path(&registry(), file.path(), &ValidateOptions::new()).valid);
    }

    #[test]
    fn test_explicit_encoding_overrides_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "type: Document\ntitle: []\nchildren: []").unwrap();
        let registry = registry();

        let result = validate_path(&registry, file.path(), &ValidateOptions::new());
        assert_eq!(result.errors[0].keyword, "parse");

        let result = validate_path_as(&registry, file.path(), Encoding::Yaml, &ValidateOptions::new());
        assert!(result.valid);
    }
}
