//! Versioned template resources for generated bundles.
//!
//! A template set is a TOML document holding the four bundle templates with
//! `{{name}}` slots. The built-in set is embedded at compile time and parsed
//! once per process; operators can point `PUBLISH_TEMPLATES` at a replacement.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

/// Highest template-set format version this build understands.
pub const SUPPORTED_VERSION: u32 = 1;

const BUILTIN_SOURCE: &str = include_str!("../../templates/default.toml");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("failed to read template set {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid template set: {0}")]
    Parse(String),

    #[error("unsupported template set version {found} (max {max})")]
    UnsupportedVersion { found: u32, max: u32 },

    #[error("template `{template}` is missing required slot {{{{{slot}}}}}")]
    MissingSlot {
        template: &'static str,
        slot: &'static str,
    },
}

/// The four bundle templates plus version metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSet {
    pub version: u32,
    pub name: String,
    pub manifest: String,
    pub build_file: String,
    pub description: String,
    pub service: String,
}

/// Slots each template must contain to render a working bundle.
const REQUIRED_SLOTS: &[(&str, &[&str])] = &[
    ("build_file", &["artifact_file", "internal_artifact", "port"]),
    ("description", &["model_name", "generated_at"]),
    ("service", &["internal_artifact", "request_fields", "feature_vector"]),
];

static BUILTIN: OnceLock<Result<TemplateSet, TemplateError>> = OnceLock::new();

impl TemplateSet {
    /// The embedded template set, parsed and validated on first use.
    pub fn builtin() -> Result<&'static TemplateSet, TemplateError> {
        BUILTIN
            .get_or_init(|| Self::from_toml(BUILTIN_SOURCE))
            .as_ref()
            .map_err(|e| e.clone())
    }

    /// Load a template set from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a template set.
    pub fn from_toml(source: &str) -> Result<Self, TemplateError> {
        let set: TemplateSet =
            toml::from_str(source).map_err(|e| TemplateError::Parse(e.to_string()))?;
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> Result<(), TemplateError> {
        if self.version == 0 || self.version > SUPPORTED_VERSION {
            return Err(TemplateError::UnsupportedVersion {
                found: self.version,
                max: SUPPORTED_VERSION,
            });
        }

        for (template, slots) in REQUIRED_SLOTS {
            let body = self.body(template);
            if let Some(slot) = slots.iter().find(|slot| !body.contains(&placeholder(slot))) {
                return Err(TemplateError::MissingSlot {
                    template: *template,
                    slot: *slot,
                });
            }
        }
        Ok(())
    }

    fn body(&self, template: &str) -> &str {
        match template {
            "manifest" => &self.manifest,
            "build_file" => &self.build_file,
            "description" => &self.description,
            _ => &self.service,
        }
    }
}

fn placeholder(slot: &str) -> String {
    format!("{{{{{}}}}}", slot)
}

/// Fill `{{slot}}` occurrences in a single pass. Unknown slots are left
/// untouched, and inserted values are never scanned for slots.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let filled = after.find("}}").and_then(|end| {
            let slot = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == slot)
                .map(|(_, value)| (end, *value))
        });
        match filled {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
