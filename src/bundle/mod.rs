//! Bundle generation.
//!
//! Renders the four deployment files of a prediction service from a
//! [`TemplateSet`], the model metadata and the extracted field list. Rendering
//! is pure; [`Bundle::write_to`] is the only filesystem side effect.

mod service;
mod templates;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{PublishError, SchemaFormatError};
use crate::schema::{self, FieldSpec};

pub use service::{assembled_features, declared_members, string_literal, ServiceFragments};
pub use templates::{render, TemplateError, TemplateSet, SUPPORTED_VERSION};

/// Dependency manifest filename.
pub const MANIFEST_FILE: &str = "requirements.txt";
/// Container build filename.
pub const BUILD_FILE: &str = "Dockerfile";
/// Description document filename.
pub const DESCRIPTION_FILE: &str = "README.md";
/// Generated service source filename.
pub const SERVICE_FILE: &str = "main.py";
/// Name the artifact is copied to inside the container.
pub const INTERNAL_ARTIFACT: &str = "model.pkl";
/// Port the generated service listens on.
pub const SERVICE_PORT: u16 = 7860;

/// A rendered bundle file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub name: &'static str,
    pub contents: String,
}

/// The generated deployment files, ready to be written into a workspace.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub manifest: BundleFile,
    pub build_file: BundleFile,
    pub description: BundleFile,
    pub service: BundleFile,
    pub fields: Vec<FieldSpec>,
}

/// Inputs that vary per publish.
#[derive(Debug, Clone)]
pub struct BundleSpec<'a> {
    pub model_name: &'a str,
    /// Artifact filename as stored in the bundle root.
    pub artifact_file: &'a str,
    pub generated_at: DateTime<Utc>,
}

impl<'a> BundleSpec<'a> {
    pub fn new(model_name: &'a str, artifact_file: &'a str) -> Self {
        Self {
            model_name,
            artifact_file,
            generated_at: Utc::now(),
        }
    }
}

impl Bundle {
    /// Extract the field list and render every file.
    ///
    /// Schema errors surface before anything is rendered or written.
    pub fn generate(
        templates: &TemplateSet,
        spec: &BundleSpec<'_>,
        schema_text: &str,
    ) -> Result<Self, SchemaFormatError> {
        let fields = schema::extract_fields(schema_text)?;
        Ok(Self::from_fields(templates, spec, fields))
    }

    /// Render every file from an already extracted field list.
    pub fn from_fields(templates: &TemplateSet, spec: &BundleSpec<'_>, fields: Vec<FieldSpec>) -> Self {
        let port = SERVICE_PORT.to_string();
        let model_name = single_line(spec.model_name);
        let generated_at = spec.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let fragments = ServiceFragments::from_fields(&fields);
        let model_name_literal = string_literal(&format!("{} Prediction API", model_name));
        let input_fields = fields
            .iter()
            .map(|f| format!("- `{}` (number)", f.raw_name))
            .collect::<Vec<_>>()
            .join("\n");

        let manifest = templates.manifest.clone();
        let build_file = render(
            &templates.build_file,
            &[
                ("artifact_file", spec.artifact_file),
                ("internal_artifact", INTERNAL_ARTIFACT),
                ("port", &port),
            ],
        );
        let description = render(
            &templates.description,
            &[
                ("model_name", &model_name),
                ("model_name_literal", &model_name_literal),
                ("generated_at", &generated_at),
                ("port", &port),
                ("input_fields", &input_fields),
            ],
        );
        let service = render(
            &templates.service,
            &[
                ("internal_artifact", INTERNAL_ARTIFACT),
                ("model_name_literal", &model_name_literal),
                ("request_fields", &fragments.request_fields),
                ("feature_vector", &fragments.feature_vector),
                ("input_log", &fragments.input_log),
            ],
        );

        Self {
            manifest: BundleFile { name: MANIFEST_FILE, contents: manifest },
            build_file: BundleFile { name: BUILD_FILE, contents: build_file },
            description: BundleFile { name: DESCRIPTION_FILE, contents: description },
            service: BundleFile { name: SERVICE_FILE, contents: service },
            fields,
        }
    }

    pub fn files(&self) -> [&BundleFile; 4] {
        [&self.manifest, &self.build_file, &self.description, &self.service]
    }

    /// Write every file into `dir`, returning the written paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
        self.files()
            .iter()
            .map(|file| {
                let path = dir.join(file.name);
                std::fs::write(&path, &file.contents)
                    .map_err(|e| PublishError::io_at("write", &path, e))?;
                Ok(path)
            })
            .collect()
    }

    /// Async form of [`Bundle::write_to`].
    pub async fn stage_into(&self, dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
        let mut written = Vec::with_capacity(4);
        for file in self.files() {
            let path = dir.join(file.name);
            tokio::fs::write(&path, &file.contents)
                .await
                .map_err(|e| PublishError::io_at("write", &path, e))?;
            written.push(path);
        }
        Ok(written)
    }
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
