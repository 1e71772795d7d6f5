//! Space Publish
//!
//! Turns an uploaded model artifact plus a loose description of its input
//! fields into a runnable prediction-service bundle, and publishes that bundle
//! to a git-backed hosting space.
//!
//! # Pipeline
//!
//! 1. [`schema`] parses the field description into an ordered field list.
//! 2. [`bundle`] renders the manifest, build file, description and service.
//! 3. [`naming`] draws a fresh destination name under the hosting account.
//! 4. [`transport`] runs init, remote, add, commit and push with per-step
//!    timeouts and redacted diagnostics.
//! 5. [`publisher`] owns the [`workspace`] for the attempt and removes it on
//!    every exit path.
//!
//! # Example
//!
//! ```no_run
//! use space_publish::{config, ArtifactUpload, PublishRequest, Publisher};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let publisher = Publisher::from_env(&config::load())?;
//! let artifact = ArtifactUpload::from_path("model.pkl".as_ref()).await?;
//! let result = publisher
//!     .run_publish(PublishRequest {
//!         owner: "alice".into(),
//!         model_name: "Credit Scorer".into(),
//!         schema_text: r#"{"age": 0, "income": 0}"#.into(),
//!         artifact,
//!     })
//!     .await?;
//! println!("{} -> {}", result.space_id, result.endpoint_url);
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod naming;
pub mod publisher;
pub mod schema;
pub mod telemetry;
pub mod transport;
pub mod workspace;

pub use bundle::{Bundle, BundleSpec, TemplateError, TemplateSet};
pub use error::{ArtifactError, DeploymentFailure, PublishError, PublishFailure, SchemaFormatError};
pub use naming::SpaceTarget;
pub use publisher::{
    ArtifactUpload, HostingTarget, PublishRequest, PublishResult, Publisher, PublisherConfig,
};
pub use schema::{extract_fields, FieldSpec, FieldType};
pub use transport::{CommandOutcome, CommandRunner, CommandSpec, OutputPolicy, ProcessRunner};
pub use workspace::{PublishState, Workspace};
