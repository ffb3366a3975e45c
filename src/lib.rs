//! OXA Schema
//!
//! Schema composition and document validation for OXA documents.
//!
//! ## Features
//!
//! - **Modular Schema**: one YAML fragment per node type, composed into a single
//!   canonical draft-07 schema with internal references
//! - **Reproducible Artifacts**: composition is deterministic and checksummed
//! - **Strict Compilation**: unknown schema keywords fail at compile time
//! - **Cached Validators**: one compiled validator per requested type
//! - **Actionable Errors**: every violation is reported, narrowed through
//!   unions, localized to line/column and paired with a suggestion
//!
//! ## Architecture
//!
//! ```text
//! schema/*.yaml ──► fragment ──► compose ──► ComposedSchema
//!                                                 │
//!                                          SchemaRegistry (lint + engine + cache)
//!                                                 │
//! text/file ──► dispatch ──► validate ──► ValidationResult ──► report
//!                                 │
//!                         locate + suggest
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use oxa_schema::{validate_text, Encoding, SchemaRegistry, ValidateOptions};
//!
//! let registry = SchemaRegistry::embedded()?;
//! let result = validate_text(&registry, "{ \"type\": \"Document\" }", Encoding::Json, &ValidateOptions::new());
//! assert!(!result.valid);
//! # Ok::<(), oxa_schema::SchemaError>(())
//! ```

pub mod checksum;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod drift;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod lint;
pub mod locate;
pub mod pointer;
pub mod registry;
pub mod report;
pub mod suggest;
pub mod validate;
pub mod version;

pub use checksum::Checksum;
pub use compose::{compose, ComposeOptions, ComposedSchema};
pub use config::{OxaConfig, PrettyMode};
pub use dispatch::{validate_path, validate_path_as, validate_text, Encoding};
pub use drift::{detect_drift, ArtifactDrift};
pub use engine::{ConstraintEngine, JsonSchemaEngine, Validator, Violation};
pub use error::{Result, SchemaError};
pub use fragment::SchemaFragment;
pub use lint::KeywordLinter;
pub use locate::{SourceLocation, SourceMap};
pub use registry::{CompiledValidator, SchemaRegistry, TypeKey};
pub use report::render_pretty;
pub use validate::{validate, ValidateOptions, ValidationError, ValidationResult};
pub use version::SchemaVersion;
