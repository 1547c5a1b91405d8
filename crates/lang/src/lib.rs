//! # sigscout-lang
//!
//! Language integration layer for structural discovery.
//!
//! The core pipeline is language-agnostic behind [`LanguageIntegration`]:
//! an integration turns one source file into [`FileMetadata`] (declared
//! structures, their methods/fields/inheritance and how each one is
//! exported), optionally contributes language-specific score components,
//! and, for dynamically loaded hosts, can probe a module at runtime
//! through a subprocess with a hard timeout and bounded output.
//!
//! Ships one production integration: JavaScript/TypeScript via tree-sitter.

mod error;
mod integration;
mod javascript;
mod metadata;
mod runtime;

pub use error::{IntegrationError, Result};
pub use integration::{LanguageIntegration, ScoreComponent};
pub use javascript::JsIntegration;
pub use metadata::{AccessDescriptor, FileMetadata, ResolvedTarget, StructureInfo};
pub use runtime::{probe_node_exports, ProbeLimits, RuntimeExport};
