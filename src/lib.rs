//! SSSOM Core: a data model, SSSOM/TSV codec, and the SSSOM/T
//! transformation DSL for the Simple Standard for Sharing Ontology
//! Mappings.
//!
//! The crate is organised the way the specification groups its
//! components:
//! - [`model`] — the mapping/mapping-set entities, the slot metamodel
//!   (component C), and extension-slot handling (component D).
//! - [`prefix`] — CURIE shortening/expansion and the Extended Prefix Map
//!   (components A/B).
//! - [`tsv`] — the SSSOM/TSV wire codec (component F).
//! - [`codec`] — the JSON/Turtle codec seams, unimplemented here.
//! - [`dsl`] — the SSSOM/T parser, filter evaluator, and mapping
//!   editor/formatter (components H–J).
//! - [`pipeline`] — the processing pipeline that runs a parsed programme
//!   against a mapping set (component K).
//! - [`variables`] — the Variable Manager (component L).
//! - [`reader_factory`] — wire-format classification and external-metadata
//!   resolution (component M).
//! - [`config`] — the explicit-argument configuration surface.
//! - [`error`] — the crate's error type.

pub mod codec;
pub mod config;
pub mod dsl;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod prefix;
pub mod reader_factory;
pub mod tsv;
pub mod variables;

pub use config::SssomConfig;
pub use error::{Result, SssomError};
pub use model::{Mapping, MappingBuilder, MappingSet, MappingSetCollection};
