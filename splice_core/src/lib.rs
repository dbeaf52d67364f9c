//! `splice_core` is the engine behind [splice](https://github.com/splice-rs/splice). It copies a
//! value from one structured document into fields of other documents, including fields that
//! hold serialized payloads of their own: YAML, JSON, TOML or INI text, base64 data, or free text
//! addressed with a regular expression.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Replacement rules (in order)
//!   → Resolver (select exactly one source document, read and refine its value)
//!   → Applicator (select target documents, find or create target fields)
//!   → Extended path (decode nested payloads outer → inner, set, re-encode inner → outer)
//! ```
//!
//! ## Extended paths
//!
//! A field path may continue inside the payload of a scalar field. Each `!!<encoding>` token
//! decodes the current payload; the tokens that follow address a value inside it:
//!
//! ```text
//! data.values\.yaml.!!yaml.common.targetRevision
//! data.ssh-config.!!base64.!!regex.\s+HostName\s+(\S+).1
//! spec.source.helm.parameters.[name=image.tag].value
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Loading replacement configurations, referenced rule files and source document
//!   sets.
//! - [`selector`]: Resource identities (including renamed resources) and selector matching.
//!
//! ## Key Types
//!
//! - [`Replacement`]: A single rule, pairing a [`SourceSelector`] and its [`TargetSelector`]s.
//! - [`ReplacementEngine`]: Applies an ordered list of replacements to a document list.
//! - [`ExtendedPath`]: A field path with an optional chain of encoding segments.
//! - [`Extender`]: A decoded payload that can be read, modified and re-encoded.
//! - [`Document`]: One structured resource.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use splice_core::ReplacementConfig;
//! use splice_core::parse_documents;
//! use splice_core::write_documents;
//! use std::path::Path;
//!
//! let config = ReplacementConfig::load(Path::new("replacements.yaml")).unwrap();
//! let engine = config.resolve(Path::new(".")).unwrap();
//!
//! let input = std::fs::read_to_string("resources.yaml").unwrap();
//! let mut documents = parse_documents(&input, "resources.yaml").unwrap();
//! engine.apply(&mut documents).unwrap();
//! print!("{}", write_documents(&documents).unwrap());
//! ```

pub use config::*;
pub use document::*;
pub use engine::*;
pub use error::*;
pub use extender::*;
pub use path::*;
pub use replacement::*;
pub use selector::*;

pub mod config;
mod document;
mod engine;
#[allow(unused_assignments)]
mod error;
mod extender;
mod path;
mod replacement;
pub mod selector;
pub(crate) mod tree;

#[cfg(test)]
mod __fixtures;
