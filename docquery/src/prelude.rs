//! Convenient re-exports of commonly used types from docquery.
//!
//! ```ignore
//! use docquery::prelude::*;
//! ```
//!
//! This provides access to:
//! - Literal parsing and identifier normalization
//! - Projection building
//! - Result modes and output
//! - Sessions, backends and error types

pub use docquery_core::{
    backend::{QueryBackend, QueryBackendBuilder, ReturnDocument},
    identifier::{DocumentId, ID_FIELD, normalize_identifier, normalize_identifier_key},
    literal::{parse, parse_document, parse_pipeline},
    projection::{IdentifierFlag, ProjectionBuilder, ProjectionSpec, build_projection},
    result::{QueryOutput, ResultMode, render_pairs, serialize},
    session::{QuerySession, translate},
    error::{QueryError, QueryResult},
};
