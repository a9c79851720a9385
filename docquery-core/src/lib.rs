//! Translation of loosely-formatted query text into canonical store documents.
//!
//! This crate is the core of the docquery project and provides:
//!
//! - **Literal parsing** ([`literal`]) - Hybrid JSON/quoted-literal text into canonical values
//! - **Document conversion** ([`document`]) - Canonical values into BSON documents
//! - **Identifier normalization** ([`identifier`]) - String `_id` values into native identifiers
//! - **Projections** ([`projection`]) - Comma separated field lists into projection documents
//! - **Result shaping** ([`result`]) - Matched documents into structured or raw output
//! - **Backend abstraction** ([`backend`]) - The driver seam translated documents are handed to
//! - **Sessions** ([`session`]) - Text-level operations tying the above together
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! Everything except [`backend`] and [`session`] is pure and synchronous, and
//! can be called from any number of threads at once.
//!
//! # Example
//!
//! ```ignore
//! use docquery::{identifier::normalize_identifier, literal::parse_document};
//!
//! let criteria = normalize_identifier(parse_document("{'_id': '507f1f77bcf86cd799439011', 'in_use': FALSE}")?)?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docquery_core;

pub mod backend;
pub mod document;
pub mod error;
pub mod identifier;
pub mod literal;
pub mod projection;
pub mod result;
pub mod session;
