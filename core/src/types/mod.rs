//! Core type definitions for table extraction
//!
//! This module provides the fundamental types used throughout the dcm2tables library:
//! - [`RulesDictionary`]: Table name to attribute list configuration
//! - [`AttributeSpec`]: Plain keyword or `Group_Field` compound specifier
//! - [`TableSet`], [`Record`]: Extracted tables and their flat rows
//! - [`Reference`]: Link from the parsed object to another SOP instance
//! - [`ObjectKind`]: Object classification by Modality
//! - [`ParserOptions`]: Scratch directory, converter location and timeout

mod enums;
mod options;
mod rules;
pub mod tables;

pub use enums::ObjectKind;
pub use options::{ParserOptions, DEFAULT_CONVERTER_TIMEOUT};
pub use rules::{AttributeSpec, RulesDictionary, SPEC_SEPARATOR};
pub use tables::{Record, Reference, TableSet};
