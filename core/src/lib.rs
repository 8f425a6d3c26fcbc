pub mod api;
pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod extraction;
pub mod types;

pub use api::DicomParser;
pub use cli::report::TextReport;
pub use diagnostics::Diagnostics;
pub use error::{Dcm2TablesError, LookupError, Result};
pub use extraction::{MeasurementReport, ReaderRegistry};
pub use types::*;
