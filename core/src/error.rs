use thiserror::Error;

/// Result type for dcm2tables operations
pub type Result<T> = std::result::Result<T, Dcm2TablesError>;

/// Error types for dcm2tables operations
///
/// Only fatal conditions are represented here. Failures to resolve a single
/// attribute are [`LookupError`]s and never leave the resolver.
#[derive(Error, Debug)]
pub enum Dcm2TablesError {
    /// The input file could not be read as a DICOM object
    #[error("DICOM read error: {0}")]
    DatasetRead(String),

    /// An attribute the parser cannot work without is missing
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// The structured report follows a template that has no reader
    #[error("DICOM SR TID {0} is currently not supported")]
    UnsupportedTemplate(String),

    /// The TID 1500 converter executable could not be located
    #[error("External tool not found: {0}")]
    ExternalToolNotFound(String),

    /// The converter ran but failed, timed out, or produced unusable output
    #[error("External tool failed: {0}")]
    ExternalToolExecution(String),

    /// Malformed rules dictionary
    #[error("Invalid rules: {0}")]
    Rules(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TSV export error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for Dcm2TablesError {
    fn from(e: dicom_object::ReadError) -> Self {
        Dcm2TablesError::DatasetRead(format!("{}", e))
    }
}

/// Why a single resolution tier produced no value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No element with this keyword at the searched level
    #[error("{0} not found")]
    NotFound(String),

    /// The element exists but does not hold a sequence of items
    #[error("{0} is not a sequence")]
    NotASequence(String),

    /// The sequence exists but has no items
    #[error("{0} has no items")]
    EmptySequence(String),

    /// No item of a concept name/code list carries the wanted meaning
    #[error("no item with concept name \"{0}\"")]
    NoConceptMatch(String),

    /// The element exists but its value cannot be rendered as text
    #[error("cannot convert {0}: {1}")]
    Conversion(String, String),
}

impl LookupError {
    /// Whether this is a plain absence rather than a malformed value
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}

/// Result of a single resolution tier
pub type LookupResult<T> = std::result::Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Dcm2TablesError::UnsupportedTemplate("300".to_string());
        assert_eq!(
            err.to_string(),
            "DICOM SR TID 300 is currently not supported"
        );

        let err = LookupError::NotFound("SegmentLabel".to_string());
        assert_eq!(err.to_string(), "SegmentLabel not found");
        assert!(err.is_not_found());
        assert!(!LookupError::EmptySequence("ContentSequence".to_string()).is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Dcm2TablesError = io.into();
        assert!(matches!(err, Dcm2TablesError::IoError(_)));
    }
}
