use std::path::PathBuf;
use std::time::Duration;

/// Default limit on how long the TID 1500 converter may run
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for a [`crate::DicomParser`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Base directory for converter scratch files; system temp dir when unset
    pub temp_dir: Option<PathBuf>,

    /// Directory holding the dcmqi executables; `PATH` is searched when unset
    pub dcmqi_path: Option<PathBuf>,

    /// Converter time limit; `None` waits indefinitely
    pub converter_timeout: Option<Duration>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            temp_dir: None,
            dcmqi_path: None,
            converter_timeout: Some(DEFAULT_CONVERTER_TIMEOUT),
        }
    }
}

impl ParserOptions {
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_dcmqi_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dcmqi_path = Some(dir.into());
        self
    }

    pub fn with_converter_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.converter_timeout = timeout;
        self
    }

    /// Scratch base directory actually used
    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ParserOptions::default();
        assert_eq!(options.converter_timeout, Some(DEFAULT_CONVERTER_TIMEOUT));
        assert!(options.dcmqi_path.is_none());
        assert_eq!(options.effective_temp_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_builder() {
        let options = ParserOptions::default()
            .with_temp_dir("/scratch")
            .with_dcmqi_path("/opt/dcmqi/bin")
            .with_converter_timeout(None);
        assert_eq!(options.effective_temp_dir(), PathBuf::from("/scratch"));
        assert_eq!(options.dcmqi_path, Some(PathBuf::from("/opt/dcmqi/bin")));
        assert!(options.converter_timeout.is_none());
    }
}
