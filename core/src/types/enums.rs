use std::fmt;

/// Kind of DICOM object, as announced by its Modality attribute
///
/// Only the kinds with a dedicated table in the rules schema are named;
/// everything else is carried as [`ObjectKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Mr,
    Ct,
    Pt,
    /// Structured Report
    Sr,
    /// Segmentation
    Seg,
    /// Real-World-Value mapping
    Rwv,
    Other(String),
}

impl ObjectKind {
    /// Parses a Modality value (case-sensitive, surrounding padding ignored)
    pub fn from_modality(modality: &str) -> Self {
        match modality.trim() {
            "MR" => ObjectKind::Mr,
            "CT" => ObjectKind::Ct,
            "PT" => ObjectKind::Pt,
            "SR" => ObjectKind::Sr,
            "SEG" => ObjectKind::Seg,
            "RWV" => ObjectKind::Rwv,
            other => ObjectKind::Other(other.to_string()),
        }
    }

    /// The Modality code, which is also the name of the per-kind table
    pub fn code(&self) -> &str {
        match self {
            ObjectKind::Mr => "MR",
            ObjectKind::Ct => "CT",
            ObjectKind::Pt => "PT",
            ObjectKind::Sr => "SR",
            ObjectKind::Seg => "SEG",
            ObjectKind::Rwv => "RWV",
            ObjectKind::Other(code) => code,
        }
    }

    /// Whether the rules schema has a top-level table for this kind
    pub fn has_table(&self) -> bool {
        !matches!(self, ObjectKind::Other(_))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MR", ObjectKind::Mr)]
    #[case("CT", ObjectKind::Ct)]
    #[case("PT", ObjectKind::Pt)]
    #[case("SR", ObjectKind::Sr)]
    #[case("SEG ", ObjectKind::Seg)]
    #[case("RWV", ObjectKind::Rwv)]
    #[case("MG", ObjectKind::Other("MG".to_string()))]
    fn test_from_modality(#[case] modality: &str, #[case] expected: ObjectKind) {
        assert_eq!(ObjectKind::from_modality(modality), expected);
    }

    #[test]
    fn test_code_round_trip() {
        for code in ["MR", "CT", "PT", "SR", "SEG", "RWV", "US"] {
            assert_eq!(ObjectKind::from_modality(code).code(), code);
        }
    }

    #[test]
    fn test_has_table() {
        assert!(ObjectKind::Seg.has_table());
        assert!(!ObjectKind::Other("MG".to_string()).has_table());
        assert_eq!(ObjectKind::Rwv.to_string(), "RWV");
    }
}
