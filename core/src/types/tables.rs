use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

// Table names produced by the parser
pub const INSTANCE_TO_FILE: &str = "Instance2File";
pub const COMPOSITE_CONTEXT: &str = "CompositeContext";
pub const REFERENCES: &str = "References";
pub const SEG_SEGMENTS: &str = "SEG_Segments";
pub const SEG_SEGMENT_FRAMES: &str = "SEG_SegmentFrames";
pub const SR1500_MEASUREMENT_GROUPS: &str = "SR1500_MeasurementGroups";
pub const SR1500_MEASUREMENTS: &str = "SR1500_Measurements";
pub const SR1500_QUALITATIVE_EVALUATIONS: &str = "SR1500_QualitativeEvaluations";

/// One flat row: attribute name to value, in insertion order
///
/// A `None` value marks an attribute that could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, keeping the original position when it already exists
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style variant of [`Record::insert`]
    pub fn with(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the field's value; `None` when absent or null
    pub fn get(&self, name: &str) -> Option<&str> {
        self.field(name).flatten()
    }

    /// Returns `Some(value)` when the field exists, even if it is null
    pub fn field(&self, name: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A reference from the parsed object to another SOP instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub source_sop_instance_uid: String,
    pub referenced_sop_class_uid: String,
    pub referenced_sop_instance_uid: String,
    pub referenced_series_instance_uid: String,
}

impl Reference {
    /// Flattens into a `References` table row
    pub fn to_record(&self) -> Record {
        Record::new()
            .with("SOPInstanceUID", Some(self.source_sop_instance_uid.clone()))
            .with(
                "ReferencedSOPClassUID",
                Some(self.referenced_sop_class_uid.clone()),
            )
            .with(
                "ReferencedSOPInstanceUID",
                Some(self.referenced_sop_instance_uid.clone()),
            )
            .with(
                "ReferencedSeriesInstanceUID",
                Some(self.referenced_series_instance_uid.clone()),
            )
    }
}

/// Table name to ordered list of records
///
/// Records are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableSet {
    tables: BTreeMap<String, Vec<Record>>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure a table exists, even when it ends up without records
    pub fn ensure_table(&mut self, table: &str) {
        if !self.tables.contains_key(table) {
            self.tables.insert(table.to_string(), Vec::new());
        }
    }

    pub fn push(&mut self, table: &str, record: Record) {
        self.ensure_table(table);
        if let Some(records) = self.tables.get_mut(table) {
            records.push(record);
        }
    }

    /// Records of a table, `None` when the table was never produced
    pub fn get(&self, table: &str) -> Option<&[Record]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// First record of a table, for single-row tables
    pub fn first(&self, table: &str) -> Option<&Record> {
        self.get(table).and_then(|records| records.first())
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.tables.iter().map(|(n, r)| (n.as_str(), r.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Appends every record of `other`, table by table
    pub fn merge(&mut self, other: TableSet) {
        for (name, records) in other.tables {
            self.tables.entry(name).or_default().extend(records);
        }
    }

    /// Union of attribute names across a table's records, first-seen order
    pub fn columns(&self, table: &str) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for record in self.get(table).unwrap_or_default() {
            for name in record.names() {
                if !columns.contains(&name) {
                    columns.push(name);
                }
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_insert_keeps_order() {
        let mut record = Record::new();
        record.insert("b", Some("1".to_string()));
        record.insert("a", None);
        record.insert("b", Some("2".to_string()));

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(record.get("b"), Some("2"));
        assert_eq!(record.get("a"), None);
        assert_eq!(record.field("a"), Some(None));
        assert_eq!(record.field("c"), None);
        assert!(record.contains("a"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_reference_record_schema() {
        let reference = Reference {
            source_sop_instance_uid: "1.1".to_string(),
            referenced_sop_class_uid: "1.2.840.10008.5.1.4.1.1.4".to_string(),
            referenced_sop_instance_uid: "1.2".to_string(),
            referenced_series_instance_uid: "1.3".to_string(),
        };
        let record = reference.to_record();

        assert_eq!(
            record.names().collect::<Vec<_>>(),
            vec![
                "SOPInstanceUID",
                "ReferencedSOPClassUID",
                "ReferencedSOPInstanceUID",
                "ReferencedSeriesInstanceUID"
            ]
        );
        assert_eq!(record.get("ReferencedSeriesInstanceUID"), Some("1.3"));
    }

    #[test]
    fn test_table_set_merge_and_columns() {
        let mut left = TableSet::new();
        left.push(
            SEG_SEGMENTS,
            Record::new().with("SegmentNumber", Some("1".to_string())),
        );

        let mut right = TableSet::new();
        right.push(
            SEG_SEGMENTS,
            Record::new()
                .with("SegmentNumber", Some("2".to_string()))
                .with("SegmentLabel", None),
        );
        right.ensure_table(REFERENCES);

        left.merge(right);

        assert_eq!(left.get(SEG_SEGMENTS).unwrap().len(), 2);
        assert_eq!(left.get(REFERENCES).unwrap().len(), 0);
        assert_eq!(
            left.columns(SEG_SEGMENTS),
            vec!["SegmentNumber", "SegmentLabel"]
        );
        assert!(left.columns("missing").is_empty());
    }

    #[test]
    fn test_table_set_serialize() {
        let mut tables = TableSet::new();
        tables.push(
            COMPOSITE_CONTEXT,
            Record::new()
                .with("PatientID", Some("p1".to_string()))
                .with("StudyDate", None),
        );

        let json = serde_json::to_string(&tables).unwrap();
        assert_eq!(
            json,
            r#"{"CompositeContext":[{"PatientID":"p1","StudyDate":null}]}"#
        );
    }
}
