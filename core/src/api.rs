use crate::diagnostics::Diagnostics;
use crate::error::{Dcm2TablesError, Result};
use crate::extraction::tags::{get_string_value, MODALITY, SOP_INSTANCE_UID};
use crate::extraction::{
    check_template, resolve_measurements, resolve_references, resolve_segment_frames,
    resolve_segments, resolve_top_level, MeasurementReport, ReaderRegistry, ResolveContext,
    Tid1500Converter,
};
use crate::types::tables::{
    COMPOSITE_CONTEXT, INSTANCE_TO_FILE, REFERENCES, SEG_SEGMENTS, SEG_SEGMENT_FRAMES,
};
use crate::types::{ObjectKind, ParserOptions, Record, RulesDictionary, TableSet};
use dicom_object::{open_file, InMemDicomObject};
use std::path::{Path, PathBuf};

/// Rule-driven flattening of one DICOM object into tables
///
/// The dataset is read once, when the parser is created. [`DicomParser::parse`]
/// then resolves every table the rules ask for that applies to the object.
///
/// # Example
///
/// ```
/// use dcm2tables_core::{DicomParser, ParserOptions, RulesDictionary};
/// use dicom_object::InMemDicomObject;
/// use dicom_core::{DataElement, PrimitiveValue, VR, Tag};
///
/// let mut dcm = InMemDicomObject::new_empty();
/// dcm.put(DataElement::new(
///     Tag(0x0008, 0x0018), // SOPInstanceUID
///     VR::UI,
///     PrimitiveValue::from("1.2.3.4"),
/// ));
/// dcm.put(DataElement::new(
///     Tag(0x0008, 0x0060), // Modality
///     VR::CS,
///     PrimitiveValue::from("MR"),
/// ));
/// dcm.put(DataElement::new(
///     Tag(0x0018, 0x0081), // EchoTime
///     VR::DS,
///     PrimitiveValue::from("12.5"),
/// ));
///
/// let rules = RulesDictionary::new()
///     .with_table("CompositeContext", ["SOPInstanceUID", "Modality"])
///     .with_table("MR", ["EchoTime", "RepetitionTime"]);
///
/// let options = ParserOptions::default();
/// let mut parser = DicomParser::from_object(dcm, "mr.dcm", rules, options).unwrap();
/// parser.parse().unwrap();
///
/// let mr = parser.tables().first("MR").unwrap();
/// assert_eq!(mr.get("EchoTime"), Some("12.5"));
/// assert_eq!(mr.field("RepetitionTime"), Some(None));
/// let instance = parser.tables().first("Instance2File").unwrap();
/// assert_eq!(instance.get("FileName"), Some("mr.dcm"));
/// ```
#[derive(Debug)]
pub struct DicomParser {
    path: PathBuf,
    dcm: InMemDicomObject,
    kind: ObjectKind,
    sop_instance_uid: String,
    rules: RulesDictionary,
    options: ParserOptions,
    readers: ReaderRegistry,
    diagnostics: Diagnostics,
    tables: TableSet,
}

impl DicomParser {
    /// Reads a DICOM file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read as a DICOM object
    /// - SOPInstanceUID or Modality is missing
    pub fn open(
        path: impl AsRef<Path>,
        rules: RulesDictionary,
        options: ParserOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let dcm = open_file(path)?.into_inner();
        Self::from_object(dcm, path, rules, options)
    }

    /// Wraps a dataset that is already in memory
    ///
    /// `path` is what the `Instance2File` table reports and what the TID 1500
    /// converter reads.
    pub fn from_object(
        dcm: InMemDicomObject,
        path: impl Into<PathBuf>,
        rules: RulesDictionary,
        options: ParserOptions,
    ) -> Result<Self> {
        let sop_instance_uid = get_string_value(&dcm, SOP_INSTANCE_UID)
            .ok_or_else(|| Dcm2TablesError::TagNotFound("SOPInstanceUID".to_string()))?;
        let modality = get_string_value(&dcm, MODALITY)
            .ok_or_else(|| Dcm2TablesError::TagNotFound("Modality".to_string()))?;

        let mut parser = Self {
            path: path.into(),
            dcm,
            kind: ObjectKind::from_modality(&modality),
            sop_instance_uid,
            rules,
            options,
            readers: ReaderRegistry::standard(),
            diagnostics: Diagnostics::default(),
            tables: TableSet::new(),
        };
        parser.tables = parser.seed_tables();
        Ok(parser)
    }

    /// Sends diagnostics to `logger` instead of discarding them
    pub fn with_logger(mut self, logger: &'static dyn log::Log) -> Self {
        self.diagnostics = Diagnostics::new(logger);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Replaces the special-case reader registry
    pub fn with_readers(mut self, readers: ReaderRegistry) -> Self {
        self.readers = readers;
        self
    }

    /// Builds every table that applies to this object
    ///
    /// Tables are rebuilt from scratch on every call. When measurement
    /// resolution fails, the tables resolved before it are kept and the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Only SR objects can fail here: unsupported template, converter not
    /// found, or converter failure.
    pub fn parse(&mut self) -> Result<()> {
        let mut tables = self.seed_tables();
        let result = self.resolve_into(&mut tables);
        self.tables = tables;
        result
    }

    fn resolve_into(&self, tables: &mut TableSet) -> Result<()> {
        let ctx = ResolveContext::new(&self.dcm, &self.readers, self.diagnostics);

        if let Some(attributes) = self.table_rules(COMPOSITE_CONTEXT) {
            tables.push(
                COMPOSITE_CONTEXT,
                resolve_top_level(&ctx, COMPOSITE_CONTEXT, attributes),
            );
        }

        tables.ensure_table(REFERENCES);
        for reference in resolve_references(&self.dcm, &self.sop_instance_uid, self.diagnostics) {
            tables.push(REFERENCES, reference.to_record());
        }

        if self.kind.has_table() {
            let table = self.kind.code();
            if let Some(attributes) = self.table_rules(table) {
                tables.push(table, resolve_top_level(&ctx, table, attributes));
            }
        }

        match self.kind {
            ObjectKind::Seg => {
                if let Some(attributes) = self.table_rules(SEG_SEGMENTS) {
                    tables.ensure_table(SEG_SEGMENTS);
                    for record in resolve_segments(&ctx, SEG_SEGMENTS, attributes) {
                        tables.push(SEG_SEGMENTS, record);
                    }
                }
                if let Some(attributes) = self.table_rules(SEG_SEGMENT_FRAMES) {
                    tables.ensure_table(SEG_SEGMENT_FRAMES);
                    for record in resolve_segment_frames(&ctx, SEG_SEGMENT_FRAMES, attributes) {
                        tables.push(SEG_SEGMENT_FRAMES, record);
                    }
                }
            }
            ObjectKind::Sr => {
                check_template(&self.dcm)?;
                let converter = Tid1500Converter::locate(&self.options)?;
                self.diagnostics.debug(format_args!(
                    "converting {} with {}",
                    self.path.display(),
                    converter.executable().display()
                ));
                let report = converter.convert(&self.path, &self.options.effective_temp_dir())?;
                resolve_measurements(&ctx, &self.rules, &report, tables);
            }
            _ => {}
        }

        Ok(())
    }

    /// Measurement tables for a converter report obtained elsewhere
    pub fn resolve_measurement_report(&self, report: &MeasurementReport) -> TableSet {
        let ctx = ResolveContext::new(&self.dcm, &self.readers, self.diagnostics);
        let mut tables = TableSet::new();
        resolve_measurements(&ctx, &self.rules, report, &mut tables);
        tables
    }

    fn seed_tables(&self) -> TableSet {
        let mut tables = TableSet::new();
        tables.push(
            INSTANCE_TO_FILE,
            Record::new()
                .with("SOPInstanceUID", Some(self.sop_instance_uid.clone()))
                .with("FileName", Some(self.path.display().to_string())),
        );
        tables
    }

    fn table_rules(&self, table: &str) -> Option<&[String]> {
        let attributes = self.rules.attributes(table);
        if attributes.is_none() {
            self.diagnostics
                .debug(format_args!("{}: no rules, table skipped", table));
        }
        attributes
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn into_tables(self) -> TableSet {
        self.tables
    }

    pub fn dataset(&self) -> &InMemDicomObject {
        &self.dcm
    }

    pub fn object_kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn sop_instance_uid(&self) -> &str {
        &self.sop_instance_uid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
