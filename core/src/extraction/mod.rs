pub mod context;
pub mod converter;
pub mod measurements;
pub mod readers;
pub mod references;
pub mod segments;
pub mod tags;
pub mod top_level;

pub use context::ResolveContext;
pub use converter::{find_tid1500_reader, Tid1500Converter, TID1500_READER};
pub use measurements::{
    check_template, resolve_measurements, template_identifier, MeasurementGroup, MeasurementReport,
    SUPPORTED_TEMPLATE,
};
pub use readers::{concept_code_by_concept_name_meaning, ReaderFn, ReaderRegistry};
pub use references::resolve_references;
pub use segments::{recursive_find_in_dataset, resolve_segment_frames, resolve_segments};
pub use tags::*;
pub use top_level::resolve_top_level;
