//! Special-case readers
//!
//! Attributes that live deep inside semantically typed sub-sequences cannot be
//! found by keyword. Each reader here walks one fixed path through the
//! dataset, always taking the first item of every sequence it descends into.

use crate::error::{LookupError, LookupResult};
use dicom_core::Tag;
use dicom_object::InMemDicomObject;
use std::collections::HashMap;

use super::tags::{
    element_by_tag, first_item, sequence_items, string_by_tag, CODE_MEANING, CODE_VALUE,
    CODING_SCHEME_DESIGNATOR, CONCEPT_CODE_SEQUENCE, CONCEPT_NAME_CODE_SEQUENCE, CONTENT_SEQUENCE,
    MEASUREMENT_UNITS_CODE_SEQUENCE, PERSON_NAME, QUANTITY_DEFINITION_SEQUENCE,
    REFERENCED_IMAGE_RWV_MAPPING_SEQUENCE, RWV_INTERCEPT, RWV_MAPPING_SEQUENCE, RWV_SLOPE,
    TEXT_VALUE,
};

/// Scope of the readers for Real-World-Value mapping objects
pub const RWV_SCOPE: &str = "RWV";

/// Scope of the document-wide Structured Report readers
pub const SR_SCOPE: &str = "SR";

/// A special reader: pure function of the dataset
pub type ReaderFn = fn(&InMemDicomObject) -> LookupResult<String>;

/// Explicit registry of special readers keyed by (scope, attribute)
///
/// A missing key only means there is no special reader for the attribute.
#[derive(Clone)]
pub struct ReaderRegistry {
    readers: HashMap<(String, String), ReaderFn>,
}

impl ReaderRegistry {
    /// Creates a registry without any reader
    pub fn empty() -> Self {
        Self {
            readers: HashMap::new(),
        }
    }

    /// Creates a registry holding every built-in reader
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register(RWV_SCOPE, "Units_CodeValue", |dcm| {
            string_by_tag(measurement_units_code(dcm)?, CODE_VALUE)
        });
        registry.register(RWV_SCOPE, "Units_CodingSchemeDesignator", |dcm| {
            string_by_tag(measurement_units_code(dcm)?, CODING_SCHEME_DESIGNATOR)
        });
        registry.register(RWV_SCOPE, "Units_CodeMeaning", |dcm| {
            string_by_tag(measurement_units_code(dcm)?, CODE_MEANING)
        });

        registry.register(RWV_SCOPE, "Quantity_CodeValue", |dcm| {
            string_by_tag(quantity(dcm)?, CODE_VALUE)
        });
        registry.register(RWV_SCOPE, "Quantity_CodingSchemeDesignator", |dcm| {
            string_by_tag(quantity(dcm)?, CODING_SCHEME_DESIGNATOR)
        });
        registry.register(RWV_SCOPE, "Quantity_CodeMeaning", |dcm| {
            string_by_tag(quantity(dcm)?, CODE_MEANING)
        });

        registry.register(RWV_SCOPE, "MeasurementMethod_CodeValue", |dcm| {
            string_by_tag(measurement_method(dcm)?, CODE_VALUE)
        });
        registry.register(RWV_SCOPE, "MeasurementMethod_CodingSchemeDesignator", |dcm| {
            string_by_tag(measurement_method(dcm)?, CODING_SCHEME_DESIGNATOR)
        });
        registry.register(RWV_SCOPE, "MeasurementMethod_CodeMeaning", |dcm| {
            string_by_tag(measurement_method(dcm)?, CODE_MEANING)
        });

        registry.register(RWV_SCOPE, "RealWorldValueIntercept", |dcm| {
            string_by_tag(rwv_mapping_item(dcm)?, RWV_INTERCEPT)
        });
        registry.register(RWV_SCOPE, "RealWorldValueSlope", |dcm| {
            string_by_tag(rwv_mapping_item(dcm)?, RWV_SLOPE)
        });

        registry.register(SR_SCOPE, "PersonObserverName", |dcm| {
            string_by_tag(content_item(dcm, "Person Observer Name")?, PERSON_NAME)
        });
        registry.register(SR_SCOPE, "DeviceObserverName", |dcm| {
            string_by_tag(content_item(dcm, "Device Observer Name")?, TEXT_VALUE)
        });
        registry.register(SR_SCOPE, "ObserverType", |dcm| {
            let item = content_item(dcm, "Observer Type")?;
            string_by_tag(first_item(item, CONCEPT_CODE_SEQUENCE)?, CODE_MEANING)
        });

        registry
    }

    /// Adds or replaces a reader
    pub fn register(&mut self, scope: &str, attribute: &str, reader: ReaderFn) {
        self.readers
            .insert((scope.to_string(), attribute.to_string()), reader);
    }

    /// Exact-key lookup
    pub fn get(&self, scope: &str, attribute: &str) -> Option<ReaderFn> {
        self.readers
            .get(&(scope.to_string(), attribute.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.readers.keys().collect();
        keys.sort();
        f.debug_struct("ReaderRegistry")
            .field("readers", &keys)
            .finish()
    }
}

/// Finds the concept code paired with a concept name
///
/// Scans items shaped ConceptNameCodeSequence/ConceptCodeSequence and returns
/// ConceptCodeSequence[0] of the first item whose concept name CodeMeaning
/// equals `meaning`. Items without a readable concept name are skipped.
pub fn concept_code_by_concept_name_meaning<'a>(
    items: &'a [InMemDicomObject],
    meaning: &str,
) -> LookupResult<&'a InMemDicomObject> {
    let item = find_by_concept_name(items, meaning)?;
    first_item(item, CONCEPT_CODE_SEQUENCE)
}

/// First item whose ConceptNameCodeSequence[0].CodeMeaning equals `meaning`
pub fn find_by_concept_name<'a>(
    items: &'a [InMemDicomObject],
    meaning: &str,
) -> LookupResult<&'a InMemDicomObject> {
    items
        .iter()
        .find(|item| concept_name_meaning(item).as_deref() == Some(meaning))
        .ok_or_else(|| LookupError::NoConceptMatch(meaning.to_string()))
}

fn concept_name_meaning(item: &InMemDicomObject) -> Option<String> {
    first_item(item, CONCEPT_NAME_CODE_SEQUENCE)
        .and_then(|name| string_by_tag(name, CODE_MEANING))
        .ok()
}

/// ReferencedImageRealWorldValueMappingSequence[0] > RealWorldValueMappingSequence[0]
fn rwv_mapping_item(dcm: &InMemDicomObject) -> LookupResult<&InMemDicomObject> {
    let referenced = first_item(dcm, REFERENCED_IMAGE_RWV_MAPPING_SEQUENCE)?;
    first_item(referenced, RWV_MAPPING_SEQUENCE)
}

fn measurement_units_code(dcm: &InMemDicomObject) -> LookupResult<&InMemDicomObject> {
    first_item(rwv_mapping_item(dcm)?, MEASUREMENT_UNITS_CODE_SEQUENCE)
}

fn quantity_definition<'a>(
    dcm: &'a InMemDicomObject,
    concept_name: &str,
) -> LookupResult<&'a InMemDicomObject> {
    let definitions = sub_sequence(rwv_mapping_item(dcm)?, QUANTITY_DEFINITION_SEQUENCE)?;
    concept_code_by_concept_name_meaning(definitions, concept_name)
}

fn quantity(dcm: &InMemDicomObject) -> LookupResult<&InMemDicomObject> {
    quantity_definition(dcm, "Quantity")
}

fn measurement_method(dcm: &InMemDicomObject) -> LookupResult<&InMemDicomObject> {
    quantity_definition(dcm, "Measurement Method")
}

/// Top-level ContentSequence item carrying the given concept name
fn content_item<'a>(
    dcm: &'a InMemDicomObject,
    concept_name: &str,
) -> LookupResult<&'a InMemDicomObject> {
    find_by_concept_name(sub_sequence(dcm, CONTENT_SEQUENCE)?, concept_name)
}

fn sub_sequence(dcm: &InMemDicomObject, tag: Tag) -> LookupResult<&[InMemDicomObject]> {
    element_by_tag(dcm, tag).and_then(sequence_items)
}
