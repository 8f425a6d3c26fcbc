use crate::error::{LookupError, LookupResult};
use dicom_core::dictionary::DataDictionary;
use dicom_core::header::Header;
use dicom_core::Tag;
use dicom_dictionary_std::StandardDataDictionary;
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;

// Identification Tags
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);

// Reference Tags
pub const REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x0008, 0x1115);
pub const REFERENCED_INSTANCE_SEQUENCE: Tag = Tag(0x0008, 0x114A);
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);
pub const REFERENCED_SOP_SEQUENCE: Tag = Tag(0x0008, 0x1199);
pub const CURRENT_REQUESTED_PROCEDURE_EVIDENCE_SEQUENCE: Tag = Tag(0x0040, 0xA375);

// Code Sequence Tags
pub const CODE_VALUE: Tag = Tag(0x0008, 0x0100);
pub const CODING_SCHEME_DESIGNATOR: Tag = Tag(0x0008, 0x0102);
pub const CODE_MEANING: Tag = Tag(0x0008, 0x0104);
pub const CONCEPT_NAME_CODE_SEQUENCE: Tag = Tag(0x0040, 0xA043);
pub const CONCEPT_CODE_SEQUENCE: Tag = Tag(0x0040, 0xA168);

// Structured Report Tags
pub const VALUE_TYPE: Tag = Tag(0x0040, 0xA040);
pub const PERSON_NAME: Tag = Tag(0x0040, 0xA123);
pub const TEXT_VALUE: Tag = Tag(0x0040, 0xA160);
pub const CONTENT_TEMPLATE_SEQUENCE: Tag = Tag(0x0040, 0xA504);
pub const CONTENT_SEQUENCE: Tag = Tag(0x0040, 0xA730);
pub const TEMPLATE_IDENTIFIER: Tag = Tag(0x0040, 0xDB00);

// Real World Value Mapping Tags
pub const MEASUREMENT_UNITS_CODE_SEQUENCE: Tag = Tag(0x0040, 0x08EA);
pub const REFERENCED_IMAGE_RWV_MAPPING_SEQUENCE: Tag = Tag(0x0040, 0x9094);
pub const RWV_MAPPING_SEQUENCE: Tag = Tag(0x0040, 0x9096);
pub const QUANTITY_DEFINITION_SEQUENCE: Tag = Tag(0x0040, 0x9220);
pub const RWV_INTERCEPT: Tag = Tag(0x0040, 0x9224);
pub const RWV_SLOPE: Tag = Tag(0x0040, 0x9225);

// Segmentation Tags
pub const FRAME_ANATOMY_SEQUENCE: Tag = Tag(0x0020, 0x9071);
pub const FRAME_LATERALITY: Tag = Tag(0x0020, 0x9072);
pub const SEGMENT_SEQUENCE: Tag = Tag(0x0062, 0x0002);
pub const SEGMENTED_PROPERTY_CATEGORY_CODE_SEQUENCE: Tag = Tag(0x0062, 0x0003);
pub const SEGMENT_NUMBER: Tag = Tag(0x0062, 0x0004);
pub const SEGMENT_LABEL: Tag = Tag(0x0062, 0x0005);
pub const SEGMENT_IDENTIFICATION_SEQUENCE: Tag = Tag(0x0062, 0x000A);
pub const REFERENCED_SEGMENT_NUMBER: Tag = Tag(0x0062, 0x000B);
pub const SHARED_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag(0x5200, 0x9229);
pub const PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag(0x5200, 0x9230);

/// Looks up the dictionary keyword of a tag
pub fn keyword_of(tag: Tag) -> Option<&'static str> {
    StandardDataDictionary.by_tag(tag).map(|entry| entry.alias)
}

/// Human-readable name of a tag for diagnostics
pub fn tag_name(tag: Tag) -> String {
    keyword_of(tag)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}", tag))
}

/// Finds an element of this dataset level by its keyword
///
/// Unknown keywords and absent elements both yield [`LookupError::NotFound`].
pub fn element_by_keyword<'a>(
    dcm: &'a InMemDicomObject,
    keyword: &str,
) -> LookupResult<&'a InMemElement> {
    dcm.element_by_name(keyword)
        .map_err(|_| LookupError::NotFound(keyword.to_string()))
}

/// Finds an element of this dataset level by its tag
pub fn element_by_tag(dcm: &InMemDicomObject, tag: Tag) -> LookupResult<&InMemElement> {
    dcm.element(tag)
        .map_err(|_| LookupError::NotFound(tag_name(tag)))
}

/// Renders an element value as a single string
///
/// Multi-valued elements are joined with `/`, every part stripped of its
/// padding. Sequences cannot be rendered.
pub fn element_to_string(elem: &InMemElement) -> LookupResult<String> {
    if elem.items().is_some() {
        return Err(conversion_error(elem, "value is a sequence"));
    }

    if elem.value().multiplicity() > 1 {
        let parts = elem.to_multi_str().map_err(|e| conversion_error(elem, e))?;
        let trimmed: Vec<&str> = parts.iter().map(|part| trim_padding(part)).collect();
        Ok(trimmed.join("/"))
    } else {
        let value = elem.to_str().map_err(|e| conversion_error(elem, e))?;
        Ok(trim_padding(&value).to_string())
    }
}

/// Strips space and NUL padding
fn trim_padding(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

fn conversion_error(elem: &InMemElement, reason: impl std::fmt::Display) -> LookupError {
    LookupError::Conversion(tag_name(elem.tag()), reason.to_string())
}

/// Looks up and renders an element by keyword
pub fn string_by_keyword(dcm: &InMemDicomObject, keyword: &str) -> LookupResult<String> {
    element_by_keyword(dcm, keyword).and_then(element_to_string)
}

/// Looks up and renders an element by tag
pub fn string_by_tag(dcm: &InMemDicomObject, tag: Tag) -> LookupResult<String> {
    element_by_tag(dcm, tag).and_then(element_to_string)
}

/// Items of a sequence element
pub fn sequence_items(elem: &InMemElement) -> LookupResult<&[InMemDicomObject]> {
    elem.items()
        .ok_or_else(|| LookupError::NotASequence(tag_name(elem.tag())))
}

/// First item of a sequence element
///
/// Only the first item is ever consulted, even when more are present.
pub fn first_item_of(elem: &InMemElement) -> LookupResult<&InMemDicomObject> {
    sequence_items(elem)?
        .first()
        .ok_or_else(|| LookupError::EmptySequence(tag_name(elem.tag())))
}

/// First item of the sequence stored under `tag`
pub fn first_item(dcm: &InMemDicomObject, tag: Tag) -> LookupResult<&InMemDicomObject> {
    element_by_tag(dcm, tag).and_then(first_item_of)
}

/// First item of the sequence stored under `keyword`
pub fn first_item_by_keyword<'a>(
    dcm: &'a InMemDicomObject,
    keyword: &str,
) -> LookupResult<&'a InMemDicomObject> {
    element_by_keyword(dcm, keyword).and_then(first_item_of)
}

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    string_by_tag(dcm, tag).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::value::{DataSetSequence, PrimitiveValue};
    use dicom_core::{DataElement, VR};

    fn code_item(value: &str, scheme: &str, meaning: &str) -> InMemDicomObject {
        InMemDicomObject::from_element_iter([
            DataElement::new(CODE_VALUE, VR::SH, PrimitiveValue::from(value)),
            DataElement::new(
                CODING_SCHEME_DESIGNATOR,
                VR::SH,
                PrimitiveValue::from(scheme),
            ),
            DataElement::new(CODE_MEANING, VR::LO, PrimitiveValue::from(meaning)),
        ])
    }

    #[test]
    fn test_tag_values() {
        assert_eq!(keyword_of(SOP_INSTANCE_UID), Some("SOPInstanceUID"));
        assert_eq!(keyword_of(SEGMENT_SEQUENCE), Some("SegmentSequence"));
        assert_eq!(
            keyword_of(CURRENT_REQUESTED_PROCEDURE_EVIDENCE_SEQUENCE),
            Some("CurrentRequestedProcedureEvidenceSequence")
        );
        assert_eq!(keyword_of(TEMPLATE_IDENTIFIER), Some("TemplateIdentifier"));
        assert_eq!(keyword_of(FRAME_LATERALITY), Some("FrameLaterality"));
        assert_eq!(tag_name(SEGMENT_NUMBER), "SegmentNumber");
    }

    #[test]
    fn test_string_by_keyword_single_and_multi() {
        let dcm = InMemDicomObject::from_element_iter([
            DataElement::new(MODALITY, VR::CS, PrimitiveValue::from("MR")),
            DataElement::new(
                IMAGE_TYPE,
                VR::CS,
                PrimitiveValue::Strs(vec!["ORIGINAL".to_string(), "PRIMARY".to_string()].into()),
            ),
            DataElement::new(SEGMENT_NUMBER, VR::US, PrimitiveValue::from(3_u16)),
        ]);

        assert_eq!(string_by_keyword(&dcm, "Modality").unwrap(), "MR");
        assert_eq!(
            string_by_keyword(&dcm, "ImageType").unwrap(),
            "ORIGINAL/PRIMARY"
        );
        assert_eq!(string_by_keyword(&dcm, "SegmentNumber").unwrap(), "3");
    }

    #[test]
    fn test_missing_and_unknown_keyword() {
        let dcm = InMemDicomObject::new_empty();
        assert_eq!(
            string_by_keyword(&dcm, "PatientID"),
            Err(LookupError::NotFound("PatientID".to_string()))
        );
        let err = string_by_keyword(&dcm, "NotARealKeyword").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_present_but_empty_value() {
        let empty = DataElement::new(PATIENT_ID, VR::LO, PrimitiveValue::Empty);
        let dcm = InMemDicomObject::from_element_iter([empty]);
        assert_eq!(string_by_keyword(&dcm, "PatientID").unwrap(), "");
    }

    #[test]
    fn test_sequence_does_not_stringify() {
        let codes = DataSetSequence::from(vec![code_item("T-A0100", "SRT", "Brain")]);
        let sequence = DataElement::new(CONCEPT_CODE_SEQUENCE, VR::SQ, codes);
        let dcm = InMemDicomObject::from_element_iter([sequence]);
        assert!(matches!(
            string_by_keyword(&dcm, "ConceptCodeSequence"),
            Err(LookupError::Conversion(_, _))
        ));
    }

    #[test]
    fn test_first_item() {
        let dcm = InMemDicomObject::from_element_iter([
            DataElement::new(
                CONCEPT_CODE_SEQUENCE,
                VR::SQ,
                DataSetSequence::from(vec![
                    code_item("1", "DCM", "first"),
                    code_item("2", "DCM", "second"),
                ]),
            ),
            DataElement::new(
                CONCEPT_NAME_CODE_SEQUENCE,
                VR::SQ,
                DataSetSequence::from(Vec::<InMemDicomObject>::new()),
            ),
            DataElement::new(MODALITY, VR::CS, PrimitiveValue::from("SR")),
        ]);

        let item = first_item(&dcm, CONCEPT_CODE_SEQUENCE).unwrap();
        assert_eq!(
            get_string_value(item, CODE_MEANING),
            Some("first".to_string())
        );

        let item = first_item_by_keyword(&dcm, "ConceptCodeSequence").unwrap();
        assert_eq!(get_string_value(item, CODE_VALUE), Some("1".to_string()));

        assert_eq!(
            first_item(&dcm, CONCEPT_NAME_CODE_SEQUENCE).unwrap_err(),
            LookupError::EmptySequence("ConceptNameCodeSequence".to_string())
        );
        assert_eq!(
            first_item(&dcm, MODALITY).unwrap_err(),
            LookupError::NotASequence("Modality".to_string())
        );
        let err = first_item(&dcm, CONTENT_SEQUENCE).unwrap_err();
        assert!(err.is_not_found());
    }
}
