use crate::error::LookupError;
use crate::types::{AttributeSpec, Record};
use dicom_core::header::Header;
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;

use super::context::ResolveContext;
use super::tags::{
    element_by_tag, element_to_string, first_item_by_keyword, keyword_of, sequence_items,
    string_by_keyword, PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE, SEGMENT_SEQUENCE,
    SHARED_FUNCTIONAL_GROUPS_SEQUENCE,
};

/// Resolves one record per SegmentSequence item
///
/// # Algorithm
///
/// For every attribute, in order:
/// 1. `SubSequence_Field`: Field from the first item of SubSequence in the segment
/// 2. The attribute directly on the segment item
/// 3. The attribute at the top level of the dataset
///
/// A missing SegmentSequence yields no records and a warning.
pub fn resolve_segments(
    ctx: &ResolveContext<'_>,
    table: &str,
    attributes: &[String],
) -> Vec<Record> {
    let segments = match element_by_tag(ctx.dcm, SEGMENT_SEQUENCE).and_then(sequence_items) {
        Ok(segments) => segments,
        Err(e) => {
            ctx.diagnostics
                .warn(format_args!("{}: cannot read segments: {}", table, e));
            return Vec::new();
        }
    };

    segments
        .iter()
        .map(|segment| {
            let mut record = Record::new();
            for attribute in attributes {
                let value = compound_value(ctx, table, segment, attribute)
                    .or_else(|| {
                        ctx.attempt(table, attribute, "segment item", || {
                            string_by_keyword(segment, attribute)
                        })
                    })
                    .or_else(|| {
                        ctx.attempt(table, attribute, "top-level", || {
                            string_by_keyword(ctx.dcm, attribute)
                        })
                    });
                if value.is_none() {
                    ctx.unresolved(table, attribute);
                }
                record.insert(attribute.as_str(), value);
            }
            record
        })
        .collect()
}

fn compound_value(
    ctx: &ResolveContext<'_>,
    table: &str,
    item: &InMemDicomObject,
    attribute: &str,
) -> Option<String> {
    match AttributeSpec::parse(attribute) {
        AttributeSpec::Compound { group, field } => {
            ctx.attempt(table, attribute, "sub-sequence", || {
                string_by_keyword(first_item_by_keyword(item, group)?, field)
            })
        }
        AttributeSpec::Keyword(_) => None,
    }
}

/// Resolves one record per PerFrameFunctionalGroupsSequence item
///
/// # Algorithm
///
/// For every attribute, in order:
/// 1. Recursive search in the per-frame functional group item
/// 2. Recursive search in SharedFunctionalGroupsSequence
/// 3. The attribute at the top level of the dataset
///
/// A value present at several tiers resolves to the per-frame one.
pub fn resolve_segment_frames(
    ctx: &ResolveContext<'_>,
    table: &str,
    attributes: &[String],
) -> Vec<Record> {
    let frames = match element_by_tag(ctx.dcm, PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE)
        .and_then(sequence_items)
    {
        Ok(frames) => frames,
        Err(e) => {
            ctx.diagnostics
                .warn(format_args!("{}: cannot read frames: {}", table, e));
            return Vec::new();
        }
    };
    let shared = element_by_tag(ctx.dcm, SHARED_FUNCTIONAL_GROUPS_SEQUENCE);

    frames
        .iter()
        .map(|frame| {
            let mut record = Record::new();
            for attribute in attributes {
                let value = ctx
                    .attempt(table, attribute, "per-frame group", || {
                        recursive_find_in_dataset(frame, attribute)
                            .ok_or_else(|| LookupError::NotFound(attribute.clone()))
                            .and_then(element_to_string)
                    })
                    .or_else(|| {
                        ctx.attempt(table, attribute, "shared group", || {
                            shared
                                .clone()
                                .and_then(|shared| {
                                    recursive_find_in_element(shared, attribute)
                                        .ok_or_else(|| LookupError::NotFound(attribute.clone()))
                                })
                                .and_then(element_to_string)
                        })
                    })
                    .or_else(|| {
                        ctx.attempt(table, attribute, "top-level", || {
                            string_by_keyword(ctx.dcm, attribute)
                        })
                    });
                if value.is_none() {
                    ctx.unresolved(table, attribute);
                }
                record.insert(attribute.as_str(), value);
            }
            record
        })
        .collect()
}

/// Depth-first keyword search below a dataset node
///
/// Elements are scanned in tag order. A matching element is returned at once;
/// a sequence-valued element is searched through its first item only.
pub fn recursive_find_in_dataset<'a>(
    dcm: &'a InMemDicomObject,
    keyword: &str,
) -> Option<&'a InMemElement> {
    dcm.iter()
        .find_map(|elem| recursive_find_in_element(elem, keyword))
}

/// Keyword search starting at an element
pub fn recursive_find_in_element<'a>(
    elem: &'a InMemElement,
    keyword: &str,
) -> Option<&'a InMemElement> {
    if keyword_of(elem.tag()) == Some(keyword) {
        return Some(elem);
    }
    elem.items()
        .and_then(|items| items.first())
        .and_then(|first| recursive_find_in_dataset(first, keyword))
}
