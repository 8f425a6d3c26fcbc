use crate::diagnostics::Diagnostics;
use crate::error::LookupResult;
use crate::types::Reference;
use dicom_object::InMemDicomObject;

use super::tags::{
    element_by_tag, sequence_items, string_by_tag, CURRENT_REQUESTED_PROCEDURE_EVIDENCE_SEQUENCE,
    REFERENCED_INSTANCE_SEQUENCE, REFERENCED_SERIES_SEQUENCE, REFERENCED_SOP_CLASS_UID,
    REFERENCED_SOP_INSTANCE_UID, REFERENCED_SOP_SEQUENCE, SERIES_INSTANCE_UID,
};

/// Collects every instance the dataset references
///
/// Two independent shapes are walked and their results concatenated in this
/// order, without deduplication:
///
/// 1. ReferencedSeriesSequence → ReferencedInstanceSequence
/// 2. CurrentRequestedProcedureEvidenceSequence → ReferencedSeriesSequence →
///    ReferencedSOPSequence
///
/// An absent top-level sequence skips its path silently. A missing key inside
/// a present item is logged and only the affected entry is dropped.
pub fn resolve_references(
    dcm: &InMemDicomObject,
    source_sop_instance_uid: &str,
    diagnostics: Diagnostics,
) -> Vec<Reference> {
    let mut references = Vec::new();

    if let Ok(series) = element_by_tag(dcm, REFERENCED_SERIES_SEQUENCE) {
        match sequence_items(series) {
            Ok(items) => {
                for item in items {
                    let walked = read_referenced_series(
                        item,
                        source_sop_instance_uid,
                        diagnostics,
                        &mut references,
                    );
                    if let Err(e) = walked {
                        diagnostics.error(format_args!("Missing key: {}", e));
                    }
                }
            }
            Err(e) => diagnostics.error(format_args!("Missing key: {}", e)),
        }
    }

    if let Ok(evidence) = element_by_tag(dcm, CURRENT_REQUESTED_PROCEDURE_EVIDENCE_SEQUENCE) {
        match sequence_items(evidence) {
            Ok(items) => {
                for item in items {
                    let walked =
                        read_evidence(item, source_sop_instance_uid, diagnostics, &mut references);
                    if let Err(e) = walked {
                        diagnostics.error(format_args!("Missing key: {}", e));
                    }
                }
            }
            Err(e) => diagnostics.error(format_args!("Missing key: {}", e)),
        }
    }

    references
}

/// One ReferencedSeriesSequence item: series UID plus ReferencedInstanceSequence
fn read_referenced_series(
    series: &InMemDicomObject,
    source: &str,
    diagnostics: Diagnostics,
    out: &mut Vec<Reference>,
) -> LookupResult<()> {
    let series_uid = string_by_tag(series, SERIES_INSTANCE_UID)?;
    let instances = element_by_tag(series, REFERENCED_INSTANCE_SEQUENCE).and_then(sequence_items)?;
    for instance in instances {
        read_reference(instance, source, &series_uid, diagnostics, out);
    }
    Ok(())
}

/// One CurrentRequestedProcedureEvidenceSequence item
fn read_evidence(
    evidence: &InMemDicomObject,
    source: &str,
    diagnostics: Diagnostics,
    out: &mut Vec<Reference>,
) -> LookupResult<()> {
    let series_items =
        element_by_tag(evidence, REFERENCED_SERIES_SEQUENCE).and_then(sequence_items)?;
    for series in series_items {
        if let Err(e) = read_evidence_series(series, source, diagnostics, out) {
            diagnostics.error(format_args!("Missing key: {}", e));
        }
    }
    Ok(())
}

/// One ReferencedSeriesSequence item nested in the evidence sequence
fn read_evidence_series(
    series: &InMemDicomObject,
    source: &str,
    diagnostics: Diagnostics,
    out: &mut Vec<Reference>,
) -> LookupResult<()> {
    let sops = element_by_tag(series, REFERENCED_SOP_SEQUENCE).and_then(sequence_items)?;
    let series_uid = string_by_tag(series, SERIES_INSTANCE_UID)?;
    for sop in sops {
        read_reference(sop, source, &series_uid, diagnostics, out);
    }
    Ok(())
}

fn read_reference(
    item: &InMemDicomObject,
    source: &str,
    series_uid: &str,
    diagnostics: Diagnostics,
    out: &mut Vec<Reference>,
) {
    let reference = string_by_tag(item, REFERENCED_SOP_CLASS_UID).and_then(|class_uid| {
        Ok(Reference {
            source_sop_instance_uid: source.to_string(),
            referenced_sop_class_uid: class_uid,
            referenced_sop_instance_uid: string_by_tag(item, REFERENCED_SOP_INSTANCE_UID)?,
            referenced_series_instance_uid: series_uid.to_string(),
        })
    });

    match reference {
        Ok(reference) => out.push(reference),
        Err(e) => diagnostics.error(format_args!("Missing key: {}", e)),
    }
}
