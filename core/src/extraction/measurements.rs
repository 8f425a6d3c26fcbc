//! TID 1500 measurement tables
//!
//! The converter output is a JSON document with one object per measurement
//! group. Groups, their measurement items and their qualitative evaluations
//! each become one record; attributes are looked up in the JSON first and in
//! the DICOM dataset last.

use crate::error::{Dcm2TablesError, LookupError, LookupResult, Result};
use crate::types::tables::{
    SR1500_MEASUREMENTS, SR1500_MEASUREMENT_GROUPS, SR1500_QUALITATIVE_EVALUATIONS,
};
use crate::types::{AttributeSpec, Record, RulesDictionary, TableSet};
use dicom_object::InMemDicomObject;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use super::context::ResolveContext;
use super::readers::SR_SCOPE;
use super::tags::{
    first_item, string_by_keyword, string_by_tag, CONTENT_TEMPLATE_SEQUENCE, TEMPLATE_IDENTIFIER,
};

/// The only SR template with a measurement reader
pub const SUPPORTED_TEMPLATE: &str = "1500";

/// JSON object as produced by the converter
pub type JsonObject = Map<String, Value>;

/// Converter output
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MeasurementReport {
    #[serde(rename = "Measurements")]
    pub measurements: Vec<MeasurementGroup>,
}

/// One measurement group with its nested items
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementGroup {
    #[serde(default)]
    pub measurement_items: Vec<JsonObject>,

    #[serde(default)]
    pub qualitative_evaluations: Vec<JsonObject>,

    /// Every other key of the group object
    #[serde(flatten)]
    pub fields: JsonObject,
}

impl MeasurementReport {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// ContentTemplateSequence[0].TemplateIdentifier
pub fn template_identifier(dcm: &InMemDicomObject) -> LookupResult<String> {
    let item = first_item(dcm, CONTENT_TEMPLATE_SEQUENCE)?;
    string_by_tag(item, TEMPLATE_IDENTIFIER)
}

/// Fails unless the report follows TID 1500
pub fn check_template(dcm: &InMemDicomObject) -> Result<()> {
    match template_identifier(dcm) {
        Ok(id) if id == SUPPORTED_TEMPLATE => Ok(()),
        Ok(id) => Err(Dcm2TablesError::UnsupportedTemplate(id)),
        Err(e) => Err(Dcm2TablesError::UnsupportedTemplate(format!("<{}>", e))),
    }
}

/// Builds the three measurement tables
///
/// A table missing from the rules is not produced. Item and evaluation
/// records still see the resolved group record as their parent when the
/// group table itself is not produced.
pub fn resolve_measurements(
    ctx: &ResolveContext<'_>,
    rules: &RulesDictionary,
    report: &MeasurementReport,
    tables: &mut TableSet,
) {
    let group_rules = table_rules(ctx, rules, SR1500_MEASUREMENT_GROUPS, tables);
    let item_rules = table_rules(ctx, rules, SR1500_MEASUREMENTS, tables);
    let evaluation_rules = table_rules(ctx, rules, SR1500_QUALITATIVE_EVALUATIONS, tables);

    for group in &report.measurements {
        let parent = resolve_object(
            ctx,
            SR1500_MEASUREMENT_GROUPS,
            &group.fields,
            None,
            group_rules.unwrap_or_default(),
        );

        if let Some(attributes) = item_rules {
            for item in &group.measurement_items {
                let record =
                    resolve_object(ctx, SR1500_MEASUREMENTS, item, Some(&parent), attributes);
                tables.push(SR1500_MEASUREMENTS, record);
            }
        }

        if let Some(attributes) = evaluation_rules {
            for evaluation in &group.qualitative_evaluations {
                let record = resolve_object(
                    ctx,
                    SR1500_QUALITATIVE_EVALUATIONS,
                    evaluation,
                    Some(&parent),
                    attributes,
                );
                tables.push(SR1500_QUALITATIVE_EVALUATIONS, record);
            }
        }

        if group_rules.is_some() {
            tables.push(SR1500_MEASUREMENT_GROUPS, parent);
        }
    }
}

fn table_rules<'r>(
    ctx: &ResolveContext<'_>,
    rules: &'r RulesDictionary,
    table: &str,
    tables: &mut TableSet,
) -> Option<&'r [String]> {
    match rules.attributes(table) {
        Some(attributes) => {
            tables.ensure_table(table);
            Some(attributes)
        }
        None => {
            ctx.diagnostics
                .debug(format_args!("{}: no rules, table skipped", table));
            None
        }
    }
}

/// Resolves one JSON object into a record
///
/// # Algorithm
///
/// For every attribute, in order:
/// 1. The attribute as a key of the object
/// 2. `Concept_Field`: key Field of the nested object Concept
/// 3. The parent group record, for items and evaluations
/// 4. The document-wide special reader for the attribute
/// 5. The attribute at the top level of the DICOM dataset
///
/// JSON nulls count as missing and fall through.
pub fn resolve_object(
    ctx: &ResolveContext<'_>,
    table: &str,
    object: &JsonObject,
    parent: Option<&Record>,
    attributes: &[String],
) -> Record {
    let mut record = Record::new();
    for attribute in attributes {
        let value = ctx
            .attempt(table, attribute, "JSON key", || json_key(object, attribute))
            .or_else(|| match AttributeSpec::parse(attribute) {
                AttributeSpec::Compound { group, field } => {
                    ctx.attempt(table, attribute, "JSON concept", || {
                        json_concept(object, group, field)
                    })
                }
                AttributeSpec::Keyword(_) => None,
            })
            .or_else(|| {
                parent.and_then(|parent| {
                    ctx.attempt(table, attribute, "parent group", || {
                        parent
                            .get(attribute)
                            .map(str::to_string)
                            .ok_or_else(|| LookupError::NotFound(attribute.clone()))
                    })
                })
            })
            .or_else(|| ctx.special(table, SR_SCOPE, attribute))
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
}

fn json_key(object: &JsonObject, key: &str) -> LookupResult<String> {
    let value = object
        .get(key)
        .ok_or_else(|| LookupError::NotFound(key.to_string()))?;
    json_to_string(value).ok_or_else(|| null_value(key))
}

fn json_concept(object: &JsonObject, concept: &str, field: &str) -> LookupResult<String> {
    let nested = object
        .get(concept)
        .ok_or_else(|| LookupError::NotFound(concept.to_string()))?;
    let path = format!("{}.{}", concept, field);
    let value = nested
        .get(field)
        .ok_or_else(|| LookupError::NotFound(path.clone()))?;
    json_to_string(value).ok_or_else(|| null_value(&path))
}

fn null_value(path: &str) -> LookupError {
    LookupError::Conversion(path.to_string(), "null".to_string())
}

/// Text of a JSON value; strings are taken verbatim, `null` has none
pub fn json_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}
