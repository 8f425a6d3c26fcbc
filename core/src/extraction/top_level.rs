use crate::types::Record;

use super::context::ResolveContext;
use super::tags::string_by_keyword;

/// Resolves a table of top-level attributes
///
/// # Algorithm
///
/// 1. Look every attribute up directly at the top level of the dataset
///    (multi-valued elements joined with `/`)
/// 2. For each attribute that failed, run the special reader registered
///    under (table, attribute), if there is one
/// 3. Anything still unresolved is recorded as null
///
/// The record keeps the attribute order of the rules.
pub fn resolve_top_level(ctx: &ResolveContext<'_>, table: &str, attributes: &[String]) -> Record {
    let mut record = Record::new();
    let mut deferred = Vec::new();

    for attribute in attributes {
        let value = ctx.attempt(table, attribute, "top-level", || {
            string_by_keyword(ctx.dcm, attribute)
        });
        if value.is_none() {
            deferred.push(attribute);
        }
        record.insert(attribute.as_str(), value);
    }

    for attribute in deferred {
        let value = ctx.special(table, table, attribute);
        if value.is_none() {
            ctx.unresolved(table, attribute);
        }
        record.insert(attribute.as_str(), value);
    }

    record
}
