use crate::error::Result;
use crate::types::TableSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes one `<table>.tsv` per table into `dir`
///
/// The header is the union of the attribute names of the table's records in
/// first-seen order. Null values and attributes a record lacks are written
/// as empty cells. A table without any attribute gets an empty file.
/// Returns the files written, in table order.
pub fn write_tsv_tables(tables: &TableSet, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (name, records) in tables.iter() {
        let tsv_path = dir.join(format!("{}.tsv", name));
        let columns = tables.columns(name);
        if columns.is_empty() {
            fs::write(&tsv_path, "")?;
            written.push(tsv_path);
            continue;
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&tsv_path)?;
        writer.write_record(&columns)?;
        for record in records {
            let row = columns.iter().map(|c| record.get(c).unwrap_or_default());
            writer.write_record(row)?;
        }
        writer.flush()?;

        written.push(tsv_path);
    }

    Ok(written)
}
