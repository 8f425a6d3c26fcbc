use crate::types::TableSet;
use std::fmt;

/// Text report formatter for a table set
pub struct TextReport<'a> {
    tables: &'a TableSet,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(tables: &'a TableSet) -> Self {
        Self { tables }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, records) in self.tables.iter() {
            writeln!(f, "{}", name)?;
            writeln!(f, "{}", "=".repeat(name.len()))?;
            writeln!(f, "Records: {}", records.len())?;

            for (index, record) in records.iter().enumerate() {
                writeln!(f)?;
                writeln!(f, "[{}]", index + 1)?;
                let width = record.names().map(str::len).max().unwrap_or(0);
                for (attribute, value) in record.iter() {
                    writeln!(
                        f,
                        "  {:<width$}  {}",
                        format!("{}:", attribute),
                        value.unwrap_or("null"),
                        width = width + 1
                    )?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    #[test]
    fn test_report_layout() {
        let mut tables = TableSet::new();
        tables.push(
            "MR",
            Record::new()
                .with("PatientID", Some("QIN-01".to_string()))
                .with("EchoTime", None),
        );
        tables.ensure_table("References");

        let report = TextReport::new(&tables).to_string();

        assert_eq!(
            report,
            "MR\n\
             ==\n\
             Records: 1\n\
             \n\
             [1]\n  \
             PatientID:  QIN-01\n  \
             EchoTime:   null\n\
             \n\
             References\n\
             ==========\n\
             Records: 0\n\
             \n"
        );
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(TextReport::new(&TableSet::new()).to_string(), "");
    }
}
