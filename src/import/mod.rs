//! Out-of-band CSV imports of partners and historical orders.
//!
//! Rows are processed one at a time. A row that cannot be imported is logged
//! and counted as skipped; it never aborts the rest of the file.

use std::{fmt, fs::File, path::Path};

use anyhow::Context;
use serde::de::DeserializeOwned;

pub mod orders;
pub mod partners;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        )
    }
}

/// Deserialize every record of a headed CSV file, trimming fields.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    parse_rows(file)
}

fn parse_rows<T: DeserializeOwned, R: std::io::Read>(reader: R) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let rows = reader
        .deserialize::<T>()
        .enumerate()
        .map(|(index, record)| record.with_context(|| format!("invalid CSV record {}", index + 1)))
        .collect::<anyhow::Result<Vec<T>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::partners::PartnerRow;

    #[test]
    fn rows_are_trimmed_and_optional_columns_default() {
        let data = "\
FIRM NAME,SD AMOUNT,PARTNER NAME,INVENTORY SHIPPING ADDRESS
  Star Net ,50000, Ravi Kumar ,Main Road
";
        let rows: Vec<PartnerRow> = parse_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].firm_name, "Star Net");
        assert_eq!(rows[0].partner_name, "Ravi Kumar");
        assert_eq!(rows[0].mobile, "");
    }

    #[test]
    fn report_displays_counts() {
        let report = ImportReport {
            created: 2,
            updated: 1,
            skipped: 0,
        };
        assert_eq!(report.to_string(), "2 created, 1 updated, 0 skipped");
    }
}
