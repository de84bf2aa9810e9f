//! Bulk import and export.
//!
//! - JSON: players, teams and matches in one document
//! - CSV: players only, in the spreadsheet layout coaches exchange
//!
//! Imports are record-at-a-time with no transaction: a bad record is
//! counted and skipped, and everything before it stays committed.

pub mod csv;
pub mod json;

use crate::api::Table;

pub use self::csv::{parse_players_csv, players_to_csv, CSV_HEADERS};
pub use self::json::ExportDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub table: Table,
    /// Position of the record within its array (or data row for CSV)
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.imported += 1;
    }

    pub(crate) fn record_failure(&mut self, table: Table, index: usize, reason: impl ToString) {
        self.failures.push(ImportFailure {
            table,
            index,
            reason: reason.to_string(),
        });
    }

    pub fn summary(&self) -> String {
        format!("Imported {} of {} records", self.imported, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_summary() {
        let mut report = ImportReport::new(3);
        report.record_success();
        report.record_failure(Table::Players, 1, "name missing");
        report.record_success();
        assert_eq!(report.summary(), "Imported 2 of 3 records");
        assert_eq!(report.failures[0].index, 1);
    }
}
