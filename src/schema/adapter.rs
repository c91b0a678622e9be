//! Adapter between the tabular source file and [`EngagementRecord`]s
//!
//! Reading is header-driven: columns may appear in any order and unknown
//! columns (including a stale `engagement_rate`) are ignored. Rows that fail
//! validation are rejected and counted in a [`LoadReport`] rather than
//! aborting the load.

use std::io;

use serde::Serialize;

use crate::error::ComputeError;
use crate::schema::record::{EngagementRecord, RawRow, RowError, REQUIRED_COLUMNS};

/// Adapter for converting CSV tables to engagement records
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a CSV table from any reader
    pub fn parse_csv<R: io::Read>(reader: R) -> Result<ParsedTable, ComputeError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(ComputeError::MissingColumn(missing.join(", ")));
        }

        let mut records = Vec::new();
        let mut report = LoadReport::default();

        for (index, row) in reader.records().enumerate() {
            report.total_rows += 1;
            // Header is line 1
            let fallback_line = index as u64 + 2;

            let row = match row {
                Ok(row) => row,
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
                Err(e) => {
                    let line = e.position().map_or(fallback_line, |p| p.line());
                    report.reject(
                        line,
                        RowError::Unreadable {
                            message: e.to_string(),
                        },
                    );
                    continue;
                }
            };

            let line = row.position().map_or(fallback_line, |p| p.line());
            let parsed = row
                .deserialize::<RawRow>(Some(&headers))
                .map_err(|e| RowError::Unreadable {
                    message: e.to_string(),
                })
                .and_then(RawRow::validate);

            match parsed {
                Ok(record) => {
                    report.accepted_rows += 1;
                    records.push(record);
                }
                Err(error) => report.reject(line, error),
            }
        }

        Ok(ParsedTable { records, report })
    }

    /// Parse a CSV table held in memory
    pub fn parse_str(csv_text: &str) -> Result<ParsedTable, ComputeError> {
        Self::parse_csv(csv_text.as_bytes())
    }

    /// Write records as CSV with the canonical column order
    pub fn write_csv<W: io::Write>(
        records: &[EngagementRecord],
        writer: W,
    ) -> Result<(), ComputeError> {
        let mut writer = csv::Writer::from_writer(writer);
        if records.is_empty() {
            writer.write_record(REQUIRED_COLUMNS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer
            .flush()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))?;
        Ok(())
    }
}

/// Records accepted from a table together with the ingestion report
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub records: Vec<EngagementRecord>,
    pub report: LoadReport,
}

/// Summary of one ingestion pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub rejections: Vec<RowRejection>,
}

/// A rejected row and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 1-based line number in the source file
    pub line: u64,
    pub error: RowError,
}

impl LoadReport {
    /// Report for a table where every row was accepted
    pub fn clean(rows: usize) -> Self {
        LoadReport {
            total_rows: rows,
            accepted_rows: rows,
            rejections: Vec::new(),
        }
    }

    pub fn rejected_rows(&self) -> usize {
        self.rejections.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }

    fn reject(&mut self, line: u64, error: RowError) {
        self.rejections.push(RowRejection { line, error });
    }
}
