//! Total line coverage of a trace file.

use crate::error::Result;
use crate::merge::MergedTrace;
use std::path::Path;

/// Line counters summed over every record of a trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTotals {
    pub found: u64,
    pub hit: u64,
}

impl LineTotals {
    /// Sum the `LF:` and `LH:` records of lcov trace text.
    pub fn parse(trace: &str) -> Self {
        let mut totals = LineTotals::default();
        for line in trace.lines().map(str::trim) {
            if let Some(value) = line.strip_prefix("LF:") {
                totals.found += value.trim().parse::<u64>().unwrap_or(0);
            } else if let Some(value) = line.strip_prefix("LH:") {
                totals.hit += value.trim().parse::<u64>().unwrap_or(0);
            }
        }
        totals
    }

    /// Hit over found, in percent, rounded to two decimals. Zero lines found
    /// counts as 0%.
    pub fn percentage(&self) -> f64 {
        if self.found == 0 {
            return 0.0;
        }
        let pct = self.hit as f64 * 100.0 / self.found as f64;
        (pct * 100.0).round() / 100.0
    }
}

/// Total line coverage of the trace file at `path`.
pub async fn total_coverage_of(path: &Path) -> Result<f64> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(LineTotals::parse(&text).percentage())
}

/// Total line coverage of the merged trace.
pub async fn total_coverage(trace: &MergedTrace) -> Result<f64> {
    total_coverage_of(trace.path()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "TN:\nSF:src/a.c\nDA:1,1\nDA:2,0\nLF:2\nLH:1\nend_of_record\n\
SF:src/b.c\nDA:1,1\nLF:8\nLH:8\nend_of_record\n";

    #[test]
    fn test_parse_sums_records() {
        let totals = LineTotals::parse(TRACE);
        assert_eq!(totals, LineTotals { found: 10, hit: 9 });
        assert_eq!(totals.percentage(), 90.0);
    }

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        let totals = LineTotals { found: 3, hit: 2 };
        assert_eq!(totals.percentage(), 66.67);
    }

    #[test]
    fn test_empty_trace_is_zero() {
        assert_eq!(LineTotals::parse("").percentage(), 0.0);
        assert_eq!(LineTotals::parse("TN:\nend_of_record\n").percentage(), 0.0);
    }

    #[test]
    fn test_ignores_branch_and_function_counters() {
        let totals = LineTotals::parse("FNF:4\nFNH:1\nBRF:10\nBRH:0\nLF:4\nLH:4\n");
        assert_eq!(totals.percentage(), 100.0);
    }

    #[tokio::test]
    async fn test_total_coverage_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcov.info");
        std::fs::write(&path, TRACE).unwrap();
        let total = total_coverage(&MergedTrace::from_path(&path)).await.unwrap();
        assert_eq!(total, 90.0);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = total_coverage_of(Path::new("/nonexistent/lcov.info"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::ReportError::Io(_)));
    }
}
