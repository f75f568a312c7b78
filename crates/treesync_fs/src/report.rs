//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::{SpecCopyError, SpecCopyOutcome};

/// One failed item kept by a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportError {
    pub path_src: PathBuf,
    pub path_dst: PathBuf,
    pub error: SpecCopyError,
}

/// Aggregate counters and failures for one tree copy.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Number of outcomes emitted (root creation included).
    pub cnt_outcomes: u64,
    /// Number of successful outcomes.
    pub cnt_succeeded: u64,
    /// Number of failed outcomes.
    pub cnt_failed: u64,
    /// Per-item failures, in emission order.
    pub errors: Vec<SpecReportError>,
}

impl ReportCopy {
    /// Number of collected failures.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_outcomes".to_string(), self.cnt_outcomes);
        dict_counts.insert("cnt_succeeded".to_string(), self.cnt_succeeded);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} outcomes={} succeeded={} failed={}",
            self.cnt_outcomes, self.cnt_succeeded, self.cnt_failed
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator fed one outcome at a time.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    cnt_outcomes: u64,
    cnt_succeeded: u64,
    cnt_failed: u64,
    errors: Vec<SpecReportError>,
}

impl ReportCopyBuilder {
    /// Count one outcome; failed ones are kept with their error detail.
    pub fn add_outcome(&mut self, outcome: &SpecCopyOutcome) {
        self.cnt_outcomes += 1;
        if outcome.if_succeeded {
            self.cnt_succeeded += 1;
            return;
        }

        self.cnt_failed += 1;
        if let Some(error) = &outcome.error {
            self.errors.push(SpecReportError {
                path_src: outcome.path_src.clone(),
                path_dst: outcome.path_dst.clone(),
                error: error.clone(),
            });
        }
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_outcomes: self.cnt_outcomes,
            cnt_succeeded: self.cnt_succeeded,
            cnt_failed: self.cnt_failed,
            errors: self.errors,
        }
    }
}

impl FromIterator<SpecCopyOutcome> for ReportCopy {
    fn from_iter<I: IntoIterator<Item = SpecCopyOutcome>>(iter: I) -> Self {
        let mut builder_cp_report = ReportCopyBuilder::default();
        for outcome in iter {
            builder_cp_report.add_outcome(&outcome);
        }
        builder_cp_report.build()
    }
}

#[cfg(test)]
mod tests {
    use super::ReportCopy;
    use crate::spec::{EnumCopyErrorKind, SpecCopyError, SpecCopyOutcome};

    #[test]
    fn report_copy_counts_outcomes_and_formats_summary() {
        let report: ReportCopy = vec![
            SpecCopyOutcome::success("/src", "/dst/src"),
            SpecCopyOutcome::success("/src/a.txt", "/dst/src/a.txt"),
            SpecCopyOutcome::failure(
                "/src/b.txt",
                "/dst/src/b.txt",
                SpecCopyError::new(EnumCopyErrorKind::Mutation, "disk full"),
            ),
        ]
        .into_iter()
        .collect();

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_outcomes"], 3);
        assert_eq!(dict_counts["cnt_succeeded"], 2);
        assert_eq!(dict_counts["cnt_failed"], 1);
        assert_eq!(dict_counts["cnt_errors"], 1);
        assert_eq!(report.errors[0].error.message, "disk full");

        let txt = report.format("[COPY]");
        assert_eq!(txt, "[COPY] outcomes=3 succeeded=2 failed=1");
        assert_eq!(report.to_string(), txt);
    }
}
