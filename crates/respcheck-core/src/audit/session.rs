use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{AuditComparator, AuditInput, AuditRecord, AuditResult, AuditSummary, summarize};

/// Append-only collection of audit records for one test session.
///
/// Safe to share across worker threads; appends are serialized by a mutex.
#[derive(Debug, Default)]
pub struct AuditSession {
    comparator: AuditComparator,
    records: Mutex<Vec<AuditRecord>>,
}

impl AuditSession {
    #[must_use]
    pub fn new(comparator: AuditComparator) -> Self {
        Self {
            comparator,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Audit one step and append the resulting record.
    pub fn audit(&self, input: &AuditInput) -> AuditRecord {
        let record = self.comparator.evaluate(input);
        debug!(
            test = %record.test_name,
            result = %record.overall_result,
            differences = record.differences.len(),
            "audited step"
        );
        if record.overall_result == AuditResult::Error {
            warn!(
                test = %record.test_name,
                detail = record.error_detail.as_deref().unwrap_or_default(),
                "audit error"
            );
        }
        self.records.lock().push(record.clone());
        record
    }

    /// Snapshot of the records so far, in append order.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop every record, starting a new session.
    pub fn clear(&self) {
        let mut records = self.records.lock();
        info!(cleared = records.len(), "audit session cleared");
        records.clear();
    }

    #[must_use]
    pub fn summarize(&self) -> AuditSummary {
        let summary = summarize(&self.records.lock());
        info!(
            total = summary.total_tests,
            passed = summary.passed,
            failed = summary.failed,
            errors = summary.errors,
            status = %summary.compliance_status,
            "audit summary"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ComplianceStatus;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn records_accumulate_and_clear() {
        let session = AuditSession::default();
        assert!(session.is_empty());
        session.audit(&AuditInput::new("ok", "up", "service up"));
        session.audit(&AuditInput::new("empty", "up", ""));
        assert_eq!(session.len(), 2);

        let summary = session.summarize();
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.compliance_status, ComplianceStatus::NonCompliant);

        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.summarize().total_tests, 0);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let session = Arc::new(AuditSession::default());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    for i in 0..25 {
                        session.audit(&AuditInput::new(format!("w{worker}-{i}"), "ok", "ok"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(session.len(), 200);
        assert_eq!(session.summarize().pass_rate, 100.0);
    }
}
