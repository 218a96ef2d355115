//! CSP violation log
//!
//! Reports are informational only; nothing is blocked or retried because
//! of them. Each session keeps its most recent reports up to a fixed cap.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::protocol::CspViolation;
use crate::sync::Surface;

/// A violation as recorded by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CspViolationRecord {
    #[serde(flatten)]
    pub violation: CspViolation,
    pub surface: Surface,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

#[derive(Debug)]
pub struct CspViolationLog {
    capacity: usize,
    entries: VecDeque<CspViolationRecord>,
}

impl CspViolationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(16)),
        }
    }

    /// Append a report, dropping the oldest once full
    pub fn record(&mut self, surface: Surface, violation: CspViolation) -> &CspViolationRecord {
        if self.entries.len() >= self.capacity.max(1) {
            self.entries.pop_front();
        }
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.entries.push_back(CspViolationRecord {
            violation,
            surface,
            timestamp_ms,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Oldest first
    pub fn entries(&self) -> impl Iterator<Item = &CspViolationRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(directive: &str) -> CspViolation {
        CspViolation {
            directive: directive.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_oldest_dropped_at_capacity() {
        let mut log = CspViolationLog::new(2);
        log.record(Surface::Primary, violation("script-src"));
        log.record(Surface::Primary, violation("img-src"));
        log.record(Surface::Secondary, violation("connect-src"));

        let directives: Vec<_> = log.entries().map(|r| r.violation.directive.as_str()).collect();
        assert_eq!(directives, vec!["img-src", "connect-src"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut log = CspViolationLog::new(10);
        let record = log.record(Surface::Primary, violation("frame-src")).clone();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["directive"], "frame-src");
        assert_eq!(value["surface"], "primary");
        assert!(value["timestampMs"].as_u64().unwrap() > 0);
    }
}
