//! Per-attempt records and the batches that group them.

use super::Target;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a single dispatch attempt for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub target: Target,
    /// Decoded JSON body; `None` unless the attempt succeeded.
    pub payload: Option<serde_json::Value>,
    pub success: bool,
    /// 1-based number of this attempt for the target.
    pub attempt: u32,
    /// Rendered failure, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchRecord {
    pub fn success(target: Target, payload: serde_json::Value, attempt: u32) -> Self {
        Self {
            target,
            payload: Some(payload),
            success: true,
            attempt,
            error: None,
        }
    }

    pub fn failure(target: Target, attempt: u32, error: impl Into<String>) -> Self {
        Self {
            target,
            payload: None,
            success: false,
            attempt,
            error: Some(error.into()),
        }
    }

    /// Render as `{target: {"payload": ..., "success": ...}}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut inner = serde_json::Map::new();
        inner.insert(
            "payload".to_string(),
            self.payload.clone().unwrap_or(serde_json::Value::Null),
        );
        inner.insert("success".to_string(), serde_json::Value::Bool(self.success));
        let mut outer = serde_json::Map::new();
        outer.insert(self.target.to_string(), serde_json::Value::Object(inner));
        serde_json::Value::Object(outer)
    }
}

/// Records produced by one boundary round, or by the final flush.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Position of this batch in the output sequence.
    pub index: usize,
    pub records: Vec<FetchRecord>,
    /// Executor rounds folded into this batch (more than one only for the final flush).
    pub rounds: usize,
    pub elapsed: Duration,
}

impl Batch {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = FetchRecord>) {
        self.records.extend(records);
        self.rounds += 1;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, FetchRecord> {
        self.records.iter()
    }
    pub fn into_records(self) -> Vec<FetchRecord> {
        self.records
    }
    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.success).count()
    }
    pub fn failure_count(&self) -> usize {
        self.records.len() - self.success_count()
    }
    pub fn all_succeeded(&self) -> bool {
        self.records.iter().all(|r| r.success)
    }
    pub fn success_rate(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.success_count() as f64 / self.records.len() as f64
        }
    }

    /// Records for `target`, in the order they were produced.
    pub fn records_for<'a>(&'a self, target: &'a Target) -> impl Iterator<Item = &'a FetchRecord> {
        self.records.iter().filter(move |r| &r.target == target)
    }
}

impl IntoIterator for Batch {
    type Item = FetchRecord;
    type IntoIter = std::vec::IntoIter<FetchRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_to_json_shape() {
        let ok = FetchRecord::success(Target::new("http://a"), json!({"id": 1}), 1);
        assert_eq!(
            ok.to_json(),
            json!({"http://a": {"payload": {"id": 1}, "success": true}})
        );

        let failed = FetchRecord::failure(Target::new("http://b"), 2, "HTTP 500");
        assert_eq!(
            failed.to_json(),
            json!({"http://b": {"payload": null, "success": false}})
        );
        assert_eq!(failed.error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_batch_counters() {
        let mut batch = Batch::new(3);
        assert!(batch.is_empty());
        assert_eq!(batch.success_rate(), 0.0);
        assert!(batch.all_succeeded());

        batch.extend(vec![
            FetchRecord::success(Target::new("a"), json!(null), 1),
            FetchRecord::failure(Target::new("b"), 1, "boom"),
        ]);
        batch.extend(vec![FetchRecord::success(Target::new("b"), json!([]), 2)]);

        assert_eq!(batch.index, 3);
        assert_eq!(batch.rounds, 2);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.success_count(), 2);
        assert_eq!(batch.failure_count(), 1);
        assert!(!batch.all_succeeded());
        assert!((batch.success_rate() - 2.0 / 3.0).abs() < f64::EPSILON);

        let b = Target::new("b");
        let attempts: Vec<u32> = batch.records_for(&b).map(|r| r.attempt).collect();
        assert_eq!(attempts, vec![1, 2]);
    }

    #[test]
    fn test_failure_record_omits_payload_in_serde() {
        let failed = FetchRecord::failure(Target::new("x"), 1, "nope");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["payload"], serde_json::Value::Null);
        assert_eq!(value["error"], "nope");
        assert_eq!(value["target"], "x");
    }
}
