//! Transaction request encoding
//!
//! The full pending log submitted against the revision the draft was
//! based on: `{"baseRevision": n, "changes": [...]}`.

use crate::change::DayChange;
use crate::log::PendingChangeLog;
use dayplan_model::Revision;
use serde::{Deserialize, Serialize};

/// One atomic submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Revision the changes were made against
    pub base_revision: Revision,
    /// Changes in submission order
    pub changes: Vec<DayChange>,
}

impl TransactionRequest {
    /// Snapshot a log into a request
    #[must_use]
    pub fn from_log(base_revision: Revision, log: &PendingChangeLog) -> Self {
        Self {
            base_revision,
            changes: log.changes().cloned().collect(),
        }
    }

    /// Number of changes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the request carries no changes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// JSON body
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayplan_model::PoiId;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let mut log = PendingChangeLog::new();
        log.push(DayChange::replace_place(PoiId::new("poi_123").unwrap(), None));
        log.push(DayChange::wish("more cafes"));

        let request = TransactionRequest::from_log(Revision(5), &log);
        assert_eq!(request.len(), 2);

        let value: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "baseRevision": 5,
                "changes": [
                    {"type": "replace_place", "data": {"from": "poi_123", "to": null}},
                    {"type": "add_wish", "data": {"text": "more cafes"}}
                ]
            })
        );
    }

    #[test]
    fn request_decodes_server_side() {
        let body = r#"{"baseRevision":7,"changes":[{"type":"set_preset","data":{"preset":"food"}}]}"#;
        let request: TransactionRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.base_revision, Revision(7));
        assert_eq!(
            request.changes,
            vec![DayChange::preset(Some(dayplan_model::ThematicPreset::Food))]
        );
    }
}
