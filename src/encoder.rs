//! Snapshot encoding
//!
//! This module wraps a computed dashboard view into a self-describing JSON
//! payload carrying producer and provenance metadata.

use chrono::Utc;
use uuid::Uuid;

use crate::error::ComputeError;
use crate::source::Dataset;
use crate::types::{DashboardView, SnapshotPayload, SnapshotProducer, SnapshotProvenance};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Snapshot encoder for producing dashboard payloads
pub struct SnapshotEncoder {
    instance_id: String,
}

impl Default for SnapshotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a dashboard view computed from `dataset`
    pub fn encode(&self, view: &DashboardView, dataset: &Dataset) -> SnapshotPayload {
        let producer = SnapshotProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = SnapshotProvenance {
            source_path: dataset.source().path.display().to_string(),
            data_origin: dataset.origin().as_str().to_string(),
            records_loaded: dataset.records().len(),
            rows_rejected: dataset.report().rejected_rows(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        SnapshotPayload {
            snapshot_version: SNAPSHOT_VERSION.to_string(),
            producer,
            provenance,
            dashboard: view.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        view: &DashboardView,
        dataset: &Dataset,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(view, dataset);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }
}
