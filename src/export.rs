//! Session bundle serialization for the persistence backend.
//!
//! The core's only obligation toward persistence is to hand over its
//! annotation and group arrays as plain, JSON-serializable data — no cyclic
//! references, no live state. The backend itself (transport, retries,
//! session ids) is a collaborator outside this crate.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use serde::{Deserialize, Serialize};

use crate::engine::RecordedSurface;
use crate::store::{Annotation, Group, SessionStore};

/// Error returned by the bundle codec.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The bundle could not be serialized or parsed as JSON.
    #[error("failed to encode session bundle: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Everything a finished session ships to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    pub session_name: String,
    pub image_id: String,
    pub session_id: String,
    pub annotations: Vec<Annotation>,
    pub groups: Vec<Group>,
    /// URL of the recorded narration, when the audio collaborator produced
    /// one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub audio_url: Option<String>,
    /// The surface the session was recorded on, so replay can remap points.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub recorded: Option<RecordedSurface>,
}

impl SessionBundle {
    /// Snapshot a store into a bundle. Annotations are copied in timestamp
    /// order so consumers can replay the array as-is.
    #[must_use]
    pub fn from_store(
        session_name: impl Into<String>,
        image_id: impl Into<String>,
        session_id: impl Into<String>,
        store: &SessionStore,
        recorded: Option<RecordedSurface>,
        audio_url: Option<String>,
    ) -> Self {
        Self {
            session_name: session_name.into(),
            image_id: image_id.into(),
            session_id: session_id.into(),
            annotations: store.sorted_annotations().into_iter().cloned().collect(),
            groups: store.groups().to_vec(),
            audio_url,
            recorded,
        }
    }

    /// Encode the bundle as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Codec`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a bundle from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Codec`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }
}
