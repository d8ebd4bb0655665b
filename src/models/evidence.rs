use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Kind of documentation attached to a checklist item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvidenceKind {
    Note,
    Photo,
    Signature,
}

/// A note, photo or signature captured during checklist execution.
///
/// Evidence is append-only: records are never mutated or deleted once
/// created. The actual bytes live in an external blob store; the core only
/// keeps the `content_ref`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    /// Owning checklist instance item.
    pub item_id: Uuid,
    pub kind: EvidenceKind,
    /// Opaque reference into the external blob store.
    pub content_ref: String,
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for attaching a piece of evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvidence {
    pub kind: EvidenceKind,
    pub content_ref: String,
}

impl NewEvidence {
    pub fn new(kind: EvidenceKind, content_ref: impl Into<String>) -> Self {
        Self {
            kind,
            content_ref: content_ref.into(),
        }
    }

    pub(crate) fn into_evidence(self, item_id: Uuid, author: Uuid) -> Evidence {
        Evidence {
            id: Uuid::new_v4(),
            item_id,
            kind: self.kind,
            content_ref: self.content_ref,
            author,
            created_at: Utc::now(),
        }
    }
}
