use serde::{Deserialize, Serialize};

use crate::domain::entities::resume::{Education, PersonalInfo, ResumeDocument, SkillCategory};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Sequence number attached to both phases of one preview refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderTicket(pub u64);

/// The part of the document the renderer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub personal_info: PersonalInfo,
    pub education: Vec<Education>,
    pub skills: Vec<SkillCategory>,
}

impl From<&ResumeDocument> for RenderRequest {
    fn from(doc: &ResumeDocument) -> Self {
        Self {
            personal_info: doc.personal_info.clone(),
            education: doc.education.clone(),
            skills: doc.skills.clone(),
        }
    }
}

/// A rendered preview held in process memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl PreviewArtifact {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Observable state of the preview cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PreviewStatus {
    Empty,
    Loading {
        /// Handle still displayed while the new render is in progress.
        current: Option<String>,
    },
    Ready {
        uri: String,
    },
    Failed {
        error: String,
        /// Last successfully displayed handle, kept on failure.
        last_good: Option<String>,
    },
}

impl PreviewStatus {
    /// The handle URI the UI should currently display, if any.
    pub fn displayed_uri(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Loading { current } => current.as_deref(),
            Self::Ready { uri } => Some(uri),
            Self::Failed { last_good, .. } => last_good.as_deref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}
