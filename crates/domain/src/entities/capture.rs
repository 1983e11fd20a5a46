use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaptureId(pub Uuid);

impl CaptureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaptureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Envelope of one user-triggered capture event.
///
/// `protocol`, `captured_at` and `content` are required for the batch to be
/// processed; they are optional here so that a malformed envelope can still
/// be represented and reported on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    #[serde(default)]
    pub id: CaptureId,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
    /// Raw page snapshot as produced by the browser host.
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Screenshot bytes, when one was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
}

impl Capture {
    pub fn new(
        protocol: impl Into<String>,
        captured_at: DateTime<Utc>,
        content: serde_json::Value,
    ) -> Self {
        Self {
            id: CaptureId::new(),
            protocol: Some(protocol.into()),
            captured_at: Some(captured_at),
            content: Some(content),
            url: None,
            title: None,
            image: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Protocol name, if present and not blank.
    pub fn protocol_name(&self) -> Option<&str> {
        self.protocol.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Snapshot content is present and non-empty.
    pub fn has_content(&self) -> bool {
        match &self.content {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(serde_json::Value::Array(a)) => !a.is_empty(),
            Some(serde_json::Value::Object(o)) => !o.is_empty(),
            Some(_) => true,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.as_ref().is_some_and(|i| !i.is_empty())
    }
}
