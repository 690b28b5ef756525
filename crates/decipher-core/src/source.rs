//! Notebook sources: links, pasted text and uploaded files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DecipherError, Result};

/// Default cap on sources per notebook.
pub const MAX_SOURCES: usize = 20;

/// Discriminant of a source, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Url,
    Manual,
    Upload,
}

/// Type-specific payload of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A web page the pipeline should fetch.
    Url { url: String },
    /// Text pasted in by the user.
    Manual { content: String },
    /// A file placed in object storage.
    Upload {
        file_path: String,
        public_url: String,
        filename: Option<String>,
    },
}

impl SourceKind {
    pub fn source_type(&self) -> SourceType {
        match self {
            SourceKind::Url { .. } => SourceType::Url,
            SourceKind::Manual { .. } => SourceType::Manual,
            SourceKind::Upload { .. } => SourceType::Upload,
        }
    }

    /// Shape the research service expects for each source.
    pub fn to_research(&self) -> ResearchSource {
        let (source_url, source_content) = match self {
            SourceKind::Url { url } => (Some(url.clone()), None),
            SourceKind::Manual { content } => (None, Some(content.clone())),
            SourceKind::Upload { public_url, .. } => (Some(public_url.clone()), None),
        };
        ResearchSource {
            source_type: self.source_type(),
            source_url,
            source_content,
        }
    }
}

/// A stored source. Owned by exactly one notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SourceRow", try_from = "SourceRow")]
pub struct Source {
    pub id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub kind: SourceKind,
}

impl Source {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Some(Utc::now()),
            kind,
        }
    }
}

/// Flat JSON representation of a [`Source`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceRow {
    id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    source_type: SourceType,
    source_url: Option<String>,
    content: Option<String>,
    file_path: Option<String>,
    filename: Option<String>,
}

impl From<Source> for SourceRow {
    fn from(source: Source) -> Self {
        let mut row = SourceRow {
            id: source.id,
            created_at: source.created_at,
            source_type: source.kind.source_type(),
            source_url: None,
            content: None,
            file_path: None,
            filename: None,
        };
        match source.kind {
            SourceKind::Url { url } => row.source_url = Some(url),
            SourceKind::Manual { content } => row.content = Some(content),
            SourceKind::Upload {
                file_path,
                public_url,
                filename,
            } => {
                row.source_url = Some(public_url);
                row.file_path = Some(file_path);
                row.filename = filename;
            }
        }
        row
    }
}

impl TryFrom<SourceRow> for Source {
    type Error = DecipherError;

    fn try_from(row: SourceRow) -> Result<Self> {
        let input = SourceInput {
            source_type: row.source_type,
            source_url: row.source_url,
            content: row.content,
            file_path: row.file_path,
            filename: row.filename,
        };
        Ok(Source {
            id: row.id,
            created_at: row.created_at,
            kind: input.into_kind()?,
        })
    }
}

/// A source as submitted by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInput {
    pub source_type: SourceType,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl SourceInput {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::Url,
            source_url: Some(url.into()),
            content: None,
            file_path: None,
            filename: None,
        }
    }

    pub fn manual(content: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::Manual,
            source_url: None,
            content: Some(content.into()),
            file_path: None,
            filename: None,
        }
    }

    pub fn upload(
        file_path: impl Into<String>,
        public_url: impl Into<String>,
        filename: Option<String>,
    ) -> Self {
        Self {
            source_type: SourceType::Upload,
            source_url: Some(public_url.into()),
            content: None,
            file_path: Some(file_path.into()),
            filename,
        }
    }

    /// Validate the type-specific fields.
    pub fn into_kind(self) -> Result<SourceKind> {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        match self.source_type {
            SourceType::Url => {
                let url = non_blank(self.source_url)
                    .ok_or_else(|| DecipherError::validation("URL source requires sourceUrl"))?;
                let url = url.trim().to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(DecipherError::validation(format!(
                        "URL source must be http(s): {url}"
                    )));
                }
                Ok(SourceKind::Url { url })
            }
            SourceType::Manual => {
                let content = non_blank(self.content)
                    .ok_or_else(|| DecipherError::validation("MANUAL source requires content"))?;
                Ok(SourceKind::Manual { content })
            }
            SourceType::Upload => {
                let file_path = non_blank(self.file_path)
                    .ok_or_else(|| DecipherError::validation("UPLOAD source requires filePath"))?;
                let public_url = non_blank(self.source_url)
                    .ok_or_else(|| DecipherError::validation("UPLOAD source requires sourceUrl"))?;
                Ok(SourceKind::Upload {
                    file_path,
                    public_url,
                    filename: non_blank(self.filename),
                })
            }
        }
    }
}

/// Validate a full replacement set of sources.
pub fn validate_sources(inputs: Vec<SourceInput>, max_sources: usize) -> Result<Vec<SourceKind>> {
    if inputs.len() > max_sources {
        return Err(DecipherError::validation(format!(
            "at most {max_sources} sources per notebook, got {}",
            inputs.len()
        )));
    }
    inputs.into_iter().map(SourceInput::into_kind).collect()
}

/// Source as sent to the research service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSource {
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub source_content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_source_validation() {
        assert!(SourceInput::url("https://example.com/paper").into_kind().is_ok());
        assert!(SourceInput::url("ftp://example.com").into_kind().is_err());
        assert!(SourceInput::url("  ").into_kind().is_err());
    }

    #[test]
    fn test_manual_source_requires_content() {
        assert!(SourceInput::manual("").into_kind().is_err());
        let kind = SourceInput::manual("notes").into_kind().unwrap();
        assert_eq!(kind.source_type(), SourceType::Manual);
    }

    #[test]
    fn test_upload_source_normalisation() {
        let kind = SourceInput::upload(
            "uploads/u1/1-abc-paper.pdf",
            "https://files.example.com/uploads/u1/1-abc-paper.pdf",
            Some("paper.pdf".to_string()),
        )
        .into_kind()
        .unwrap();

        let research = kind.to_research();
        assert_eq!(research.source_type, SourceType::Upload);
        assert_eq!(
            research.source_url.as_deref(),
            Some("https://files.example.com/uploads/u1/1-abc-paper.pdf")
        );
        assert!(research.source_content.is_none());

        let json = serde_json::to_value(&research).unwrap();
        assert_eq!(json["source_type"], "UPLOAD");
    }

    #[test]
    fn test_source_limit() {
        let inputs = (0..3).map(|i| SourceInput::manual(format!("n{i}"))).collect();
        let err = validate_sources(inputs, 2).unwrap_err();
        assert!(matches!(err, DecipherError::Validation { .. }));
    }

    #[test]
    fn test_source_json_shape() {
        let source = Source::new(SourceKind::Manual {
            content: "pasted".to_string(),
        });
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["sourceType"], "MANUAL");
        assert_eq!(json["content"], "pasted");
        assert!(json["sourceUrl"].is_null());

        let back: Source = serde_json::from_value(json).unwrap();
        assert_eq!(back, source);
    }
}
