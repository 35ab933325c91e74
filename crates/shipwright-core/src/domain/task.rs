//! Task descriptor: the unit of work accepted by intake.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::errors::PipelineError;

/// One attachment as submitted: a file name and a self-describing
/// `data:<media-type>;base64,<body>` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Everything needed to build, publish and report one artifact.
///
/// Immutable once accepted: the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub email: String,
    #[serde(rename = "task")]
    pub task_id: String,
    pub round: u32,
    pub nonce: String,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(rename = "evaluation_url")]
    pub callback_url: String,
}

impl TaskDescriptor {
    /// Filesystem and repository safe form of the task id.
    ///
    /// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `-`.
    pub fn slug(&self) -> String {
        let slug: String = self
            .task_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let slug = slug.trim_matches('-');
        if slug.is_empty() {
            "task".to_string()
        } else {
            slug.to_string()
        }
    }
}

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a `data:<media-type>;base64,<body>` string.
///
/// The `data:` prefix is optional. Whitespace inside the body is ignored so
/// that wrapped payloads decode.
pub fn decode_data_uri(name: &str, raw: &str) -> Result<DataUri, PipelineError> {
    let decode_err = |reason: &str| PipelineError::Decode {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let rest = raw.strip_prefix("data:").unwrap_or(raw);
    let (media_type, body) = rest
        .split_once(";base64,")
        .ok_or_else(|| decode_err("missing ';base64,' marker"))?;

    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| decode_err(&format!("invalid base64: {e}")))?;

    Ok(DataUri {
        media_type: media_type.to_string(),
        bytes,
    })
}
