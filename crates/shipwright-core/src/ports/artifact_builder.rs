//! ArtifactBuilder port - turns a brief into the files to publish.
//!
//! Implementations must be pure: no network, no randomness, no clock reads.
//! The caller passes the year so the output is reproducible.

use std::collections::BTreeMap;

use crate::domain::Attachment;

/// Relative path -> file content.
pub type FileMap = BTreeMap<String, String>;

pub trait ArtifactBuilder: Send + Sync {
    fn build(&self, brief: &str, attachments: &[Attachment], year: i32) -> FileMap;
}
