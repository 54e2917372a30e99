use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a file derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Audio,
    Binary,
    Document,
    Image,
    Video,
}

impl FileType {
    /// Derive a file type classification from a MIME type string.
    pub fn from_mime(mime_type: &str) -> Self {
        let (primary, sub) = mime_type.split_once('/').unwrap_or((mime_type, ""));
        match primary {
            "audio" => FileType::Audio,
            "image" => FileType::Image,
            "video" => FileType::Video,
            "text" => FileType::Document,
            "application" => match sub {
                "pdf"
                | "msword"
                | "rtf"
                | "vnd.openxmlformats-officedocument.wordprocessingml.document"
                | "vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                | "vnd.openxmlformats-officedocument.presentationml.presentation"
                | "vnd.ms-excel"
                | "vnd.ms-powerpoint" => FileType::Document,
                _ => FileType::Binary,
            },
            _ => FileType::Binary,
        }
    }

    /// Directory segment used by type-partitioned storage layouts.
    pub fn as_dir(&self) -> &'static str {
        match self {
            FileType::Audio => "audio",
            FileType::Binary => "binary",
            FileType::Document => "document",
            FileType::Image => "image",
            FileType::Video => "video",
        }
    }
}

/// A physical, content-addressed blob. Exactly one per distinct hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: u64,
    pub hash: String,
    pub size: u64,
    pub mime_type: String,
    /// Storage directory chosen when the file was first ingested
    pub storage_dir: String,
    /// Desired number of replicas
    pub importance: u32,
    pub created_at: DateTime<Utc>,
}

/// A named reference from an owner to a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub id: u64,
    pub owner_id: u64,
    pub file_id: u64,
    pub filename: String,
    pub extension: String,
    pub created_at: DateTime<Utc>,
}

/// Evidence of one completed copy of a file to a replica target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaRecord {
    pub id: u64,
    pub file_id: u64,
    pub storage_id: u64,
    pub location_id: u64,
    /// Opaque, target-specific data (e.g. the remote object key)
    pub context: String,
    pub created_at: DateTime<Utc>,
}
