//! Errors that reject an upload batch.

use crate::consistency::ConversationMismatch;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UploadError>;

/// Why a batch was rejected. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please select at least one JSON file")]
    NoFiles,

    #[error("Invalid file types: {}. Please upload only JSON files.", .0.join(", "))]
    InvalidFileTypes(Vec<String>),

    #[error("Failed to read file \"{filename}\"")]
    ReadFailed {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in file \"{filename}\"")]
    InvalidJson {
        filename: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unrecognized file format in: {}. Please upload Instagram message files or processed stats JSON.", .0.join(", "))]
    UnrecognizedFormat(Vec<String>),

    #[error("Cannot mix raw Instagram files and processed stats files. Please upload only one type.")]
    MixedTypes,

    #[error("Multiple processed stats files detected. Please upload only one processed stats file.")]
    MultipleProcessedFiles,

    #[error("Files appear to be from different conversations. {0}Please ensure all uploaded files are from the same conversation.")]
    DifferentConversations(#[from] ConversationMismatch),

    #[error("Processing raw Instagram files is not yet implemented ({file_count} file(s) validated). Please upload a processed stats JSON file.")]
    RawStatsNotImplemented { file_count: usize },
}
