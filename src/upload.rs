//! Batch upload: reading, classification and validation of selected files.

use crate::classify::{classify, Classification};
use crate::consistency::validate_same_conversation;
use crate::error::{Result, UploadError};
use crate::types::{ProcessedStats, RawExportFile, SelectedFile, UploadedFile};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Checkpoints reported while a batch is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadingFiles,
    ValidatingFormats,
    ValidatingConsistency,
    Processing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::ReadingFiles => "Reading files...",
            Stage::ValidatingFormats => "Validating file formats...",
            Stage::ValidatingConsistency => "Validating conversation consistency...",
            Stage::Processing => "Processing...",
        };
        f.write_str(label)
    }
}

/// A batch of raw exports that passed validation but has not been turned
/// into statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "raw_instagram")]
pub struct RawExportBatch {
    pub files: Vec<RawExportFile>,
    #[serde(rename = "fileCount")]
    pub file_count: usize,
}

/// What an accepted batch produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadPayload {
    ProcessedStats(ProcessedStats),
    RawExports(RawExportBatch),
}

impl UploadPayload {
    /// Statistics ready for display.
    ///
    /// Raw exports are not aggregated, so they are rejected here.
    pub fn into_stats(self) -> Result<ProcessedStats> {
        match self {
            UploadPayload::ProcessedStats(stats) => Ok(stats),
            UploadPayload::RawExports(batch) => Err(UploadError::RawStatsNotImplemented {
                file_count: batch.file_count,
            }),
        }
    }
}

/// Runs upload batches, optionally reporting progress stages on a channel.
#[derive(Debug, Clone, Default)]
pub struct Uploader {
    progress: Option<UnboundedSender<Stage>>,
}

impl Uploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(progress: UnboundedSender<Stage>) -> Self {
        Self {
            progress: Some(progress),
        }
    }

    fn report(&self, stage: Stage) {
        debug!(%stage, "upload progress");
        if let Some(progress) = &self.progress {
            // A closed receiver only means nobody is watching.
            let _ = progress.send(stage);
        }
    }

    /// Validate one batch of selected files.
    ///
    /// Every gate is terminal: the first failure rejects the whole batch.
    pub async fn process_files(&self, files: &[SelectedFile]) -> Result<UploadPayload> {
        let result = self.run_gates(files).await;
        match &result {
            Ok(UploadPayload::ProcessedStats(_)) => info!("accepted processed stats file"),
            Ok(UploadPayload::RawExports(batch)) => {
                info!(file_count = batch.file_count, "accepted raw export batch")
            }
            Err(err) => warn!("upload rejected: {err}"),
        }
        result
    }

    async fn run_gates(&self, files: &[SelectedFile]) -> Result<UploadPayload> {
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }

        let invalid: Vec<String> = files
            .iter()
            .filter(|file| !file.is_json())
            .map(|file| file.name.clone())
            .collect();
        if !invalid.is_empty() {
            return Err(UploadError::InvalidFileTypes(invalid));
        }

        self.report(Stage::ReadingFiles);
        let uploaded = try_join_all(files.iter().map(read_file)).await?;

        self.report(Stage::ValidatingFormats);
        let mut raw_files = Vec::new();
        let mut processed_files = Vec::new();
        let mut unknown_files = Vec::new();
        for UploadedFile { filename, data } in uploaded {
            let classification = classify(&data);
            debug!(file = %filename, label = %classification.label(), "classified upload");
            match classification {
                Classification::RawExport(export) => raw_files.push(RawExportFile {
                    filename,
                    data,
                    export,
                }),
                Classification::ProcessedStats(stats) => processed_files.push(stats),
                Classification::Unknown => unknown_files.push(filename),
            }
        }

        if !unknown_files.is_empty() {
            return Err(UploadError::UnrecognizedFormat(unknown_files));
        }

        if !raw_files.is_empty() && !processed_files.is_empty() {
            return Err(UploadError::MixedTypes);
        }

        if !processed_files.is_empty() {
            if processed_files.len() > 1 {
                return Err(UploadError::MultipleProcessedFiles);
            }
            return Ok(UploadPayload::ProcessedStats(processed_files.remove(0)));
        }

        self.report(Stage::ValidatingConsistency);
        validate_same_conversation(&raw_files)?;

        self.report(Stage::Processing);
        let file_count = raw_files.len();
        Ok(UploadPayload::RawExports(RawExportBatch {
            files: raw_files,
            file_count,
        }))
    }
}

/// Validate a batch without progress reporting.
pub async fn process_files(files: &[SelectedFile]) -> Result<UploadPayload> {
    Uploader::new().process_files(files).await
}

/// Read one selected file and parse it as JSON.
pub async fn read_file(file: &SelectedFile) -> Result<UploadedFile> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| UploadError::ReadFailed {
            filename: file.name.clone(),
            source,
        })?;
    debug!(file = %file.name, bytes = bytes.len(), "read upload");
    parse_uploaded(&file.name, &bytes)
}

/// Decode file bytes as text and parse them as JSON.
///
/// Invalid UTF-8 sequences are replaced and a leading byte order mark is
/// dropped, matching a browser text read.
pub fn parse_uploaded(filename: &str, bytes: &[u8]) -> Result<UploadedFile> {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);
    let data: Value = serde_json::from_str(text).map_err(|source| UploadError::InvalidJson {
        filename: filename.to_string(),
        source,
    })?;
    Ok(UploadedFile {
        filename: filename.to_string(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_with_bom() {
        let uploaded = parse_uploaded("stats.json", "\u{feff}{\"a\": 1}".as_bytes()).unwrap();
        assert_eq!(uploaded.filename, "stats.json");
        assert_eq!(uploaded.data, json!({"a": 1}));
    }

    #[test]
    fn invalid_utf8_inside_strings_is_replaced() {
        let mut bytes = b"{\"title\": \"caf".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b"\"}");
        let uploaded = parse_uploaded("message_1.json", &bytes).unwrap();
        assert_eq!(uploaded.data["title"], json!("caf\u{fffd}"));
    }

    #[test]
    fn invalid_json_names_the_file() {
        let err = parse_uploaded("broken.json", b"{not json").unwrap_err();
        assert!(matches!(err, UploadError::InvalidJson { .. }));
        assert_eq!(err.to_string(), "Invalid JSON in file \"broken.json\"");
    }

    #[test]
    fn stage_labels() {
        assert_eq!(Stage::ReadingFiles.to_string(), "Reading files...");
        assert_eq!(Stage::ValidatingFormats.to_string(), "Validating file formats...");
        assert_eq!(
            Stage::ValidatingConsistency.to_string(),
            "Validating conversation consistency..."
        );
        assert_eq!(Stage::Processing.to_string(), "Processing...");
    }

    #[test]
    fn raw_payload_cannot_be_displayed() {
        let payload = UploadPayload::RawExports(RawExportBatch {
            files: Vec::new(),
            file_count: 2,
        });
        let err = payload.into_stats().unwrap_err();
        assert!(matches!(
            err,
            UploadError::RawStatsNotImplemented { file_count: 2 }
        ));
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let err = process_files(&[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select at least one JSON file");
    }

    #[tokio::test]
    async fn declared_content_type_must_be_json() {
        let files = [SelectedFile::new("stats.json", "text/plain", "/nonexistent/stats.json")];
        let err = process_files(&files).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file types: stats.json. Please upload only JSON files."
        );
    }

    #[tokio::test]
    async fn missing_file_fails_to_read() {
        let files = [SelectedFile::from_path("/nonexistent/rewind/message_1.json")];
        let err = process_files(&files).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to read file \"message_1.json\"");
    }
}
