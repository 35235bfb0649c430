//! Rewind - validate exported chat conversations and render a summary
//!
//! This library checks a batch of uploaded JSON files: it tells raw chat
//! exports apart from pre-computed statistics, rejects mixed or malformed
//! batches, and makes sure several raw export files describe the same
//! conversation. Accepted statistics can be rendered as terminal cards.
//!
//! # Examples
//!
//! ## Validating a batch
//!
//! ```no_run
//! use rewind::{process_files, SelectedFile};
//!
//! # async fn run() -> Result<(), rewind::UploadError> {
//! let files = vec![
//!     SelectedFile::from_path("/path/to/message_1.json"),
//!     SelectedFile::from_path("/path/to/message_2.json"),
//! ];
//! let payload = process_files(&files).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Rendering processed stats
//!
//! ```no_run
//! use rewind::{process_files, render_cards, RenderOptions, SelectedFile};
//!
//! # async fn run() -> Result<(), rewind::UploadError> {
//! let files = vec![SelectedFile::from_path("/path/to/stats.json")];
//! let stats = process_files(&files).await?.into_stats()?;
//! println!("{}", render_cards(&stats, &RenderOptions::default()));
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod classify;
pub mod consistency;
pub mod error;
pub mod upload;
pub mod render;

pub use types::{
    ProcessedStats, RawExport, RawExportFile, SelectedFile, UploadedFile,
};
pub use classify::{classify, Classification, ClassificationLabel};
pub use consistency::{validate_same_conversation, ConversationMismatch};
pub use error::UploadError;
pub use upload::{
    process_files, read_file, RawExportBatch, Stage, UploadPayload, Uploader,
};
pub use render::{render_cards, CardVariant, RenderOptions};
