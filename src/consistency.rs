//! Cross-file checks that raw exports belong to one conversation.

use crate::types::RawExportFile;
use thiserror::Error;

/// The first difference found between a raw export and the reference file.
///
/// `Display` renders the clause used inside the "different conversations"
/// message, trailing space included.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationMismatch {
    #[error("Chat titles don't match. Expected: \"{expected}\" but found: \"{found}\" in file \"{file}\". ")]
    TitleMismatch {
        expected: String,
        found: String,
        file: String,
    },
    #[error("Different number of participants. Expected: {expected_count} people, but found: {found_count} people in file \"{file}\". ")]
    ParticipantCountMismatch {
        expected_count: usize,
        found_count: usize,
        file: String,
    },
    #[error("Different participants. Expected: {}, but found: {} in file \"{file}\". ", .expected.join(", "), .found.join(", "))]
    ParticipantNameMismatch {
        expected: Vec<String>,
        found: Vec<String>,
        file: String,
    },
}

impl ConversationMismatch {
    /// Stable tag for the kind of mismatch.
    pub fn reason(&self) -> &'static str {
        match self {
            ConversationMismatch::TitleMismatch { .. } => "title_mismatch",
            ConversationMismatch::ParticipantCountMismatch { .. } => "participant_count_mismatch",
            ConversationMismatch::ParticipantNameMismatch { .. } => "participant_name_mismatch",
        }
    }

    /// Name of the file that disagreed with the reference.
    pub fn file(&self) -> &str {
        match self {
            ConversationMismatch::TitleMismatch { file, .. }
            | ConversationMismatch::ParticipantCountMismatch { file, .. }
            | ConversationMismatch::ParticipantNameMismatch { file, .. } => file,
        }
    }
}

/// Check that every raw export shares the first file's title and participants.
///
/// Files are compared against the first one in order. Title is checked before
/// participant count, which is checked before the sorted names; the first
/// failing check of the first failing file is returned.
pub fn validate_same_conversation(files: &[RawExportFile]) -> Result<(), ConversationMismatch> {
    let Some((reference, rest)) = files.split_first() else {
        return Ok(());
    };

    let expected_title = &reference.export.title;
    let expected_names = reference.export.sorted_participant_names();

    for current in rest {
        let found_title = &current.export.title;
        let found_names = current.export.sorted_participant_names();

        if expected_title != found_title {
            return Err(ConversationMismatch::TitleMismatch {
                expected: expected_title.clone(),
                found: found_title.clone(),
                file: current.filename.clone(),
            });
        }

        if expected_names.len() != found_names.len() {
            return Err(ConversationMismatch::ParticipantCountMismatch {
                expected_count: expected_names.len(),
                found_count: found_names.len(),
                file: current.filename.clone(),
            });
        }

        if expected_names
            .iter()
            .zip(&found_names)
            .any(|(expected, found)| expected != found)
        {
            return Err(ConversationMismatch::ParticipantNameMismatch {
                expected: expected_names,
                found: found_names,
                file: current.filename.clone(),
            });
        }
    }

    Ok(())
}
