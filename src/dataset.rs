//! Example dialogue dataset loading.

use std::io;

use tracing::{debug, info};

use crate::config::DatasetSettings;
use crate::error::StartupError;

/// One worked example: a client conversation and the agent's response to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueExample {
    pub dialogue: String,
    pub label: String,
}

impl DialogueExample {
    pub fn new(dialogue: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            dialogue: dialogue.into(),
            label: label.into(),
        }
    }
}

/// Read every row of the CSV file named in `settings`.
pub fn load_dataset(settings: &DatasetSettings) -> Result<Vec<DialogueExample>, StartupError> {
    let path = settings.path.as_path();
    let file = std::fs::File::open(path).map_err(|e| StartupError::dataset(path, e))?;

    let examples = read_examples(file, &settings.dialogue_column, &settings.label_column)
        .map_err(|e| StartupError::dataset(path, e))?;

    info!(path = %path.display(), rows = examples.len(), "loaded dialogue dataset");
    Ok(examples)
}

/// Parse CSV rows from `reader`, picking the two named columns.
///
/// Missing columns and short rows yield empty strings instead of errors.
pub fn read_examples<R: io::Read>(
    reader: R,
    dialogue_column: &str,
    label_column: &str,
) -> Result<Vec<DialogueExample>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let dialogue_idx = headers.iter().position(|h| h.trim() == dialogue_column);
    let label_idx = headers.iter().position(|h| h.trim() == label_column);

    if dialogue_idx.is_none() || label_idx.is_none() {
        debug!(
            ?dialogue_idx,
            ?label_idx,
            "dataset is missing an expected column; substituting empty strings"
        );
    }

    let field = |record: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i)).unwrap_or_default().to_string()
    };

    reader
        .records()
        .map(|record| {
            let record = record?;
            Ok(DialogueExample {
                dialogue: field(&record, dialogue_idx),
                label: field(&record, label_idx),
            })
        })
        .collect()
}
