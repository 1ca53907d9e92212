use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One extracted record: field name to value, in field order
pub type ExtractedItem = Map<String, Value>;

/// Position of a record within the page it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePosition {
    /// Page number as sent in the page parameter
    pub page: i64,

    /// 1-based index of the record on its page
    pub element_number: usize,

    /// Records found on the page
    pub total_elements_on_page: usize,
}

/// Progress event emitted by a paginated extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtractionEvent {
    /// A record extracted from a page
    Result {
        #[serde(flatten)]
        position: PagePosition,
        data: ExtractedItem,
    },

    /// A page that could not be fetched, parsed or extracted
    Error { page: i64, message: String },
}

impl ExtractionEvent {
    pub fn page(&self) -> i64 {
        match self {
            ExtractionEvent::Result { position, .. } => position.page,
            ExtractionEvent::Error { page, .. } => *page,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExtractionEvent::Error { .. })
    }
}

/// Items and page errors accumulated from a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub items: Vec<ExtractedItem>,
    pub errors: Vec<(i64, String)>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the dataset
    pub fn push(&mut self, event: ExtractionEvent) {
        match event {
            ExtractionEvent::Result { data, .. } => self.items.push(data),
            ExtractionEvent::Error { page, message } => self.errors.push((page, message)),
        }
    }

    /// Write the items as a pretty-printed JSON array
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.items)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl FromIterator<ExtractionEvent> for Dataset {
    fn from_iter<I: IntoIterator<Item = ExtractionEvent>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        for event in iter {
            dataset.push(event);
        }
        dataset
    }
}
