use crate::model::{ExtractionEvent, OperationKind};
use crate::state::ResultState;
use serde::Serialize;

pub const COLUMN_HEADERS: [&str; 4] = ["Event", "Start", "End", "Source line"];

const BUSY_LABEL: &str = "Extracting...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub operation: &'static str,
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub event: String,
    pub start: String,
    pub end: String,
    pub source: String,
}

impl From<&ExtractionEvent> for Row {
    fn from(event: &ExtractionEvent) -> Self {
        Self {
            event: event.event.clone(),
            start: event.start.clone().unwrap_or_default(),
            end: event.end.clone().unwrap_or_default(),
            source: event.source.clone(),
        }
    }
}

impl Row {
    pub fn cells(&self) -> [&str; 4] {
        [&self.event, &self.start, &self.end, &self.source]
    }
}

/// Everything a renderer needs, derived from one `ResultState` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub busy: bool,
    pub controls: [Control; 2],
    pub error: Option<String>,
    pub count: u64,
    pub rows: Vec<Row>,
}

impl View {
    pub fn project(state: &ResultState) -> Self {
        let busy = state.is_busy();
        let extract_label = if busy {
            BUSY_LABEL
        } else {
            OperationKind::ExtractEvents.label()
        };

        Self {
            busy,
            controls: [
                Control {
                    operation: OperationKind::ExtractEvents.label(),
                    label: extract_label,
                    enabled: !busy,
                },
                Control {
                    operation: OperationKind::ExtractCsv.label(),
                    label: OperationKind::ExtractCsv.label(),
                    enabled: !busy,
                },
            ],
            error: state.error_message().map(str::to_string),
            count: state.count(),
            rows: state.events().iter().map(Row::from).collect(),
        }
    }

    pub fn summary(&self) -> String {
        format!("Found: {} rows", self.count)
    }

    /// The table is only shown when there is something in it.
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}
