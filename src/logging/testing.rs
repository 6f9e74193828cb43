//! Recording logger for unit tests.

use parking_lot::Mutex;

use crate::logging::logger::{Field, Level, Logger, render};

/// Keeps every record as `(level, "msg k=v ...")`.
#[derive(Default)]
pub(crate) struct RecordingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.records.lock().iter().filter(|(l, _)| *l == level).count()
    }

    /// Records at `level` whose text contains `needle`.
    pub fn matching(&self, level: Level, needle: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|(l, text)| *l == level && text.contains(needle))
            .count()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, msg: &str, fields: &[Field<'_>]) {
        self.records.lock().push((level, format!("{msg} {}", render(fields))));
    }
}
