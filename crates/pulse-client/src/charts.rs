use pulse_types::models::Chart;

use crate::Status;

/// Local mirror of the chart list. Create/update/delete apply the
/// operation's own response optimistically instead of re-fetching; the
/// list does not reconcile against broadcaster writes (those reach the
/// live slice instead).
#[derive(Debug, Default)]
pub struct ChartList {
    items: Vec<Chart>,
    status: Status,
    error: Option<String>,
}

impl ChartList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_started(&mut self) {
        self.status = Status::Loading;
        self.error = None;
    }

    pub fn request_failed(&mut self, message: impl Into<String>) {
        self.status = Status::Failed;
        self.error = Some(message.into());
    }

    /// Replace the cached list with a fresh server snapshot.
    pub fn snapshot(&mut self, charts: Vec<Chart>) {
        self.items = charts;
        self.status = Status::Idle;
        self.error = None;
    }

    /// A create succeeded: the new chart goes to the front of the list.
    pub fn created(&mut self, chart: Chart) {
        self.items.insert(0, chart);
        self.status = Status::Idle;
        self.error = None;
    }

    /// An update succeeded: replace the matching entry in place. A miss
    /// (e.g. the list was never fetched) is ignored.
    pub fn updated(&mut self, chart: Chart) {
        if let Some(existing) = self.items.iter_mut().find(|c| c.id == chart.id) {
            *existing = chart;
        }
        self.status = Status::Idle;
        self.error = None;
    }

    /// A delete succeeded: drop the matching entry.
    pub fn deleted(&mut self, id: i64) {
        self.items.retain(|c| c.id != id);
        self.status = Status::Idle;
        self.error = None;
    }

    pub fn items(&self) -> &[Chart] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&Chart> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
