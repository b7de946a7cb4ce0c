use std::collections::HashMap;

/// Per-folder counters for the `{counter}` token.
///
/// Each destination folder counts independently from the configured start.
#[derive(Debug, Clone)]
pub struct FolderCounters {
    start: u32,
    next: HashMap<String, u32>,
}

impl FolderCounters {
    pub fn new(start: u32) -> Self {
        Self {
            start,
            next: HashMap::new(),
        }
    }

    /// Take the next counter value for a folder.
    pub fn next(&mut self, folder: &str) -> u32 {
        let slot = self.next.entry(folder.to_string()).or_insert(self.start);
        let value = *slot;
        *slot = slot.saturating_add(1);
        value
    }
}
