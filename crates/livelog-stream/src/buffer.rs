use std::collections::VecDeque;

use livelog_types::LogLevel;

/// One formatted line together with the raw event it was rendered from.
///
/// Keeping the raw text is what allows a theme reload to re-render history
/// instead of dropping it.
#[derive(Clone, Debug)]
pub struct BufferedLine {
    pub raw: String,
    pub level: LogLevel,
    pub formatted: String,
}

/// Bounded FIFO of formatted log lines, oldest evicted first
#[derive(Debug)]
pub struct LineBuffer {
    entries: VecDeque<BufferedLine>,
    capacity: usize,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a line, evicting the oldest entries past capacity
    pub fn push(&mut self, line: BufferedLine) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line);
    }

    /// Change the capacity, trimming oldest entries when shrinking
    pub fn resize(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Concatenated formatted contents, one line per entry
    pub fn contents(&self) -> String {
        self.entries
            .iter()
            .map(|line| line.formatted.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Mutable walk over the buffered lines, oldest first
    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut BufferedLine> {
        self.entries.iter_mut()
    }
}
