use std::time::Instant;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Clone, Debug)]
struct Entry<T> {
    id: u64,
    due: Instant,
    task: T,
}

/// Deferred tasks driven by an external clock.
///
/// Nothing runs on its own: the owner polls [`Scheduler::pop_next_due`] with
/// the current instant, so cancelled tasks can never fire late.
#[derive(Clone, Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, due, task });
        TaskHandle(id)
    }

    /// Returns whether the task was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != handle.0);
        self.entries.len() != before
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.id == handle.0)
    }

    /// Remove and return the earliest task due at or before `now`, with the
    /// instant it was due. Ties go to the task scheduled first.
    pub fn pop_next_due(&mut self, now: Instant) -> Option<(Instant, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)?;
        let entry = self.entries.swap_remove(idx);
        Some((entry.due, entry.task))
    }
}
