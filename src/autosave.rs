//! Debounced persistence for one open record.
//!
//! Edits are coalesced: each observed change pushes the write deadline out by
//! the quiet interval, and only the last deadline of a burst fires. The driver
//! owns the clock; it passes `now` in and calls [`AutosaveController::poll_due`]
//! to learn when to snapshot the record and hand it to the store.

use crate::config::{autosave_debug_enabled, EditorConfig};
use crate::models::{BookContent, BookRecord, SaveStatus};
use crate::store::StoreError;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AutosaveController {
    quiet_interval: Duration,
    saved_display: Duration,
    status: SaveStatus,
    observed: BookContent,
    deadline: Option<Instant>,
    idle_at: Option<Instant>,
    torn_down: bool,
}

impl AutosaveController {
    /// Starts watching `record`. Its current content counts as already seen,
    /// so opening a record does not write it back.
    pub fn new(config: &EditorConfig, record: &BookRecord) -> Self {
        Self {
            quiet_interval: config.quiet_interval(),
            saved_display: config.saved_display(),
            status: SaveStatus::Idle,
            observed: record.content.clone(),
            deadline: None,
            idle_at: None,
            torn_down: false,
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Earliest instant at which `poll_due` has something to do.
    pub fn next_wakeup(&self) -> Option<Instant> {
        match (self.deadline, self.idle_at) {
            (Some(deadline), Some(idle_at)) => Some(deadline.min(idle_at)),
            (deadline, idle_at) => deadline.or(idle_at),
        }
    }

    /// Compares the record's content with what was last seen and reschedules
    /// the write when it changed. Returns whether a write is now scheduled
    /// because of this call.
    pub fn observe(&mut self, record: &BookRecord, now: Instant) -> bool {
        if self.torn_down || record.content == self.observed {
            return false;
        }
        self.observed = record.content.clone();

        if record.is_blank() {
            if self.deadline.take().is_some() {
                self.status = SaveStatus::Idle;
                log::debug!("autosave dropped pending write, record is blank again");
            }
            return false;
        }

        let rescheduled = self.deadline.is_some();
        self.deadline = Some(now + self.quiet_interval);
        self.status = SaveStatus::Saving;
        self.idle_at = None;
        if autosave_debug_enabled() {
            log::info!(
                "[autosave-debug] write scheduled in {:?} record={} rescheduled={}",
                self.quiet_interval,
                record.id.as_deref().unwrap_or("<new>"),
                rescheduled
            );
        }
        true
    }

    /// True once per burst, when its quiet interval has elapsed. The caller
    /// must snapshot the record at that point and report back through
    /// [`complete`](Self::complete). Also returns a `saved` indicator to
    /// `idle` after its display delay.
    pub fn poll_due(&mut self, now: Instant) -> bool {
        if let Some(idle_at) = self.idle_at {
            if now >= idle_at {
                self.idle_at = None;
                if self.status == SaveStatus::Saved {
                    self.status = SaveStatus::Idle;
                }
            }
        }

        match self.deadline {
            Some(deadline) if !self.torn_down && now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Applies the outcome of a fired write. A store-assigned id is merged
    /// only into a record whose id is missing or blank; the id is not part of
    /// the watched content, so the merge never schedules another write.
    pub fn complete(
        &mut self,
        result: Result<String, StoreError>,
        record: &mut BookRecord,
        now: Instant,
    ) {
        match result {
            Ok(id) => {
                let has_id = record.id.as_deref().is_some_and(|id| !id.trim().is_empty());
                if !has_id && !id.is_empty() {
                    log::info!("autosave assigned id {}", id);
                    record.id = Some(id);
                }
                if self.deadline.is_none() {
                    self.status = SaveStatus::Saved;
                    self.idle_at = Some(now + self.saved_display);
                }
            }
            Err(err) => {
                // No retry: the next edit schedules a fresh write.
                log::error!("auto-save failed: {}", err);
                if self.deadline.is_none() {
                    self.status = SaveStatus::Idle;
                }
                self.idle_at = None;
            }
        }
    }

    /// Teardown. A pending write is dropped and later observations are
    /// ignored; a write that already fired still completes normally.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            log::debug!("autosave cancelled a pending write on teardown");
        }
        self.torn_down = true;
    }
}
