//! One open book: the record being edited plus everything that reacts to it.
//!
//! Every data setter follows the same path: mutate the record, re-derive the
//! overall rating, then let autosave look at the result. UI-only flags live in
//! [`EditorUi`] outside the record, so toggling them can never schedule a
//! write.

use crate::autosave::AutosaveController;
use crate::config::EditorConfig;
use crate::geometry::Point;
use crate::models::{
    BookFormat, BookRecord, Category, LongField, RatingKind, SaveStatus, Sticker, TextField,
};
use crate::rating::{self, normalize_sub_rating, RatingInput};
use crate::stickers::{BoardAction, Handle, PointerId, RemovalRequest, StickerBoard};
use crate::store::{RecordStore, StoreError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorUi {
    pub dragging_cover: bool,
    pub closing: bool,
}

/// Snapshot handed to the view layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub record: BookRecord,
    pub status: SaveStatus,
    pub ui: EditorUi,
    pub rating_drafts: BTreeMap<String, String>,
    pub pending_removal: Option<RemovalRequest>,
}

#[derive(Debug, Clone)]
pub struct BookEditor {
    record: BookRecord,
    ui: EditorUi,
    rating_inputs: [RatingInput; 5],
    autosave: AutosaveController,
    board: StickerBoard,
}

impl BookEditor {
    pub fn new_record(category: Category, config: &EditorConfig) -> Self {
        Self::open(BookRecord::new(category), config)
    }

    /// Opens an existing record. A stale overall rating is corrected before
    /// autosave starts watching, so the correction alone writes nothing.
    pub fn open(mut record: BookRecord, config: &EditorConfig) -> Self {
        if rating::sync_overall(&mut record.content) {
            log::debug!(
                "corrected overall rating of {} to {}",
                record.id.as_deref().unwrap_or("<new>"),
                record.content.rating
            );
        }
        let ratings = record.content.ratings;
        let rating_inputs = RatingKind::ALL.map(|kind| RatingInput::new(ratings.get(kind)));
        let autosave = AutosaveController::new(config, &record);
        let board = StickerBoard::new(record.content.stickers.clone(), config.stickers.clone());
        Self {
            record,
            ui: EditorUi::default(),
            rating_inputs,
            autosave,
            board,
        }
    }

    pub fn record(&self) -> &BookRecord {
        &self.record
    }

    pub fn into_record(self) -> BookRecord {
        self.record
    }

    pub fn status(&self) -> SaveStatus {
        self.autosave.status()
    }

    pub fn ui(&self) -> EditorUi {
        self.ui
    }

    pub fn board(&self) -> &StickerBoard {
        &self.board
    }

    pub fn next_wakeup(&self) -> Option<Instant> {
        self.autosave.next_wakeup()
    }

    pub fn rating_draft(&self, kind: RatingKind) -> &str {
        self.rating_inputs[rating_slot(kind)].raw()
    }

    fn after_edit(&mut self, now: Instant) -> bool {
        rating::sync_overall(&mut self.record.content);
        self.autosave.observe(&self.record, now)
    }

    pub fn set_text(&mut self, field: TextField, value: &str, now: Instant) -> bool {
        let slot = self.record.content.text_mut(field);
        if *slot == value {
            return false;
        }
        *slot = value.to_string();
        self.after_edit(now)
    }

    pub fn set_category(&mut self, category: Category, now: Instant) -> bool {
        self.record.content.category = category;
        self.after_edit(now)
    }

    pub fn set_format(&mut self, format: Option<BookFormat>, now: Instant) -> bool {
        self.record.content.format = format;
        self.after_edit(now)
    }

    pub fn set_color(&mut self, field: TextField, color: &str, now: Instant) -> bool {
        if !self.record.content.set_color(field, color) {
            return false;
        }
        self.after_edit(now)
    }

    pub fn set_cover(&mut self, cover_url: Option<String>, now: Instant) -> bool {
        self.record.content.cover_url = cover_url;
        self.after_edit(now)
    }

    /// Remembers a text area's height. Non-finite or negative heights are
    /// ignored.
    pub fn set_area_height(&mut self, field: LongField, height: f64, now: Instant) -> bool {
        if !height.is_finite() || height < 0.0 {
            return false;
        }
        *self.record.content.area_height_mut(field) = Some(height.round());
        self.after_edit(now)
    }

    /// Typing into a rating field. The text is kept as typed; the record only
    /// moves when it parses.
    pub fn edit_rating(&mut self, kind: RatingKind, text: &str, now: Instant) -> bool {
        let Some(value) = self.rating_inputs[rating_slot(kind)].edit(text) else {
            return false;
        };
        self.record.content.ratings.set(kind, value);
        self.after_edit(now)
    }

    pub fn blur_rating(&mut self, kind: RatingKind, now: Instant) -> bool {
        let value = self.rating_inputs[rating_slot(kind)].blur();
        self.record.content.ratings.set(kind, value);
        self.after_edit(now)
    }

    /// A value picked on the stars.
    pub fn set_rating(&mut self, kind: RatingKind, value: f64, now: Instant) -> bool {
        let value = normalize_sub_rating(value);
        self.rating_inputs[rating_slot(kind)].reset(value);
        self.record.content.ratings.set(kind, value);
        self.after_edit(now)
    }

    pub fn set_dragging_cover(&mut self, dragging: bool) {
        self.ui.dragging_cover = dragging;
    }

    pub fn begin_close(&mut self) {
        self.ui.closing = true;
    }

    /// Mirrors settled sticker collections into the record.
    fn absorb(&mut self, actions: Vec<BoardAction>, now: Instant) -> Vec<BoardAction> {
        for action in &actions {
            if let BoardAction::Changed(stickers) = action {
                if self.record.content.stickers != *stickers {
                    self.record.content.stickers = stickers.clone();
                    self.after_edit(now);
                }
            }
        }
        actions
    }

    pub fn sticker_pointer_down(
        &mut self,
        pointer_id: PointerId,
        sticker_id: &str,
        handle: Handle,
        at: Point,
    ) -> Vec<BoardAction> {
        self.board.pointer_down(pointer_id, sticker_id, handle, at)
    }

    pub fn sticker_pointer_move(&mut self, pointer_id: PointerId, at: Point) -> Vec<BoardAction> {
        self.board.pointer_move(pointer_id, at)
    }

    pub fn sticker_pointer_up(&mut self, pointer_id: PointerId, now: Instant) -> Vec<BoardAction> {
        let actions = self.board.pointer_up(pointer_id);
        self.absorb(actions, now)
    }

    pub fn add_stickers(&mut self, urls: Vec<String>, now: Instant) -> Vec<BoardAction> {
        let actions = self.board.add_images(urls);
        self.absorb(actions, now)
    }

    pub fn request_sticker_removal(&mut self, sticker_id: &str) -> Vec<BoardAction> {
        self.board.request_removal(sticker_id)
    }

    pub fn request_clear_stickers(&mut self) -> Vec<BoardAction> {
        self.board.request_clear()
    }

    pub fn confirm_sticker_removal(&mut self, now: Instant) -> Vec<BoardAction> {
        let actions = self.board.confirm_removal();
        self.absorb(actions, now)
    }

    pub fn cancel_sticker_removal(&mut self) {
        self.board.cancel_removal();
    }

    /// Takes in stickers that arrived after the editor opened, typically from
    /// a load that completed late. Returns how many were new.
    pub fn sync_stickers(&mut self, external: &[Sticker], now: Instant) -> usize {
        let merged = self.board.sync_external(external);
        if merged > 0 {
            self.record.content.stickers = self.board.stickers().to_vec();
            self.after_edit(now);
        }
        merged
    }

    /// Drives autosave. When a write is due the record as it is right now is
    /// handed to the store; returns the id it was stored under.
    pub fn tick(&mut self, now: Instant, store: &dyn RecordStore) -> Option<String> {
        let snapshot = self.take_due_snapshot(now)?;
        let result = store.upsert(&snapshot);
        self.finish_save(result, now)
    }

    /// The record to write, if a write is due. The caller performs the write
    /// and reports back through [`BookEditor::finish_save`]; edits made in
    /// between stay pending.
    pub fn take_due_snapshot(&mut self, now: Instant) -> Option<BookRecord> {
        self.autosave.poll_due(now).then(|| self.record.clone())
    }

    pub fn finish_save(
        &mut self,
        result: Result<String, StoreError>,
        now: Instant,
    ) -> Option<String> {
        let saved_as = result.as_ref().ok().cloned();
        self.autosave.complete(result, &mut self.record, now);
        saved_as
    }

    /// Teardown. A write that has not fired yet never will.
    pub fn close(&mut self) {
        self.ui.closing = true;
        self.autosave.cancel();
    }

    pub fn view(&self) -> EditorView {
        let rating_drafts = RatingKind::ALL
            .into_iter()
            .map(|kind| (kind.key().to_string(), self.rating_draft(kind).to_string()))
            .collect();
        EditorView {
            record: self.record.clone(),
            status: self.status(),
            ui: self.ui,
            rating_drafts,
            pending_removal: self.board.pending_removal().cloned(),
        }
    }
}

fn rating_slot(kind: RatingKind) -> usize {
    match kind {
        RatingKind::Content => 0,
        RatingKind::WritingStyle => 1,
        RatingKind::Readability => 2,
        RatingKind::PlotDevelopment => 3,
        RatingKind::Characters => 4,
    }
}
