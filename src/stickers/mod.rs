//! Direct-manipulation board for a record's stickers.
//!
//! The board owns the sticker collection while an editor is open. Pointer
//! events come in with a pointer id; each pointer drives at most one gesture.
//! Methods return [`BoardAction`]s for the host to carry out (pointer capture,
//! re-render, confirmation prompts) instead of calling back into it.

mod gesture;
mod z_order;

pub use gesture::{GestureState, Handle};
pub use z_order::ZCounter;

use crate::config::StickerConfig;
use crate::geometry::Point;
use crate::models::{generate_id, Sticker};
use gesture::Gesture;
use serde::Serialize;
use std::collections::HashMap;

pub type PointerId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "id", rename_all = "camelCase")]
pub enum RemovalRequest {
    One(String),
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum BoardAction {
    /// Route later events of this pointer to the board even when it leaves
    /// the sticker.
    #[serde(rename_all = "camelCase")]
    CapturePointer { pointer_id: PointerId },
    #[serde(rename_all = "camelCase")]
    ReleasePointer { pointer_id: PointerId },
    /// Ask the user before removing anything.
    ConfirmRemoval(RemovalRequest),
    /// Settled collection for the owning record.
    Changed(Vec<Sticker>),
    /// Transient state moved; redraw without persisting.
    RenderNeeded,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    /// Nothing reported yet. A report equal to `baseline` would only echo the
    /// owner's own collection back to it.
    Initializing { baseline: Vec<Sticker> },
    Live,
}

#[derive(Debug, Clone)]
pub struct StickerBoard {
    stickers: Vec<Sticker>,
    gestures: HashMap<PointerId, Gesture>,
    z: ZCounter,
    phase: Phase,
    pending_removal: Option<RemovalRequest>,
    config: StickerConfig,
}

impl StickerBoard {
    pub fn new(initial: Vec<Sticker>, config: StickerConfig) -> Self {
        let z = ZCounter::seeded(config.base_z, &initial);
        Self {
            phase: Phase::Initializing {
                baseline: initial.clone(),
            },
            stickers: initial,
            gestures: HashMap::new(),
            z,
            pending_removal: None,
            config,
        }
    }

    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    pub fn z_counter(&self) -> &ZCounter {
        &self.z
    }

    pub fn gesture_state(&self, pointer_id: PointerId) -> GestureState {
        self.gestures
            .get(&pointer_id)
            .map(Gesture::state)
            .unwrap_or(GestureState::Idle)
    }

    pub fn pending_removal(&self) -> Option<&RemovalRequest> {
        self.pending_removal.as_ref()
    }

    fn index_of(&self, sticker_id: &str) -> Option<usize> {
        self.stickers
            .iter()
            .position(|sticker| sticker.id == sticker_id)
    }

    /// Starts a gesture and brings the sticker to the front. A pointer that
    /// already had a gesture abandons it.
    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        sticker_id: &str,
        handle: Handle,
        at: Point,
    ) -> Vec<BoardAction> {
        let Some(index) = self.index_of(sticker_id) else {
            log::debug!("pointer {} went down on unknown sticker {}", pointer_id, sticker_id);
            return Vec::new();
        };
        let z = self.z.bump();
        let sticker = &mut self.stickers[index];
        sticker.z = z;
        let gesture = Gesture::begin(sticker, handle, at);
        if self.gestures.insert(pointer_id, gesture).is_some() {
            log::debug!("pointer {} restarted its gesture", pointer_id);
        }
        vec![
            BoardAction::CapturePointer { pointer_id },
            BoardAction::RenderNeeded,
        ]
    }

    pub fn pointer_move(&mut self, pointer_id: PointerId, at: Point) -> Vec<BoardAction> {
        let min_size = self.config.min_size;
        let Some(gesture) = self.gestures.get_mut(&pointer_id) else {
            return Vec::new();
        };
        let Some(sticker) = self
            .stickers
            .iter_mut()
            .find(|sticker| sticker.id == gesture.sticker_id)
        else {
            return Vec::new();
        };
        if gesture.update(sticker, at, min_size) {
            vec![BoardAction::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Ends the pointer's gesture. The settled collection is reported only
    /// when the sticker it was working on still exists.
    pub fn pointer_up(&mut self, pointer_id: PointerId) -> Vec<BoardAction> {
        let Some(gesture) = self.gestures.remove(&pointer_id) else {
            return Vec::new();
        };
        let mut actions = vec![BoardAction::ReleasePointer { pointer_id }];
        if self.index_of(&gesture.sticker_id).is_some() {
            actions.extend(self.settle());
        }
        actions
    }

    /// Appends one sticker per image, fanned out from the spawn origin so
    /// none lands exactly on another.
    pub fn add_images<I>(&mut self, urls: I) -> Vec<BoardAction>
    where
        I: IntoIterator<Item = String>,
    {
        let width = self.config.default_width;
        let height = width * self.config.default_aspect;
        let mut added = 0usize;
        for (slot, url) in urls.into_iter().enumerate() {
            let offset = self.config.spawn_origin + self.config.spawn_step * slot as f64;
            let sticker = Sticker {
                id: self.fresh_id(),
                url,
                x: offset,
                y: offset,
                width,
                height,
                angle: 0,
                z: self.z.bump(),
            };
            self.stickers.push(sticker);
            added += 1;
        }
        if added == 0 {
            return Vec::new();
        }
        log::debug!("added {} sticker(s), {} on board", added, self.stickers.len());
        self.settle().into_iter().collect()
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_id();
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    /// Stages removal of one sticker. Nothing is removed until
    /// [`confirm_removal`](Self::confirm_removal).
    pub fn request_removal(&mut self, sticker_id: &str) -> Vec<BoardAction> {
        if self.index_of(sticker_id).is_none() {
            return Vec::new();
        }
        let request = RemovalRequest::One(sticker_id.to_string());
        self.pending_removal = Some(request.clone());
        vec![BoardAction::ConfirmRemoval(request)]
    }

    pub fn request_clear(&mut self) -> Vec<BoardAction> {
        if self.stickers.is_empty() {
            return Vec::new();
        }
        self.pending_removal = Some(RemovalRequest::All);
        vec![BoardAction::ConfirmRemoval(RemovalRequest::All)]
    }

    pub fn cancel_removal(&mut self) {
        self.pending_removal = None;
    }

    pub fn confirm_removal(&mut self) -> Vec<BoardAction> {
        let Some(request) = self.pending_removal.take() else {
            return Vec::new();
        };
        let before = self.stickers.len();
        match &request {
            RemovalRequest::One(id) => self.stickers.retain(|sticker| &sticker.id != id),
            RemovalRequest::All => self.stickers.clear(),
        }
        if self.stickers.len() == before {
            return Vec::new();
        }
        log::debug!("removed {} sticker(s)", before - self.stickers.len());
        self.settle().into_iter().collect()
    }

    /// Reports the current collection upward. The first report after
    /// construction is dropped when it only repeats the initial collection.
    pub fn settle(&mut self) -> Option<BoardAction> {
        if let Phase::Initializing { baseline } = &self.phase {
            let echo = *baseline == self.stickers;
            self.phase = Phase::Live;
            if echo {
                log::debug!("sticker board suppressed echo of its initial collection");
                return None;
            }
        }
        Some(BoardAction::Changed(self.stickers.clone()))
    }

    /// Merges stickers that appeared on the owning record from elsewhere,
    /// such as a load that finished after the board was built. Only unknown
    /// ids are taken; local stickers are never overwritten or dropped.
    /// Returns how many were merged.
    pub fn sync_external(&mut self, external: &[Sticker]) -> usize {
        self.phase = Phase::Live;
        let mut merged = 0;
        for sticker in external {
            if self.index_of(&sticker.id).is_some() {
                continue;
            }
            self.z.observe(sticker.z);
            self.stickers.push(sticker.clone());
            merged += 1;
        }
        if merged > 0 {
            log::debug!("merged {} external sticker(s)", merged);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sticker(id: &str, x: f64, y: f64, z: u64) -> Sticker {
        Sticker {
            id: id.to_string(),
            url: format!("data:image/png;base64,{}", id),
            x,
            y,
            width: 100.0,
            height: 100.0,
            angle: 0,
            z,
        }
    }

    fn board(initial: Vec<Sticker>) -> StickerBoard {
        StickerBoard::new(initial, StickerConfig::default())
    }

    fn changed(actions: &[BoardAction]) -> Option<&Vec<Sticker>> {
        actions.iter().find_map(|action| match action {
            BoardAction::Changed(stickers) => Some(stickers),
            _ => None,
        })
    }

    fn find<'a>(board: &'a StickerBoard, id: &str) -> &'a Sticker {
        board
            .stickers()
            .iter()
            .find(|sticker| sticker.id == id)
            .expect("sticker on board")
    }

    #[test]
    fn untouched_board_reports_nothing() {
        let mut board = board(vec![sticker("a", 10.0, 10.0, 1001)]);
        assert!(!board.is_live());
        assert_eq!(board.settle(), None);
        assert!(board.is_live());
        assert!(matches!(board.settle(), Some(BoardAction::Changed(_))));
    }

    #[test]
    fn adding_images_spawns_fanned_out_stickers_with_rising_z() {
        let mut board = board(Vec::new());
        let actions = board.add_images(vec!["data:a".to_string(), "data:b".to_string()]);

        let reported = changed(&actions).expect("changed");
        assert_eq!(reported.len(), 2);
        assert_eq!((reported[0].x, reported[0].y), (40.0, 40.0));
        assert_eq!((reported[1].x, reported[1].y), (70.0, 70.0));
        assert_eq!(reported[0].width, 160.0);
        assert!((reported[0].height - 212.8).abs() < 1e-9);
        assert!(reported[0].z < reported[1].z);
        assert_ne!(reported[0].id, reported[1].id);

        assert!(board.add_images(Vec::new()).is_empty());
    }

    #[test]
    fn z_rises_with_every_creation_and_focus() {
        let mut board = board(vec![sticker("a", 0.0, 0.0, 1500), sticker("b", 0.0, 0.0, 3)]);
        let mut seen = Vec::new();

        board.pointer_down(1, "b", Handle::Body, Point::new(1.0, 1.0));
        seen.push(find(&board, "b").z);
        board.pointer_up(1);
        board.add_images(vec!["data:c".to_string()]);
        seen.push(board.stickers().last().map(|s| s.z).unwrap_or_default());
        board.pointer_down(2, "a", Handle::Rotate, Point::new(1.0, 1.0));
        seen.push(find(&board, "a").z);

        assert_eq!(seen[0], 1501);
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn move_gesture_clamps_and_reports_on_release() {
        let mut board = board(vec![sticker("a", 50.0, 50.0, 1001)]);

        let actions = board.pointer_down(7, "a", Handle::Body, Point::new(60.0, 55.0));
        assert_eq!(actions[0], BoardAction::CapturePointer { pointer_id: 7 });
        assert_eq!(board.gesture_state(7), GestureState::Moving);

        assert_eq!(
            board.pointer_move(7, Point::new(-30.0, 200.0)),
            vec![BoardAction::RenderNeeded]
        );
        assert_eq!((find(&board, "a").x, find(&board, "a").y), (0.0, 195.0));

        let actions = board.pointer_up(7);
        assert_eq!(actions[0], BoardAction::ReleasePointer { pointer_id: 7 });
        assert_eq!(changed(&actions).map(Vec::len), Some(1));
        assert_eq!(board.gesture_state(7), GestureState::Idle);
    }

    #[test]
    fn resize_never_goes_below_minimum() {
        let mut board = board(vec![sticker("a", 0.0, 0.0, 1001)]);
        board.pointer_down(1, "a", Handle::Resize, Point::new(100.0, 100.0));
        board.pointer_move(1, Point::new(-50.0, 130.0));

        assert_eq!(find(&board, "a").width, 40.0);
        assert_eq!(find(&board, "a").height, 130.0);
    }

    #[test]
    fn rotating_a_quarter_turn_clockwise() {
        let mut board = board(Vec::new());
        board.add_images(vec!["data:a".to_string()]);
        let id = board.stickers()[0].id.clone();
        // 160 x 212.8 at (40, 40): center (120, 146.4)
        board.pointer_down(1, &id, Handle::Rotate, Point::new(220.0, 146.4));
        assert_eq!(board.gesture_state(1), GestureState::Rotating);

        board.pointer_move(1, Point::new(120.0, 246.4));
        assert_eq!(find(&board, &id).angle, 90);

        board.pointer_move(1, Point::new(20.0, 146.5));
        board.pointer_move(1, Point::new(20.0, 146.3));
        board.pointer_move(1, Point::new(120.0, 46.4));
        assert_eq!(find(&board, &id).angle, 270);
    }

    #[test]
    fn independent_pointers_drive_independent_gestures() {
        let mut board = board(vec![sticker("a", 0.0, 0.0, 1001), sticker("b", 300.0, 0.0, 1002)]);
        board.pointer_down(1, "a", Handle::Body, Point::new(10.0, 10.0));
        board.pointer_down(2, "b", Handle::Resize, Point::new(400.0, 100.0));

        board.pointer_move(1, Point::new(20.0, 30.0));
        board.pointer_move(2, Point::new(420.0, 100.0));

        assert_eq!((find(&board, "a").x, find(&board, "a").y), (10.0, 20.0));
        assert_eq!(find(&board, "b").width, 120.0);
        assert_eq!((find(&board, "b").x, find(&board, "b").y), (300.0, 0.0));
    }

    #[test]
    fn events_without_a_live_target_are_ignored() {
        let mut board = board(vec![sticker("a", 0.0, 0.0, 1001)]);
        assert!(board.pointer_move(9, Point::new(5.0, 5.0)).is_empty());
        assert!(board.pointer_up(9).is_empty());
        assert!(board
            .pointer_down(1, "ghost", Handle::Body, Point::new(0.0, 0.0))
            .is_empty());

        board.pointer_down(1, "a", Handle::Body, Point::new(0.0, 0.0));
        board.request_removal("a");
        board.confirm_removal();

        assert!(board.pointer_move(1, Point::new(50.0, 50.0)).is_empty());
        assert_eq!(
            board.pointer_up(1),
            vec![BoardAction::ReleasePointer { pointer_id: 1 }]
        );
    }

    #[test]
    fn removal_waits_for_confirmation() {
        let mut board = board(vec![sticker("a", 0.0, 0.0, 1001), sticker("b", 0.0, 0.0, 1002)]);

        assert_eq!(
            board.request_removal("a"),
            vec![BoardAction::ConfirmRemoval(RemovalRequest::One("a".to_string()))]
        );
        assert_eq!(board.stickers().len(), 2);
        board.cancel_removal();
        assert!(board.confirm_removal().is_empty());
        assert_eq!(board.stickers().len(), 2);

        board.request_removal("a");
        let actions = board.confirm_removal();
        assert_eq!(changed(&actions).map(Vec::len), Some(1));
        assert_eq!(board.stickers()[0].id, "b");

        board.request_clear();
        board.confirm_removal();
        assert!(board.stickers().is_empty());
        assert!(board.request_clear().is_empty());
        assert!(board.request_removal("missing").is_empty());
    }

    #[test]
    fn external_sync_only_adds_unknown_stickers() {
        let mut board = board(Vec::new());
        board.add_images(vec!["data:local".to_string()]);
        let local = board.stickers()[0].clone();

        let mut stale_copy = local.clone();
        stale_copy.x = 999.0;
        let loaded = vec![stale_copy, sticker("remote", 5.0, 5.0, 4000)];

        assert_eq!(board.sync_external(&loaded), 1);
        assert_eq!(board.stickers().len(), 2);
        assert_eq!(find(&board, &local.id).x, local.x);
        assert_eq!(board.z_counter().current(), 4000);
        assert_eq!(board.sync_external(&loaded), 0);
    }

    #[test]
    fn sync_before_any_report_ends_initialization() {
        let mut board = board(Vec::new());
        board.sync_external(&[sticker("late", 0.0, 0.0, 1001)]);
        assert!(board.is_live());
        assert!(matches!(board.settle(), Some(BoardAction::Changed(list)) if list.len() == 1));
    }
}
