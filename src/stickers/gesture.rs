use crate::geometry::{clamp_min, normalize_angle_delta, pointer_angle, Point, Rect, Size};
use crate::models::Sticker;
use serde::{Deserialize, Serialize};

/// Below this distance from the center the pointer angle is meaningless.
const ROTATE_DEAD_ZONE_PX: f64 = 0.5;

/// Part of a sticker a pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Handle {
    Body,
    Resize,
    Rotate,
}

/// What a pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureState {
    Idle,
    Moving,
    Resizing,
    Rotating,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GestureMode {
    /// Pointer minus the sticker's top-left corner at gesture start.
    Moving { offset: Point },
    /// Logical size at start; the on-screen box of a rotated sticker is larger.
    Resizing { start_pointer: Point, start_size: Size },
    Rotating {
        center: Point,
        start_angle: i32,
        last_pointer_angle: f64,
        travelled: f64,
    },
}

/// One pointer's gesture on one sticker, from pointer-down to pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Gesture {
    pub(crate) sticker_id: String,
    pub(crate) mode: GestureMode,
}

impl Gesture {
    pub(crate) fn begin(sticker: &Sticker, handle: Handle, at: Point) -> Self {
        let origin = Point::new(sticker.x, sticker.y);
        let size = Size::new(sticker.width, sticker.height);
        let mode = match handle {
            Handle::Body => GestureMode::Moving { offset: at - origin },
            Handle::Resize => GestureMode::Resizing {
                start_pointer: at,
                start_size: size,
            },
            Handle::Rotate => {
                let center = Rect::new(origin, size).center();
                GestureMode::Rotating {
                    center,
                    start_angle: sticker.angle,
                    last_pointer_angle: pointer_angle(center, at),
                    travelled: 0.0,
                }
            }
        };
        Self {
            sticker_id: sticker.id.clone(),
            mode,
        }
    }

    pub(crate) fn state(&self) -> GestureState {
        match self.mode {
            GestureMode::Moving { .. } => GestureState::Moving,
            GestureMode::Resizing { .. } => GestureState::Resizing,
            GestureMode::Rotating { .. } => GestureState::Rotating,
        }
    }

    /// Moves the gesture to `at` and applies it to `sticker`. Returns whether
    /// the sticker changed.
    pub(crate) fn update(&mut self, sticker: &mut Sticker, at: Point, min_size: f64) -> bool {
        match &mut self.mode {
            GestureMode::Moving { offset } => {
                let target = at - *offset;
                let x = clamp_min(target.x, 0.0);
                let y = clamp_min(target.y, 0.0);
                let changed = sticker.x != x || sticker.y != y;
                sticker.x = x;
                sticker.y = y;
                changed
            }
            GestureMode::Resizing {
                start_pointer,
                start_size,
            } => {
                let size = start_size.resized_by(at - *start_pointer, min_size);
                let changed = sticker.width != size.width || sticker.height != size.height;
                sticker.width = size.width;
                sticker.height = size.height;
                changed
            }
            GestureMode::Rotating {
                center,
                start_angle,
                last_pointer_angle,
                travelled,
            } => {
                if center.distance_to(at) < ROTATE_DEAD_ZONE_PX {
                    return false;
                }
                // Accumulate short-way steps so crossing the ±180° seam does
                // not snap the sticker a full turn.
                let angle = pointer_angle(*center, at);
                *travelled += normalize_angle_delta(angle - *last_pointer_angle);
                *last_pointer_angle = angle;
                let next = (f64::from(*start_angle) + *travelled).round();
                let next = next.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
                let changed = sticker.angle != next;
                sticker.angle = next;
                changed
            }
        }
    }
}
