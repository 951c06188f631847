//! Classification of raw pointer input into drawing and view gestures.
//!
//! The classifier follows at most two pointers through one interaction:
//!
//! - `Start`: nothing decided yet. The first press picks the active button
//!   and emits [`GestureAction::Down`]. A second press switches to
//!   `PanZoom`; the first pointer leaving the drag radius switches to
//!   `DrawPan`.
//! - `DrawPan`: the first pointer draws, an optional second pointer pans.
//! - `PanZoom`: each move scales around the pointer that stayed put.
//! - `Finished`: entered when the primary pointer lifts. Everything is
//!   ignored until all pointers are up, then the classifier resets.
//!
//! Every [`GestureAction::Down`] is matched by exactly one
//! [`GestureAction::Up`]. Pointer combinations outside this table return
//! [`CoreError::GestureLogic`].

use crate::error::{CoreError, CoreResult};
use crate::input::{MouseButton, PointerEvent, PointerId, PointerPhase};
use crate::settings::DEFAULT_DRAG_THRESHOLD;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Where the classifier is within an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureMode {
    Start,
    PanZoom,
    DrawPan,
    Finished,
}

/// A pointer followed from press to release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerTrack {
    pub pointer_id: PointerId,
    pub start: Point,
    pub current: Point,
}

impl PointerTrack {
    fn new(pointer_id: PointerId, position: Point) -> Self {
        Self {
            pointer_id,
            start: position,
            current: position,
        }
    }
}

/// Semantic output of one pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// An interaction started.
    Down { position: Point, button: MouseButton },
    /// The drawing pointer moved.
    Draw { position: Point },
    /// The view should move by `delta`.
    Pan { delta: Vec2 },
    /// Pinch: `from` moved to `to` while `origin` stayed.
    Scale { origin: Point, from: Point, to: Point },
    /// The interaction ended.
    Up,
    Ignore,
}

impl GestureAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Down { .. } => "down",
            Self::Draw { .. } => "draw",
            Self::Pan { .. } => "pan",
            Self::Scale { .. } => "scale",
            Self::Up => "up",
            Self::Ignore => "ignore",
        }
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, Self::Ignore)
    }
}

/// Finite-state machine over up to two concurrent pointers.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureClassifier {
    drag_threshold: f64,
    mode: GestureMode,
    active_button: Option<MouseButton>,
    pressed: Vec<PointerId>,
    first: Option<PointerTrack>,
    second: Option<PointerTrack>,
    down_emitted: bool,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl GestureClassifier {
    pub fn new(drag_threshold: f64) -> Self {
        Self {
            drag_threshold,
            mode: GestureMode::Start,
            active_button: None,
            pressed: Vec::new(),
            first: None,
            second: None,
            down_emitted: false,
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    /// Number of pointers currently pressed, tracked or not.
    pub fn pointer_count(&self) -> usize {
        self.pressed.len()
    }

    /// Bitmask value of the active button, `0` before the first press.
    pub fn active_button(&self) -> u8 {
        self.active_button.map_or(0, MouseButton::bit)
    }

    pub fn first_pointer(&self) -> Option<&PointerTrack> {
        self.first.as_ref()
    }

    pub fn second_pointer(&self) -> Option<&PointerTrack> {
        self.second.as_ref()
    }

    /// Feed one pointer event.
    pub fn process(&mut self, event: &PointerEvent) -> CoreResult<GestureAction> {
        let action = match event.phase {
            PointerPhase::Down => self.pointer_down(event)?,
            PointerPhase::Move => self.pointer_move(event)?,
            PointerPhase::Up => self.pointer_up(event),
        };
        log::trace!(
            "gesture {:?} #{} -> {} ({:?})",
            event.phase,
            event.pointer_id,
            action.tag(),
            self.mode
        );
        Ok(action)
    }

    /// Abandon the interaction, e.g. when the surface loses focus. Returns
    /// the `Up` owed for an emitted `Down`, if any.
    pub fn cancel(&mut self) -> GestureAction {
        let action = self.finish();
        self.reset();
        action
    }

    fn pointer_down(&mut self, event: &PointerEvent) -> CoreResult<GestureAction> {
        let id = event.pointer_id;
        if self.pressed.contains(&id) {
            return Err(CoreError::GestureLogic(format!("pointer {id} pressed twice")));
        }
        if self.mode != GestureMode::Finished && self.pressed.len() >= 2 {
            return Err(CoreError::GestureLogic(format!(
                "pointer {id} is a third concurrent pointer"
            )));
        }
        self.pressed.push(id);
        let track = PointerTrack::new(id, event.position);

        match self.mode {
            GestureMode::Finished => Ok(GestureAction::Ignore),
            GestureMode::Start if self.first.is_none() => {
                match MouseButton::from_bitmask(event.buttons) {
                    Some(button) => {
                        self.active_button = Some(button);
                        self.first = Some(track);
                        self.down_emitted = true;
                        Ok(GestureAction::Down {
                            position: event.position,
                            button,
                        })
                    }
                    None => {
                        self.mode = GestureMode::Finished;
                        Ok(GestureAction::Ignore)
                    }
                }
            }
            GestureMode::Start => {
                self.second = Some(track);
                self.mode = GestureMode::PanZoom;
                Ok(GestureAction::Ignore)
            }
            GestureMode::DrawPan if self.second.is_none() => {
                self.second = Some(track);
                Ok(GestureAction::Ignore)
            }
            mode => Err(CoreError::GestureLogic(format!(
                "pointer {id} pressed in {mode:?} with both slots taken"
            ))),
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent) -> CoreResult<GestureAction> {
        let id = event.pointer_id;
        if !self.pressed.contains(&id) || self.mode == GestureMode::Finished {
            return Ok(GestureAction::Ignore);
        }
        let position = event.position;
        let is_first = self.first.is_some_and(|t| t.pointer_id == id);
        let is_second = self.second.is_some_and(|t| t.pointer_id == id);

        match (self.mode, &mut self.first, &mut self.second) {
            (GestureMode::Start, Some(first), None) if is_first => {
                first.current = position;
                if first.start.distance(position) > self.drag_threshold {
                    self.mode = GestureMode::DrawPan;
                    Ok(GestureAction::Draw { position })
                } else {
                    Ok(GestureAction::Ignore)
                }
            }
            (GestureMode::DrawPan, Some(first), _) if is_first => {
                first.current = position;
                Ok(GestureAction::Draw { position })
            }
            (GestureMode::DrawPan, _, Some(second)) if is_second => {
                let delta = position - second.current;
                second.current = position;
                Ok(GestureAction::Pan { delta })
            }
            (GestureMode::PanZoom, Some(first), Some(second)) if is_first || is_second => {
                let (moving, other) = if is_first {
                    (first, second)
                } else {
                    (second, first)
                };
                let from = moving.current;
                moving.current = position;
                Ok(GestureAction::Scale {
                    origin: other.current,
                    from,
                    to: position,
                })
            }
            (mode, _, _) => Err(CoreError::GestureLogic(format!(
                "move of pointer {id} has no transition in {mode:?}"
            ))),
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent) -> GestureAction {
        let id = event.pointer_id;
        if !self.pressed.contains(&id) {
            return GestureAction::Ignore;
        }
        self.pressed.retain(|&p| p != id);
        let is_first = self.first.is_some_and(|t| t.pointer_id == id);

        let action = match self.mode {
            GestureMode::Finished => GestureAction::Ignore,
            GestureMode::DrawPan if !is_first => {
                self.second = None;
                GestureAction::Ignore
            }
            GestureMode::Start | GestureMode::DrawPan | GestureMode::PanZoom => self.finish(),
        };

        if self.pressed.is_empty() && self.mode == GestureMode::Finished {
            self.reset();
        }
        action
    }

    fn finish(&mut self) -> GestureAction {
        self.mode = GestureMode::Finished;
        if std::mem::take(&mut self.down_emitted) {
            GestureAction::Up
        } else {
            GestureAction::Ignore
        }
    }

    fn reset(&mut self) {
        log::debug!("gesture interaction reset");
        *self = Self::new(self.drag_threshold);
    }
}
