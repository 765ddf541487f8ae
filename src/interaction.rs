//! Drag-to-rotate and wheel-to-zoom.
//!
//! Pointer and single-finger touch are the same gesture. Input starting over
//! a control surface (a button bar, a settings panel) is ignored, and so is
//! any gesture with more than one finger down.
//!
//! Every accepted input stamps the interaction time, which the scheduler uses
//! to decide when autonomous rotation may resume.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};

use crate::camera::RotationDelta;
use crate::config::{ScreenRect, ViewConfig};

/// Pointer, touch and wheel state for one view.
#[derive(Debug, Clone)]
pub struct InteractionController {
    dragging: bool,
    reference: Vec2,
    last_interaction: Option<Instant>,
    target_zoom: f32,
    current_zoom: f32,
    zoom_min: f32,
    zoom_max: f32,
    zoom_step: f32,
    sensitivity: f32,
    control_surfaces: Vec<ScreenRect>,
    // Window-event adapter state
    cursor: Vec2,
    touches: BTreeMap<u64, Vec2>,
}

impl InteractionController {
    pub fn new(config: &ViewConfig) -> Self {
        let zoom = 1.0f32.clamp(config.zoom_min, config.zoom_max);
        Self {
            dragging: false,
            reference: Vec2::ZERO,
            last_interaction: None,
            target_zoom: zoom,
            current_zoom: zoom,
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max,
            zoom_step: config.zoom_step,
            sensitivity: config.drag_sensitivity,
            control_surfaces: config.control_surfaces.clone(),
            cursor: Vec2::ZERO,
            touches: BTreeMap::new(),
        }
    }

    // ========== Queries ==========

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    #[inline]
    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    #[inline]
    pub fn current_zoom(&self) -> f32 {
        self.current_zoom
    }

    /// When the user last rotated or zoomed, if ever.
    #[inline]
    pub fn last_interaction(&self) -> Option<Instant> {
        self.last_interaction
    }

    /// Time since the last interaction; `None` if there never was one.
    pub fn idle_time(&self, now: Instant) -> Option<Duration> {
        self.last_interaction.map(|t| now.saturating_duration_since(t))
    }

    /// Whether a screen point lies over a control surface.
    pub fn over_control_surface(&self, pos: Vec2) -> bool {
        self.control_surfaces.iter().any(|r| r.contains(pos.x, pos.y))
    }

    pub fn set_control_surfaces(&mut self, surfaces: Vec<ScreenRect>) {
        self.control_surfaces = surfaces;
    }

    // ========== Gestures ==========

    /// Begin a drag at `pos`. Returns `false` when the press was ignored.
    pub fn drag_start(&mut self, pos: Vec2, now: Instant) -> bool {
        if self.over_control_surface(pos) {
            return false;
        }
        self.dragging = true;
        self.reference = pos;
        self.last_interaction = Some(now);
        true
    }

    /// Continue a drag, returning the rotation it produced.
    pub fn drag_move(&mut self, pos: Vec2, now: Instant) -> Option<RotationDelta> {
        if !self.dragging {
            return None;
        }
        let delta = pos - self.reference;
        self.reference = pos;
        self.last_interaction = Some(now);
        Some(RotationDelta {
            spin: delta.x * self.sensitivity,
            tilt: delta.y * self.sensitivity,
        })
    }

    pub fn drag_end(&mut self) {
        self.dragging = false;
    }

    /// Zoom by one step. Positive `delta_y` (scrolling forward) zooms in.
    pub fn wheel(&mut self, pos: Vec2, delta_y: f32, now: Instant) {
        if self.over_control_surface(pos) {
            return;
        }
        self.last_interaction = Some(now);
        if delta_y > 0.0 {
            self.target_zoom = (self.target_zoom + self.zoom_step).min(self.zoom_max);
        } else if delta_y < 0.0 {
            self.target_zoom = (self.target_zoom - self.zoom_step).max(self.zoom_min);
        }
    }

    /// A finger went down; `points` holds every finger now touching.
    pub fn touch_start(&mut self, points: &[Vec2], now: Instant) -> bool {
        match points {
            [single] => self.drag_start(*single, now),
            _ => {
                self.drag_end();
                false
            }
        }
    }

    /// Fingers moved; only a single finger rotates.
    pub fn touch_move(&mut self, points: &[Vec2], now: Instant) -> Option<RotationDelta> {
        match points {
            [single] => self.drag_move(*single, now),
            _ => {
                self.drag_end();
                None
            }
        }
    }

    /// Move the current zoom a `factor` of the way toward the target.
    pub fn smooth_zoom(&mut self, factor: f32) -> f32 {
        self.current_zoom += (self.target_zoom - self.current_zoom) * factor;
        self.current_zoom
    }

    // ========== Window events ==========

    /// Route a winit window event to the gestures above.
    ///
    /// Returns the rotation produced by the event, if any.
    pub fn handle_window_event(&mut self, event: &WindowEvent, now: Instant) -> Option<RotationDelta> {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        self.drag_start(self.cursor, now);
                    }
                    ElementState::Released => self.drag_end(),
                }
                None
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.drag_move(self.cursor, now)
            }

            WindowEvent::CursorLeft { .. } => {
                self.drag_end();
                None
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.wheel(self.cursor, scroll, now);
                None
            }

            WindowEvent::Touch(touch) => self.handle_touch(touch, now),

            _ => None,
        }
    }

    fn handle_touch(&mut self, touch: &Touch, now: Instant) -> Option<RotationDelta> {
        let pos = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => {
                self.touches.insert(touch.id, pos);
                let points: Vec<Vec2> = self.touches.values().copied().collect();
                self.touch_start(&points, now);
                None
            }
            TouchPhase::Moved => {
                self.touches.insert(touch.id, pos);
                let points: Vec<Vec2> = self.touches.values().copied().collect();
                self.touch_move(&points, now)
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.remove(&touch.id);
                self.drag_end();
                None
            }
        }
    }
}
