//! Pointer and resize input for an engine.
//!
//! Hosts never touch engine state from event handlers. They push
//! [`InputEvent`]s into an [`InputQueue`], and the engine drains the queue
//! once at the start of each tick, so a frame sees one consistent input
//! state for its whole duration.
//!
//! # Usage
//!
//! ```ignore
//! // In a winit handler:
//! if let Some(event) = input::translate(&event, window.inner_size(), window.scale_factor()) {
//!     engine.push_input(event);
//! }
//! ```

use glam::Vec2;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use crate::surface::SurfaceSize;

/// A message from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// The container changed size.
    Resize(SurfaceSize),
    /// Pointer position, normalized to `[-1, 1]` with the origin at the
    /// center and `+y` down.
    PointerMove(Vec2),
    /// The pointer left the container.
    PointerLeave,
}

/// The latest pointer message of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerUpdate {
    Move(Vec2),
    Leave,
}

/// Input collapsed for one frame. Last write wins for each kind.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub resize: Option<SurfaceSize>,
    pub pointer: Option<PointerUpdate>,
}

impl FrameInput {
    pub fn is_empty(&self) -> bool {
        self.resize.is_none() && self.pointer.is_none()
    }
}

/// Pending host messages.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every pending message, collapsed to the last of each kind.
    pub fn drain(&mut self) -> FrameInput {
        let mut frame = FrameInput::default();
        for event in self.events.drain(..) {
            match event {
                InputEvent::Resize(size) => frame.resize = Some(size),
                InputEvent::PointerMove(p) => frame.pointer = Some(PointerUpdate::Move(p)),
                InputEvent::PointerLeave => frame.pointer = Some(PointerUpdate::Leave),
            }
        }
        frame
    }
}

/// Map a position inside a `width` x `height` box to `[-1, 1]`.
///
/// Returns `None` for an empty box. Positions outside the box clamp.
pub fn normalize_pointer(x: f32, y: f32, width: f32, height: f32) -> Option<Vec2> {
    if !(width > 0.0 && height > 0.0) || !(x.is_finite() && y.is_finite()) {
        return None;
    }
    let p = Vec2::new(x / width, y / height) * 2.0 - Vec2::ONE;
    Some(p.clamp(Vec2::NEG_ONE, Vec2::ONE))
}

/// Translate a winit window event into an engine message.
///
/// * `inner` - current physical inner size of the window
/// * `scale_factor` - current device-pixel ratio
pub fn translate(
    event: &WindowEvent,
    inner: PhysicalSize<u32>,
    scale_factor: f64,
) -> Option<InputEvent> {
    match event {
        WindowEvent::Resized(size) => Some(InputEvent::Resize(logical_size(*size, scale_factor))),

        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
            Some(InputEvent::Resize(logical_size(inner, *scale_factor)))
        }

        WindowEvent::CursorMoved { position, .. } => normalize_pointer(
            position.x as f32,
            position.y as f32,
            inner.width as f32,
            inner.height as f32,
        )
        .map(InputEvent::PointerMove),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeave),

        _ => None,
    }
}

/// Convert a physical window size to a logical [`SurfaceSize`].
pub fn logical_size(size: PhysicalSize<u32>, scale_factor: f64) -> SurfaceSize {
    let ratio = scale_factor as f32;
    let ratio = if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 };
    SurfaceSize::new(size.width as f32 / ratio, size.height as f32 / ratio, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_normalization() {
        assert_eq!(normalize_pointer(400.0, 300.0, 800.0, 600.0), Some(Vec2::ZERO));
        assert_eq!(normalize_pointer(0.0, 600.0, 800.0, 600.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(normalize_pointer(2000.0, -5.0, 800.0, 600.0), Some(Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn test_pointer_on_empty_box_is_skipped() {
        assert_eq!(normalize_pointer(10.0, 10.0, 0.0, 600.0), None);
        assert_eq!(normalize_pointer(10.0, 10.0, 800.0, 0.0), None);
    }

    #[test]
    fn test_drain_keeps_last_of_each_kind() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::PointerMove(Vec2::new(0.1, 0.1)));
        queue.push(InputEvent::Resize(SurfaceSize::new(10.0, 10.0, 1.0)));
        queue.push(InputEvent::PointerMove(Vec2::new(0.5, -0.5)));
        queue.push(InputEvent::Resize(SurfaceSize::new(800.0, 600.0, 2.0)));

        let frame = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(frame.resize, Some(SurfaceSize::new(800.0, 600.0, 2.0)));
        assert_eq!(frame.pointer, Some(PointerUpdate::Move(Vec2::new(0.5, -0.5))));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_leave_after_move_wins() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::PointerMove(Vec2::ONE));
        queue.push(InputEvent::PointerLeave);
        assert_eq!(queue.drain().pointer, Some(PointerUpdate::Leave));
    }

    #[test]
    fn test_resized_event_uses_logical_units() {
        let event = WindowEvent::Resized(PhysicalSize::new(1600, 1200));
        let translated = translate(&event, PhysicalSize::new(1600, 1200), 2.0);
        assert_eq!(
            translated,
            Some(InputEvent::Resize(SurfaceSize::new(800.0, 600.0, 2.0)))
        );
    }

    #[test]
    fn test_zero_resize_is_forwarded() {
        let event = WindowEvent::Resized(PhysicalSize::new(0, 0));
        let Some(InputEvent::Resize(size)) = translate(&event, PhysicalSize::new(0, 0), 1.0) else {
            panic!("resize expected");
        };
        assert!(size.is_zero());
    }
}
