//! Display mode state machine
//!
//! ```text
//!            request pip (wide)        request fullscreen
//!   inline ───────────────────▶ pip     inline ─────────────▶ fullscreen
//!     ▲                          │        ▲                      │
//!     └──── any other request ───┘        └── any other request ─┘
//! ```
//!
//! A pip request on a narrow viewport becomes fullscreen. There is no
//! pip <-> fullscreen edge. Only one session holds pip at a time.

use crate::protocol::{DisplayMode, DisplayModeRequest, MaxHeight};
use crate::session::SessionId;

/// Result of applying one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub mode: DisplayMode,
    pub max_height: MaxHeight,
    /// Session pushed back to inline because it lost the floating slot
    pub evicted: Option<SessionId>,
}

/// Next mode for a session in `current` asking for `requested`
pub fn next_mode(current: DisplayMode, requested: DisplayMode, narrow: bool) -> DisplayMode {
    let requested = match requested {
        DisplayMode::Floating if narrow => DisplayMode::Fullscreen,
        other => other,
    };
    match (current, requested) {
        (DisplayMode::Floating, DisplayMode::Fullscreen)
        | (DisplayMode::Fullscreen, DisplayMode::Floating) => DisplayMode::Inline,
        (_, next) => next,
    }
}

/// Owner of the one process-wide floating slot
#[derive(Debug, Default)]
pub struct DisplayModeMachine {
    floating: Option<SessionId>,
}

impl DisplayModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session currently holding the floating slot
    pub fn floating_holder(&self) -> Option<SessionId> {
        self.floating
    }

    /// Apply `request` for `session`, updating slot ownership
    pub fn transition(
        &mut self,
        session: SessionId,
        current: DisplayMode,
        request: &DisplayModeRequest,
        narrow: bool,
    ) -> Transition {
        let mode = next_mode(current, request.mode, narrow);
        let mut evicted = None;

        if mode == DisplayMode::Floating {
            evicted = self.floating.replace(session).filter(|holder| *holder != session);
        } else if self.floating == Some(session) {
            self.floating = None;
        }

        if let Some(holder) = evicted {
            tracing::debug!(session = %session, evicted = %holder, "floating slot changed hands");
        }

        Transition {
            mode,
            max_height: request.max_height,
            evicted,
        }
    }

    /// Give up the slot if `session` holds it (session closed)
    pub fn release(&mut self, session: SessionId) {
        if self.floating == Some(session) {
            self.floating = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: DisplayMode) -> DisplayModeRequest {
        DisplayModeRequest::new(mode)
    }

    #[test]
    fn test_floating_is_exclusive() {
        let mut machine = DisplayModeMachine::new();
        let a = SessionId::new();
        let b = SessionId::new();

        let t = machine.transition(a, DisplayMode::Inline, &request(DisplayMode::Floating), false);
        assert_eq!(t.mode, DisplayMode::Floating);
        assert_eq!(t.evicted, None);

        let t = machine.transition(b, DisplayMode::Inline, &request(DisplayMode::Floating), false);
        assert_eq!(t.mode, DisplayMode::Floating);
        assert_eq!(t.evicted, Some(a));
        assert_eq!(machine.floating_holder(), Some(b));
    }

    #[test]
    fn test_reentering_floating_does_not_evict_self() {
        let mut machine = DisplayModeMachine::new();
        let a = SessionId::new();
        machine.transition(a, DisplayMode::Inline, &request(DisplayMode::Floating), false);
        let t = machine.transition(a, DisplayMode::Floating, &request(DisplayMode::Floating), false);
        assert_eq!(t.evicted, None);
    }

    #[test]
    fn test_narrow_viewport_downgrades_floating() {
        let mut machine = DisplayModeMachine::new();
        let a = SessionId::new();
        let t = machine.transition(a, DisplayMode::Inline, &request(DisplayMode::Floating), true);
        assert_eq!(t.mode, DisplayMode::Fullscreen);
        assert_eq!(machine.floating_holder(), None);
    }

    #[test]
    fn test_no_direct_floating_fullscreen_edge() {
        assert_eq!(
            next_mode(DisplayMode::Floating, DisplayMode::Fullscreen, false),
            DisplayMode::Inline
        );
        assert_eq!(
            next_mode(DisplayMode::Fullscreen, DisplayMode::Floating, false),
            DisplayMode::Inline
        );
        assert_eq!(
            next_mode(DisplayMode::Fullscreen, DisplayMode::Inline, false),
            DisplayMode::Inline
        );
    }

    #[test]
    fn test_leaving_floating_releases_slot() {
        let mut machine = DisplayModeMachine::new();
        let a = SessionId::new();
        machine.transition(a, DisplayMode::Inline, &request(DisplayMode::Floating), false);
        let t = machine.transition(a, DisplayMode::Floating, &request(DisplayMode::Fullscreen), false);
        assert_eq!(t.mode, DisplayMode::Inline);
        assert_eq!(machine.floating_holder(), None);
    }

    #[test]
    fn test_max_height_travels_with_request() {
        let mut machine = DisplayModeMachine::new();
        let a = SessionId::new();
        let t = machine.transition(
            a,
            DisplayMode::Inline,
            &request(DisplayMode::Inline).with_max_height(MaxHeight::Limit(480.0)),
            false,
        );
        assert_eq!(t.max_height, MaxHeight::Limit(480.0));
    }

    #[test]
    fn test_release() {
        let mut machine = DisplayModeMachine::new();
        let a = SessionId::new();
        machine.transition(a, DisplayMode::Inline, &request(DisplayMode::Floating), false);
        machine.release(a);
        assert_eq!(machine.floating_holder(), None);
    }
}
