//! Widget state synchronization between a session's surfaces
//!
//! Widget state is opaque to the host. The latest value is kept per session
//! and mirrored from whichever surface changed it to the other one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which of a session's execution surfaces a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// The inline widget
    Primary,
    /// A modal opened from the widget
    Secondary,
}

impl Surface {
    /// The surface on the opposite side
    pub fn other(&self) -> Surface {
        match self {
            Surface::Primary => Surface::Secondary,
            Surface::Secondary => Surface::Primary,
        }
    }
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Surface::Primary => f.write_str("primary"),
            Surface::Secondary => f.write_str("secondary"),
        }
    }
}

/// A state change that has to travel further
#[derive(Debug, Clone, PartialEq)]
pub struct StatePropagation {
    pub tool_id: Option<String>,
    pub state: Value,
    /// Surface to push the new state to, if it is ready
    pub mirror_to: Option<Surface>,
}

/// Widget state shared by the primary and secondary surfaces of a session
#[derive(Debug, Default)]
pub struct WidgetStateSync {
    tool_id: Option<String>,
    state: Option<Value>,
    secondary_ready: bool,
}

impl WidgetStateSync {
    /// Create an empty sync with no secondary surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest state, if any surface has set one
    pub fn current(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    /// Record a state set by `from`. Structurally equal states are dropped.
    pub fn apply(
        &mut self,
        from: Surface,
        tool_id: Option<String>,
        state: Value,
    ) -> Option<StatePropagation> {
        if self.state.as_ref() == Some(&state) {
            return None;
        }

        self.state = Some(state.clone());
        if tool_id.is_some() {
            self.tool_id = tool_id;
        }

        let target = from.other();
        let mirror_to = match target {
            Surface::Primary => Some(Surface::Primary),
            Surface::Secondary => self.secondary_ready.then_some(Surface::Secondary),
        };

        Some(StatePropagation {
            tool_id: self.tool_id.clone(),
            state,
            mirror_to,
        })
    }

    /// Mark the secondary surface ready. Always yields the push it must
    /// receive, even when no state has been set yet.
    pub fn secondary_ready(&mut self) -> StatePropagation {
        self.secondary_ready = true;
        StatePropagation {
            tool_id: self.tool_id.clone(),
            state: self.state.clone().unwrap_or(Value::Null),
            mirror_to: Some(Surface::Secondary),
        }
    }

    /// Forget the secondary surface
    pub fn secondary_detached(&mut self) {
        self.secondary_ready = false;
    }

    /// Whether state is mirrored to a secondary surface
    pub fn is_secondary_ready(&self) -> bool {
        self.secondary_ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_state_is_suppressed() {
        let mut sync = WidgetStateSync::new();
        assert!(sync.apply(Surface::Primary, None, json!({"a": 1, "b": [1, 2]})).is_some());
        // Key order does not matter
        assert!(sync.apply(Surface::Primary, None, json!({"b": [1, 2], "a": 1})).is_none());
        assert!(sync.apply(Surface::Primary, None, json!({"a": 2, "b": [1, 2]})).is_some());
    }

    #[test]
    fn test_mirror_requires_ready_secondary() {
        let mut sync = WidgetStateSync::new();
        let change = sync.apply(Surface::Primary, Some("t1".into()), json!(1)).unwrap();
        assert_eq!(change.mirror_to, None);

        sync.secondary_ready();
        let change = sync.apply(Surface::Primary, None, json!(2)).unwrap();
        assert_eq!(change.mirror_to, Some(Surface::Secondary));
        assert_eq!(change.tool_id.as_deref(), Some("t1"));

        let change = sync.apply(Surface::Secondary, None, json!(3)).unwrap();
        assert_eq!(change.mirror_to, Some(Surface::Primary));

        sync.secondary_detached();
        let change = sync.apply(Surface::Primary, None, json!(4)).unwrap();
        assert_eq!(change.mirror_to, None);
    }

    #[test]
    fn test_secondary_ready_always_pushes() {
        let mut sync = WidgetStateSync::new();
        assert_eq!(sync.secondary_ready().state, Value::Null);

        sync.apply(Surface::Primary, None, json!({"step": 2}));
        let push = sync.secondary_ready();
        assert_eq!(push.state, json!({"step": 2}));
        assert_eq!(push.mirror_to, Some(Surface::Secondary));
    }
}
