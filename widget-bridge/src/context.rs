//! Host context store and diffing
//!
//! Each session sees the host environment through a [`HostContextSnapshot`].
//! After the handshake, every environment change is turned into the minimal
//! [`ContextDiff`]: scalars compare by equality, grouped fields
//! (`viewport`, `deviceCapabilities`, `safeAreaInsets`) are sent whole or not
//! at all.

use serde::{Deserialize, Serialize};

use crate::protocol::{DisplayMode, MaxHeight, Platform, Theme};

/// Size of the area the host gives its widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Viewport as a guest sees it, including its own height constraint
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "MaxHeight::is_default")]
    pub max_height: MaxHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub hover: bool,
    pub touch: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            hover: true,
            touch: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeAreaInsets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Host-wide environment shared by every session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Environment {
    pub theme: Theme,
    pub locale: String,
    pub time_zone: String,
    pub platform: Platform,
    pub viewport: ViewportSize,
    pub device_capabilities: DeviceCapabilities,
    pub safe_area_insets: SafeAreaInsets,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            locale: "en-US".to_string(),
            time_zone: "UTC".to_string(),
            platform: Platform::default(),
            viewport: ViewportSize::default(),
            device_capabilities: DeviceCapabilities::default(),
            safe_area_insets: SafeAreaInsets::default(),
        }
    }
}

impl Environment {
    /// Set the color theme
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set the BCP 47 locale
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the IANA time zone
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Set the host platform
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Set the viewport size in pixels
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = ViewportSize { width, height };
        self
    }

    /// Set the pointer capabilities
    pub fn with_device_capabilities(mut self, hover: bool, touch: bool) -> Self {
        self.device_capabilities = DeviceCapabilities { hover, touch };
        self
    }

    /// Set the safe area insets
    pub fn with_safe_area_insets(mut self, insets: SafeAreaInsets) -> Self {
        self.safe_area_insets = insets;
        self
    }

    /// Whether the viewport is too narrow for the floating slot
    pub fn is_narrow(&self, breakpoint: u32) -> bool {
        self.viewport.width < breakpoint
    }
}

/// Everything a single guest knows about its host at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContextSnapshot {
    pub theme: Theme,
    pub display_mode: DisplayMode,
    pub locale: String,
    pub time_zone: String,
    pub platform: Platform,
    pub viewport: Viewport,
    pub device_capabilities: DeviceCapabilities,
    pub safe_area_insets: SafeAreaInsets,
}

impl HostContextSnapshot {
    /// Combine the host environment with one session's presentation
    pub fn compose(env: &Environment, display_mode: DisplayMode, max_height: MaxHeight) -> Self {
        Self {
            theme: env.theme,
            display_mode,
            locale: env.locale.clone(),
            time_zone: env.time_zone.clone(),
            platform: env.platform,
            viewport: Viewport {
                width: env.viewport.width,
                height: env.viewport.height,
                max_height,
            },
            device_capabilities: env.device_capabilities,
            safe_area_insets: env.safe_area_insets,
        }
    }

    /// Fields of `next` that differ from `self`
    pub fn diff(&self, next: &HostContextSnapshot) -> ContextDiff {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }

        ContextDiff {
            theme: changed(&self.theme, &next.theme),
            display_mode: changed(&self.display_mode, &next.display_mode),
            locale: changed(&self.locale, &next.locale),
            time_zone: changed(&self.time_zone, &next.time_zone),
            platform: changed(&self.platform, &next.platform),
            viewport: changed(&self.viewport, &next.viewport),
            max_height: changed(&self.viewport.max_height, &next.viewport.max_height),
            device_capabilities: changed(&self.device_capabilities, &next.device_capabilities),
            safe_area_insets: changed(&self.safe_area_insets, &next.safe_area_insets),
        }
    }
}

/// Changed top-level context fields; unchanged ones are `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDiff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    /// Set only when the guest's height constraint itself changed. On the
    /// JSON-RPC wire it travels inside `viewport`.
    #[serde(skip)]
    pub max_height: Option<MaxHeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_capabilities: Option<DeviceCapabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_area_insets: Option<SafeAreaInsets>,
}

impl ContextDiff {
    /// A diff carrying every field, used for the initial push to flat guests
    pub fn full(snapshot: &HostContextSnapshot) -> Self {
        Self {
            theme: Some(snapshot.theme),
            display_mode: Some(snapshot.display_mode),
            locale: Some(snapshot.locale.clone()),
            time_zone: Some(snapshot.time_zone.clone()),
            platform: Some(snapshot.platform),
            viewport: Some(snapshot.viewport),
            max_height: Some(snapshot.viewport.max_height).filter(|h| !h.is_default()),
            device_capabilities: Some(snapshot.device_capabilities),
            safe_area_insets: Some(snapshot.safe_area_insets),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ContextDiff::default()
    }
}

/// Per-session context store.
///
/// Before the handshake nothing is retained and nothing is emitted; the
/// handshake snapshot becomes the baseline every later diff is taken from.
#[derive(Debug, Default)]
pub struct ContextStore {
    previous: Option<HostContextSnapshot>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the handshake baseline has been recorded
    pub fn is_ready(&self) -> bool {
        self.previous.is_some()
    }

    /// Record the snapshot delivered inside the handshake
    pub fn fold_in(&mut self, snapshot: HostContextSnapshot) {
        self.previous = Some(snapshot);
    }

    /// Compare against the baseline; `None` before the handshake or when nothing changed
    pub fn observe(&mut self, next: HostContextSnapshot) -> Option<ContextDiff> {
        let previous = self.previous.as_mut()?;
        let diff = previous.diff(&next);
        *previous = next;
        (!diff.is_empty()).then_some(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(env: &Environment) -> HostContextSnapshot {
        HostContextSnapshot::compose(env, DisplayMode::Inline, MaxHeight::Default)
    }

    #[test]
    fn test_identical_snapshot_emits_nothing() {
        let env = Environment::default();
        let mut store = ContextStore::new();
        store.fold_in(snapshot(&env));
        assert!(store.observe(snapshot(&env)).is_none());
        assert!(store.observe(snapshot(&env)).is_none());
    }

    #[test]
    fn test_single_scalar_change() {
        let env = Environment::default();
        let mut store = ContextStore::new();
        store.fold_in(snapshot(&env));

        let diff = store
            .observe(snapshot(&env.clone().with_theme(Theme::Dark)))
            .unwrap();
        assert_eq!(serde_json::to_value(&diff).unwrap(), json!({"theme": "dark"}));
    }

    #[test]
    fn test_groups_are_sent_whole() {
        let env = Environment::default().with_viewport(1000, 700);
        let mut store = ContextStore::new();
        store.fold_in(snapshot(&env));

        let diff = store.observe(snapshot(&env.clone().with_viewport(1000, 500))).unwrap();
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({"viewport": {"width": 1000, "height": 500}})
        );

        let diff = store
            .observe(snapshot(&env.clone().with_viewport(1000, 500).with_device_capabilities(true, true)))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({"deviceCapabilities": {"hover": true, "touch": true}})
        );
    }

    #[test]
    fn test_nothing_before_handshake() {
        let env = Environment::default();
        let mut store = ContextStore::new();
        assert!(!store.is_ready());
        assert!(store.observe(snapshot(&env.with_theme(Theme::Dark))).is_none());
    }

    #[test]
    fn test_max_height_travels_in_viewport() {
        let env = Environment::default();
        let mut store = ContextStore::new();
        store.fold_in(snapshot(&env));

        let next = HostContextSnapshot::compose(&env, DisplayMode::Inline, MaxHeight::Unconstrained);
        let diff = store.observe(next).unwrap();
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!({"viewport": {"width": 1280, "height": 800, "maxHeight": null}})
        );
        assert_eq!(diff.max_height, Some(MaxHeight::Unconstrained));

        // A size change alone leaves the constraint untouched
        let next = HostContextSnapshot::compose(&env.with_viewport(900, 800), DisplayMode::Inline, MaxHeight::Unconstrained);
        let diff = store.observe(next).unwrap();
        assert!(diff.viewport.is_some());
        assert_eq!(diff.max_height, None);
    }

    #[test]
    fn test_full_diff_omits_default_max_height() {
        let env = Environment::default();
        assert_eq!(ContextDiff::full(&snapshot(&env)).max_height, None);

        let limited = HostContextSnapshot::compose(&env, DisplayMode::Inline, MaxHeight::Limit(400.0));
        assert_eq!(ContextDiff::full(&limited).max_height, Some(MaxHeight::Limit(400.0)));
    }

    #[test]
    fn test_full_diff_has_every_field() {
        let diff = ContextDiff::full(&snapshot(&Environment::default()));
        let value = serde_json::to_value(&diff).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 8);
        assert!(!diff.is_empty());
    }
}
