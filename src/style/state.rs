//! Visual states of a widget or of a component inside it.

use std::fmt;

/// Number of storage slots needed to index a value by state (`DisabledActive` is 10).
pub(crate) const STATE_SLOTS: usize = 11;

/// Interaction state, encoded so the value doubles as a bit position.
///
/// The modifiers are `Hover` (1), `Active` (2), `Focused` (4) and `Disabled` (8);
/// every other state is the bitwise OR of the modifiers it names. Value 9 is
/// intentionally unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum ComponentState {
    /// Default state.
    #[default]
    Normal = 0,
    /// Mouse hover.
    Hover = 1,
    /// Pressed, checked or selected.
    Active = 2,
    /// Pressed, checked or selected with mouse hover.
    ActiveHover = 3,
    /// Has focus.
    Focused = 4,
    /// Has focus with mouse hover.
    FocusedHover = 5,
    /// Has focus while pressed, checked or selected.
    FocusedActive = 6,
    /// Has focus while pressed, checked or selected with mouse hover.
    FocusedActiveHover = 7,
    /// Disabled.
    Disabled = 8,
    /// Disabled while pressed, checked or selected.
    DisabledActive = 10,
}

impl ComponentState {
    /// Every named state, in ascending numeric order.
    pub const ALL: [ComponentState; 10] = [
        ComponentState::Normal,
        ComponentState::Hover,
        ComponentState::Active,
        ComponentState::ActiveHover,
        ComponentState::Focused,
        ComponentState::FocusedHover,
        ComponentState::FocusedActive,
        ComponentState::FocusedActiveHover,
        ComponentState::Disabled,
        ComponentState::DisabledActive,
    ];

    /// Theme key suffixes; a suffix always precedes the shorter suffixes it ends with.
    const SUFFIX_MATCH_ORDER: [ComponentState; 9] = [
        ComponentState::FocusedActiveHover,
        ComponentState::DisabledActive,
        ComponentState::FocusedActive,
        ComponentState::FocusedHover,
        ComponentState::ActiveHover,
        ComponentState::Disabled,
        ComponentState::Focused,
        ComponentState::Active,
        ComponentState::Hover,
    ];

    /// Numeric value (also the bit position in a presence mask).
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Single-bit mask for this state in a 16-bit presence set.
    pub const fn bit(self) -> u16 {
        1 << self as u8
    }

    /// Storage slot for per-state values.
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Whether this (possibly combined) state includes the `modifier` bits.
    pub const fn includes(self, modifier: ComponentState) -> bool {
        self.bits() & modifier.bits() != 0
    }

    /// Derive the state from a widget's interaction flags.
    ///
    /// A disabled widget only distinguishes between active and not active.
    pub fn from_flags(hover: bool, active: bool, focused: bool, enabled: bool) -> Self {
        match (enabled, focused, active, hover) {
            (false, _, true, _) => ComponentState::DisabledActive,
            (false, _, false, _) => ComponentState::Disabled,
            (true, true, true, true) => ComponentState::FocusedActiveHover,
            (true, true, true, false) => ComponentState::FocusedActive,
            (true, true, false, true) => ComponentState::FocusedHover,
            (true, true, false, false) => ComponentState::Focused,
            (true, false, true, true) => ComponentState::ActiveHover,
            (true, false, true, false) => ComponentState::Active,
            (true, false, false, true) => ComponentState::Hover,
            (true, false, false, false) => ComponentState::Normal,
        }
    }

    /// Suffix used for this state in theme property names (`TextColorDownHover`).
    pub const fn suffix(self) -> &'static str {
        match self {
            ComponentState::Normal => "",
            ComponentState::Hover => "Hover",
            ComponentState::Active => "Down",
            ComponentState::ActiveHover => "DownHover",
            ComponentState::Focused => "Focused",
            ComponentState::FocusedHover => "FocusedHover",
            ComponentState::FocusedActive => "DownFocused",
            ComponentState::FocusedActiveHover => "DownFocusedHover",
            ComponentState::Disabled => "Disabled",
            ComponentState::DisabledActive => "DownDisabled",
        }
    }

    /// Split a theme property name into its base name and state.
    ///
    /// `"BackgroundColorDownHover"` yields `("BackgroundColor", ActiveHover)`;
    /// a name without a known suffix is returned whole with `Normal`.
    pub fn split_suffix(key: &str) -> (&str, ComponentState) {
        for state in Self::SUFFIX_MATCH_ORDER {
            let suffix = state.suffix();
            if key.len() > suffix.len() && key.ends_with(suffix) {
                return (&key[..key.len() - suffix.len()], state);
            }
        }
        (key, ComponentState::Normal)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
