//! Per-state styling: visual states, state-resolved properties and the
//! aggregates and caches built on them.
//!
//! - [`ComponentState`]: bit-composable interaction state
//! - [`StyleProperty`]: one attribute with a value per state and change events
//! - [`StylePropertyBackground`] / [`StylePropertyText`]: property bundles
//! - [`BackgroundComponent`] / [`TextComponent`]: cached resolved values
//! - [`values`]: typed values parsed from theme strings

pub mod aggregate;
pub mod component;
pub mod property;
pub mod state;
pub mod values;

pub use aggregate::{StylePropertyBackground, StylePropertyText};
pub use component::{BackgroundComponent, TextComponent};
pub use property::{AnyStyleProperty, StyleProperty};
pub use state::ComponentState;
pub use values::{Color, Outline, TextStyles, Texture, ValueError};
