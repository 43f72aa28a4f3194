//! Cached rendering state of a component, kept current through change events.
//!
//! A component subscribes to every property of its aggregate when created.
//! The broker callback only flags the cache as stale; [`sync`] then re-resolves
//! the values for the current state. Dropping the component unsubscribes.
//!
//! [`sync`]: BackgroundComponent::sync

use std::cell::Cell;
use std::rc::Rc;

use crate::message::{CallbackId, MessageBroker};
use crate::style::aggregate::{StylePropertyBackground, StylePropertyText};
use crate::style::property::StyleProperty;
use crate::style::state::ComponentState;
use crate::style::values::{Color, Outline, TextStyles, Texture};

/// Subscriptions held by one component, released on drop.
#[derive(Debug)]
struct Watch {
    stale: Rc<Cell<bool>>,
    callbacks: Vec<(Rc<MessageBroker>, CallbackId)>,
}

impl Watch {
    fn new() -> Self {
        Self {
            stale: Rc::new(Cell::new(true)),
            callbacks: Vec::new(),
        }
    }

    fn property<T>(&mut self, property: &StyleProperty<T>) {
        let stale = self.stale.clone();
        let id = property.connect_callback(move || stale.set(true));
        self.callbacks.push((property.broker().clone(), id));
    }

    fn is_stale(&self) -> bool {
        self.stale.get()
    }

    fn mark_stale(&self) {
        self.stale.set(true);
    }

    /// Clear the flag, returning whether it was set.
    fn take(&self) -> bool {
        self.stale.replace(false)
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        for (broker, id) in self.callbacks.drain(..) {
            broker.unsubscribe(id);
        }
    }
}

// ---------------------------------------------------------------------------
// BackgroundComponent
// ---------------------------------------------------------------------------

/// Resolved background look for one widget.
///
/// Must be synced with the same [`StylePropertyBackground`] it was created from.
#[derive(Debug)]
pub struct BackgroundComponent {
    state: ComponentState,
    opacity: f32,
    border_color: Color,
    color: Color,
    texture: Texture,
    borders: Outline,
    padding: Outline,
    rounded_border_radius: f32,
    watch: Watch,
}

impl BackgroundComponent {
    pub fn new(style: &StylePropertyBackground) -> Self {
        let mut watch = Watch::new();
        watch.property(&style.border_color);
        watch.property(&style.color);
        watch.property(&style.texture);
        watch.property(&style.borders);
        watch.property(&style.padding);

        let mut component = Self {
            state: ComponentState::Normal,
            opacity: 1.0,
            border_color: Color::default(),
            color: Color::default(),
            texture: Texture::default(),
            borders: Outline::default(),
            padding: Outline::default(),
            rounded_border_radius: 0.0,
            watch,
        };
        component.sync(style);
        component
    }

    /// Change the visual state; values refresh on the next [`sync`](Self::sync).
    pub fn set_component_state(&mut self, state: ComponentState) {
        if self.state != state {
            self.state = state;
            self.watch.mark_stale();
        }
    }

    pub fn component_state(&self) -> ComponentState {
        self.state
    }

    /// Set opacity in `0.0..=1.0`, applied to the cached colors.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.watch.mark_stale();
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Whether a property changed (or state/opacity did) since the last sync.
    pub fn is_stale(&self) -> bool {
        self.watch.is_stale()
    }

    /// Re-resolve every cached value if stale. Returns whether anything was refreshed.
    ///
    /// The corner radius publishes no events, so it is compared on every call.
    pub fn sync(&mut self, style: &StylePropertyBackground) -> bool {
        let radius_changed = self.rounded_border_radius != style.rounded_border_radius;
        self.rounded_border_radius = style.rounded_border_radius;
        if !self.watch.take() {
            return radius_changed;
        }
        let state = self.state;
        self.border_color = style.border_color.get(state).apply_opacity(self.opacity);
        self.color = style.color.get(state).apply_opacity(self.opacity);
        self.texture = style.texture.get(state).clone();
        self.borders = *style.borders.get(state);
        self.padding = *style.padding.get(state);
        true
    }

    pub fn border_color(&self) -> Color {
        self.border_color
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn borders(&self) -> Outline {
        self.borders
    }

    pub fn padding(&self) -> Outline {
        self.padding
    }

    pub fn rounded_border_radius(&self) -> f32 {
        self.rounded_border_radius
    }
}

// ---------------------------------------------------------------------------
// TextComponent
// ---------------------------------------------------------------------------

/// Resolved text look plus the string being shown.
#[derive(Debug)]
pub struct TextComponent {
    text: String,
    state: ComponentState,
    opacity: f32,
    color: Color,
    style: TextStyles,
    watch: Watch,
}

impl TextComponent {
    pub fn new(style: &StylePropertyText) -> Self {
        let mut watch = Watch::new();
        watch.property(&style.color);
        watch.property(&style.style);

        let mut component = Self {
            text: String::new(),
            state: ComponentState::Normal,
            opacity: 1.0,
            color: Color::default(),
            style: TextStyles::REGULAR,
            watch,
        };
        component.sync(style);
        component
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_component_state(&mut self, state: ComponentState) {
        if self.state != state {
            self.state = state;
            self.watch.mark_stale();
        }
    }

    pub fn component_state(&self) -> ComponentState {
        self.state
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.watch.mark_stale();
    }

    pub fn is_stale(&self) -> bool {
        self.watch.is_stale()
    }

    pub fn sync(&mut self, style: &StylePropertyText) -> bool {
        if !self.watch.take() {
            return false;
        }
        self.color = style.color.get(self.state).apply_opacity(self.opacity);
        self.style = *style.style.get(self.state);
        true
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn style(&self) -> TextStyles {
        self.style
    }
}
