//! Style aggregates: the full set of properties describing one visual component.

use std::rc::Rc;

use crate::message::MessageBroker;
use crate::style::property::StyleProperty;
use crate::style::state::ComponentState;
use crate::style::values::{parse_number, Color, Outline, TextStyles, Texture, ValueError};

/// Look of a rectangular background: fill, border and optional texture.
#[derive(Debug, Clone)]
pub struct StylePropertyBackground {
    pub border_color: StyleProperty<Color>,
    pub color: StyleProperty<Color>,
    pub texture: StyleProperty<Texture>,
    pub borders: StyleProperty<Outline>,
    pub padding: StyleProperty<Outline>,
    /// Corner radius; not state dependent.
    pub rounded_border_radius: f32,
}

impl StylePropertyBackground {
    pub fn new() -> Self {
        Self::with_broker(MessageBroker::current())
    }

    pub fn with_broker(broker: Rc<MessageBroker>) -> Self {
        Self {
            border_color: StyleProperty::with_broker(broker.clone(), Color::BLACK),
            color: StyleProperty::with_broker(broker.clone(), Color::WHITE),
            texture: StyleProperty::with_broker(broker.clone(), Texture::default()),
            borders: StyleProperty::with_broker(broker.clone(), Outline::default()),
            padding: StyleProperty::with_broker(broker, Outline::default()),
            rounded_border_radius: 0.0,
        }
    }

    /// Apply `Name[StateSuffix] = value` pairs, e.g. `BackgroundColorHover = red`.
    ///
    /// Recognised names are `BorderColor`, `BackgroundColor`, `Texture`
    /// (or `TextureBackground`), `Borders`, `Padding` and `RoundedBorderRadius`.
    /// Other keys are skipped. `None` unsets a color or texture for that state.
    /// Returns how many pairs were applied.
    pub fn apply<I, K, V>(&mut self, properties: I) -> Result<usize, ValueError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut applied = 0;
        for (key, value) in properties {
            let (name, state) = ComponentState::split_suffix(key.as_ref());
            let value = value.as_ref();
            match name {
                "BorderColor" => self
                    .border_color
                    .set_optional_value(optional_color(value)?, state),
                "BackgroundColor" => self.color.set_optional_value(optional_color(value)?, state),
                "Texture" | "TextureBackground" => {
                    let texture: Texture = value.parse()?;
                    self.texture
                        .set_optional_value(texture.is_set().then_some(texture), state);
                }
                "Borders" => self.borders.set_value(value.parse()?, state),
                "Padding" => self.padding.set_value(value.parse()?, state),
                "RoundedBorderRadius" if state == ComponentState::Normal => {
                    self.rounded_border_radius = parse_number(value)?;
                }
                _ => continue,
            }
            applied += 1;
        }
        Ok(applied)
    }
}

impl Default for StylePropertyBackground {
    fn default() -> Self {
        Self::new()
    }
}

/// Look of a piece of text.
#[derive(Debug, Clone)]
pub struct StylePropertyText {
    pub color: StyleProperty<Color>,
    pub style: StyleProperty<TextStyles>,
}

impl StylePropertyText {
    pub fn new() -> Self {
        Self::with_broker(MessageBroker::current())
    }

    pub fn with_broker(broker: Rc<MessageBroker>) -> Self {
        Self {
            color: StyleProperty::with_broker(broker.clone(), Color::BLACK),
            style: StyleProperty::with_broker(broker, TextStyles::REGULAR),
        }
    }

    /// Apply `TextColor[StateSuffix]` and `TextStyle[StateSuffix]` pairs.
    pub fn apply<I, K, V>(&mut self, properties: I) -> Result<usize, ValueError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut applied = 0;
        for (key, value) in properties {
            let (name, state) = ComponentState::split_suffix(key.as_ref());
            let value = value.as_ref();
            match name {
                "TextColor" => self.color.set_optional_value(optional_color(value)?, state),
                "TextStyle" => self.style.set_value(value.parse()?, state),
                _ => continue,
            }
            applied += 1;
        }
        Ok(applied)
    }
}

impl Default for StylePropertyText {
    fn default() -> Self {
        Self::new()
    }
}

/// `None` (or nothing) means "no value for this state".
fn optional_color(value: &str) -> Result<Option<Color>, ValueError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}
