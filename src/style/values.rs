//! Typed style values parsed from raw DataIO strings.
//!
//! Every type here implements [`FromStr`] with [`ValueError`] so theme code can
//! go from `"rgb(10, 20, 30)"` or `"(2, 4)"` to a value for a [`StyleProperty`].
//!
//! [`StyleProperty`]: crate::style::StyleProperty

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::dataio::deserialize_string;

/// Errors from converting a raw value string into a typed style value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("invalid color '{0}'")]
    Color(String),
    #[error("invalid outline '{0}': expected 1, 2 or 4 numbers separated by commas")]
    Outline(String),
    #[error("invalid number '{0}'")]
    Number(String),
    #[error("invalid text style '{0}'")]
    TextStyle(String),
    #[error("invalid texture '{value}': {message}")]
    Texture { value: String, message: String },
}

/// Parse a plain number, ignoring surrounding whitespace.
pub fn parse_number(value: &str) -> Result<f32, ValueError> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| ValueError::Number(value.to_string()))
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale the alpha channel by `opacity`, clamped to `0.0..=1.0`.
    pub fn apply_opacity(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            a: (f32::from(self.a) * opacity).round() as u8,
            ..self
        }
    }

    fn named(name: &str) -> Option<Color> {
        let color = match name {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::RED,
            "green" => Color::GREEN,
            "blue" => Color::BLUE,
            "yellow" => Color::YELLOW,
            "magenta" => Color::MAGENTA,
            "cyan" => Color::CYAN,
            "transparent" => Color::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }

    fn from_hex(hex: &str) -> Option<Color> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let short = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
        let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Color::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Color::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Color::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Color::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl FromStr for Color {
    type Err = ValueError;

    /// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
    /// `rgba(r, g, b, a)`, a bare `r, g, b[, a]` list and a few color names.
    /// `none` and the empty string yield [`Color::TRANSPARENT`].
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::Color(value.to_string());
        let lower = value.trim().to_ascii_lowercase();

        if lower.is_empty() || lower == "none" {
            return Ok(Color::TRANSPARENT);
        }
        if let Some(hex) = lower.strip_prefix('#') {
            return Color::from_hex(hex).ok_or_else(invalid);
        }
        if let Some(color) = Color::named(&lower) {
            return Ok(color);
        }

        let body = lower
            .strip_prefix("rgba")
            .or_else(|| lower.strip_prefix("rgb"))
            .unwrap_or(&lower)
            .trim();
        let body = body
            .strip_prefix('(')
            .and_then(|b| b.strip_suffix(')'))
            .unwrap_or(body);

        let channels = body
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        match channels[..] {
            [r, g, b] => Ok(Color::rgb(r, g, b)),
            [r, g, b, a] => Ok(Color::rgba(r, g, b, a)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outline
// ---------------------------------------------------------------------------

/// Per-side thickness, used for borders and padding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Outline {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Outline {
    /// Same thickness on all sides.
    pub const fn uniform(size: f32) -> Self {
        Self::new(size, size, size, size)
    }

    /// `horizontal` on left and right, `vertical` on top and bottom.
    pub const fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }

    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl FromStr for Outline {
    type Err = ValueError;

    /// Parse `n`, `h, v` or `l, t, r, b`, optionally wrapped in `()` or `{}`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueError::Outline(value.to_string());
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let inner = trimmed
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .or_else(|| trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
            .unwrap_or(trimmed)
            .trim();
        if inner.is_empty() {
            return Ok(Outline::default());
        }

        let sizes = inner
            .split(',')
            .map(|part| part.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        match sizes[..] {
            [size] => Ok(Outline::uniform(size)),
            [horizontal, vertical] => Ok(Outline::symmetric(horizontal, vertical)),
            [left, top, right, bottom] => Ok(Outline::new(left, top, right, bottom)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

// ---------------------------------------------------------------------------
// TextStyles
// ---------------------------------------------------------------------------

bitflags! {
    /// Text decoration flags; the empty set is the regular style.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextStyles: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINED = 1 << 2;
        const STRIKE_THROUGH = 1 << 3;
    }
}

impl TextStyles {
    pub const REGULAR: TextStyles = TextStyles::empty();

    const NAMES: [(TextStyles, &'static str); 4] = [
        (TextStyles::BOLD, "Bold"),
        (TextStyles::ITALIC, "Italic"),
        (TextStyles::UNDERLINED, "Underlined"),
        (TextStyles::STRIKE_THROUGH, "StrikeThrough"),
    ];
}

impl FromStr for TextStyles {
    type Err = ValueError;

    /// Parse names joined by `|`, case-insensitively (`Bold | Italic`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut styles = TextStyles::REGULAR;
        for word in value.split('|').map(str::trim) {
            if word.is_empty() || word.eq_ignore_ascii_case("regular") {
                continue;
            }
            let (flag, _) = TextStyles::NAMES
                .iter()
                .find(|(_, name)| word.eq_ignore_ascii_case(name))
                .ok_or_else(|| ValueError::TextStyle(value.to_string()))?;
            styles |= *flag;
        }
        Ok(styles)
    }
}

impl fmt::Display for TextStyles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Regular");
        }
        let mut first = true;
        for (flag, name) in TextStyles::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Texture
// ---------------------------------------------------------------------------

/// Rectangle as `[left, top, width, height]` in texture pixels.
pub type UIntRect = [u32; 4];

/// A texture reference: file name plus optional sub-rectangles.
///
/// Only the reference is modelled; loading pixels belongs to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Texture {
    pub filename: String,
    /// Part of the image to use.
    pub part_rect: Option<UIntRect>,
    /// Middle section for nine-slice scaling.
    pub middle_rect: Option<UIntRect>,
    /// Explicit smoothing override.
    pub smooth: Option<bool>,
}

impl Texture {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    /// Whether a file is referenced at all (`none` parses to an unset texture).
    pub fn is_set(&self) -> bool {
        !self.filename.is_empty()
    }
}

impl FromStr for Texture {
    type Err = ValueError;

    /// Parse `file.png`, or `"file.png" Part(l, t, w, h) Middle(l, t, w, h) Smooth`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| ValueError::Texture {
            value: value.to_string(),
            message: message.to_string(),
        };
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Texture::default());
        }
        if !trimmed.starts_with('"') {
            return Ok(Texture::new(trimmed));
        }

        let close = closing_quote(trimmed)
            .ok_or_else(|| invalid("missing closing quote after filename"))?;
        let mut texture = Texture::new(deserialize_string(&trimmed[..=close]));

        let mut rest = trimmed[close + 1..].trim_start();
        while !rest.is_empty() {
            let Some(open) = rest.find('(') else {
                match rest.trim() {
                    s if s.eq_ignore_ascii_case("smooth") => texture.smooth = Some(true),
                    s if s.eq_ignore_ascii_case("nosmooth") => texture.smooth = Some(false),
                    _ => return Err(invalid("unexpected text after filename")),
                }
                break;
            };

            let word = rest[..open].trim();
            let close = rest[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or_else(|| invalid("missing ')' after rectangle"))?;
            let numbers = &rest[open + 1..close];
            if word.eq_ignore_ascii_case("part") {
                texture.part_rect =
                    Some(parse_rect(numbers, true).ok_or_else(|| invalid("bad Part rectangle"))?);
            } else if word.eq_ignore_ascii_case("middle") {
                texture.middle_rect = Some(
                    parse_rect(numbers, false).ok_or_else(|| invalid("bad Middle rectangle"))?,
                );
            } else {
                return Err(invalid("expected 'Part' or 'Middle' before '('"));
            }
            rest = rest[close + 1..].trim_start();
        }

        Ok(texture)
    }
}

/// Byte offset of the quote closing the string that opens `text`.
fn closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_rect(numbers: &str, require_four: bool) -> Option<UIntRect> {
    let values = numbers
        .split(',')
        .map(|n| n.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match values[..] {
        [l, t, w, h] => Some([l, t, w, h]),
        [l, t] if !require_four => Some([l, t, 0, 0]),
        [v] if !require_four => Some([v, v, 0, 0]),
        _ => None,
    }
}
