//! Theme loading: a DataIO document whose top-level sections describe the
//! look of one widget type each.
//!
//! Loading a theme parses the text, prefixes relative texture, font and image
//! paths with a resource path, inlines `&Section` references and flattens every
//! section into `property -> raw value`. Nested sections become `{\n…}` values
//! that can themselves be parsed again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dataio::{self, deserialize_string, emit_body, Document, NodeId, ParseError, ValueNode};
use crate::style::{StylePropertyBackground, StylePropertyText, ValueError};

/// Flattened properties of one theme section.
pub type SectionProperties = BTreeMap<String, String>;

/// Errors from loading a theme.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("root property '{0}' found, a theme may only contain sections")]
    RootProperty(String),
    #[error("no section '{0}' in theme")]
    UnknownSection(String),
    #[error("undefined reference to '{0}'")]
    UndefinedReference(String),
    #[error("reference to '{0}' refers back to itself")]
    CyclicReference(String),
    #[error("failed to read theme file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// ThemeConfig
// ---------------------------------------------------------------------------

/// Options for loading a theme.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    /// Prefix for relative `Texture*`, `Font` and `Image` values, e.g. `"themes/"`.
    ///
    /// When unset, [`Theme::load_file`] uses the directory of the theme file.
    pub resource_path: Option<String>,
    /// Fail on `key = value;` pairs outside of any section.
    pub reject_root_properties: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            resource_path: None,
            reject_root_properties: true,
        }
    }
}

impl ThemeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource path (builder).
    pub fn with_resource_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    /// Set whether root properties are an error (builder).
    pub fn with_reject_root_properties(mut self, reject: bool) -> Self {
        self.reject_root_properties = reject;
        self
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// A loaded theme: section name to flattened properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    sections: BTreeMap<String, SectionProperties>,
}

impl Theme {
    /// Parse theme text.
    pub fn parse(text: &str, config: &ThemeConfig) -> Result<Self, ThemeError> {
        let doc = dataio::parse(text)?;
        Self::from_document(doc, config)
    }

    /// Read and parse a theme file.
    pub fn load_file(path: impl AsRef<Path>, config: &ThemeConfig) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = config.clone();
        if config.resource_path.is_none() {
            config.resource_path = directory_of(path);
        }
        let theme = Self::parse(&text, &config)?;
        debug!(
            path = %path.display(),
            sections = theme.sections.len(),
            "loaded theme"
        );
        Ok(theme)
    }

    /// Build a theme from an already parsed document.
    pub fn from_document(mut doc: Document, config: &ThemeConfig) -> Result<Self, ThemeError> {
        let root = doc.root();
        if let Some(path) = config.resource_path.as_deref().filter(|p| !p.is_empty()) {
            inject_resource_path(&mut doc, root, path);
        }
        if config.reject_root_properties {
            if let Some((key, _)) = doc.properties(root).next() {
                return Err(ThemeError::RootProperty(key.to_string()));
            }
        }

        // The first section with a given name wins.
        let mut index = BTreeMap::new();
        for &child in doc.children(root) {
            index
                .entry(deserialize_string(doc.name(child)))
                .or_insert(child);
        }

        resolve_references(&mut doc, &index, root, &mut Vec::new())?;

        let sections = index
            .iter()
            .map(|(name, &id)| (name.clone(), flatten(&doc, id)))
            .collect();
        Ok(Self { sections })
    }

    /// Properties of the section `name`.
    pub fn section(&self, name: &str) -> Option<&SectionProperties> {
        self.sections.get(name)
    }

    /// Section names in sorted order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Apply the background properties of `section` to `style`.
    pub fn apply_background(
        &self,
        section: &str,
        style: &mut StylePropertyBackground,
    ) -> Result<usize, ThemeError> {
        Ok(style.apply(self.require(section)?)?)
    }

    /// Apply the text properties of `section` to `style`.
    pub fn apply_text(
        &self,
        section: &str,
        style: &mut StylePropertyText,
    ) -> Result<usize, ThemeError> {
        Ok(style.apply(self.require(section)?)?)
    }

    fn require(&self, section: &str) -> Result<&SectionProperties, ThemeError> {
        self.section(section)
            .ok_or_else(|| ThemeError::UnknownSection(section.to_string()))
    }
}

/// Directory part of `path` with a trailing slash, if any.
fn directory_of(path: &Path) -> Option<String> {
    let dir = path.parent()?.to_string_lossy();
    if dir.is_empty() {
        None
    } else {
        Some(format!("{}/", dir.trim_end_matches('/')))
    }
}

fn is_resource_key(key: &str) -> bool {
    key.starts_with("Texture") || key == "Font" || key == "Image"
}

/// Prefix a relative filename with `path`. Quoted values keep their quotes.
fn with_resource_path(value: &str, path: &str) -> Option<String> {
    let unset = ["none", "null", "nullptr"];
    if value.is_empty() || unset.iter().any(|u| value.eq_ignore_ascii_case(u)) {
        return None;
    }
    match value.strip_prefix('"') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => None,
        Some(rest) => Some(format!("\"{path}{rest}")),
        None if value.starts_with('/') => None,
        None => Some(format!("{path}{value}")),
    }
}

fn inject_resource_path(doc: &mut Document, id: NodeId, path: &str) {
    let updates: Vec<(String, String)> = doc
        .properties(id)
        .filter(|(key, _)| is_resource_key(key))
        .filter_map(|(key, value)| {
            with_resource_path(&value.value, path).map(|value| (key.to_string(), value))
        })
        .collect();
    for (key, value) in updates {
        doc.set_property(id, key, ValueNode::new(value));
    }
    for child in doc.children(id).to_vec() {
        inject_resource_path(doc, child, path);
    }
}

/// Replace every `&Name` value below `id` by the inlined body of section `Name`.
fn resolve_references(
    doc: &mut Document,
    index: &BTreeMap<String, NodeId>,
    id: NodeId,
    resolving: &mut Vec<NodeId>,
) -> Result<(), ThemeError> {
    let references: Vec<(String, String)> = doc
        .properties(id)
        .filter_map(|(key, value)| {
            let name = value.value.strip_prefix('&')?;
            Some((key.to_string(), deserialize_string(name)))
        })
        .collect();

    for (key, name) in references {
        let target = *index
            .get(&name)
            .ok_or_else(|| ThemeError::UndefinedReference(name.clone()))?;
        if resolving.contains(&target) {
            return Err(ThemeError::CyclicReference(name));
        }
        resolving.push(target);
        resolve_references(doc, index, target, resolving)?;
        resolving.pop();

        let inline = format!("{{\n{}}}", emit_body(doc, target));
        doc.set_property(id, key, ValueNode::new(inline));
    }

    for child in doc.children(id).to_vec() {
        resolve_references(doc, index, child, resolving)?;
    }
    Ok(())
}

fn flatten(doc: &Document, id: NodeId) -> SectionProperties {
    let mut properties: SectionProperties = doc
        .properties(id)
        .map(|(key, value)| (key.to_string(), value.value.clone()))
        .collect();
    for &child in doc.children(id) {
        properties.insert(
            doc.name(child).to_string(),
            format!("{{\n{}}}", emit_body(doc, child)),
        );
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBroker;
    use crate::style::{Color, ComponentState, Outline, TextStyles};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn theme(text: &str) -> Theme {
        Theme::parse(text, &ThemeConfig::default()).unwrap()
    }

    fn get<'t>(theme: &'t Theme, section: &str, key: &str) -> Option<&'t str> {
        theme.section(section)?.get(key).map(String::as_str)
    }

    #[test]
    fn sections_are_keyed_by_unquoted_name() {
        let theme = theme(r#"Button { TextColor = red; } "Check Box" { TextColor = blue; }"#);
        assert_eq!(theme.sections().collect::<Vec<_>>(), vec!["Button", "Check Box"]);
        assert_eq!(get(&theme, "Check Box", "TextColor"), Some("blue"));
        assert_eq!(theme.len(), 2);
    }

    #[test]
    fn first_duplicate_section_wins() {
        let theme = theme("Button { A = 1; } Button { A = 2; }");
        assert_eq!(get(&theme, "Button", "A"), Some("1"));
    }

    #[test]
    fn root_properties_are_rejected() {
        let err = Theme::parse("Stray = 1; Button {}", &ThemeConfig::default()).unwrap_err();
        assert!(matches!(err, ThemeError::RootProperty(ref key) if key == "Stray"));

        let lenient = ThemeConfig::new().with_reject_root_properties(false);
        let theme = Theme::parse("Stray = 1; Button {}", &lenient).unwrap();
        assert!(theme.section("Button").is_some());
    }

    #[test]
    fn parse_errors_are_wrapped() {
        let err = Theme::parse("Button {", &ThemeConfig::default()).unwrap_err();
        assert!(matches!(err, ThemeError::Parse(ref e) if e.line == 1));
    }

    #[test]
    fn nested_sections_become_inline_values() {
        let theme = theme("ListBox { Scrollbar { TrackColor = red; } TextColor = black; }");
        assert_eq!(
            get(&theme, "ListBox", "Scrollbar"),
            Some("{\nTrackColor = red;\n}")
        );
        assert_eq!(get(&theme, "ListBox", "TextColor"), Some("black"));
    }

    #[test]
    fn inline_values_parse_again() {
        let theme = theme("ListBox { Scrollbar { TrackColor = red; } }");
        let inline = get(&theme, "ListBox", "Scrollbar").unwrap();
        let doc = dataio::parse(inline).unwrap();
        let section = doc.children(doc.root())[0];
        assert_eq!(
            doc.property(section, "TrackColor").map(|v| v.value.as_str()),
            Some("red")
        );
    }

    #[test]
    fn references_are_inlined() {
        let theme = theme(
            "Scrollbar { TrackColor = red; } \
             ListBox { Scrollbar = &Scrollbar; } \
             ComboBox { ListBox = &\"ListBox\"; }",
        );
        assert_eq!(
            get(&theme, "ListBox", "Scrollbar"),
            Some("{\nTrackColor = red;\n}")
        );
        assert_eq!(
            get(&theme, "ComboBox", "ListBox"),
            Some("{\nScrollbar = {\nTrackColor = red;\n};\n}")
        );
    }

    #[test]
    fn reference_errors() {
        let err = Theme::parse("A { X = &Missing; }", &ThemeConfig::default()).unwrap_err();
        assert!(matches!(err, ThemeError::UndefinedReference(ref n) if n == "Missing"));

        let err = Theme::parse("A { X = &B; } B { Y = &A; }", &ThemeConfig::default())
            .unwrap_err();
        assert!(matches!(err, ThemeError::CyclicReference(_)));

        let err = Theme::parse("A { X = &A; }", &ThemeConfig::default()).unwrap_err();
        assert!(matches!(err, ThemeError::CyclicReference(ref n) if n == "A"));
    }

    #[test]
    fn resource_path_is_injected() {
        let config = ThemeConfig::new().with_resource_path("themes/");
        let theme = Theme::parse(
            r#"Button {
                Texture = Black.png;
                TextureHover = "BlackHover.png" Part(0, 0, 10, 10);
                TextureDisabled = /abs/Disabled.png;
                TextureDown = None;
                Font = "/fonts/a.ttf";
                Image = pic.png;
                Other = keep.png;
                Inner { Texture = inner.png; }
            }"#,
            &config,
        )
        .unwrap();
        assert_eq!(get(&theme, "Button", "Texture"), Some("themes/Black.png"));
        assert_eq!(
            get(&theme, "Button", "TextureHover"),
            Some(r#""themes/BlackHover.png" Part(0, 0, 10, 10)"#)
        );
        assert_eq!(get(&theme, "Button", "TextureDisabled"), Some("/abs/Disabled.png"));
        assert_eq!(get(&theme, "Button", "TextureDown"), Some("None"));
        assert_eq!(get(&theme, "Button", "Font"), Some(r#""/fonts/a.ttf""#));
        assert_eq!(get(&theme, "Button", "Image"), Some("themes/pic.png"));
        assert_eq!(get(&theme, "Button", "Other"), Some("keep.png"));
        assert_eq!(
            get(&theme, "Button", "Inner"),
            Some("{\nTexture = themes/inner.png;\n}")
        );
    }

    #[test]
    fn apply_to_aggregates() {
        let theme = theme(
            "Button {
                BackgroundColor = #202020;
                BackgroundColorHover = rgb(40, 40, 40);
                Borders = (2, 1);
                TextColor = white;
                TextColorDisabled = (128, 128, 128);
                TextStyleDown = Bold;
            }",
        );
        let broker = Rc::new(MessageBroker::new());
        let mut background = StylePropertyBackground::with_broker(broker.clone());
        let mut text = StylePropertyText::with_broker(broker);

        assert_eq!(theme.apply_background("Button", &mut background).unwrap(), 3);
        assert_eq!(theme.apply_text("Button", &mut text).unwrap(), 3);

        assert_eq!(*background.color.get(ComponentState::Normal), Color::rgb(32, 32, 32));
        assert_eq!(*background.color.get(ComponentState::Hover), Color::rgb(40, 40, 40));
        assert_eq!(
            *background.borders.get(ComponentState::Disabled),
            Outline::symmetric(2.0, 1.0)
        );
        assert_eq!(*text.color.get(ComponentState::Disabled), Color::rgb(128, 128, 128));
        assert_eq!(*text.style.get(ComponentState::ActiveHover), TextStyles::BOLD);
    }

    #[test]
    fn apply_errors() {
        let theme = theme("Button { BackgroundColor = not-a-color; }");
        let mut background = StylePropertyBackground::with_broker(Rc::new(MessageBroker::new()));
        assert!(matches!(
            theme.apply_background("Button", &mut background),
            Err(ThemeError::Value(ValueError::Color(_)))
        ));
        assert!(matches!(
            theme.apply_background("Slider", &mut background),
            Err(ThemeError::UnknownSection(ref s)) if s == "Slider"
        ));
    }

    #[test]
    fn load_file_uses_file_directory() {
        let dir = std::env::temp_dir().join(format!("themekit-theme-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("Black.txt");
        fs::write(&file, "Button { Texture = Button.png; }").unwrap();

        let theme = Theme::load_file(&file, &ThemeConfig::default()).unwrap();
        let expected = format!("{}/Button.png", dir.to_string_lossy().trim_end_matches('/'));
        assert_eq!(get(&theme, "Button", "Texture"), Some(expected.as_str()));

        let explicit = ThemeConfig::new().with_resource_path("res/");
        let theme = Theme::load_file(&file, &explicit).unwrap();
        assert_eq!(get(&theme, "Button", "Texture"), Some("res/Button.png"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_file() {
        let err = Theme::load_file("does/not/exist.txt", &ThemeConfig::default()).unwrap_err();
        assert!(matches!(err, ThemeError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.txt"));
    }
}
