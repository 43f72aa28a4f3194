//! Serializer: [`Document`] back to text the parser accepts.
//!
//! Root properties become bare `key = value;` lines and every section becomes
//! an indented `name { … }` block. Values are written from their raw `value`
//! string, so list elements are not re-joined.

use std::fmt::Write as _;

use crate::dataio::document::{Document, NodeId};

/// Formatting options for [`emit_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitConfig {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Put an empty line between sibling sections.
    pub blank_line_between_sections: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: 4,
            blank_line_between_sections: true,
        }
    }
}

impl EmitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_blank_line_between_sections(mut self, blank: bool) -> Self {
        self.blank_line_between_sections = blank;
        self
    }
}

/// Serialize a whole document with the default formatting.
pub fn emit(doc: &Document) -> String {
    emit_with(doc, &EmitConfig::default())
}

/// Serialize a whole document.
pub fn emit_with(doc: &Document, config: &EmitConfig) -> String {
    body(doc, doc.root(), config)
}

/// Serialize the contents of `id` as if it were the root: its properties as
/// bare lines followed by its child sections.
pub fn emit_body(doc: &Document, id: NodeId) -> String {
    body(doc, id, &EmitConfig::default())
}

/// Serialize one section in block form, `name { … }`.
pub fn emit_node(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for line in block_lines(doc, id, &EmitConfig::default()) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn body(doc: &Document, id: NodeId, config: &EmitConfig) -> String {
    let mut out = String::new();
    let mut has_properties = false;
    for (key, value) in doc.properties(id) {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{key} = {};", value.value);
        has_properties = true;
    }

    let children = doc.children(id);
    if has_properties && !children.is_empty() {
        out.push('\n');
    }
    for (i, &child) in children.iter().enumerate() {
        if i > 0 && config.blank_line_between_sections {
            out.push('\n');
        }
        for line in block_lines(doc, child, config) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

fn block_lines(doc: &Document, id: NodeId, config: &EmitConfig) -> Vec<String> {
    let indent = " ".repeat(config.indent);
    let name = doc.name(id);
    let mut lines = vec![if name.is_empty() {
        "{".to_string()
    } else {
        format!("{name} {{")
    }];

    let mut has_properties = false;
    for (key, value) in doc.properties(id) {
        lines.push(format!("{indent}{key} = {};", value.value));
        has_properties = true;
    }

    let children = doc.children(id);
    if has_properties && !children.is_empty() {
        lines.push(String::new());
    }
    for (i, &child) in children.iter().enumerate() {
        if i > 0 && config.blank_line_between_sections {
            lines.push(String::new());
        }
        for line in block_lines(doc, child, config) {
            if line.is_empty() {
                lines.push(line);
            } else {
                lines.push(format!("{indent}{line}"));
            }
        }
    }

    lines.push("}".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataio::document::ValueNode;
    use crate::dataio::parser::parse;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        doc.set_property(root, "GlobalProperty1", ValueNode::new("GlobalValue1"));
        doc.set_property(root, "GlobalProperty2", ValueNode::new("GlobalValue2"));

        let child1 = doc.insert_child(root, "Child1").unwrap();
        doc.set_property(child1, "Property", ValueNode::new("Value"));
        let nested = doc.insert_child(child1, "NestedChild").unwrap();
        doc.set_property(nested, "PropertyA", ValueNode::new("ValueA"));
        doc.set_property(nested, "PropertyB", ValueNode::new("[]"));
        doc.set_property(nested, "PropertyC", ValueNode::new("[X, Y, Z]"));

        doc.insert_child(root, "").unwrap();
        doc
    }

    #[test]
    fn emit_sample() {
        insta::assert_snapshot!(emit(&sample()), @r###"
        GlobalProperty1 = GlobalValue1;
        GlobalProperty2 = GlobalValue2;

        Child1 {
            Property = Value;

            NestedChild {
                PropertyA = ValueA;
                PropertyB = [];
                PropertyC = [X, Y, Z];
            }
        }

        {
        }
        "###);
    }

    #[test]
    fn emit_compact_config() {
        let config = EmitConfig::new()
            .with_indent(2)
            .with_blank_line_between_sections(false);
        insta::assert_snapshot!(emit_with(&sample(), &config), @r###"
        GlobalProperty1 = GlobalValue1;
        GlobalProperty2 = GlobalValue2;

        Child1 {
          Property = Value;

          NestedChild {
            PropertyA = ValueA;
            PropertyB = [];
            PropertyC = [X, Y, Z];
          }
        }
        {
        }
        "###);
    }

    #[test]
    fn emit_single_node_and_body() {
        let doc = sample();
        let child1 = doc.find_child(doc.root(), "Child1").unwrap();
        insta::assert_snapshot!(emit_node(&doc, child1), @r###"
        Child1 {
            Property = Value;

            NestedChild {
                PropertyA = ValueA;
                PropertyB = [];
                PropertyC = [X, Y, Z];
            }
        }
        "###);
        insta::assert_snapshot!(emit_body(&doc, child1), @r###"
        Property = Value;

        NestedChild {
            PropertyA = ValueA;
            PropertyB = [];
            PropertyC = [X, Y, Z];
        }
        "###);
    }

    #[test]
    fn empty_document_emits_nothing() {
        assert_eq!(emit(&Document::new()), "");
    }

    #[test]
    fn emitted_text_parses_back() {
        let doc = parse(&emit(&sample())).unwrap();
        let root = doc.root();
        assert_eq!(doc.name(root), "");
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(
            doc.property(root, "GlobalProperty1").map(|v| v.value.as_str()),
            Some("GlobalValue1")
        );

        let child1 = doc.children(root)[0];
        assert_eq!(doc.name(child1), "Child1");
        assert_eq!(doc.parent(child1), Some(root));

        let nested = doc.children(child1)[0];
        assert_eq!(doc.name(nested), "NestedChild");
        let list_b = doc.property(nested, "PropertyB").unwrap();
        assert!(list_b.list_node);
        assert!(list_b.value_list.is_empty());
        let list_c = doc.property(nested, "PropertyC").unwrap();
        assert_eq!(list_c.value_list, vec!["X", "Y", "Z"]);

        let anonymous = doc.children(root)[1];
        assert_eq!(doc.name(anonymous), "");
        assert!(doc.children(anonymous).is_empty());
        assert_eq!(doc.properties(anonymous).count(), 0);
    }
}
