//! Recursive descent parser for the DataIO format.
//!
//! Parses text into a [`Document`]. Uses the logos-based tokenizer from
//! [`crate::dataio::tokenizer`]. The first grammar violation aborts the whole
//! parse; no partial document is returned.
//!
//! ```text
//! root     := (section | keyvalue | inherit)*
//! section  := NAME? '{' (section | keyvalue | inherit)* '}' ';'?
//! keyvalue := NAME '=' (section | VALUE) ';'?
//! inherit  := NAME ':' BASENAME section-body
//! ```

use tracing::{debug, warn};

use crate::dataio::document::{Document, Node, NodeId, ValueNode};
use crate::dataio::tokenizer::{tokenize, Spanned, Token};

/// A parse failure with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error while parsing input at line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// What went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected EOF while parsing")]
    UnexpectedEof,
    #[error("unexpected '/' found")]
    UnexpectedSlash,
    #[error("sections nested more than {max} levels deep", max = MAX_NESTING_DEPTH)]
    NestingTooDeep,
    #[error("expected section name, found '{found}' instead")]
    ExpectedSectionName { found: char },
    #[error("found EOF while trying to read property or nested section name")]
    EofInName,
    #[error("expected property or nested section name, found '{found}' instead")]
    ExpectedPropertyName { found: char },
    #[error("expected '{{', '=' or ':', found '{found}' instead")]
    ExpectedSeparator { found: char },
    #[error("found EOF while trying to read a value")]
    EofInValue,
    #[error("found '=' while trying to read a value")]
    AssignInValue,
    #[error("found '{{' while trying to read a value")]
    BraceInValue,
    #[error("found empty value")]
    EmptyValue,
    #[error("expected name of base section to inherit from after ':'")]
    MissingBaseName,
    #[error("failed to find base section '{0}' to inherit from")]
    UnknownBaseSection(String),
    #[error("expected '{{' after specifying base section to inherit from")]
    ExpectedBaseBrace,
    #[error("invalid input")]
    InvalidToken,
}

type Step<T> = Result<T, ParseErrorKind>;

/// Sections nested deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse DataIO text into a [`Document`].
pub fn parse(input: &str) -> Result<Document, ParseError> {
    let tokens = tokenize(input).map_err(|offset| ParseError {
        line: line_at(input, offset),
        kind: ParseErrorKind::InvalidToken,
    })?;

    let mut parser = Parser {
        input,
        tokens,
        cursor: 0,
        depth: 0,
        doc: Document::new(),
    };
    match parser.parse_root() {
        Ok(()) => {
            debug!(
                sections = parser.doc.len() - 1,
                bytes = input.len(),
                "parsed document"
            );
            Ok(parser.doc)
        }
        Err(kind) => Err(ParseError {
            line: line_at(input, parser.offset()),
            kind,
        }),
    }
}

/// 1-based line number of byte `offset`.
fn line_at(input: &str, offset: usize) -> usize {
    input[..offset].matches('\n').count() + 1
}

/// Recursive descent parser state.
struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    cursor: usize,
    /// Number of sections currently open.
    depth: usize,
    doc: Document,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).map(|t| t.token)
    }

    fn bump(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    /// Source text of the current token.
    fn text(&self) -> &'a str {
        self.tokens
            .get(self.cursor)
            .map_or("", |t| &self.input[t.start..t.end])
    }

    /// First character of the current token, for error messages.
    fn found(&self) -> char {
        self.text().chars().next().unwrap_or('\0')
    }

    /// Byte offset of the current token, or the input length at EOF.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.input.len(), |t| t.start)
    }

    /// Skip whitespace and comments. Returns whether any input remains.
    fn skip_trivia(&mut self) -> Step<bool> {
        loop {
            match self.peek() {
                Some(Token::Whitespace | Token::LineComment | Token::BlockComment) => self.bump(),
                Some(Token::Slash) => return Err(ParseErrorKind::UnexpectedSlash),
                Some(_) => return Ok(true),
                None => return Ok(false),
            }
        }
    }

    /// Skip whitespace and comments, failing at EOF.
    fn expect_more(&mut self) -> Step<()> {
        if self.skip_trivia()? {
            Ok(())
        } else {
            Err(ParseErrorKind::UnexpectedEof)
        }
    }

    /// Read a section or property name.
    ///
    /// Stops before whitespace and punctuation. A line comment ends the name,
    /// a block comment is dropped from it. Returns an empty string at EOF.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(token) = self.peek() {
            match token {
                Token::Text | Token::Slash | Token::Str => {
                    word.push_str(self.text());
                    self.bump();
                }
                Token::BlockComment => self.bump(),
                Token::LineComment => {
                    let ends_line = self.text().ends_with('\n');
                    self.bump();
                    if ends_line {
                        return word;
                    }
                }
                Token::Whitespace
                | Token::Equals
                | Token::Semicolon
                | Token::Colon
                | Token::BraceOpen
                | Token::BraceClose => return word,
            }
        }
        String::new()
    }

    /// Read a raw value up to `;` or `}` (not consumed).
    ///
    /// Whitespace runs collapse to one space and comments are dropped. Returns
    /// an empty string when the value runs into `=`, `{` or EOF.
    fn read_line(&mut self) -> String {
        let mut line = String::new();
        let mut spaced = false;
        while let Some(token) = self.peek() {
            match token {
                Token::Whitespace => {
                    if !spaced {
                        line.push(' ');
                        spaced = true;
                    }
                }
                Token::LineComment | Token::BlockComment => {}
                Token::Equals | Token::BraceOpen => return String::new(),
                Token::Semicolon | Token::BraceClose => {
                    line.truncate(line.trim_end().len());
                    return line;
                }
                Token::Text | Token::Slash | Token::Colon | Token::Str => {
                    line.push_str(self.text());
                    spaced = false;
                }
            }
            self.bump();
        }
        String::new()
    }

    fn parse_root(&mut self) -> Step<()> {
        let root = self.doc.root();
        while self.skip_trivia()? {
            let word = self.read_word();
            if word.is_empty() {
                self.expect_more()?;
                if self.peek() != Some(Token::BraceOpen) {
                    return Err(ParseErrorKind::ExpectedSectionName {
                        found: self.found(),
                    });
                }
            }
            self.expect_more()?;
            self.parse_entry(root, word)?;
        }
        Ok(())
    }

    /// Dispatch on the token following a name.
    fn parse_entry(&mut self, node: NodeId, name: String) -> Step<()> {
        match self.peek() {
            Some(Token::BraceOpen) => self.parse_section(node, name).map(|_| ()),
            Some(Token::Equals) => self.parse_key_value(node, name),
            Some(Token::Colon) => self.parse_inheritance(node, name),
            _ => Err(ParseErrorKind::ExpectedSeparator {
                found: self.found(),
            }),
        }
    }

    /// Parse `{ … }` into a new child of `parent`.
    ///
    /// The section joins its parent's children only once its closing brace is
    /// read, so it cannot find itself as an inheritance base.
    fn parse_section(&mut self, parent: NodeId, name: String) -> Step<NodeId> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseErrorKind::NestingTooDeep);
        }
        self.bump(); // '{'
        self.depth += 1;
        let section = self
            .doc
            .create_detached(parent, Node::new(name))
            .ok_or(ParseErrorKind::InvalidToken)?;

        loop {
            self.expect_more()?;
            let word = self.read_word();
            if word.is_empty() {
                match self.peek() {
                    None => return Err(ParseErrorKind::EofInName),
                    Some(Token::BraceClose) => {
                        self.doc.attach(section);
                        self.depth -= 1;
                        self.bump();
                        if self.skip_trivia()? && self.peek() == Some(Token::Semicolon) {
                            self.bump();
                        }
                        self.skip_trivia()?;
                        return Ok(section);
                    }
                    Some(Token::BraceOpen) => {}
                    Some(_) => {
                        return Err(ParseErrorKind::ExpectedPropertyName {
                            found: self.found(),
                        })
                    }
                }
            }
            self.expect_more()?;
            self.parse_entry(section, word)?;
        }
    }

    fn parse_key_value(&mut self, node: NodeId, key: String) -> Step<()> {
        self.bump(); // '='
        self.expect_more()?;

        if self.peek() == Some(Token::BraceOpen) {
            return self.parse_section(node, key).map(|_| ());
        }

        let line = self.read_line();
        let value = line.trim();
        if value.is_empty() {
            return Err(match self.peek() {
                None => ParseErrorKind::EofInValue,
                Some(Token::Equals) => ParseErrorKind::AssignInValue,
                Some(Token::BraceOpen) => ParseErrorKind::BraceInValue,
                Some(_) => ParseErrorKind::EmptyValue,
            });
        }
        if self.peek() == Some(Token::Semicolon) {
            self.bump();
        }

        if let Some(previous) = self.doc.set_property(node, key.as_str(), ValueNode::new(value)) {
            warn!(
                key = %key,
                section = %self.doc.name(node),
                previous = %previous.value,
                "duplicate key, keeping the last value"
            );
        }
        Ok(())
    }

    fn parse_inheritance(&mut self, node: NodeId, name: String) -> Step<()> {
        self.bump(); // ':'
        self.expect_more()?;

        let base_name = self.read_word();
        if base_name.is_empty() {
            return Err(ParseErrorKind::MissingBaseName);
        }
        let base = self
            .doc
            .find_in_scope(node, &base_name)
            .ok_or(ParseErrorKind::UnknownBaseSection(base_name))?;

        self.expect_more()?;
        if self.peek() != Some(Token::BraceOpen) {
            return Err(ParseErrorKind::ExpectedBaseBrace);
        }

        let section = self.parse_section(node, name)?;
        self.doc.inherit(section, base);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn value<'d>(doc: &'d Document, id: NodeId, key: &str) -> Option<&'d str> {
        doc.property(id, key).map(|v| v.value.as_str())
    }

    fn kind(input: &str) -> ParseErrorKind {
        parse(input).expect_err("input should be rejected").kind
    }

    // ── Valid input ─────────────────────────────────────────────────

    #[test]
    fn empty_input() {
        let doc = parse("").unwrap();
        assert!(doc.is_empty());
        assert!(parse("  // only a comment\n /* and another */ ").unwrap().is_empty());
    }

    #[test]
    fn global_property() {
        let doc = parse("Property = Value;").unwrap();
        assert_eq!(value(&doc, doc.root(), "Property"), Some("Value"));
    }

    #[test]
    fn section_with_quoted_and_tuple_values() {
        let doc = parse(r#"Button { Text = "OK"; Size = (80, 30); }"#).unwrap();
        let root = doc.root();
        assert_eq!(doc.children(root).len(), 1);
        let button = doc.find_child(root, "Button").unwrap();
        assert_eq!(value(&doc, button, "Text"), Some(r#""OK""#));
        assert_eq!(value(&doc, button, "Size"), Some("(80, 30)"));
    }

    #[test]
    fn value_whitespace_collapses() {
        let doc = parse("Key =   a  \t b\n  c   ;").unwrap();
        assert_eq!(value(&doc, doc.root(), "Key"), Some("a b c"));
    }

    #[test]
    fn whitespace_after_string_is_kept() {
        let doc = parse(r#"Key = a "b" c;"#).unwrap();
        assert_eq!(value(&doc, doc.root(), "Key"), Some(r#"a "b" c"#));
    }

    #[test]
    fn slash_and_colon_inside_value() {
        let doc = parse("Path = themes/Black.png; Time = 12:30;").unwrap();
        assert_eq!(value(&doc, doc.root(), "Path"), Some("themes/Black.png"));
        assert_eq!(value(&doc, doc.root(), "Time"), Some("12:30"));
    }

    #[test]
    fn nested_sections() {
        let doc = parse("Child { Child2 { Property = Value; } }").unwrap();
        let child = doc.find_child(doc.root(), "Child").unwrap();
        let child2 = doc.find_child(child, "Child2").unwrap();
        assert_eq!(doc.parent(child2), Some(child));
        assert_eq!(value(&doc, child2, "Property"), Some("Value"));
    }

    #[test]
    fn nested_section_as_value() {
        let doc = parse("Child { Child2 = { Property = Value; }; }").unwrap();
        let child = doc.find_child(doc.root(), "Child").unwrap();
        let child2 = doc.find_child(child, "Child2").unwrap();
        assert_eq!(value(&doc, child2, "Property"), Some("Value"));
    }

    #[test]
    fn extra_semicolons() {
        let doc = parse("Child { Child2 { Property = Value; }; };").unwrap();
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn list_property() {
        let doc = parse(r#"Items = [1, 2, "a,b"];"#).unwrap();
        let items = doc.property(doc.root(), "Items").unwrap();
        assert!(items.list_node);
        assert_eq!(items.value_list, vec!["1", "2", r#""a,b""#]);
    }

    #[test]
    fn unnamed_section_with_comment_in_name() {
        let doc = parse("{ Property//\n= [\"a\", \"\\\"b\\\"\", \"\\\\c\\\\\"]; }").unwrap();
        let section = doc.children(doc.root())[0];
        assert_eq!(doc.name(section), "");
        let list = doc.property(section, "Property").unwrap();
        assert_eq!(list.value_list.len(), 3);
    }

    #[test]
    fn empty_section() {
        let doc = parse("name{}").unwrap();
        assert!(doc.find_child(doc.root(), "name").is_some());
    }

    #[test]
    fn block_comment_inside_name() {
        let doc = parse("Na/* hidden */me = 1;").unwrap();
        assert_eq!(value(&doc, doc.root(), "Name"), Some("1"));
    }

    #[test]
    fn name_with_special_characters() {
        let input = "\"SpecialChars.{}=:;/*#//\\t\\\"\\\\\" { Property\r\n//txt\n = \"\\\\\\\"Value\\\"\\\\\"; }";
        let doc = parse(input).unwrap();
        let section = doc.children(doc.root())[0];
        assert_eq!(doc.name(section), "\"SpecialChars.{}=:;/*#//\\t\\\"\\\\\"");
        assert_eq!(
            value(&doc, section, "Property"),
            Some("\"\\\\\\\"Value\\\"\\\\\"")
        );
    }

    #[test]
    fn quoted_slash_name() {
        let doc = parse("\"/\" {}").unwrap();
        assert!(doc.find_child(doc.root(), "\"/\"").is_some());
    }

    #[test]
    fn comments_are_stripped() {
        let doc = parse("X = 1; // comment\nY = 2; /* multi\nline */ Z = 3;").unwrap();
        let root = doc.root();
        let keys: Vec<&str> = doc.properties(root).map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["X", "Y", "Z"]);
        assert_eq!(value(&doc, root, "X"), Some("1"));
        assert_eq!(value(&doc, root, "Y"), Some("2"));
        assert_eq!(value(&doc, root, "Z"), Some("3"));
    }

    #[test]
    fn comment_inside_value() {
        let doc = parse("X = a /* note */ b; Y = c // trailing\n;").unwrap();
        assert_eq!(value(&doc, doc.root(), "X"), Some("a b"));
        assert_eq!(value(&doc, doc.root(), "Y"), Some("c"));
    }

    #[tracing_test::traced_test]
    #[test]
    fn duplicate_key_last_write_wins() {
        let doc = parse("Key = 1; Key = 2;").unwrap();
        assert_eq!(value(&doc, doc.root(), "Key"), Some("2"));
        assert!(logs_contain("duplicate key"));
    }

    // ── Inheritance ─────────────────────────────────────────────────

    #[test]
    fn inheritance_copies_missing_properties() {
        let doc = parse("A { X = 1; Y = 2; } B : A { Y = 3; }").unwrap();
        let b = doc.find_child(doc.root(), "B").unwrap();
        assert_eq!(value(&doc, b, "X"), Some("1"));
        assert_eq!(value(&doc, b, "Y"), Some("3"));
    }

    #[test]
    fn inheritance_deep_copies_children() {
        let doc = parse("A { Inner { P = 1; } Own { Q = 1; } } B : A { Own { Q = 2; } }").unwrap();
        let a = doc.find_child(doc.root(), "A").unwrap();
        let b = doc.find_child(doc.root(), "B").unwrap();
        let inner_a = doc.find_child(a, "Inner").unwrap();
        let inner_b = doc.find_child(b, "Inner").unwrap();
        assert_ne!(inner_a, inner_b);
        assert_eq!(doc.parent(inner_b), Some(b));
        assert_eq!(value(&doc, inner_b, "P"), Some("1"));

        let own_b = doc.find_child(b, "Own").unwrap();
        assert_eq!(value(&doc, own_b, "Q"), Some("2"));
        assert_eq!(doc.children(b).len(), 2);
    }

    #[test]
    fn inheritance_searches_enclosing_scopes() {
        let doc = parse("Base { X = outer; } Group { Base { X = inner; } Local : Base {} Far { Deep : Base {} } }")
            .unwrap();
        let group = doc.find_child(doc.root(), "Group").unwrap();
        let local = doc.find_child(group, "Local").unwrap();
        assert_eq!(value(&doc, local, "X"), Some("inner"));

        let far = doc.find_child(group, "Far").unwrap();
        let deep = doc.find_child(far, "Deep").unwrap();
        assert_eq!(value(&doc, deep, "X"), Some("inner"));
    }

    #[test]
    fn inheritance_cannot_see_enclosing_open_section() {
        assert_eq!(
            kind("Outer { Inner : Outer {} }"),
            ParseErrorKind::UnknownBaseSection("Outer".to_string())
        );
    }

    #[test]
    fn inheritance_errors() {
        assert_eq!(kind("B : Missing {}"), ParseErrorKind::UnknownBaseSection("Missing".into()));
        assert_eq!(kind("A {} B : ;"), ParseErrorKind::MissingBaseName);
        assert_eq!(kind("A {} B : A = 1;"), ParseErrorKind::ExpectedBaseBrace);
    }

    // ── Errors ──────────────────────────────────────────────────────

    #[test]
    fn unexpected_slash() {
        assert_eq!(kind("/ {}"), ParseErrorKind::UnexpectedSlash);
        assert_eq!(kind("{ / }"), ParseErrorKind::UnexpectedSlash);
    }

    #[test]
    fn unexpected_eof() {
        for input in ["name", "name ", "{", "{{", "{ name{", "{ /**/ ", "{ Property "] {
            let err = parse(input).expect_err(input);
            assert!(
                matches!(err.kind, ParseErrorKind::UnexpectedEof | ParseErrorKind::EofInName),
                "{input}: {err}"
            );
        }
        assert_eq!(kind("{ Property"), ParseErrorKind::EofInName);
    }

    #[test]
    fn expected_section_name() {
        assert_eq!(kind(";"), ParseErrorKind::ExpectedSectionName { found: ';' });
        assert_eq!(kind("}"), ParseErrorKind::ExpectedSectionName { found: '}' });
    }

    #[test]
    fn expected_separator() {
        assert_eq!(kind("name;"), ParseErrorKind::ExpectedSeparator { found: ';' });
        assert_eq!(kind("{ Property;"), ParseErrorKind::ExpectedSeparator { found: ';' });
        assert_eq!(kind("{ Property }"), ParseErrorKind::ExpectedSeparator { found: '}' });
    }

    #[test]
    fn expected_property_name() {
        assert_eq!(kind("{;"), ParseErrorKind::ExpectedPropertyName { found: ';' });
    }

    #[test]
    fn value_errors() {
        assert_eq!(kind("{ Property = Value"), ParseErrorKind::EofInValue);
        assert_eq!(kind("{ { Property = Value /"), ParseErrorKind::EofInValue);
        assert_eq!(kind("{ Property= \""), ParseErrorKind::EofInValue);
        assert_eq!(kind("{ Property = ="), ParseErrorKind::AssignInValue);
        assert_eq!(kind("{ Property = ; "), ParseErrorKind::EmptyValue);
        assert_eq!(kind("{ Property = a { }"), ParseErrorKind::BraceInValue);
        assert_eq!(kind("{ Property = a = b; }"), ParseErrorKind::AssignInValue);
    }

    #[test]
    fn nesting_depth_is_limited() {
        let err = parse(&"{".repeat(10_000)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
        assert_eq!(err.line, 1);

        let err = parse(&"A {\n".repeat(MAX_NESTING_DEPTH + 50)).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingTooDeep);
        assert_eq!(err.line, MAX_NESTING_DEPTH + 1);

        let deepest = "A {".repeat(MAX_NESTING_DEPTH) + &"}".repeat(MAX_NESTING_DEPTH);
        let doc = parse(&deepest).unwrap();
        assert_eq!(doc.len(), MAX_NESTING_DEPTH + 1);
    }

    #[test]
    fn error_reports_line_number() {
        let err = parse("A {\n  X = 1;\n  B {\n    Y = 2;\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.line, 5);

        let err = parse("A = 1;\nB = 2;\nC ;\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(
            err.to_string(),
            "error while parsing input at line 3: expected '{', '=' or ':', found ';' instead"
        );
    }
}
