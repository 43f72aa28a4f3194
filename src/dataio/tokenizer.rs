//! logos-based tokenizer for the DataIO format.
//!
//! Whitespace and comments are kept as tokens because the grammar gives them
//! meaning: whitespace ends a name and collapses to one space inside a value,
//! a line comment ends a name, and a block comment inside a name joins its halves.
//!
//! Token priority:
//! - `//…` and `/*…` beat a lone [`Token::Slash`] by length
//! - [`Token::Str`] and [`Token::BlockComment`] run to their terminator or EOF

use logos::{Lexer, Logos};

/// DataIO token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Run of whitespace.
    #[regex(r"[ \t\r\n\x0B\x0C]+")]
    Whitespace,

    /// `// …` up to and including the newline (or EOF).
    #[regex(r"//[^\n]*\n?")]
    LineComment,

    /// `/* … */`; unterminated comments run to EOF.
    #[token("/*", block_comment)]
    BlockComment,

    /// Double-quoted string with backslash escapes, quotes included.
    #[token("\"", string_literal)]
    Str,

    /// A `/` that does not start a comment.
    #[token("/")]
    Slash,

    /// `=`
    #[token("=")]
    Equals,

    /// `;`
    #[token(";")]
    Semicolon,

    /// `:`
    #[token(":")]
    Colon,

    /// `{`
    #[token("{")]
    BraceOpen,

    /// `}`
    #[token("}")]
    BraceClose,

    /// Any other run of characters.
    #[regex(r#"[^ \t\r\n\x0B\x0C=;:{}"/]+"#)]
    Text,
}

fn block_comment(lex: &mut Lexer<Token>) {
    let rest = lex.remainder();
    let len = rest.find("*/").map_or(rest.len(), |end| end + 2);
    lex.bump(len);
}

fn string_literal(lex: &mut Lexer<Token>) {
    let rest = lex.remainder();
    let mut len = rest.len();
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                len = i + 1;
                break;
            }
            _ => {}
        }
    }
    lex.bump(len);
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Tokenize `input` into spanned tokens.
///
/// On failure returns the byte offset of the first input that could not be lexed.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, usize> {
    Token::lexer(input)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok(Spanned {
                token,
                start: span.start,
                end: span.end,
            }),
            Err(()) => Err(span.start),
        })
        .collect()
}
