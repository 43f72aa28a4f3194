//! The brace-delimited data format used by themes and saved layouts.
//!
//! ```text
//! // comment
//! Button {
//!     Text = "OK";
//!     Size = (80, 30);
//!     Items = [1, 2, "a,b"];
//! }
//! Primary : Button { Text = "Go"; }
//! ```
//!
//! - [`parse`]: text to [`Document`], all-or-nothing, errors carry a line number
//! - [`emit`] / [`emit_with`]: [`Document`] back to text
//! - [`deserialize_string`] / [`serialize_string`]: quoting of names and values

pub mod document;
pub mod emit;
pub mod escape;
pub mod parser;
pub mod tokenizer;

pub use document::{Document, Node, NodeId, ValueNode};
pub use emit::{emit, emit_body, emit_node, emit_with, EmitConfig};
pub use escape::{deserialize_string, serialize_string};
pub use parser::{parse, ParseError, ParseErrorKind, MAX_NESTING_DEPTH};
