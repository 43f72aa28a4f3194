//! # themekit
//!
//! The styling core of a retained-mode widget toolkit: per-state style
//! properties with change notification, and the brace-delimited data format
//! that themes and saved layouts are written in.
//!
//! ## Core Systems
//!
//! - **[`message`]**: Topic/subscriber registry used for change notification
//! - **[`style`]**: Visual states, `StyleProperty<T>` resolution, style aggregates,
//!   value types and cached component state
//! - **[`dataio`]**: Tokenizer, recursive descent parser, section tree and serializer
//! - **[`theme`]**: Theme loading on top of [`dataio`], feeding style aggregates

// Foundation
pub mod message;

// Styling
pub mod style;

// Data format
pub mod dataio;
pub mod theme;
