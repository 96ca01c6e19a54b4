//! Cutting tool geometry.
//!
//! A [`Bit`] is a union of [`BitPart`] primitives sharing one pose. Tool
//! shapes come from comment directives ([`ToolShape`]) or a CSV tool table
//! ([`ToolLibrary`]).

pub mod bit;
pub mod library;
pub mod part;
pub mod shape;

pub use bit::Bit;
pub use library::{ToolKind, ToolLibrary, ToolSpec};
pub use part::BitPart;
pub use shape::{directive_tokens, ToolShape};
