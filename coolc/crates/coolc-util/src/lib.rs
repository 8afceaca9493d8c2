//! coolc-util - Shared leaf utilities for the coolc workspace.
//!
//! This crate holds the pieces every compiler phase agrees on: the
//! well-known class and runtime symbol names (with the helpers that form
//! assembly labels from them) and the character classification / escape
//! rendering rules shared between the lexer and the backend.
//!
//! Nothing here depends on any other coolc crate.

pub mod chars;
pub mod names;

pub use chars::{char_to_string_representation, is_cool_whitespace, unescaped_len};
pub use names::Names;
