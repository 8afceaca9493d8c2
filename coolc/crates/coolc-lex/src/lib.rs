//! coolc-lex - Lexical analysis for COOL.
//!
//! The first phase of the pipeline: bytes in, a finite stream of tokens
//! out. The scanner is direct-coded over a one-character-lookahead
//! [`Cursor`](cursor::Cursor) (two characters only to spot `--`, `(*` and
//! `*)`), with these COOL-specific rules:
//!
//! - keywords are case-insensitive, but `true`/`false` count as booleans
//!   only when they start lowercase;
//! - block comments nest, and a comment left open at end of file turns
//!   into an `EOF in comment` error token;
//! - string literals are stored *escaped*, quotes included, and every
//!   lexical problem inside one has its own diagnostic;
//! - anything the scanner cannot place becomes an `ERROR` token in the
//!   stream; lexing itself never fails, the parser deals with the rest.
//!
//! ```
//! use coolc_lex::{tokenize, TokenKind};
//!
//! let tokens = tokenize("class Main { main(): Int { 0 }; };");
//! assert_eq!(tokens[0].kind, TokenKind::Class);
//! assert_eq!(tokens[1].lexeme, "Main");
//! ```

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{dump_tokens, Token, TokenKind};
