//! The COOL lexer.
//!
//! Transforms source text into a stream of [`Token`]s. Comments and
//! whitespace are skipped between tokens; string literals are stored in
//! escaped form with their surrounding quotes; lexical problems become
//! [`TokenKind::Error`] tokens in the stream rather than failures.

use coolc_util::{char_to_string_representation, is_cool_whitespace};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Longest processed string constant the lexer accepts, in characters
/// after escape processing.
const MAX_STR_LENGTH: usize = 1024;

/// Hand-written scanner over a single source file.
///
/// # Example
///
/// ```
/// use coolc_lex::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("class Main inherits IO");
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Class);
/// assert_eq!(lexer.next_token().unwrap().lexeme, "Main");
/// ```
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Returns the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        if let Err(token) = self.skip_whitespace_and_comments() {
            return Some(token);
        }
        if self.cursor.is_at_end() {
            return None;
        }

        let c = self.cursor.current_char();
        match c {
            '{' | '}' | '(' | ')' | ':' | ';' | '+' | '-' | '/' | '.' | ',' | '@' | '~' => {
                self.cursor.advance();
                Some(Token::atom(c, self.cursor.line()))
            }
            '=' => {
                self.cursor.advance();
                if self.cursor.match_char('>') {
                    Some(Token::new(TokenKind::Darrow, self.cursor.line()))
                } else {
                    Some(Token::atom('=', self.cursor.line()))
                }
            }
            '*' => {
                self.cursor.advance();
                if self.cursor.match_char(')') {
                    Some(Token::error("Unmatched *)", self.cursor.line()))
                } else {
                    Some(Token::atom('*', self.cursor.line()))
                }
            }
            '<' => {
                self.cursor.advance();
                if self.cursor.match_char('-') {
                    Some(Token::new(TokenKind::Assign, self.cursor.line()))
                } else if self.cursor.match_char('=') {
                    Some(Token::new(TokenKind::Le, self.cursor.line()))
                } else {
                    Some(Token::atom('<', self.cursor.line()))
                }
            }
            '"' => Some(self.string()),
            c if c.is_ascii_digit() => Some(self.number()),
            c if c.is_ascii_alphabetic() => Some(self.identifier()),
            c => {
                self.cursor.advance();
                Some(Token::error(
                    char_to_string_representation(c),
                    self.cursor.line(),
                ))
            }
        }
    }

    /// Skips whitespace, `--` comments and nested `(* *)` comments.
    ///
    /// An unterminated block comment surfaces as an `EOF in comment` error
    /// token; the cursor is then at the end, so the stream stops after it.
    fn skip_whitespace_and_comments(&mut self) -> Result<(), Token> {
        loop {
            if self.cursor.is_at_end() {
                return Ok(());
            }
            let c = self.cursor.current_char();
            if is_cool_whitespace(c) {
                self.cursor.advance();
                continue;
            }
            if c == '-' && self.cursor.peek_next() == '-' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                continue;
            }
            if c == '(' && self.cursor.peek_next() == '*' {
                self.cursor.advance();
                self.cursor.advance();
                self.skip_block_comment()?;
                continue;
            }
            return Ok(());
        }
    }

    /// Consumes a block comment body, tracking nesting depth. The opening
    /// `(*` has already been consumed.
    fn skip_block_comment(&mut self) -> Result<(), Token> {
        let mut depth = 1usize;
        while depth > 0 && !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            let next = self.cursor.peek_next();
            if c == '*' && next == ')' {
                depth -= 1;
            }
            if c == '(' && next == '*' {
                depth += 1;
            }
            self.cursor.advance();
        }
        if depth > 0 {
            return Err(Token::error("EOF in comment", self.cursor.line()));
        }
        // The loop stops having consumed the closing `*`; skip the `)`.
        self.cursor.advance();
        Ok(())
    }

    /// Scans a string literal, storing it in escaped form including the
    /// surrounding quotes.
    fn string(&mut self) -> Token {
        let mut result = String::from("\"");
        let mut size = 0usize;
        self.cursor.advance(); // opening quote

        loop {
            if self.cursor.is_at_end() {
                return Token::error("EOF in string constant", self.cursor.line());
            }
            let c = self.cursor.current_char();
            if c == '"' {
                break;
            }
            if c == '\\' {
                let next = self.cursor.peek_next();
                match next {
                    'b' | 't' | 'n' | 'f' | '\\' | '"' => {
                        result.push('\\');
                        result.push(next);
                        size += 1;
                        self.cursor.advance(); // the backslash
                    }
                    '\n' => {
                        // An escaped line break is stored as `\n`.
                        result.push_str("\\n");
                        size += 1;
                        self.cursor.advance(); // the backslash
                    }
                    '\0' => {
                        self.cursor.advance(); // the backslash
                        return Token::error(
                            "String contains escaped null character.",
                            self.cursor.line(),
                        );
                    }
                    // Any other escaped character stands for itself; drop
                    // the backslash and let the next round store the char.
                    _ => {}
                }
            } else if c == '\n' {
                self.cursor.advance();
                return Token::error("Unterminated string constant", self.cursor.line());
            } else if c == '\0' {
                while !self.cursor.is_at_end()
                    && self.cursor.current_char() != '"'
                    && self.cursor.current_char() != '\n'
                {
                    self.cursor.advance();
                }
                self.cursor.match_char('"');
                return Token::error("String contains null character.", self.cursor.line());
            } else {
                result.push_str(&char_to_string_representation(c));
                size += 1;
            }
            self.cursor.advance();
        }

        self.cursor.advance(); // closing quote
        result.push('"');
        if size > MAX_STR_LENGTH {
            return Token::error("String constant too long", self.cursor.line());
        }
        Token::with_lexeme(TokenKind::StrConst, result, self.cursor.line())
    }

    /// Scans a run of decimal digits.
    fn number(&mut self) -> Token {
        let start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        Token::with_lexeme(
            TokenKind::IntConst,
            self.cursor.slice_from(start),
            self.cursor.line(),
        )
    }

    /// Scans an identifier or keyword.
    ///
    /// Keywords are recognized case-insensitively; `true`/`false` are
    /// boolean constants only when spelled with a lowercase first letter,
    /// and are stored fully lowercased. Other words become `OBJECTID` or
    /// `TYPEID` depending on the case of the first letter.
    fn identifier(&mut self) -> Token {
        let start = self.cursor.position();
        loop {
            let c = self.cursor.current_char();
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let line = self.cursor.line();
        let first_lower = text.chars().next().is_some_and(|c| c.is_ascii_lowercase());

        match keyword_kind(&text.to_ascii_lowercase()) {
            Some(TokenKind::BoolConst) => {
                if first_lower {
                    Token::with_lexeme(TokenKind::BoolConst, text.to_ascii_lowercase(), line)
                } else {
                    Token::with_lexeme(TokenKind::TypeId, text, line)
                }
            }
            Some(kind) => Token::new(kind, line),
            None if first_lower => Token::with_lexeme(TokenKind::ObjectId, text, line),
            None => Token::with_lexeme(TokenKind::TypeId, text, line),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Maps a lowercased word to its keyword kind, if it is one.
fn keyword_kind(lower: &str) -> Option<TokenKind> {
    Some(match lower {
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "fi" => TokenKind::Fi,
        "if" => TokenKind::If,
        "in" => TokenKind::In,
        "inherits" => TokenKind::Inherits,
        "let" => TokenKind::Let,
        "loop" => TokenKind::Loop,
        "pool" => TokenKind::Pool,
        "then" => TokenKind::Then,
        "while" => TokenKind::While,
        "case" => TokenKind::Case,
        "esac" => TokenKind::Esac,
        "of" => TokenKind::Of,
        "new" => TokenKind::New,
        "isvoid" => TokenKind::Isvoid,
        "not" => TokenKind::Not,
        "true" | "false" => TokenKind::BoolConst,
        _ => return None,
    })
}

/// Lexes a whole source into a vector of tokens.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}
