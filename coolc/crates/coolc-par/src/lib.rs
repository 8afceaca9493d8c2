//! coolc-par - Recursive-descent parser for COOL.
//!
//! The parser consumes the token stream produced by `coolc-lex` and builds
//! the [`ast`] tree. The grammar is LL(2): one extra token of lookahead
//! distinguishes attributes from methods (`x :` vs `x (`) and assignments
//! from bare identifiers (`x <-`).
//!
//! The first syntax error aborts parsing with a [`SyntaxError`] naming the
//! offending token:
//!
//! ```text
//! "bad.cl", line 3: syntax error at or near OBJECTID = foo
//! ```
//!
//! Lexical `ERROR` tokens travel through the stream untouched and surface
//! here, in the same format, when the parser runs into one.

pub mod ast;
pub mod expr;
pub mod printer;

use coolc_lex::{Token, TokenKind};
use coolc_util::Names;
use thiserror::Error;

pub use ast::{Attr, CaseBranch, Class, Expr, ExprKind, Feature, Formal, Method, Program};
pub use printer::dump_program;

/// Fatal parse failure; carries the exact diagnostic line.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("\"{filename}\", line {line}: syntax error at or near {token}")]
pub struct SyntaxError {
    pub filename: String,
    pub line: u32,
    /// Description of the offending token, or `EOF`.
    pub token: String,
}

/// Parses a token stream into a [`Program`].
///
/// # Example
///
/// ```
/// use coolc_lex::tokenize;
/// use coolc_par::parse;
///
/// let tokens = tokenize("class Main { main(): Int { 0 }; };");
/// let program = parse(&tokens, "main.cl").unwrap();
/// assert_eq!(program.classes[0].name, "Main");
/// ```
pub fn parse(tokens: &[Token], filename: &str) -> Result<Program, SyntaxError> {
    Parser::new(tokens, filename).parse_program()
}

/// Recursive-descent parser over a borrowed token slice.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    filename: String,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], filename: &str) -> Self {
        Self {
            tokens,
            pos: 0,
            filename: filename.to_string(),
        }
    }

    /// `program := (class ";")+`
    pub fn parse_program(&mut self) -> Result<Program, SyntaxError> {
        let line = self.line();
        let mut classes = vec![self.parse_class()?];
        self.expect_atom(';')?;
        while !self.is_at_end() {
            classes.push(self.parse_class()?);
            self.expect_atom(';')?;
        }
        Ok(Program { line, classes })
    }

    /// `class := "class" TYPEID ["inherits" TYPEID] "{" (feature ";")* "}"`
    fn parse_class(&mut self) -> Result<Class, SyntaxError> {
        let line = self.line();
        self.expect_kind(TokenKind::Class)?;
        let name = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
        let parent = if self.match_kind(TokenKind::Inherits) {
            self.expect_kind(TokenKind::TypeId)?.lexeme.clone()
        } else {
            Names::OBJECT.to_string()
        };
        self.expect_atom('{')?;
        let mut features = Vec::new();
        while !self.check_atom('}') {
            features.push(self.parse_feature()?);
        }
        self.expect_atom('}')?;
        Ok(Class {
            line,
            name,
            parent,
            features,
            filename: self.filename.clone(),
        })
    }

    /// A feature is an attribute when the token after the name is `:`,
    /// a method otherwise.
    fn parse_feature(&mut self) -> Result<Feature, SyntaxError> {
        let feature = if self.peek_next_is_atom(':') {
            Feature::Attr(self.parse_attr()?)
        } else {
            Feature::Method(self.parse_method()?)
        };
        self.expect_atom(';')?;
        Ok(feature)
    }

    /// `attr := OBJECTID ":" TYPEID ["<-" expr]`
    fn parse_attr(&mut self) -> Result<Attr, SyntaxError> {
        let line = self.line();
        let name = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
        self.expect_atom(':')?;
        let ty = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
        let init = if self.match_kind(TokenKind::Assign) {
            self.parse_expr()?
        } else {
            Expr::no_expr(line)
        };
        Ok(Attr {
            line,
            name,
            ty,
            init,
        })
    }

    /// `method := OBJECTID "(" [formal ("," formal)*] ")" ":" TYPEID "{" expr "}"`
    fn parse_method(&mut self) -> Result<Method, SyntaxError> {
        let line = self.line();
        let name = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
        self.expect_atom('(')?;
        let mut formals = Vec::new();
        if !self.check_atom(')') {
            formals.push(self.parse_formal()?);
            while self.match_atom(',') {
                formals.push(self.parse_formal()?);
            }
        }
        self.expect_atom(')')?;
        self.expect_atom(':')?;
        let return_type = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
        self.expect_atom('{')?;
        let body = self.parse_expr()?;
        self.expect_atom('}')?;
        Ok(Method {
            line,
            name,
            formals,
            return_type,
            body,
        })
    }

    /// `formal := OBJECTID ":" TYPEID`
    fn parse_formal(&mut self) -> Result<Formal, SyntaxError> {
        let line = self.line();
        let name = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
        self.expect_atom(':')?;
        let ty = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
        Ok(Formal { line, name, ty })
    }

    // ---- token-stream helpers -------------------------------------------

    pub(crate) fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_next(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos + 1)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line of the current token; past the end, the line of the last one.
    pub(crate) fn line(&self) -> u32 {
        match self.peek() {
            Some(token) => token.line,
            None => self.tokens.last().map_or(1, |t| t.line),
        }
    }

    pub(crate) fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    pub(crate) fn check_atom(&self, c: char) -> bool {
        self.peek().is_some_and(|t| is_atom_token(t, c))
    }

    pub(crate) fn peek_next_is_atom(&self, c: char) -> bool {
        self.peek_next().is_some_and(|t| is_atom_token(t, c))
    }

    pub(crate) fn peek_next_is_kind(&self, kind: TokenKind) -> bool {
        self.peek_next().is_some_and(|t| t.kind == kind)
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check_kind(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it is the given punctuation atom.
    pub(crate) fn match_atom(&mut self, c: char) -> bool {
        if self.check_atom(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or fails with a syntax error.
    pub(crate) fn expect_kind(&mut self, kind: TokenKind) -> Result<&'a Token, SyntaxError> {
        if self.check_kind(kind) {
            Ok(self.advance().unwrap())
        } else {
            Err(self.syntax_error())
        }
    }

    /// Consumes the given punctuation atom or fails with a syntax error.
    pub(crate) fn expect_atom(&mut self, c: char) -> Result<(), SyntaxError> {
        if self.match_atom(c) {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    /// Builds the diagnostic for the current position.
    pub(crate) fn syntax_error(&self) -> SyntaxError {
        SyntaxError {
            filename: self.filename.clone(),
            line: self.line(),
            token: match self.peek() {
                Some(token) => token.describe(),
                None => "EOF".to_string(),
            },
        }
    }
}

fn is_atom_token(token: &Token, c: char) -> bool {
    if token.kind != TokenKind::Atom {
        return false;
    }
    let mut chars = token.lexeme.chars();
    chars.next() == Some(c) && chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolc_lex::tokenize;

    fn parse_source(source: &str) -> Result<Program, SyntaxError> {
        parse(&tokenize(source), "test.cl")
    }

    #[test]
    fn test_minimal_program() {
        let program = parse_source("class Main { main(): Int { 0 }; };").unwrap();
        assert_eq!(program.classes.len(), 1);
        let main = &program.classes[0];
        assert_eq!(main.name, "Main");
        assert_eq!(main.parent, "Object");
        assert_eq!(main.filename, "test.cl");
        assert_eq!(main.methods().count(), 1);
    }

    #[test]
    fn test_inherits_clause() {
        let program = parse_source("class A inherits IO { };").unwrap();
        assert_eq!(program.classes[0].parent, "IO");
    }

    #[test]
    fn test_attribute_with_and_without_init() {
        let program = parse_source("class A { x : Int; y : Int <- 3; };").unwrap();
        let attrs: Vec<_> = program.classes[0].attrs().collect();
        assert!(attrs[0].init.is_no_expr());
        assert!(matches!(attrs[1].init.kind, ExprKind::Int(3)));
    }

    #[test]
    fn test_method_formals() {
        let program =
            parse_source("class A { f(x : Int, y : String) : Object { x }; };").unwrap();
        let method = program.classes[0].methods().next().unwrap();
        assert_eq!(method.formals.len(), 2);
        assert_eq!(method.formals[0].name, "x");
        assert_eq!(method.formals[0].ty, "Int");
        assert_eq!(method.formals[1].name, "y");
        assert_eq!(method.formals[1].ty, "String");
        assert_eq!(method.return_type, "Object");
    }

    #[test]
    fn test_multiple_classes() {
        let program = parse_source("class A { }; class B inherits A { };").unwrap();
        assert_eq!(program.classes.len(), 2);
        assert_eq!(program.classes[1].parent, "A");
    }

    #[test]
    fn test_missing_semicolon_after_class() {
        let err = parse_source("class A { }").unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"test.cl\", line 1: syntax error at or near EOF"
        );
    }

    #[test]
    fn test_error_names_offending_token() {
        let err = parse_source("class a { };").unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"test.cl\", line 1: syntax error at or near OBJECTID = a"
        );
    }

    #[test]
    fn test_lexer_error_token_surfaces_as_syntax_error() {
        let err = parse_source("class Main { main(): Int { (* oops }; };").unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"test.cl\", line 1: syntax error at or near ERROR = EOF in comment"
        );
    }

    #[test]
    fn test_empty_input_is_syntax_error() {
        let err = parse_source("").unwrap_err();
        assert_eq!(err.token, "EOF");
    }

    #[test]
    fn test_atom_error_quotes_lexeme() {
        let err = parse_source("class Main { main(): Int { 0 }; }; ;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"test.cl\", line 1: syntax error at or near ';'"
        );
    }
}
