//! Token model for the COOL lexer.
//!
//! Tokens are produced by the [`Lexer`](crate::Lexer), consumed by the
//! parser and never mutated. Lexical errors are ordinary tokens of kind
//! [`TokenKind::Error`] carrying a human-readable message, so the lexer
//! itself never fails; the parser reports them when it runs into one.

use std::fmt;

/// Discriminant of a [`Token`].
///
/// Single-character punctuation is folded into [`TokenKind::Atom`] with the
/// character as the lexeme, the way the reference toolchain prints it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Class,
    Else,
    Fi,
    If,
    In,
    Inherits,
    Let,
    Loop,
    Pool,
    Then,
    While,
    Case,
    Esac,
    Of,
    /// The `=>` arrow of case branches.
    Darrow,
    New,
    Isvoid,
    StrConst,
    IntConst,
    BoolConst,
    TypeId,
    ObjectId,
    /// The `<-` assignment operator.
    Assign,
    Not,
    /// The `<=` comparison operator.
    Le,
    /// A lexical error; the lexeme holds the message.
    Error,
    /// Single-character punctuation; the lexeme holds the character.
    Atom,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Class => "CLASS",
            TokenKind::Else => "ELSE",
            TokenKind::Fi => "FI",
            TokenKind::If => "IF",
            TokenKind::In => "IN",
            TokenKind::Inherits => "INHERITS",
            TokenKind::Let => "LET",
            TokenKind::Loop => "LOOP",
            TokenKind::Pool => "POOL",
            TokenKind::Then => "THEN",
            TokenKind::While => "WHILE",
            TokenKind::Case => "CASE",
            TokenKind::Esac => "ESAC",
            TokenKind::Of => "OF",
            TokenKind::Darrow => "DARROW",
            TokenKind::New => "NEW",
            TokenKind::Isvoid => "ISVOID",
            TokenKind::StrConst => "STR_CONST",
            TokenKind::IntConst => "INT_CONST",
            TokenKind::BoolConst => "BOOL_CONST",
            TokenKind::TypeId => "TYPEID",
            TokenKind::ObjectId => "OBJECTID",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Not => "NOT",
            TokenKind::Le => "LE",
            TokenKind::Error => "ERROR",
            TokenKind::Atom => "ATOM",
        };
        f.write_str(name)
    }
}

/// One lexical token with its 1-based source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Lexeme text; empty for keywords and multi-character operators.
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    /// A token with no lexeme (keywords, `=>`, `<-`, `<=`).
    pub fn new(kind: TokenKind, line: u32) -> Self {
        Self {
            kind,
            lexeme: String::new(),
            line,
        }
    }

    /// A single-character punctuation token.
    pub fn atom(c: char, line: u32) -> Self {
        Self {
            kind: TokenKind::Atom,
            lexeme: c.to_string(),
            line,
        }
    }

    /// A token carrying a lexeme (identifiers, literals).
    pub fn with_lexeme(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// A lexical error token.
    pub fn error(message: impl Into<String>, line: u32) -> Self {
        Self::with_lexeme(TokenKind::Error, message, line)
    }

    /// How the parser names this token in a syntax error message:
    /// `'{'` for punctuation, the bare kind for lexeme-less tokens,
    /// `KIND = lexeme` otherwise.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Atom => format!("'{}'", self.lexeme),
            _ if self.lexeme.is_empty() => self.kind.to_string(),
            _ => format!("{} = {}", self.kind, self.lexeme),
        }
    }
}

impl fmt::Display for Token {
    /// The line format of the token dump used for differential testing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Atom => write!(f, "#{} '{}'", self.line, self.lexeme),
            TokenKind::Error => write!(f, "#{} ERROR \"{}\"", self.line, self.lexeme),
            _ if self.lexeme.is_empty() => write!(f, "#{} {}", self.line, self.kind),
            _ => write!(f, "#{} {} {}", self.line, self.kind, self.lexeme),
        }
    }
}

/// Renders the full token dump for one source file: a `#name` header line
/// followed by one line per token.
pub fn dump_tokens(filename: &str, tokens: &[Token]) -> String {
    let mut out = format!("#name \"{filename}\"\n");
    for token in tokens {
        out.push_str(&token.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keyword() {
        let t = Token::new(TokenKind::Class, 3);
        assert_eq!(t.to_string(), "#3 CLASS");
    }

    #[test]
    fn test_display_atom() {
        let t = Token::atom('{', 7);
        assert_eq!(t.to_string(), "#7 '{'");
    }

    #[test]
    fn test_display_error() {
        let t = Token::error("EOF in comment", 1);
        assert_eq!(t.to_string(), "#1 ERROR \"EOF in comment\"");
    }

    #[test]
    fn test_display_with_lexeme() {
        let t = Token::with_lexeme(TokenKind::ObjectId, "foo", 2);
        assert_eq!(t.to_string(), "#2 OBJECTID foo");
        let t = Token::with_lexeme(TokenKind::StrConst, "\"hi\"", 4);
        assert_eq!(t.to_string(), "#4 STR_CONST \"hi\"");
    }

    #[test]
    fn test_describe() {
        assert_eq!(Token::atom(';', 1).describe(), "';'");
        assert_eq!(Token::new(TokenKind::Fi, 1).describe(), "FI");
        assert_eq!(
            Token::with_lexeme(TokenKind::ObjectId, "foo", 1).describe(),
            "OBJECTID = foo"
        );
        assert_eq!(
            Token::error("Unmatched *)", 1).describe(),
            "ERROR = Unmatched *)"
        );
    }

    #[test]
    fn test_dump_header() {
        let tokens = vec![Token::new(TokenKind::Class, 1), Token::atom(';', 1)];
        let dump = dump_tokens("hello.cl", &tokens);
        assert_eq!(dump, "#name \"hello.cl\"\n#1 CLASS\n#1 ';'\n");
    }
}
