//! Lexer for script source code
//!
//! Converts source text into a stream of tokens.

use std::iter::Peekable;
use std::rc::Rc;
use std::str::CharIndices;

/// Source span information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// Template literal contents: cooked quasi strings plus the raw source of
/// each interpolated expression (re-parsed by the parser).
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateToken {
    /// Cooked string chunks; always one more than `exprs`
    pub quasis: Vec<String>,
    /// Raw source text of each `${...}` expression
    pub exprs: Vec<String>,
}

/// Token types for the supported JavaScript subset
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(Rc<str>),
    Template(TemplateToken),
    RegExp(String, String), // (pattern, flags)
    True,
    False,
    Null,

    // Identifiers & keywords
    Identifier(Rc<str>),
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,
    New,
    This,
    Typeof,
    In,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Question,
    Colon,

    // Operators
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    Shr,
    UShr,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    AmpAmp,
    PipePipe,

    /// A character outside the language; surfaced by the parser
    Unknown(char),

    Eof,
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn eof(offset: usize, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(offset, offset, line, column),
        }
    }
}

/// Lexer over source text.
///
/// Cloning is cheap (the char cursor is an index pair), which the parser
/// uses for bounded lookahead.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: u32,
    column: u32,
    /// Whether a `/` at the current position starts a regex literal.
    /// False right after a token that can end an expression.
    regex_allowed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            regex_allowed: true,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.source.len())
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume the next char if it matches
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    // Look ahead without consuming the slash
                    let rest = &self.source[self.peek_offset()..];
                    if rest.starts_with("//") {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else if rest.starts_with("/*") {
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                Some('*') if self.peek() == Some('/') => {
                                    self.advance();
                                    break;
                                }
                                Some(_) => {}
                                None => break,
                            }
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Produce the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.peek_offset();
        let line = self.line;
        let column = self.column;

        let Some(c) = self.peek() else {
            return Token::eof(start, line, column);
        };

        let kind = if c.is_ascii_digit() || (c == '.' && self.second_is_digit()) {
            self.lex_number()
        } else if c == '"' || c == '\'' {
            self.lex_string(c)
        } else if c == '`' {
            self.lex_template()
        } else if c == '_' || c == '$' || c.is_alphabetic() {
            self.lex_identifier()
        } else if c == '/' && self.regex_allowed {
            self.lex_regex()
        } else {
            self.lex_operator()
        };

        self.regex_allowed = !matches!(
            kind,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Template(_)
                | TokenKind::RegExp(..)
                | TokenKind::Identifier(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        );

        let end = self.peek_offset();
        Token {
            kind,
            span: Span::new(start, end, line, column),
        }
    }

    fn second_is_digit(&mut self) -> bool {
        let rest = &self.source[self.peek_offset()..];
        let mut it = rest.chars();
        it.next();
        matches!(it.next(), Some(c) if c.is_ascii_digit())
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.peek_offset();

        if self.peek() == Some('0') {
            let rest = &self.source[start..];
            if rest.len() > 1 {
                let prefix = rest.as_bytes()[1].to_ascii_lowercase();
                if prefix == b'x' || prefix == b'b' || prefix == b'o' {
                    self.advance();
                    self.advance();
                    let digits_start = self.peek_offset();
                    while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
                        self.advance();
                    }
                    let digits = &self.source[digits_start..self.peek_offset()];
                    let radix = match prefix {
                        b'x' => 16,
                        b'b' => 2,
                        _ => 8,
                    };
                    let value = u64::from_str_radix(digits, radix).unwrap_or(0);
                    return TokenKind::Number(value as f64);
                }
            }
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.second_is_digit() {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let rest = &self.source[self.peek_offset()..];
            let mut it = rest.chars();
            it.next();
            let next = it.next();
            if matches!(next, Some(c) if c.is_ascii_digit() || c == '+' || c == '-') {
                self.advance();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.source[start..self.peek_offset()];
        TokenKind::Number(text.parse::<f64>().unwrap_or(f64::NAN))
    }

    fn lex_string(&mut self, quote: char) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some(escaped) => value.push(unescape(escaped)),
                    None => break,
                },
                Some(c) => value.push(c),
                None => break, // unterminated; parser surfaces a clean error on Eof
            }
        }
        TokenKind::String(Rc::from(value.as_str()))
    }

    fn lex_template(&mut self) -> TokenKind {
        self.advance(); // opening backtick
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        let mut current = String::new();

        loop {
            match self.advance() {
                Some('`') | None => break,
                Some('\\') => match self.advance() {
                    Some(escaped) => current.push(unescape(escaped)),
                    None => break,
                },
                Some('$') if self.peek() == Some('{') => {
                    self.advance(); // '{'
                    quasis.push(std::mem::take(&mut current));
                    exprs.push(self.scan_template_expr());
                }
                Some(c) => current.push(c),
            }
        }
        quasis.push(current);

        TokenKind::Template(TemplateToken { quasis, exprs })
    }

    /// Scan the raw source of a `${...}` expression up to the matching brace.
    /// Braces inside nested string literals are skipped.
    fn scan_template_expr(&mut self) -> String {
        let mut depth = 1usize;
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('{') => {
                    depth += 1;
                    text.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    text.push('}');
                }
                Some(q @ ('"' | '\'')) => {
                    text.push(q);
                    loop {
                        match self.advance() {
                            Some('\\') => {
                                text.push('\\');
                                if let Some(c) = self.advance() {
                                    text.push(c);
                                }
                            }
                            Some(c) => {
                                text.push(c);
                                if c == q {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                }
                Some(c) => text.push(c),
                None => break,
            }
        }
        text
    }

    fn lex_regex(&mut self) -> TokenKind {
        self.advance(); // opening slash
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.advance() {
                Some('\\') => {
                    pattern.push('\\');
                    if let Some(c) = self.advance() {
                        pattern.push(c);
                    }
                }
                Some('[') => {
                    in_class = true;
                    pattern.push('[');
                }
                Some(']') => {
                    in_class = false;
                    pattern.push(']');
                }
                Some('/') if !in_class => break,
                Some(c) => pattern.push(c),
                None => break,
            }
        }
        let mut flags = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            flags.push(self.advance().unwrap_or_default());
        }
        TokenKind::RegExp(pattern, flags)
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.peek_offset();
        while matches!(self.peek(), Some(c) if c == '_' || c == '$' || c.is_alphanumeric()) {
            self.advance();
        }
        let text = &self.source[start..self.peek_offset()];

        match text {
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "throw" => TokenKind::Throw,
            "new" => TokenKind::New,
            "this" => TokenKind::This,
            "typeof" => TokenKind::Typeof,
            "in" => TokenKind::In,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier(Rc::from(text)),
        }
    }

    fn lex_operator(&mut self) -> TokenKind {
        let c = self.advance().unwrap_or_default();
        match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,

            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('=') {
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentAssign
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::NotEqEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.eat('<') {
                    if self.eat('=') {
                        TokenKind::ShlAssign
                    } else {
                        TokenKind::Shl
                    }
                } else if self.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') {
                            TokenKind::UShrAssign
                        } else {
                            TokenKind::UShr
                        }
                    } else if self.eat('=') {
                        TokenKind::ShrAssign
                    } else {
                        TokenKind::Shr
                    }
                } else if self.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AmpAmp
                } else if self.eat('=') {
                    TokenKind::AmpAssign
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::PipePipe
                } else if self.eat('=') {
                    TokenKind::PipeAssign
                } else {
                    TokenKind::Pipe
                }
            }
            '^' => {
                if self.eat('=') {
                    TokenKind::CaretAssign
                } else {
                    TokenKind::Caret
                }
            }
            other => TokenKind::Unknown(other),
        }
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        'f' => '\u{c}',
        'v' => '\u{b}',
        '0' => '\0',
        other => other,
    }
}
