//! Condition expression lexer.
//!
//! Tokenizes expressions like `$header.x == '1' && $body.items.contains(3)`.

use super::ConditionError;

/// Scope root named by a `$` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    Header,
    Query,
    Path,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Root(Root),      // $header, $query, $path, $body
    Ident(String),   // property or helper name
    Number(String),  // unsigned literal text, sign handled by the parser
    Str(String),     // 'quoted' or "quoted"
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Not,             // !
    Minus,           // -
    Eq,              // ==
    NotEq,           // !=
    StrictEq,        // ===
    StrictNotEq,     // !==
    Lt,
    Le,
    Gt,
    Ge,
    And,             // &&
    Or,              // ||
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn is_ident_start(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn is_ident_char(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ConditionError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else { break };

            let token = match ch {
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '[' => self.single(Token::LBracket),
                ']' => self.single(Token::RBracket),
                '.' => self.single(Token::Dot),
                ',' => self.single(Token::Comma),
                '-' => self.single(Token::Minus),
                '=' => match (self.peek_at(1), self.peek_at(2)) {
                    (Some('='), Some('=')) => self.multi(3, Token::StrictEq),
                    (Some('='), _) => self.multi(2, Token::Eq),
                    _ => return Err(self.unexpected(ch)),
                },
                '!' => match (self.peek_at(1), self.peek_at(2)) {
                    (Some('='), Some('=')) => self.multi(3, Token::StrictNotEq),
                    (Some('='), _) => self.multi(2, Token::NotEq),
                    _ => self.single(Token::Not),
                },
                '<' => match self.peek_at(1) {
                    Some('=') => self.multi(2, Token::Le),
                    _ => self.single(Token::Lt),
                },
                '>' => match self.peek_at(1) {
                    Some('=') => self.multi(2, Token::Ge),
                    _ => self.single(Token::Gt),
                },
                '&' => match self.peek_at(1) {
                    Some('&') => self.multi(2, Token::And),
                    _ => return Err(self.unexpected(ch)),
                },
                '|' => match self.peek_at(1) {
                    Some('|') => self.multi(2, Token::Or),
                    _ => return Err(self.unexpected(ch)),
                },
                '\'' | '"' => self.string(ch)?,
                '$' => self.root()?,
                c if c.is_ascii_digit() => self.number(),
                c if Self::is_ident_start(c) => {
                    match self.read_while(Self::is_ident_char) {
                        "true" => Token::True,
                        "false" => Token::False,
                        "null" => Token::Null,
                        ident => Token::Ident(ident.to_string()),
                    }
                }
                other => return Err(self.unexpected(other)),
            };
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn multi(&mut self, len: usize, token: Token) -> Token {
        for _ in 0..len {
            self.advance();
        }
        token
    }

    fn unexpected(&self, ch: char) -> ConditionError {
        ConditionError::Syntax(format!("unexpected character '{ch}' at offset {}", self.pos))
    }

    fn root(&mut self) -> Result<Token, ConditionError> {
        self.advance(); // $
        let name = self.read_while(Self::is_ident_char);
        let root = match name {
            "header" => Root::Header,
            "query" => Root::Query,
            "path" => Root::Path,
            "body" => Root::Body,
            other => {
                return Err(ConditionError::Syntax(format!("unknown scope '${other}'")));
            }
        };
        Ok(Token::Root(root))
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        self.read_while(|c| c.is_ascii_digit());
        // Only consume the dot when a digit follows, so `1.length` still lexes.
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.read_while(|c| c.is_ascii_digit());
        }
        Token::Number(self.input[start..self.pos].to_string())
    }

    fn string(&mut self, quote: char) -> Result<Token, ConditionError> {
        let start = self.pos;
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(ConditionError::Syntax(format!(
                        "unterminated string starting at offset {start}"
                    )));
                }
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                    None => {
                        return Err(ConditionError::Syntax("dangling escape".to_string()));
                    }
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }
        Ok(Token::Str(value))
    }
}
