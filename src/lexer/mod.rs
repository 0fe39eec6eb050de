mod token;

pub use token::*;

use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    error::Error,
    fmt::Display,
    iter::Peekable,
    str::Chars,
};

#[macro_export]
macro_rules! terminal {
    ($map:ident, $name:ident, $value:expr) => {
        $map.insert($value, Terminal::$name);
    };
}

/// Match table for the fixed terminal symbols. Keys are the surface lexemes;
/// lookups support the longest-match scan in [`Lexer`].
#[derive(Debug, Clone, Default)]
pub struct LexMap {
    map: HashMap<&'static str, Terminal>,
}

impl LexMap {
    pub fn insert(&mut self, key: &'static str, value: Terminal) {
        self.map.insert(key, value);
    }

    /// Whether `key` is a prefix of at least one known lexeme.
    pub fn can_match(&self, key: &str) -> bool {
        self.map.keys().any(|map_key| map_key.starts_with(key))
    }

    pub fn get(&self, key: &str) -> Option<Terminal> {
        self.map.get(key).copied()
    }
}

static LEX_MAP: Lazy<LexMap> = Lazy::new(|| {
    let mut m = LexMap::default();

    terminal!(m, Assign, ":=");
    terminal!(m, Equal, "==");
    terminal!(m, NotEqual, "!=");
    terminal!(m, LessOrEqual, "<=");
    terminal!(m, GreaterOrEqual, ">=");
    terminal!(m, LessThan, "<");
    terminal!(m, GreaterThan, ">");
    terminal!(m, Plus, "+");
    terminal!(m, Minus, "-");
    terminal!(m, Times, "*");
    terminal!(m, Divide, "/");
    terminal!(m, Caret, "^");
    terminal!(m, LParen, "(");
    terminal!(m, RParen, ")");
    terminal!(m, IfKeyword, "IF");
    terminal!(m, ThenKeyword, "THEN");
    terminal!(m, ElseKeyword, "ELSE");
    terminal!(m, EndIfKeyword, "ENDIF");
    terminal!(m, WhileKeyword, "WHILE");
    terminal!(m, DoKeyword, "DO");
    terminal!(m, LoopKeyword, "LOOP");
    terminal!(m, EndLoopKeyword, "ENDLOOP");
    terminal!(m, BreakKeyword, "BREAK");
    terminal!(m, InputKeyword, "INPUT");
    terminal!(m, OutputKeyword, "OUTPUT");
    terminal!(m, TrueKeyword, "TRUE");
    terminal!(m, FalseKeyword, "FALSE");
    terminal!(m, NotKeyword, "NOT");
    terminal!(m, AndKeyword, "AND");
    terminal!(m, OrKeyword, "OR");
    terminal!(m, ModKeyword, "MOD");

    m
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError(String);

pub type LexResult<T> = Result<T, LexError>;

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Error for LexError {}

/// Tokenizer for FlowLang source text.
///
/// Whitespace is discarded except for newlines, which turn into explicit
/// [`Token::Newline`] markers; the statement parser depends on them to find
/// the end of an expression. `--` comments are dropped without consuming the
/// newline that terminates them.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    tokens: Vec<Token>,
    iterator: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: vec![],
            iterator: input.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        while let Some(next) = self.peek().copied() {
            match next {
                c if c.is_whitespace() => self.eat_whitespace(),
                'a'..='z' | 'A'..='Z' | '_' => self.lex_alphanumeric(),
                '0'..='9' => self.lex_numeric()?,
                '"' => self.lex_string()?,
                '-' => self.lex_minus_or_comment(),
                _ => self.lex_special()?,
            }
        }

        Ok(self.tokens)
    }

    fn peek(&mut self) -> Option<&char> {
        self.iterator.peek()
    }

    fn next(&mut self) -> Option<char> {
        self.iterator.next()
    }

    fn next_if(&mut self, func: impl FnOnce(&char) -> bool) -> Option<char> {
        self.iterator.next_if(func)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn eat_whitespace(&mut self) {
        while let Some(next) = self.next_if(|item| item.is_whitespace()) {
            if next == '\n' {
                let position = self.position();
                self.tokens.push(Token::Newline { position });
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn lex_minus_or_comment(&mut self) {
        let position = self.position();
        self.next();
        self.col += 1;

        if self.peek() == Some(&'-') {
            // comment runs to end of line; the newline itself is left for
            // eat_whitespace so the marker is still emitted
            while self.next_if(|item| *item != '\n').is_some() {
                self.col += 1;
            }
        } else {
            self.tokens.push(Token::Minus { position });
        }
    }

    fn lex_alphanumeric(&mut self) {
        let mut stack = vec![];
        let position = self.position();

        while let Some(next) = self.next_if(|item| item.is_alphanumeric() || *item == '_') {
            self.col += 1;
            stack.push(next);
        }

        let read = stack.iter().collect::<String>();

        if let Some(terminal) = LEX_MAP.get(read.as_str()) {
            self.tokens.push(terminal.to_token(position));
        } else {
            self.tokens.push(Token::Id {
                value: read,
                position,
            })
        }
    }

    fn lex_numeric(&mut self) -> LexResult<()> {
        let mut stack = vec![];
        let position = self.position();

        while let Some(next) = self.next_if(|item| item.is_ascii_digit()) {
            self.col += 1;
            stack.push(next);
        }

        let mut is_float = false;
        if let Some(dot) = self.next_if(|item| *item == '.') {
            self.col += 1;
            stack.push(dot);
            is_float = true;

            while let Some(next) = self.next_if(|item| item.is_ascii_digit()) {
                self.col += 1;
                stack.push(next);
            }
        }

        let read = stack.iter().collect::<String>();

        let token = if is_float {
            read.parse::<f64>()
                .map(|value| Token::FloatingPoint { value, position })
                .map_err(|e| e.to_string())
        } else {
            read.parse::<i64>()
                .map(|value| Token::Integer { value, position })
                .map_err(|e| e.to_string())
        }
        .map_err(|_| LexError(format!("failed to parse numeric '{read}'")))?;

        self.tokens.push(token);

        Ok(())
    }

    fn lex_string(&mut self) -> LexResult<()> {
        let mut stack = vec![];
        let position = self.position();

        if let Some(quote) = self.next_if(|item| *item == '"') {
            self.col += 1;
            stack.push(quote);
        }

        loop {
            let Some(next) = self.next() else {
                return Err(LexError(format!(
                    "unterminated string literal starting at line {}",
                    position.line
                )));
            };

            stack.push(next);
            match next {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.next() {
                        self.col += 2;
                        stack.push(escaped);
                    }
                }
                '\n' => {
                    self.line += 1;
                    self.col = 1;
                }
                _ => self.col += 1,
            }
        }
        self.col += 1;

        self.tokens.push(Token::StringLiteral {
            value: stack.iter().collect(),
            position,
        });

        Ok(())
    }

    fn lex_special(&mut self) -> LexResult<()> {
        let mut stack = vec![];
        let position = self.position();

        while let Some(next) = self.next() {
            self.col += 1;
            stack.push(next);

            let read = stack.iter().collect::<String>();

            let can_read_next = self
                .peek()
                .map(|item| {
                    let mut stack = stack.clone();
                    stack.push(*item);
                    let read = stack.iter().collect::<String>();
                    LEX_MAP.can_match(read.as_str())
                })
                .unwrap_or(false);

            if can_read_next {
                continue;
            }

            match LEX_MAP.get(read.as_str()) {
                Some(current_match) => self.tokens.push(current_match.to_token(position)),
                None => {
                    let [value] = stack.as_slice() else {
                        return Err(LexError(format!("failed to lex '{read}'")));
                    };
                    self.tokens.push(Token::Symbol {
                        value: *value,
                        position,
                    });
                }
            }
            break;
        }

        Ok(())
    }
}
