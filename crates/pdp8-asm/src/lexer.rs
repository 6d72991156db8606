//! Longest-match lexer (C8): a set of recognizers race over the input
//! stream one character at a time; the first to uniquely fail on a
//! character wins the previous characters as its token.

use std::fmt;

use crate::token::{Token, TokenClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecognizerState {
    Undetermined,
    Passing,
    Failed,
    FailedOn,
}

/// The token syntaxes a [`Lexer`] races against each other. Each variant
/// mirrors one recognizer of the original token grammar.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Comment,
    LabelAssign,
    LabelDefine,
    Location,
    ProgramCounter,
    Addition,
    Subtraction,
    EndOfInstruction,
    EndOfLine,
    WhiteSpace,
    Literal,
    Number,
}

impl Kind {
    fn class(self) -> TokenClass {
        match self {
            Self::Comment => TokenClass::Comment,
            Self::LabelAssign => TokenClass::LabelAssign,
            Self::LabelDefine => TokenClass::LabelDefine,
            Self::Location => TokenClass::Location,
            Self::ProgramCounter => TokenClass::ProgramCounter,
            Self::Addition => TokenClass::Addition,
            Self::Subtraction => TokenClass::Subtraction,
            Self::EndOfInstruction => TokenClass::EndOfInstruction,
            Self::EndOfLine => TokenClass::EndOfLine,
            Self::WhiteSpace => TokenClass::WhiteSpace,
            Self::Literal => TokenClass::Literal,
            Self::Number => TokenClass::Number,
        }
    }
}

/// Tracks which part of a numeric literal has been consumed so far, so the
/// `Number` recognizer can tell a `0x`-prefixed hex literal from a plain
/// octal/decimal digit run (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberSubState {
    Start,
    LeadingZero,
    HexPrefix,
    Hex,
    Digits,
}

struct Recognizer {
    kind: Kind,
    state: RecognizerState,
    passing_count: u32,
    number_state: NumberSubState,
}

impl Recognizer {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            state: RecognizerState::Undetermined,
            passing_count: 0,
            number_state: NumberSubState::Start,
        }
    }

    fn reset(&mut self) {
        self.state = RecognizerState::Undetermined;
        self.passing_count = 0;
        self.number_state = NumberSubState::Start;
    }

    fn parse(&mut self, c: char) -> RecognizerState {
        self.state = match self.kind {
            Kind::Comment => self.parse_single_char_prefix_to_eol(c, '/'),
            Kind::LabelAssign => self.parse_single_char(c, '='),
            Kind::LabelDefine => self.parse_single_char(c, ','),
            Kind::Location => self.parse_single_char(c, '*'),
            Kind::ProgramCounter => self.parse_single_char(c, '.'),
            Kind::Addition => self.parse_single_char(c, '+'),
            Kind::Subtraction => self.parse_single_char(c, '-'),
            Kind::EndOfInstruction => self.parse_single_char(c, ';'),
            Kind::EndOfLine => self.parse_run(c, |c| c == '\n' || c == '\r'),
            Kind::WhiteSpace => self.parse_run(c, |c| c.is_whitespace() && c != '\n' && c != '\r'),
            Kind::Literal => self.parse_literal(c),
            Kind::Number => self.parse_number(c),
        };
        if self.state == RecognizerState::Passing {
            self.passing_count += 1;
        }
        self.state
    }

    fn parse_single_char(&self, c: char, want: char) -> RecognizerState {
        match self.state {
            RecognizerState::Undetermined => {
                if c == want {
                    RecognizerState::Passing
                } else {
                    RecognizerState::Failed
                }
            }
            RecognizerState::Passing => RecognizerState::FailedOn,
            RecognizerState::FailedOn => RecognizerState::Failed,
            RecognizerState::Failed => RecognizerState::Failed,
        }
    }

    fn parse_single_char_prefix_to_eol(&self, c: char, want: char) -> RecognizerState {
        match self.state {
            RecognizerState::Undetermined => {
                if c == want {
                    RecognizerState::Passing
                } else {
                    RecognizerState::Failed
                }
            }
            RecognizerState::Passing => {
                if c == '\n' || c == '\r' {
                    RecognizerState::FailedOn
                } else {
                    RecognizerState::Passing
                }
            }
            RecognizerState::FailedOn => RecognizerState::Failed,
            RecognizerState::Failed => RecognizerState::Failed,
        }
    }

    fn parse_run(&self, c: char, test: impl Fn(char) -> bool) -> RecognizerState {
        match self.state {
            RecognizerState::Undetermined => {
                if test(c) {
                    RecognizerState::Passing
                } else {
                    RecognizerState::Failed
                }
            }
            RecognizerState::Passing => {
                if test(c) {
                    RecognizerState::Passing
                } else {
                    RecognizerState::FailedOn
                }
            }
            RecognizerState::FailedOn => RecognizerState::Failed,
            RecognizerState::Failed => RecognizerState::Failed,
        }
    }

    fn parse_literal(&self, c: char) -> RecognizerState {
        match self.state {
            RecognizerState::Undetermined => {
                if c.is_alphabetic() || c == '_' {
                    RecognizerState::Passing
                } else {
                    RecognizerState::Failed
                }
            }
            RecognizerState::Passing => {
                if c.is_alphanumeric() || c == '_' {
                    RecognizerState::Passing
                } else {
                    RecognizerState::FailedOn
                }
            }
            RecognizerState::FailedOn => RecognizerState::Failed,
            RecognizerState::Failed => RecognizerState::Failed,
        }
    }

    /// Recognizes decimal/octal digit runs and a `0x`/`0X` hex-prefixed run
    /// (spec §4.7) as a single token.
    fn parse_number(&mut self, c: char) -> RecognizerState {
        match self.state {
            RecognizerState::Undetermined => {
                if c == '0' {
                    self.number_state = NumberSubState::LeadingZero;
                    RecognizerState::Passing
                } else if c.is_ascii_digit() {
                    self.number_state = NumberSubState::Digits;
                    RecognizerState::Passing
                } else {
                    RecognizerState::Failed
                }
            }
            RecognizerState::Passing => match self.number_state {
                NumberSubState::LeadingZero => {
                    if c == 'x' || c == 'X' {
                        self.number_state = NumberSubState::HexPrefix;
                        RecognizerState::Passing
                    } else if c.is_ascii_digit() {
                        self.number_state = NumberSubState::Digits;
                        RecognizerState::Passing
                    } else {
                        RecognizerState::FailedOn
                    }
                }
                NumberSubState::HexPrefix => {
                    if c.is_ascii_hexdigit() {
                        self.number_state = NumberSubState::Hex;
                        RecognizerState::Passing
                    } else {
                        // "0x" with no hex digit following is not a number.
                        RecognizerState::Failed
                    }
                }
                NumberSubState::Hex => {
                    if c.is_ascii_hexdigit() {
                        RecognizerState::Passing
                    } else {
                        RecognizerState::FailedOn
                    }
                }
                NumberSubState::Digits => {
                    if c.is_ascii_digit() {
                        RecognizerState::Passing
                    } else {
                        RecognizerState::FailedOn
                    }
                }
                NumberSubState::Start => RecognizerState::Failed,
            },
            RecognizerState::FailedOn => RecognizerState::Failed,
            RecognizerState::Failed => RecognizerState::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ambiguous token at line {} column {}",
            self.line, self.column
        )
    }
}

impl std::error::Error for LexError {}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn recognizers() -> Vec<Recognizer> {
        [
            Kind::Comment,
            Kind::LabelAssign,
            Kind::LabelDefine,
            Kind::Location,
            Kind::ProgramCounter,
            Kind::Addition,
            Kind::Subtraction,
            Kind::EndOfInstruction,
            Kind::EndOfLine,
            Kind::WhiteSpace,
            Kind::Literal,
            Kind::Number,
        ]
        .into_iter()
        .map(Recognizer::new)
        .collect()
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let mut recognizers = Self::recognizers();
        let mut literal = String::new();
        let (start_line, start_column) = (self.line, self.column);

        loop {
            let Some(&c) = self.chars.get(self.pos) else {
                break;
            };

            let mut failed_on = Vec::new();
            for (i, r) in recognizers.iter_mut().enumerate() {
                if r.parse(c) == RecognizerState::FailedOn {
                    failed_on.push(i);
                }
            }

            match failed_on.len() {
                0 => {
                    literal.push(c);
                    self.advance();
                }
                1 => {
                    let class = recognizers[failed_on[0]].kind.class();
                    return Ok(Token::new(class, literal, start_line, start_column));
                }
                _ => {
                    return Err(LexError {
                        line: self.line,
                        column: self.column,
                    })
                }
            }
        }

        if literal.is_empty() {
            return Ok(Token::new(
                TokenClass::EndOfFile,
                literal,
                start_line,
                start_column,
            ));
        }
        let winner = recognizers
            .iter()
            .max_by_key(|r| r.passing_count)
            .expect("recognizer list is non-empty");
        Ok(Token::new(winner.kind.class(), literal, start_line, start_column))
    }

    fn advance(&mut self) {
        if self.chars[self.pos] == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += 1;
    }

    /// Lexes the whole source into a token stream, always terminated by one
    /// `EndOfFile` token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.class == TokenClass::EndOfFile;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(source: &str) -> Vec<TokenClass> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.class)
            .collect()
    }

    #[test]
    fn lexes_comment_to_end_of_line() {
        let tokens = Lexer::tokenize("/ hello\n").unwrap();
        assert_eq!(tokens[0].class, TokenClass::Comment);
        assert_eq!(tokens[0].literal, "/ hello");
    }

    #[test]
    fn lexes_label_define_and_assign() {
        assert_eq!(
            classes("FOO,"),
            vec![TokenClass::Literal, TokenClass::LabelDefine, TokenClass::EndOfFile]
        );
        assert_eq!(
            classes("FOO=5"),
            vec![
                TokenClass::Literal,
                TokenClass::LabelAssign,
                TokenClass::Number,
                TokenClass::EndOfFile
            ]
        );
    }

    #[test]
    fn lexes_location_and_program_counter() {
        assert_eq!(
            classes("*200"),
            vec![TokenClass::Location, TokenClass::Number, TokenClass::EndOfFile]
        );
        assert_eq!(classes("."), vec![TokenClass::ProgramCounter, TokenClass::EndOfFile]);
    }

    #[test]
    fn lexes_expression_operators() {
        assert_eq!(
            classes("1+2-3"),
            vec![
                TokenClass::Number,
                TokenClass::Addition,
                TokenClass::Number,
                TokenClass::Subtraction,
                TokenClass::Number,
                TokenClass::EndOfFile
            ]
        );
    }

    #[test]
    fn lexes_hex_prefixed_number_as_one_token() {
        let tokens = Lexer::tokenize("0x1F\n").unwrap();
        assert_eq!(tokens[0].class, TokenClass::Number);
        assert_eq!(tokens[0].literal, "0x1F");
    }

    #[test]
    fn whitespace_separates_literals() {
        assert_eq!(
            classes("TAD I"),
            vec![
                TokenClass::Literal,
                TokenClass::WhiteSpace,
                TokenClass::Literal,
                TokenClass::EndOfFile
            ]
        );
    }
}
