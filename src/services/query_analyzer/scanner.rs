//! Lexical sanity scan of SQL text
//!
//! The structural passes are regex based and never parse SQL. Before they
//! run, the text is walked once to make sure it is something a regex can be
//! trusted on: no NUL bytes, and every quoted literal or block comment is
//! closed. Comments are skipped so that quotes inside them don't count.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("SQL text is empty")]
    Empty,

    #[error("NUL byte at offset {offset}")]
    NulByte { offset: usize },

    #[error("Unterminated {quote} literal starting at offset {offset}")]
    UnterminatedLiteral { quote: char, offset: usize },

    #[error("Unterminated block comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },
}

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Clone, Copy)]
enum State {
    Code,
    Quoted { quote: char, start: usize },
    LineComment,
    BlockComment { start: usize },
}

/// Walk `sql` once and report the first lexical defect
pub fn scan(sql: &str) -> ScanResult<()> {
    if sql.trim().is_empty() {
        return Err(ScanError::Empty);
    }

    let mut state = State::Code;
    let mut chars = sql.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c == '\0' {
            return Err(ScanError::NulByte { offset });
        }

        state = match state {
            State::Code => match c {
                '\'' | '"' | '`' => State::Quoted { quote: c, start: offset },
                '#' => State::LineComment,
                '-' if chars.peek().map(|&(_, n)| n) == Some('-') => {
                    chars.next();
                    State::LineComment
                },
                '/' if chars.peek().map(|&(_, n)| n) == Some('*') => {
                    chars.next();
                    State::BlockComment { start: offset }
                },
                _ => State::Code,
            },
            State::Quoted { quote, start } => {
                if c == '\\' && quote != '`' {
                    // skip the escaped character
                    if let Some((next_offset, next)) = chars.next()
                        && next == '\0'
                    {
                        return Err(ScanError::NulByte { offset: next_offset });
                    }
                    State::Quoted { quote, start }
                } else if c == quote {
                    // a doubled quote simply closes and reopens the literal
                    State::Code
                } else {
                    State::Quoted { quote, start }
                }
            },
            State::LineComment => {
                if c == '\n' {
                    State::Code
                } else {
                    State::LineComment
                }
            },
            State::BlockComment { start } => {
                if c == '*' && chars.peek().map(|&(_, n)| n) == Some('/') {
                    chars.next();
                    State::Code
                } else {
                    State::BlockComment { start }
                }
            },
        };
    }

    match state {
        State::Quoted { quote, start } => {
            Err(ScanError::UnterminatedLiteral { quote, offset: start })
        },
        State::BlockComment { start } => Err(ScanError::UnterminatedComment { offset: start }),
        State::Code | State::LineComment => Ok(()),
    }
}
