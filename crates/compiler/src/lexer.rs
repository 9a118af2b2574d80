//! Character-level tokenizer. Expects whitespace to be stripped already.

use std::fmt;

use calc_core::{CompileError, Operator};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Number(f64),
    Operator(Operator),
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Operator(op) => write!(f, "{op}"),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
        }
    }
}

/// Split `text` into numbers, operators and brackets.
///
/// Digits and `.` accumulate into one literal; anything that is not a digit,
/// `.`, `+ - * /` or a bracket is rejected.
pub fn tokenize(text: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut number = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }

        let token = match c {
            '(' => Token::Open,
            ')' => Token::Close,
            _ => match Operator::from_symbol(c) {
                Some(op) => Token::Operator(op),
                None => return Err(CompileError::UnacceptableSymbol(c.to_string())),
            },
        };
        flush_number(&mut number, &mut tokens)?;
        tokens.push(token);
    }
    flush_number(&mut number, &mut tokens)?;

    Ok(tokens)
}

fn flush_number(number: &mut String, tokens: &mut Vec<Token>) -> Result<(), CompileError> {
    if number.is_empty() {
        return Ok(());
    }
    let value = number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CompileError::UnacceptableSymbol(number.clone()))?;
    tokens.push(Token::Number(value));
    number.clear();
    Ok(())
}
