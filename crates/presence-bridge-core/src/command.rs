//! Wire grammar for commands sent by clients.

use std::fmt;

use thiserror::Error;

/// Prefix of a max occupancy update.
pub const MAX_PREFIX: &str = "MAX:";

/// Literal reset command.
pub const RESET: &str = "RESET";

/// A classified client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `MAX:<n>` with a strictly positive `n`.
    SetMax(u32),
    /// Exactly `RESET`.
    Reset,
    /// Anything else, already trimmed.
    Other(String),
}

/// A `MAX:` command that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("MAX value is not a number: {0:?}")]
    NotANumber(String),
    #[error("MAX value must be positive, got {0}")]
    NotPositive(i64),
    #[error("MAX value out of range: {0:?}")]
    OutOfRange(String),
}

impl ClientCommand {
    /// Classify a raw client message.
    ///
    /// Surrounding whitespace is trimmed first. For `MAX:` only the second
    /// `:`-separated field is read, and it is parsed leniently: leading
    /// whitespace, an optional sign, then the leading run of digits. Any
    /// trailing garbage after the digits is ignored.
    ///
    /// # Errors
    /// Returns `CommandError` if a `MAX:` command does not carry a positive
    /// integer. Non-`MAX:` messages never fail.
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        let message = raw.trim();

        if message.starts_with(MAX_PREFIX) {
            let field = message.split(':').nth(1).unwrap_or_default();
            let value = parse_leading_int(field)?;
            if value <= 0 {
                return Err(CommandError::NotPositive(value));
            }
            return u32::try_from(value)
                .map(Self::SetMax)
                .map_err(|_| CommandError::OutOfRange(field.to_string()));
        }

        if message == RESET {
            return Ok(Self::Reset);
        }

        Ok(Self::Other(message.to_string()))
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetMax(n) => write!(f, "{MAX_PREFIX}{n}"),
            Self::Reset => f.write_str(RESET),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

fn parse_leading_int(field: &str) -> Result<i64, CommandError> {
    let s = field.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return Err(CommandError::NotANumber(field.to_string()));
    }

    let magnitude: i64 = digits
        .parse()
        .map_err(|_| CommandError::OutOfRange(field.to_string()))?;
    Ok(if negative { -magnitude } else { magnitude })
}
