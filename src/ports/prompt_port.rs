//! Operator question port used by the confirmation workflow.

use crate::domain::error::DipledgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFormat {
    /// "dollars.cents", answered in cents.
    Currency,
    /// Whole units, optionally capped.
    Quantity { max: Option<i64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub format: AnswerFormat,
    pub required: bool,
    pub default: Option<i64>,
}

impl Question {
    pub fn currency(text: impl Into<String>) -> Self {
        Question {
            text: text.into(),
            format: AnswerFormat::Currency,
            required: false,
            default: None,
        }
    }

    pub fn quantity(text: impl Into<String>, max: Option<i64>) -> Self {
        Question {
            text: text.into(),
            format: AnswerFormat::Quantity { max },
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: i64) -> Self {
        self.default = Some(default);
        self
    }
}

pub trait PromptPort {
    /// Ask one question. Returns a value conforming to `question.format`, or
    /// `None` when an optional question is left unanswered. Malformed input
    /// never reaches the caller.
    fn ask(&mut self, question: &Question) -> Result<Option<i64>, DipledgerError>;
}

/// Parse "digits.cents" into cents.
pub fn parse_currency(input: &str) -> Option<i64> {
    let (dollars, cents) = input.split_once('.')?;
    if dollars.is_empty()
        || cents.len() != 2
        || !dollars.bytes().all(|b| b.is_ascii_digit())
        || !cents.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let dollars: i64 = dollars.parse().ok()?;
    let cents: i64 = cents.parse().ok()?;
    dollars.checked_mul(100)?.checked_add(cents)
}

/// Parse a whole, non-negative quantity.
pub fn parse_quantity(input: &str) -> Option<i64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

/// Format cents as "dollars.cents".
pub fn format_cents(cents: f64) -> String {
    format!("{:.2}", cents / 100.0)
}
