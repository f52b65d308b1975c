//! Line-oriented terminal prompt.

use crate::domain::error::DipledgerError;
use crate::ports::prompt_port::{
    format_cents, parse_currency, parse_quantity, AnswerFormat, PromptPort, Question,
};
use std::io::{self, BufRead, Write};

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        TerminalPrompt::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn render(&mut self, question: &Question) -> io::Result<()> {
        write!(self.output, "Question... {}", question.text)?;
        if let Some(default) = question.default {
            let shown = match question.format {
                AnswerFormat::Currency => format_cents(default as f64),
                AnswerFormat::Quantity { .. } => default.to_string(),
            };
            write!(self.output, " ({})", shown)?;
        }
        write!(self.output, ": ")?;
        self.output.flush()
    }

    fn parse(format: AnswerFormat, input: &str) -> Result<i64, &'static str> {
        match format {
            AnswerFormat::Currency => {
                parse_currency(input).ok_or("input must be a number with the format \"(Dollars).CC\"")
            }
            AnswerFormat::Quantity { max } => {
                let value = parse_quantity(input).ok_or("input must be a whole number")?;
                match max {
                    Some(max) if value > max => Err("input exceeds the amount held"),
                    _ => Ok(value),
                }
            }
        }
    }
}

impl<R: BufRead, W: Write> PromptPort for TerminalPrompt<R, W> {
    fn ask(&mut self, question: &Question) -> Result<Option<i64>, DipledgerError> {
        loop {
            self.render(question)?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(DipledgerError::Prompt {
                    reason: "input closed before an answer was given".into(),
                });
            }

            let answer = line.trim();
            if answer.is_empty() {
                if let Some(default) = question.default {
                    return Ok(Some(default));
                }
                if !question.required {
                    return Ok(None);
                }
                writeln!(self.output, "an answer is required")?;
                continue;
            }

            match Self::parse(question.format, answer) {
                Ok(value) => return Ok(Some(value)),
                Err(message) => writeln!(self.output, "{}", message)?,
            }
        }
    }
}
