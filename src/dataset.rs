//! Line-oriented input and output.
//!
//! The input is a list of `user_id item_id rating` lines, optionally preceded by
//! the `train dataset` marker, followed by the `test dataset` marker and
//! a list of `user_id item_id` queries. The markers may repeat.

use std::io::{BufRead, Write};
use std::str::{FromStr, SplitWhitespace};

use crate::prelude::*;
use crate::trainer::store::RatingStore;

pub const TRAIN_MARKER: &str = "train dataset";
pub const TEST_MARKER: &str = "test dataset";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Malformed lines fail the whole input.
    #[default]
    Strict,

    /// Fields are read up to the first character that does not fit the number,
    /// fields with no numeric prefix and all the fields after a malformed one are read as zeroes.
    Lenient,
}

#[derive(Debug, Default)]
pub struct Dataset {
    pub store: RatingStore,
    pub queries: Vec<(i64, i64)>,
}

#[derive(Copy, Clone)]
enum Section {
    Train,
    Test,
}

impl Dataset {
    /// Reads the ratings and the queries.
    /// Training IDs above `max_id` are rejected, queries are not limited.
    #[instrument(skip(reader))]
    pub fn read(reader: impl BufRead, policy: ParsePolicy, max_id: u32) -> Result<Self> {
        let mut dataset = Self::default();
        let mut section = Section::Train;

        for (line_number, line) in (1..).zip(reader.split(b'\n')) {
            let line = line.with_context(|| format!("failed to read line #{}", line_number))?;
            let line = match policy {
                ParsePolicy::Strict => String::from_utf8(line)
                    .with_context(|| format!("line #{} is not valid UTF-8", line_number))?,
                ParsePolicy::Lenient => String::from_utf8_lossy(&line).into_owned(),
            };
            match line.trim_end() {
                TRAIN_MARKER => section = Section::Train,
                TEST_MARKER => section = Section::Test,
                line if policy == ParsePolicy::Strict && line.trim_start().is_empty() => {}
                line => dataset
                    .push_line(line, section, policy, max_id)
                    .with_context(|| format!("line #{}: `{}`", line_number, line))?,
            }
        }

        info!(
            n_ratings = dataset.store.len(),
            n_users = dataset.store.n_users(),
            n_items = dataset.store.n_items(),
            n_queries = dataset.queries.len(),
            "read",
        );
        Ok(dataset)
    }

    fn push_line(
        &mut self,
        line: &str,
        section: Section,
        policy: ParsePolicy,
        max_id: u32,
    ) -> Result {
        let mut fields = Fields::new(line, policy);
        match section {
            Section::Train => {
                let user_id = parse_id(fields.next("user ID")?, max_id)?;
                let item_id = parse_id(fields.next("item ID")?, max_id)?;
                let rating: f64 = fields.next("rating")?;
                fields.finish()?;
                self.store.put(user_id, item_id, check_rating(rating, policy)?);
            }
            Section::Test => {
                let user_id = fields.next("user ID")?;
                let item_id = fields.next("item ID")?;
                fields.finish()?;
                self.queries.push((user_id, item_id));
            }
        }
        Ok(())
    }
}

/// Whitespace-separated fields of a single line.
struct Fields<'a> {
    tokens: SplitWhitespace<'a>,
    policy: ParsePolicy,
    is_failed: bool,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str, policy: ParsePolicy) -> Self {
        Self {
            tokens: line.split_whitespace(),
            policy,
            is_failed: false,
        }
    }

    fn next<T>(&mut self, name: &str) -> Result<T>
    where
        T: Field,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let token = self.tokens.next();
        match self.policy {
            ParsePolicy::Strict => {
                let token = token.ok_or_else(|| anyhow!("missing {}", name))?;
                token
                    .parse()
                    .with_context(|| format!("invalid {}: `{}`", name, token))
            }
            ParsePolicy::Lenient if self.is_failed => Ok(T::default()),
            ParsePolicy::Lenient => {
                let prefix = token.map_or("", |token| &token[..T::prefix_length(token)]);
                match prefix.parse() {
                    Ok(value) => {
                        // Trailing garbage stops the following fields, as a stream would.
                        self.is_failed = token.map_or(true, |token| prefix.len() != token.len());
                        Ok(value)
                    }
                    Err(_) => {
                        self.is_failed = true;
                        Ok(T::default())
                    }
                }
            }
        }
    }

    fn finish(mut self) -> Result {
        match (self.policy, self.tokens.next()) {
            (ParsePolicy::Strict, Some(token)) => Err(anyhow!("unexpected field: `{}`", token)),
            _ => Ok(()),
        }
    }
}

/// Numeric field which may be read from the longest valid prefix of a token.
trait Field: FromStr + Default {
    /// Length of the longest prefix of the token that is a number of this type.
    fn prefix_length(token: &str) -> usize;
}

impl Field for i64 {
    fn prefix_length(token: &str) -> usize {
        let bytes = token.as_bytes();
        let sign = sign_length(bytes);
        match digits_length(&bytes[sign..]) {
            0 => 0,
            n_digits => sign + n_digits,
        }
    }
}

impl Field for f64 {
    fn prefix_length(token: &str) -> usize {
        let bytes = token.as_bytes();
        let sign = sign_length(bytes);
        let n_integer_digits = digits_length(&bytes[sign..]);
        let mut length = sign + n_integer_digits;
        let mut n_mantissa_digits = n_integer_digits;
        if bytes.get(length) == Some(&b'.') {
            let n_fraction_digits = digits_length(&bytes[length + 1..]);
            n_mantissa_digits += n_fraction_digits;
            if n_mantissa_digits != 0 {
                length += 1 + n_fraction_digits;
            }
        }
        if n_mantissa_digits == 0 {
            return 0;
        }
        if matches!(bytes.get(length), Some(b'e' | b'E')) {
            let exponent_sign = sign_length(&bytes[length + 1..]);
            let n_exponent_digits = digits_length(&bytes[length + 1 + exponent_sign..]);
            if n_exponent_digits != 0 {
                length += 1 + exponent_sign + n_exponent_digits;
            }
        }
        length
    }
}

fn sign_length(bytes: &[u8]) -> usize {
    usize::from(matches!(bytes.first(), Some(b'+' | b'-')))
}

fn digits_length(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}

/// User and item IDs index dense parameter rows, hence the limit.
fn parse_id(id: i64, max_id: u32) -> Result<u32> {
    match u32::try_from(id) {
        Ok(id) if id <= max_id => Ok(id),
        _ => Err(anyhow!("ID {} is out of the supported range [0, {}]", id, max_id)),
    }
}

fn check_rating(rating: f64, policy: ParsePolicy) -> Result<f64> {
    match (rating.is_finite(), policy) {
        (true, _) => Ok(rating),
        (false, ParsePolicy::Lenient) => Ok(0.0),
        (false, ParsePolicy::Strict) => Err(anyhow!("rating must be finite, got {}", rating)),
    }
}

#[must_use]
pub fn format_prediction(prediction: f64) -> String {
    format!("{:.2}", prediction)
}

/// Writes one prediction per line in the query order.
#[instrument(skip_all, fields(n_predictions = predictions.len()))]
pub fn write_predictions(mut writer: impl Write, predictions: &[f64]) -> Result {
    for prediction in predictions {
        writeln!(writer, "{}", format_prediction(*prediction))
            .context("failed to write the prediction")?;
    }
    writer.flush().context("failed to flush the output")
}
