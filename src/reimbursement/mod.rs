//! Reimbursement records as returned by the API
//!
//! Every field is optional on the wire. Accessors return `None` for missing
//! values and callers pick their own fallback text.

pub mod filter;
pub mod pagination;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Reimbursement {
    #[serde(default, deserialize_with = "lenient")]
    pub expense: Option<Expense>,
    #[serde(default, deserialize_with = "truthy")]
    pub is_paid: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Expense {
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<Amount>,
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<Driver>,
}

/// The user who submitted the expense
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Driver {
    #[serde(default, deserialize_with = "lenient")]
    pub phone_number: Option<String>,
}

/// A field of the wrong shape reads as missing instead of failing the record
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Paid flag with JavaScript truthiness: null, 0 and "" are unpaid
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Expense amount kept in its display form.
///
/// The API sends either a JSON number (`1500`, `12.5`) or a decimal string
/// (`"1500.00"`). Numbers are printed without a trailing `.0`, strings are
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    text: String,
    // Sent as a JSON number rather than a string
    numeric: bool,
}

impl Amount {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Numeric value, when the text parses as one
    pub fn as_f64(&self) -> Option<f64> {
        self.text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// Empty text or a numeric zero; the string `"0"` is not blank
    pub fn is_blank(&self) -> bool {
        self.text.is_empty() || (self.numeric && self.as_f64() == Some(0.0))
    }

    fn from_number(n: &Number) -> Self {
        let text = if let Some(i) = n.as_i64() {
            i.to_string()
        } else if let Some(u) = n.as_u64() {
            u.to_string()
        } else {
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                Some(f) => f.to_string(),
                None => n.to_string(),
            }
        };
        Self { text, numeric: true }
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Self { text: s.to_string(), numeric: false }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => Amount::from_number(&n),
            Value::String(s) => Amount { text: s, numeric: false },
            other => Amount { text: other.to_string(), numeric: false },
        })
    }
}

impl Reimbursement {
    pub fn category(&self) -> Option<&str> {
        self.expense.as_ref()?.category.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.expense.as_ref()?.user.as_ref()?.phone_number.as_deref()
    }

    pub fn amount(&self) -> Option<&Amount> {
        self.expense.as_ref()?.amount.as_ref()
    }

    pub fn date(&self) -> Option<&str> {
        self.expense.as_ref()?.date.as_deref()
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_paid { "Paid" } else { "Unpaid" }
    }
}
