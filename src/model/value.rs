// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime value shapes for field slots
//!
//! A [`Value`] is what a field holds, independent of what its descriptor
//! declares. Typed accessors narrow a value to one shape and fail with
//! [`Hl7v2Error::TypeMismatch`] on anything else; there is no unchecked path.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::temporal::{V2Date, V2Time, V2Timestamp};
use crate::error::{Hl7v2Error, Result};

/// A coded entry: identifier plus optional display text and coding system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodedValue {
    /// The code itself
    pub identifier: String,
    /// Display text for the code
    pub text: Option<String>,
    /// Name of the coding system the code belongs to
    pub coding_system: Option<String>,
}

impl CodedValue {
    /// Create a coded value with just an identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            text: None,
            coding_system: None,
        }
    }

    /// Attach display text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach a coding system name
    pub fn with_coding_system(mut self, coding_system: impl Into<String>) -> Self {
        self.coding_system = Some(coding_system.into());
        self
    }
}

/// Runtime value held by one field repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value present
    Empty,
    /// Character data (ST/TX/FT and friends)
    Text(String),
    /// Numeric value with decimal precision (NM)
    Number(Decimal),
    /// Positive sequence number (SI)
    SequenceId(u32),
    /// Date (DT)
    Date(V2Date),
    /// Time (TM)
    Time(V2Time),
    /// Date/time (DTM)
    Timestamp(V2Timestamp),
    /// Coded entry (ID/IS/CWE)
    Coded(CodedValue),
    /// Ordered components of a composite type (XPN, XAD, …)
    Composite(Vec<Value>),
}

impl Value {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a coded value with just an identifier
    pub fn coded(identifier: impl Into<String>) -> Self {
        Self::Coded(CodedValue::new(identifier))
    }

    /// Whether this value is [`Value::Empty`]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Name of this value's shape, used in mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::SequenceId(_) => "sequence id",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
            Self::Coded(_) => "coded",
            Self::Composite(_) => "composite",
        }
    }

    /// Narrow to character data
    pub fn as_text(&self) -> Result<&str> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(Hl7v2Error::type_mismatch("text", other.type_name())),
        }
    }

    /// Narrow to a numeric value
    pub fn as_number(&self) -> Result<Decimal> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(Hl7v2Error::type_mismatch("number", other.type_name())),
        }
    }

    /// Narrow to a sequence number
    pub fn as_sequence_id(&self) -> Result<u32> {
        match self {
            Self::SequenceId(n) => Ok(*n),
            other => Err(Hl7v2Error::type_mismatch("sequence id", other.type_name())),
        }
    }

    /// Narrow to a date
    pub fn as_date(&self) -> Result<&V2Date> {
        match self {
            Self::Date(d) => Ok(d),
            other => Err(Hl7v2Error::type_mismatch("date", other.type_name())),
        }
    }

    /// Narrow to a time
    pub fn as_time(&self) -> Result<&V2Time> {
        match self {
            Self::Time(t) => Ok(t),
            other => Err(Hl7v2Error::type_mismatch("time", other.type_name())),
        }
    }

    /// Narrow to a timestamp
    pub fn as_timestamp(&self) -> Result<&V2Timestamp> {
        match self {
            Self::Timestamp(t) => Ok(t),
            other => Err(Hl7v2Error::type_mismatch("timestamp", other.type_name())),
        }
    }

    /// Narrow to a coded entry
    pub fn as_coded(&self) -> Result<&CodedValue> {
        match self {
            Self::Coded(c) => Ok(c),
            other => Err(Hl7v2Error::type_mismatch("coded", other.type_name())),
        }
    }

    /// Narrow to composite components
    pub fn as_components(&self) -> Result<&[Value]> {
        match self {
            Self::Composite(parts) => Ok(parts),
            other => Err(Hl7v2Error::type_mismatch("composite", other.type_name())),
        }
    }

    /// The code carried by this value, for table-membership checks:
    /// the identifier of a coded entry, or text as-is
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Coded(c) => Some(&c.identifier),
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Empty
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<V2Date> for Value {
    fn from(value: V2Date) -> Self {
        Self::Date(value)
    }
}

impl From<V2Time> for Value {
    fn from(value: V2Time) -> Self {
        Self::Time(value)
    }
}

impl From<V2Timestamp> for Value {
    fn from(value: V2Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

impl From<CodedValue> for Value {
    fn from(value: CodedValue) -> Self {
        Self::Coded(value)
    }
}

impl fmt::Display for Value {
    /// Human-readable rendering; component separators here are display
    /// conventions, not wire encoding
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::SequenceId(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Timestamp(t) => write!(f, "{t}"),
            Self::Coded(c) => {
                f.write_str(&c.identifier)?;
                if let Some(text) = &c.text {
                    write!(f, "^{text}")?;
                }
                if let Some(system) = &c.coding_system {
                    write!(f, "^{system}")?;
                }
                Ok(())
            }
            Self::Composite(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("^")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let value = Value::text("Martinez");
        assert_eq!(value.as_text().unwrap(), "Martinez");
        let err = value.as_number().unwrap_err();
        assert_eq!(err, Hl7v2Error::type_mismatch("number", "text"));
    }

    #[test]
    fn test_coded_value() {
        let coded = CodedValue::new("M")
            .with_text("Male")
            .with_coding_system("HL70001");
        let value = Value::from(coded);
        assert_eq!(value.as_coded().unwrap().identifier, "M");
        assert_eq!(value.code(), Some("M"));
        assert_eq!(value.to_string(), "M^Male^HL70001");
    }

    #[test]
    fn test_composite_display() {
        let name = Value::Composite(vec![
            Value::text("Martinez"),
            Value::text("Maria"),
            Value::Empty,
        ]);
        assert_eq!(name.to_string(), "Martinez^Maria^");
        assert_eq!(name.as_components().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_default() {
        let value = Value::default();
        assert!(value.is_empty());
        assert_eq!(value.to_string(), "");
        assert_eq!(value.code(), None);
    }

    #[test]
    fn test_temporal_values() {
        let value: Value = V2Date::parse("20240115").unwrap().into();
        assert_eq!(value.as_date().unwrap().format(), "20240115");
        assert!(value.as_timestamp().is_err());
    }
}
