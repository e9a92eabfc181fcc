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

//! One typed value slot inside a segment
//!
//! Construction and raw get/set never fail; checking a value against its
//! declared type, length and code table is advisory and reports through
//! [`Diagnostic`]s.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::datatype::DataType;
use super::temporal::{V2Date, V2Time, V2Timestamp};
use super::value::Value;
use crate::descriptor::FieldDescriptor;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::tables::CodeTableProvider;

/// One repetition of one segment field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    data_type: DataType,
    table: Option<u16>,
    max_length: Option<u32>,
    value: Value,
}

impl Field {
    /// Create an empty field of the given type
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            table: None,
            max_length: None,
            value: Value::Empty,
        }
    }

    /// Attach a code-table number
    pub fn with_table(mut self, table: u16) -> Self {
        self.table = Some(table);
        self
    }

    /// Attach a maximum rendered length
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Create an empty field shaped by a descriptor entry
    pub fn from_descriptor(descriptor: &FieldDescriptor) -> Self {
        Self {
            data_type: descriptor.data_type,
            table: descriptor.table,
            max_length: descriptor.max_length,
            value: Value::Empty,
        }
    }

    /// The declared data type of this slot
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The code table this slot draws from, if any
    pub fn table(&self) -> Option<u16> {
        self.table
    }

    /// The current value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access to the current value
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Replace the current value; always succeeds
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Whether no value has been set
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Advisory check of the value against the declared type, length and
    /// code table; never fails, never mutates
    pub fn validate(
        &self,
        subject: &str,
        tables: Option<&dyn CodeTableProvider>,
    ) -> Vec<Diagnostic> {
        let mut findings = Vec::new();
        if self.value.is_empty() {
            return findings;
        }

        if let Some(max) = self.max_length {
            let rendered = self.value.to_string().chars().count();
            if rendered > max as usize {
                findings.push(Diagnostic::warning(
                    DiagnosticCode::FieldTooLong {
                        max,
                        actual: rendered,
                    },
                    format!("value is {rendered} characters, maximum is {max}"),
                    subject,
                ));
            }
        }

        if !self.value_fits_type() {
            findings.push(Diagnostic::warning(
                DiagnosticCode::MalformedValue {
                    expected: self.data_type.as_str().to_string(),
                },
                format!(
                    "{} value does not fit declared type {}",
                    self.value.type_name(),
                    self.data_type
                ),
                subject,
            ));
        }

        if self.data_type.is_coded() {
            if let (Some(table), Some(provider)) = (self.table, tables) {
                if let Some(code) = self.value.code() {
                    if provider.contains(table, code) == Some(false) {
                        findings.push(Diagnostic::warning(
                            DiagnosticCode::UnknownTableValue {
                                table,
                                value: code.to_string(),
                            },
                            format!("'{code}' is not a member of table {table:04}"),
                            subject,
                        ));
                    }
                }
            }
        }

        findings
    }

    fn value_fits_type(&self) -> bool {
        match self.data_type {
            DataType::Nm => match &self.value {
                Value::Number(_) => true,
                Value::Text(s) => Decimal::from_str(s).is_ok(),
                _ => false,
            },
            DataType::Si => match &self.value {
                Value::SequenceId(_) => true,
                Value::Text(s) => s.parse::<u32>().is_ok(),
                _ => false,
            },
            DataType::Dt => match &self.value {
                Value::Date(_) => true,
                Value::Text(s) => V2Date::parse(s).is_ok(),
                _ => false,
            },
            DataType::Tm => match &self.value {
                Value::Time(_) => true,
                Value::Text(s) => V2Time::parse(s).is_ok(),
                _ => false,
            },
            DataType::Dtm => match &self.value {
                Value::Timestamp(_) => true,
                Value::Text(s) => V2Timestamp::parse(s).is_ok(),
                _ => false,
            },
            DataType::Id | DataType::Is | DataType::Cwe => {
                matches!(&self.value, Value::Coded(_) | Value::Text(_))
            }
            // Text-like and composite slots accept anything a caller
            // chooses to store; Varies is unconstrained by definition
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::InMemoryTableProvider;

    #[test]
    fn test_construction_and_raw_access() {
        let mut field = Field::new(DataType::St).with_max_length(20);
        assert!(field.is_empty());
        field.set_value("hello");
        assert_eq!(field.value().as_text().unwrap(), "hello");
    }

    #[test]
    fn test_empty_value_has_no_findings() {
        let field = Field::new(DataType::Nm).with_max_length(3);
        assert!(field.validate("OBX-9", None).is_empty());
    }

    #[test]
    fn test_length_overflow_is_advisory() {
        let mut field = Field::new(DataType::St).with_max_length(4);
        field.set_value("overlong");
        let findings = field.validate("PID-12", None);
        assert_eq!(findings.len(), 1);
        assert!(matches!(
            findings[0].code,
            DiagnosticCode::FieldTooLong { max: 4, actual: 8 }
        ));
        // the value is untouched
        assert_eq!(field.value().as_text().unwrap(), "overlong");
    }

    #[test]
    fn test_numeric_shape_check() {
        let mut field = Field::new(DataType::Nm);
        field.set_value("12.5");
        assert!(field.validate("OBX-9", None).is_empty());

        field.set_value("twelve");
        let findings = field.validate("OBX-9", None);
        assert!(matches!(
            findings[0].code,
            DiagnosticCode::MalformedValue { .. }
        ));
    }

    #[test]
    fn test_table_membership() {
        let provider = InMemoryTableProvider::new();
        let mut field = Field::new(DataType::Is).with_table(1);

        field.set_value(Value::coded("F"));
        assert!(field.validate("PID-8", Some(&provider)).is_empty());

        field.set_value(Value::coded("ZZ"));
        let findings = field.validate("PID-8", Some(&provider));
        assert!(matches!(
            findings[0].code,
            DiagnosticCode::UnknownTableValue { table: 1, .. }
        ));
    }

    #[test]
    fn test_unknown_table_is_not_checked() {
        let provider = InMemoryTableProvider::empty();
        let mut field = Field::new(DataType::Is).with_table(1);
        field.set_value(Value::coded("ZZ"));
        assert!(field.validate("PID-8", Some(&provider)).is_empty());
    }
}
