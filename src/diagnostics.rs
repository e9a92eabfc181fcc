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

//! Out-of-band reporting for descriptor defects and advisory validation
//!
//! Descriptor construction never fails: invalid metadata is skipped and the
//! defect recorded here. Field validation is advisory and reports through the
//! same types. Anything that should stop a caller goes through
//! [`crate::error::Hl7v2Error`] instead.

use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Severity {
    /// Information - worth knowing, nothing to fix
    #[default]
    Info,
    /// Warning - suspicious content that does not block use
    Warning,
    /// Error - a defect; the offending entry was skipped or the value is unusable
    Error,
}

/// Diagnostic codes for descriptor defects and advisory validation findings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum DiagnosticCode {
    // Descriptor construction
    /// A field or child was declared with a name already taken in the same structure
    DuplicateName(String),
    /// A field or child was declared with an empty name
    EmptyName,
    /// A segment was built with no fields at all
    NoFields,
    /// A group was built with no children at all
    NoChildren,
    /// A descriptor-set entry referenced a segment code that resolves nowhere
    UnresolvedSegment(String),
    /// A descriptor-set child entry declared neither a segment nor a group shape
    MissingShape,

    // Advisory field validation
    /// A rendered field value exceeds the declared maximum length
    FieldTooLong {
        /// Declared maximum length
        max: u32,
        /// Rendered length found
        actual: usize,
    },
    /// A field value does not fit the declared data type's shape
    MalformedValue {
        /// The declared data-type tag
        expected: String,
    },
    /// A coded field holds a value not present in its code table
    UnknownTableValue {
        /// HL7 table number
        table: u16,
        /// The offending value
        value: String,
    },
    /// A required field holds no value
    RequiredFieldEmpty,

    /// Custom code for downstream consumers
    Custom(String),
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// What kind of problem was found
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// What the diagnostic is about, e.g. `PID`, `PID-3`, `ORU_R01/PATIENT_RESULT`
    pub subject: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            subject: subject.into(),
        }
    }

    /// Create an error-severity diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>, subject: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message, subject)
    }

    /// Create a warning-severity diagnostic
    pub fn warning(
        code: DiagnosticCode,
        message: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self::new(code, Severity::Warning, message, subject)
    }

    /// Check if this diagnostic is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity}[{}]: {}", self.subject, self.message)
    }
}

/// An ordered accumulation of diagnostics
///
/// Returned alongside built descriptors and from tree validation. Error
/// entries are also emitted through the `log` facade at the point they are
/// recorded, so defects remain visible even when the caller discards the
/// collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record one diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            log::warn!("{diagnostic}");
        }
        self.0.push(diagnostic);
    }

    /// Absorb another collection, preserving order
    pub fn merge(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any error-severity diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Iterate over recorded diagnostics in order
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Borrow the recorded diagnostics as a slice
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
