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

//! Error types for HL7 v2 structure access
//!
//! Access-time failures (unknown names, out-of-range repetitions, type
//! narrowing) surface here as `Hl7v2Error`. Build-time defects in descriptor
//! metadata do not: those accumulate as [`crate::diagnostics::Diagnostics`]
//! and never fail construction.

use thiserror::Error;

/// Result type alias for HL7 v2 model operations
pub type Result<T> = std::result::Result<T, Hl7v2Error>;

/// Comprehensive error type for HL7 v2 model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Hl7v2Error {
    /// A child name not present in the group's descriptor was requested
    #[error("Unknown structure '{name}' in group {group}")]
    UnknownChild {
        /// The requested child name
        name: String,
        /// Name of the group that was asked
        group: String,
    },

    /// A field index outside the segment's registered range was requested
    #[error("Field {index} is out of range for segment {segment} (1..={count})")]
    UnknownField {
        /// Segment code
        segment: String,
        /// The requested 1-based field index
        index: usize,
        /// Number of registered fields
        count: usize,
    },

    /// A repetition more than one past the current count was requested
    #[error("Repetition {requested} of '{name}' is out of range ({count} present)")]
    RepetitionOutOfRange {
        /// Child name or segment-field label
        name: String,
        /// The requested 0-based repetition index
        requested: usize,
        /// Current repetition count
        count: usize,
    },

    /// A second repetition was requested on a non-repeating slot
    #[error("'{name}' does not repeat")]
    NotRepeatable {
        /// Child name or segment-field label
        name: String,
    },

    /// A repeating slot refused to grow past its declared maximum
    #[error("'{name}' allows at most {max} repetitions")]
    RepetitionLimit {
        /// Child name or segment-field label
        name: String,
        /// Declared maximum repetition count
        max: usize,
    },

    /// A non-creating read found an optional structure that was never populated
    #[error("Structure '{name}' is not populated")]
    MissingStructure {
        /// The requested child name
        name: String,
    },

    /// A typed accessor found a different shape than it narrows to
    #[error("Type mismatch: expected {expected}, got {actual}{}", context.as_ref().map(|c| format!(" in {c}")).unwrap_or_default())]
    TypeMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape found
        actual: String,
        /// Additional context about where the mismatch occurred
        context: Option<String>,
    },

    /// A version string did not name a known HL7 v2 release
    #[error("Unknown HL7 version: {version}")]
    UnknownVersion {
        /// The unrecognized version string
        version: String,
    },

    /// A message type string could not be split into code and trigger
    #[error("Malformed message type: '{value}'")]
    MalformedMessageType {
        /// The unparseable input
        value: String,
    },

    /// A registry lookup found no message descriptor for the key
    #[error("Unknown message type {message_type} for version {version}")]
    UnknownMessageType {
        /// Structure id of the requested message type
        message_type: String,
        /// Requested version
        version: String,
    },

    /// A registry lookup found no segment descriptor for the key
    #[error("Unknown segment {code} for version {version}")]
    UnknownSegment {
        /// Requested segment code
        code: String,
        /// Requested version
        version: String,
    },

    /// A date value did not match the HL7 `YYYY[MM[DD]]` shape
    #[error("Malformed date '{value}': {message}")]
    MalformedDate {
        /// The unparseable input
        value: String,
        /// What was wrong with it
        message: String,
    },

    /// A time value did not match the HL7 `HH[MM[SS[.S+]]]` shape
    #[error("Malformed time '{value}': {message}")]
    MalformedTime {
        /// The unparseable input
        value: String,
        /// What was wrong with it
        message: String,
    },

    /// A timestamp value did not match the HL7 DTM shape
    #[error("Malformed timestamp '{value}': {message}")]
    MalformedTimestamp {
        /// The unparseable input
        value: String,
        /// What was wrong with it
        message: String,
    },

    /// A descriptor-set document could not be read at all
    #[error("Invalid descriptor document: {message}")]
    InvalidDescriptor {
        /// Why the document was rejected
        message: String,
    },
}

impl Hl7v2Error {
    /// Create an unknown-child error
    pub fn unknown_child(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self::UnknownChild {
            name: name.into(),
            group: group.into(),
        }
    }

    /// Create an unknown-field error
    pub fn unknown_field(segment: impl Into<String>, index: usize, count: usize) -> Self {
        Self::UnknownField {
            segment: segment.into(),
            index,
            count,
        }
    }

    /// Create a repetition-out-of-range error
    pub fn repetition_out_of_range(name: impl Into<String>, requested: usize, count: usize) -> Self {
        Self::RepetitionOutOfRange {
            name: name.into(),
            requested,
            count,
        }
    }

    /// Create a not-repeatable error
    pub fn not_repeatable(name: impl Into<String>) -> Self {
        Self::NotRepeatable { name: name.into() }
    }

    /// Create a repetition-limit error
    pub fn repetition_limit(name: impl Into<String>, max: usize) -> Self {
        Self::RepetitionLimit {
            name: name.into(),
            max,
        }
    }

    /// Create a missing-structure error
    pub fn missing_structure(name: impl Into<String>) -> Self {
        Self::MissingStructure { name: name.into() }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            context: None,
        }
    }

    /// Create a type-mismatch error with context
    pub fn type_mismatch_with_context(
        expected: impl Into<String>,
        actual: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            context: Some(context.into()),
        }
    }

    /// Create an unknown-version error
    pub fn unknown_version(version: impl Into<String>) -> Self {
        Self::UnknownVersion {
            version: version.into(),
        }
    }

    /// Create a malformed-date error
    pub fn malformed_date(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDate {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-time error
    pub fn malformed_time(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedTime {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-timestamp error
    pub fn malformed_timestamp(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-descriptor error
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the structure-access family
    /// (as opposed to registry lookups or value parsing)
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownChild { .. }
                | Self::UnknownField { .. }
                | Self::RepetitionOutOfRange { .. }
                | Self::NotRepeatable { .. }
                | Self::RepetitionLimit { .. }
                | Self::MissingStructure { .. }
        )
    }
}
