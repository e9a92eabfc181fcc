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

//! HL7 v2 release versions and message-type identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Hl7v2Error, Result};

/// HL7 v2.x release versions, ordered by release date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum V2Version {
    /// HL7 v2.1
    #[serde(rename = "2.1")]
    V2_1,
    /// HL7 v2.2
    #[serde(rename = "2.2")]
    V2_2,
    /// HL7 v2.3
    #[serde(rename = "2.3")]
    V2_3,
    /// HL7 v2.3.1
    #[serde(rename = "2.3.1")]
    V2_3_1,
    /// HL7 v2.4
    #[serde(rename = "2.4")]
    V2_4,
    /// HL7 v2.5
    #[serde(rename = "2.5")]
    V2_5,
    /// HL7 v2.5.1
    #[serde(rename = "2.5.1")]
    V2_5_1,
    /// HL7 v2.6
    #[serde(rename = "2.6")]
    V2_6,
    /// HL7 v2.7
    #[serde(rename = "2.7")]
    V2_7,
    /// HL7 v2.7.1
    #[serde(rename = "2.7.1")]
    V2_7_1,
    /// HL7 v2.8
    #[serde(rename = "2.8")]
    V2_8,
    /// HL7 v2.8.1
    #[serde(rename = "2.8.1")]
    V2_8_1,
}

impl V2Version {
    /// All known versions, oldest first
    pub const ALL: [V2Version; 12] = [
        V2Version::V2_1,
        V2Version::V2_2,
        V2Version::V2_3,
        V2Version::V2_3_1,
        V2Version::V2_4,
        V2Version::V2_5,
        V2Version::V2_5_1,
        V2Version::V2_6,
        V2Version::V2_7,
        V2Version::V2_7_1,
        V2Version::V2_8,
        V2Version::V2_8_1,
    ];

    /// The version string as carried in MSH-12
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2_1 => "2.1",
            Self::V2_2 => "2.2",
            Self::V2_3 => "2.3",
            Self::V2_3_1 => "2.3.1",
            Self::V2_4 => "2.4",
            Self::V2_5 => "2.5",
            Self::V2_5_1 => "2.5.1",
            Self::V2_6 => "2.6",
            Self::V2_7 => "2.7",
            Self::V2_7_1 => "2.7.1",
            Self::V2_8 => "2.8",
            Self::V2_8_1 => "2.8.1",
        }
    }
}

impl fmt::Display for V2Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for V2Version {
    type Err = Hl7v2Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| Hl7v2Error::unknown_version(s))
    }
}

/// Message code plus trigger event, e.g. `ADT^A01`
///
/// Identifies which message descriptor governs a [`crate::model::Message`].
/// Displays in wire form (`ADT^A01`); [`MessageType::structure_id`] gives the
/// conventional structure id (`ADT_A01`) used as registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageType {
    /// Message code (MSH-9.1), e.g. `ADT`
    pub code: String,
    /// Trigger event (MSH-9.2), e.g. `A01`
    pub trigger: String,
}

impl MessageType {
    /// Create a new message type
    pub fn new(code: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            trigger: trigger.into(),
        }
    }

    /// The conventional structure id, e.g. `ADT_A01`
    pub fn structure_id(&self) -> String {
        format!("{}_{}", self.code, self.trigger)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}^{}", self.code, self.trigger)
    }
}

impl FromStr for MessageType {
    type Err = Hl7v2Error;

    /// Accepts both the wire form `ADT^A01` and the structure id `ADT_A01`
    fn from_str(s: &str) -> Result<Self> {
        let (code, trigger) = s
            .split_once('^')
            .or_else(|| s.split_once('_'))
            .ok_or_else(|| Hl7v2Error::MalformedMessageType {
                value: s.to_string(),
            })?;
        if code.is_empty() || trigger.is_empty() {
            return Err(Hl7v2Error::MalformedMessageType {
                value: s.to_string(),
            });
        }
        Ok(Self::new(code, trigger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_round_trip() {
        for version in V2Version::ALL {
            assert_eq!(version.as_str().parse::<V2Version>(), Ok(version));
        }
    }

    #[test]
    fn test_version_ordering() {
        assert!(V2Version::V2_1 < V2Version::V2_3_1);
        assert!(V2Version::V2_5_1 < V2Version::V2_6);
        assert!(V2Version::V2_8 < V2Version::V2_8_1);
    }

    #[test]
    fn test_unknown_version() {
        let err = "3.0".parse::<V2Version>().unwrap_err();
        assert!(matches!(err, Hl7v2Error::UnknownVersion { .. }));
    }

    #[test]
    fn test_message_type_forms() {
        let from_wire: MessageType = "ORU^R01".parse().unwrap();
        let from_id: MessageType = "ORU_R01".parse().unwrap();
        assert_eq!(from_wire, from_id);
        assert_eq!(from_wire.structure_id(), "ORU_R01");
        assert_eq!(from_wire.to_string(), "ORU^R01");
    }

    #[test]
    fn test_malformed_message_type() {
        assert!("ADT".parse::<MessageType>().is_err());
        assert!("^A01".parse::<MessageType>().is_err());
        assert!("ADT^".parse::<MessageType>().is_err());
    }
}
