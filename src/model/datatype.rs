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

//! HL7 v2 data-type tags
//!
//! The tag set a field descriptor can declare. This is the subset of the v2
//! data-type catalogue the generic model distinguishes; everything else is a
//! composite of these or plain text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data-type tags for field slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    /// String data
    St,
    /// Text data
    Tx,
    /// Formatted text data
    Ft,
    /// Numeric
    Nm,
    /// Sequence ID
    Si,
    /// Coded value for HL7-defined tables
    Id,
    /// Coded value for user-defined tables
    Is,
    /// Date
    Dt,
    /// Time
    Tm,
    /// Date/time
    Dtm,
    /// Coded with exceptions
    Cwe,
    /// Extended person name
    Xpn,
    /// Extended address
    Xad,
    /// Extended telecommunication number
    Xtn,
    /// Extended composite ID number and name for persons
    Xcn,
    /// Extended composite ID with check digit
    Cx,
    /// Hierarchic designator
    Hd,
    /// Person location
    Pl,
    /// Entity identifier
    Ei,
    /// Message type
    Msg,
    /// Version identifier
    Vid,
    /// Processing type
    Pt,
    /// Variable type resolved at runtime (OBX-5 style)
    #[serde(rename = "Varies")]
    Varies,
}

impl DataType {
    /// The conventional upper-case tag, e.g. `CWE`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::St => "ST",
            Self::Tx => "TX",
            Self::Ft => "FT",
            Self::Nm => "NM",
            Self::Si => "SI",
            Self::Id => "ID",
            Self::Is => "IS",
            Self::Dt => "DT",
            Self::Tm => "TM",
            Self::Dtm => "DTM",
            Self::Cwe => "CWE",
            Self::Xpn => "XPN",
            Self::Xad => "XAD",
            Self::Xtn => "XTN",
            Self::Xcn => "XCN",
            Self::Cx => "CX",
            Self::Hd => "HD",
            Self::Pl => "PL",
            Self::Ei => "EI",
            Self::Msg => "MSG",
            Self::Vid => "VID",
            Self::Pt => "PT",
            Self::Varies => "Varies",
        }
    }

    /// Whether this tag names a single-component type
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::St
                | Self::Tx
                | Self::Ft
                | Self::Nm
                | Self::Si
                | Self::Id
                | Self::Is
                | Self::Dt
                | Self::Tm
                | Self::Dtm
        )
    }

    /// Whether values of this type are drawn from a code table
    pub fn is_coded(&self) -> bool {
        matches!(self, Self::Id | Self::Is | Self::Cwe)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(DataType::Nm.is_primitive());
        assert!(!DataType::Cwe.is_primitive());
        assert!(DataType::Id.is_coded());
        assert!(DataType::Is.is_coded());
        assert!(DataType::Cwe.is_coded());
        assert!(!DataType::St.is_coded());
    }

    #[test]
    fn test_serde_tag_round_trip() {
        let json = serde_json::to_string(&DataType::Dtm).unwrap();
        assert_eq!(json, "\"DTM\"");
        let back: DataType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DataType::Dtm);
    }
}
