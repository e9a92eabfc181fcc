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

//! Code-table lookups for coded field values
//!
//! HL7 tables (0001 Administrative Sex, 0003 Event Type, …) live outside this
//! model; validation reaches them through the [`CodeTableProvider`] trait.
//! The in-memory implementation covers tests and small deployments.

use indexmap::{IndexMap, IndexSet};

/// External collaborator resolving HL7 table membership
///
/// Implementations may back onto a terminology service, a database, or plain
/// in-memory data. A provider that does not know a table answers `None`,
/// which validation treats as "cannot check" rather than "invalid".
pub trait CodeTableProvider {
    /// Whether the provider knows the given table at all
    fn knows_table(&self, table: u16) -> bool;

    /// Whether `value` is a member of `table`; `None` when the table is unknown
    fn contains(&self, table: u16, value: &str) -> Option<bool>;
}

/// In-memory code tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableProvider {
    tables: IndexMap<u16, IndexSet<String>>,
}

impl InMemoryTableProvider {
    /// Create an empty provider with no tables
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a provider pre-loaded with a handful of well-known tables
    pub fn new() -> Self {
        let mut provider = Self::default();
        provider.initialize_standard_tables();
        provider
    }

    /// Register or extend a table
    pub fn add_table<I, S>(&mut self, table: u16, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .entry(table)
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Table numbers known to this provider, in registration order
    pub fn table_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.tables.keys().copied()
    }

    fn initialize_standard_tables(&mut self) {
        // 0001 Administrative Sex
        self.add_table(1, ["A", "F", "M", "N", "O", "U"]);
        // 0003 Event Type (admission/visit subset)
        self.add_table(3, ["A01", "A02", "A03", "A04", "A08", "R01"]);
        // 0004 Patient Class
        self.add_table(4, ["B", "C", "E", "I", "N", "O", "P", "R", "U"]);
        // 0085 Observation Result Status
        self.add_table(85, ["C", "D", "F", "I", "N", "O", "P", "R", "S", "U", "W", "X"]);
        // 0125 Value Type (common subset)
        self.add_table(125, ["CWE", "DT", "DTM", "FT", "NM", "SN", "ST", "TM", "TX"]);
    }
}

impl CodeTableProvider for InMemoryTableProvider {
    fn knows_table(&self, table: u16) -> bool {
        self.tables.contains_key(&table)
    }

    fn contains(&self, table: u16, value: &str) -> Option<bool> {
        self.tables.get(&table).map(|values| values.contains(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables() {
        let provider = InMemoryTableProvider::new();
        assert!(provider.knows_table(1));
        assert_eq!(provider.contains(1, "F"), Some(true));
        assert_eq!(provider.contains(1, "ZZ"), Some(false));
    }

    #[test]
    fn test_unknown_table() {
        let provider = InMemoryTableProvider::empty();
        assert!(!provider.knows_table(1));
        assert_eq!(provider.contains(1, "F"), None);
    }

    #[test]
    fn test_add_table_extends() {
        let mut provider = InMemoryTableProvider::empty();
        provider.add_table(9999, ["X"]);
        provider.add_table(9999, ["Y"]);
        assert_eq!(provider.contains(9999, "X"), Some(true));
        assert_eq!(provider.contains(9999, "Y"), Some(true));
    }
}
