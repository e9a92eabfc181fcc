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

//! Built-in descriptor sets
//!
//! A curated catalogue of common segments and message structures, built
//! through the same builders any caller would use. The
//! [`standard_registry`] serves them process-wide; callers needing local
//! or site-specific structures should use their own
//! [`DescriptorRegistry`].

pub mod v2_5;

use once_cell::sync::Lazy;

use crate::registry::DescriptorRegistry;

static STANDARD_REGISTRY: Lazy<DescriptorRegistry> = Lazy::new(|| {
    let registry = DescriptorRegistry::new();
    v2_5::register(&registry);
    registry
});

/// The shared registry pre-loaded with the built-in descriptor sets
pub fn standard_registry() -> &'static DescriptorRegistry {
    &STANDARD_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{MessageType, V2Version};

    #[test]
    fn test_standard_registry_serves_builtins() {
        let registry = standard_registry();
        assert!(registry.segment(V2Version::V2_5, "PID").is_ok());
        assert!(registry
            .message(V2Version::V2_5, &MessageType::new("ADT", "A01"))
            .is_ok());
        assert!(registry
            .message(V2Version::V2_5, &MessageType::new("ORU", "R01"))
            .is_ok());
    }

    #[test]
    fn test_builtins_absent_for_other_versions() {
        let registry = standard_registry();
        assert!(registry.segment(V2Version::V2_3, "PID").is_err());
    }
}
