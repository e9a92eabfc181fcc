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

//! Descriptor registry: which structures exist for which HL7 version
//!
//! The registry is configuration, not message state: it is the one
//! shareable, lock-guarded piece of the crate. Descriptor sets can be
//! registered programmatically through the builders or loaded from a JSON
//! document; loading follows the same defect policy as the builders —
//! take what is usable, report the rest as diagnostics.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::descriptor::{
    ChildDef, FieldDef, GroupBuilder, GroupDescriptor, MessageBuilder, MessageDescriptor,
    SegmentBuilder, SegmentDescriptor,
};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::error::{Hl7v2Error, Result};
use crate::model::datatype::DataType;
use crate::version::{MessageType, V2Version};

/// Keyed store of segment and message descriptors, per HL7 version
///
/// Registration of an existing key replaces the previous descriptor
/// (latest wins). Lookups hand out `Arc` clones; descriptors themselves
/// are immutable.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    segments: RwLock<FxHashMap<(V2Version, String), Arc<SegmentDescriptor>>>,
    messages: RwLock<FxHashMap<(V2Version, String), Arc<MessageDescriptor>>>,
}

impl DescriptorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a segment descriptor for a version
    pub fn register_segment(&self, version: V2Version, descriptor: Arc<SegmentDescriptor>) {
        self.segments
            .write()
            .insert((version, descriptor.code().to_string()), descriptor);
    }

    /// Register a message descriptor under its own version and type
    pub fn register_message(&self, descriptor: Arc<MessageDescriptor>) {
        let key = (
            descriptor.version(),
            descriptor.message_type().structure_id(),
        );
        self.messages.write().insert(key, descriptor);
    }

    /// Look up a segment descriptor
    pub fn segment(&self, version: V2Version, code: &str) -> Result<Arc<SegmentDescriptor>> {
        self.segments
            .read()
            .get(&(version, code.to_string()))
            .cloned()
            .ok_or_else(|| Hl7v2Error::UnknownSegment {
                code: code.to_string(),
                version: version.to_string(),
            })
    }

    /// Look up a message descriptor
    pub fn message(
        &self,
        version: V2Version,
        message_type: &MessageType,
    ) -> Result<Arc<MessageDescriptor>> {
        self.messages
            .read()
            .get(&(version, message_type.structure_id()))
            .cloned()
            .ok_or_else(|| Hl7v2Error::UnknownMessageType {
                message_type: message_type.structure_id(),
                version: version.to_string(),
            })
    }

    /// Segment codes registered for a version, sorted
    pub fn segment_codes(&self, version: V2Version) -> Vec<String> {
        let mut codes: Vec<String> = self
            .segments
            .read()
            .keys()
            .filter(|(v, _)| *v == version)
            .map(|(_, code)| code.clone())
            .collect();
        codes.sort();
        codes
    }

    /// Message types registered for a version, sorted by structure id
    pub fn message_types(&self, version: V2Version) -> Vec<MessageType> {
        let mut types: Vec<MessageType> = self
            .messages
            .read()
            .values()
            .filter(|d| d.version() == version)
            .map(|d| d.message_type().clone())
            .collect();
        types.sort_by_key(MessageType::structure_id);
        types
    }

    /// Load a JSON descriptor-set document, registering its segments and
    /// messages
    ///
    /// An unreadable document is a hard error; a readable document with
    /// defective entries registers what is usable and reports the rest in
    /// the returned diagnostics.
    pub fn load_json(&self, json: &str) -> Result<Diagnostics> {
        let doc: DescriptorSetDoc = serde_json::from_str(json)
            .map_err(|e| Hl7v2Error::invalid_descriptor(e.to_string()))?;
        let mut diagnostics = Diagnostics::new();
        let version = doc.version;

        for segment in doc.segments {
            let mut builder = SegmentBuilder::new(&segment.code);
            for field in segment.fields {
                builder = builder.field(field.into_def());
            }
            let (descriptor, segment_diagnostics) = builder.build();
            diagnostics.merge(segment_diagnostics);
            self.register_segment(version, descriptor);
        }

        for message in doc.messages {
            let message_type = MessageType::new(&message.code, &message.trigger);
            let subject = message_type.structure_id();
            let defs = self.resolve_children(version, &subject, message.children, &mut diagnostics);
            let mut builder = MessageBuilder::new(version, message_type);
            for def in defs {
                builder = builder.child(def);
            }
            let (descriptor, message_diagnostics) = builder.build();
            diagnostics.merge(message_diagnostics);
            self.register_message(descriptor);
        }

        Ok(diagnostics)
    }

    fn resolve_children(
        &self,
        version: V2Version,
        subject: &str,
        children: Vec<ChildDoc>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ChildDef> {
        let mut defs = Vec::with_capacity(children.len());
        for child in children {
            let def = match (child.segment, child.group) {
                (Some(code), None) => match self.segment(version, &code) {
                    Ok(descriptor) => ChildDef::segment(&descriptor),
                    Err(_) => {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticCode::UnresolvedSegment(code.clone()),
                            format!("segment '{code}' is not registered for version {version}"),
                            subject,
                        ));
                        continue;
                    }
                },
                (None, Some(group)) => {
                    let descriptor = self.build_group(version, group, diagnostics);
                    ChildDef::group(&descriptor)
                }
                _ => {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticCode::MissingShape,
                        "child must declare exactly one of 'segment' or 'group'",
                        subject,
                    ));
                    continue;
                }
            };
            let mut def = def;
            if let Some(name) = child.name {
                def = def.named(name);
            }
            if child.required {
                def = def.required();
            }
            if child.repeating {
                def = def.repeating();
            }
            defs.push(def);
        }
        defs
    }

    fn build_group(
        &self,
        version: V2Version,
        doc: GroupDoc,
        diagnostics: &mut Diagnostics,
    ) -> Arc<GroupDescriptor> {
        let name = doc.name.clone();
        let defs = self.resolve_children(version, &name, doc.children, diagnostics);
        let mut builder = GroupBuilder::new(name);
        for def in defs {
            builder = builder.child(def);
        }
        let (descriptor, group_diagnostics) = builder.build();
        diagnostics.merge(group_diagnostics);
        descriptor
    }
}

/// Top-level JSON descriptor-set document
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DescriptorSetDoc {
    version: V2Version,
    #[serde(default)]
    segments: Vec<SegmentDoc>,
    #[serde(default)]
    messages: Vec<MessageDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SegmentDoc {
    code: String,
    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldDoc {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    repeating: bool,
    #[serde(default)]
    max_repetitions: Option<usize>,
    #[serde(default)]
    max_length: Option<u32>,
    #[serde(default)]
    table: Option<u16>,
}

impl FieldDoc {
    fn into_def(self) -> FieldDef {
        let mut def = FieldDef::new(self.name, self.data_type);
        if self.required {
            def = def.required();
        }
        if self.repeating {
            def = def.repeating();
        }
        if let Some(max) = self.max_repetitions {
            def = def.max_repetitions(max);
        }
        if let Some(max) = self.max_length {
            def = def.max_length(max);
        }
        if let Some(table) = self.table {
            def = def.table(table);
        }
        def
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MessageDoc {
    code: String,
    trigger: String,
    #[serde(default)]
    children: Vec<ChildDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ChildDoc {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    repeating: bool,
    #[serde(default)]
    segment: Option<String>,
    #[serde(default)]
    group: Option<GroupDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct GroupDoc {
    name: String,
    #[serde(default)]
    children: Vec<ChildDoc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDef;

    fn registry_with_zpv() -> DescriptorRegistry {
        let registry = DescriptorRegistry::new();
        let (segment, _) = SegmentBuilder::new("ZPV")
            .field(FieldDef::new("Visit Note", DataType::St))
            .build();
        registry.register_segment(V2Version::V2_5, segment);
        registry
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = registry_with_zpv();
        let segment = registry.segment(V2Version::V2_5, "ZPV").unwrap();
        assert_eq!(segment.code(), "ZPV");
        assert!(matches!(
            registry.segment(V2Version::V2_4, "ZPV"),
            Err(Hl7v2Error::UnknownSegment { .. })
        ));
        assert!(matches!(
            registry.message(V2Version::V2_5, &MessageType::new("ADT", "A01")),
            Err(Hl7v2Error::UnknownMessageType { .. })
        ));
    }

    #[test]
    fn test_latest_registration_wins() {
        let registry = registry_with_zpv();
        let (replacement, _) = SegmentBuilder::new("ZPV")
            .field(FieldDef::new("Visit Note", DataType::St))
            .field(FieldDef::new("Visit Flag", DataType::Id))
            .build();
        registry.register_segment(V2Version::V2_5, replacement);
        assert_eq!(
            registry.segment(V2Version::V2_5, "ZPV").unwrap().field_count(),
            2
        );
    }

    #[test]
    fn test_load_json_round_trip() {
        let registry = DescriptorRegistry::new();
        let diagnostics = registry
            .load_json(
                r#"{
                    "version": "2.5",
                    "segments": [
                        {
                            "code": "ZAL",
                            "fields": [
                                {"name": "Set ID", "type": "SI", "required": true},
                                {"name": "Allergy Code", "type": "CWE", "repeating": true, "table": 127},
                                {"name": "Onset Date", "type": "DT", "maxLength": 8}
                            ]
                        }
                    ],
                    "messages": [
                        {
                            "code": "ZAU",
                            "trigger": "Z01",
                            "children": [
                                {"segment": "ZAL", "required": true, "repeating": true}
                            ]
                        }
                    ]
                }"#,
            )
            .unwrap();
        assert!(diagnostics.is_empty());

        let segment = registry.segment(V2Version::V2_5, "ZAL").unwrap();
        assert_eq!(segment.field_count(), 3);
        assert_eq!(segment.field(2).unwrap().table, Some(127));

        let message = registry
            .message(V2Version::V2_5, &MessageType::new("ZAU", "Z01"))
            .unwrap();
        assert_eq!(message.root().child_count(), 1);
        assert!(message.root().child("ZAL").unwrap().repeating);
    }

    #[test]
    fn test_load_json_unresolved_segment_degrades() {
        let registry = DescriptorRegistry::new();
        let diagnostics = registry
            .load_json(
                r#"{
                    "version": "2.5",
                    "messages": [
                        {
                            "code": "ZAU",
                            "trigger": "Z02",
                            "children": [{"segment": "NOPE", "required": true}]
                        }
                    ]
                }"#,
            )
            .unwrap();
        assert!(diagnostics.has_errors());
        // the message registered anyway, minus the unresolvable child
        let message = registry
            .message(V2Version::V2_5, &MessageType::new("ZAU", "Z02"))
            .unwrap();
        assert_eq!(message.root().child_count(), 0);
    }

    #[test]
    fn test_load_json_rejects_garbage() {
        let registry = DescriptorRegistry::new();
        assert!(matches!(
            registry.load_json("not json at all"),
            Err(Hl7v2Error::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_listing() {
        let registry = registry_with_zpv();
        assert_eq!(registry.segment_codes(V2Version::V2_5), vec!["ZPV"]);
        assert!(registry.segment_codes(V2Version::V2_4).is_empty());
        assert!(registry.message_types(V2Version::V2_5).is_empty());
    }
}
