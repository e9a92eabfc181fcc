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

//! Static structure metadata: what a segment/group/message is made of
//!
//! Descriptors are immutable after construction and shared via `Arc`; the
//! runtime tree in [`crate::model`] walks them for every access. Builders
//! never fail: invalid entries are skipped and recorded in the returned
//! [`Diagnostics`], so a defective declaration degrades to a smaller
//! descriptor instead of failing the caller.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::model::datatype::DataType;
use crate::version::{MessageType, V2Version};

/// Metadata for one field slot of a segment
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// 1-based HL7 field position
    pub index: usize,
    /// Field name, unique within the segment
    pub name: String,
    /// Declared data type
    pub data_type: DataType,
    /// Whether one repetition is created eagerly at segment construction
    pub required: bool,
    /// Whether more than one repetition is allowed
    pub repeating: bool,
    /// Upper bound on repetitions, when `repeating` and bounded
    pub max_repetitions: Option<usize>,
    /// Maximum rendered length, advisory
    pub max_length: Option<u32>,
    /// HL7 code table for coded types
    pub table: Option<u16>,
}

/// Declaration of one field, fed to [`SegmentBuilder::field`]
///
/// The field index is assigned by declaration order, starting at 1.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    data_type: DataType,
    required: bool,
    repeating: bool,
    max_repetitions: Option<usize>,
    max_length: Option<u32>,
    table: Option<u16>,
}

impl FieldDef {
    /// Declare an optional, non-repeating field
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            required: false,
            repeating: false,
            max_repetitions: None,
            max_length: None,
            table: None,
        }
    }

    /// Mark the field required: one empty repetition exists from construction
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allow unbounded repetitions
    pub fn repeating(mut self) -> Self {
        self.repeating = true;
        self
    }

    /// Allow up to `max` repetitions
    pub fn max_repetitions(mut self, max: usize) -> Self {
        self.repeating = true;
        self.max_repetitions = Some(max);
        self
    }

    /// Declare the maximum rendered length
    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Bind coded values to an HL7 table
    pub fn table(mut self, table: u16) -> Self {
        self.table = Some(table);
        self
    }
}

/// Immutable metadata for one segment type
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDescriptor {
    code: String,
    fields: Vec<FieldDescriptor>,
    by_name: IndexMap<String, usize>,
}

impl SegmentDescriptor {
    /// The segment code, e.g. `PID`
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of registered fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field metadata by 1-based index
    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        index.checked_sub(1).and_then(|i| self.fields.get(i))
    }

    /// Field metadata by name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// All fields in index order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }
}

/// Builder for [`SegmentDescriptor`]; see module docs for the defect policy
#[derive(Debug)]
pub struct SegmentBuilder {
    code: String,
    defs: Vec<FieldDef>,
}

impl SegmentBuilder {
    /// Start a segment descriptor for the given code
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            defs: Vec::new(),
        }
    }

    /// Declare the next field; its index is the declaration position
    pub fn field(mut self, def: FieldDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Build the descriptor; always succeeds, defects land in the diagnostics
    pub fn build(self) -> (Arc<SegmentDescriptor>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut fields = Vec::with_capacity(self.defs.len());
        let mut by_name = IndexMap::new();

        for def in self.defs {
            if def.name.is_empty() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::EmptyName,
                    "field declared with an empty name",
                    &self.code,
                ));
                continue;
            }
            if by_name.contains_key(&def.name) {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::DuplicateName(def.name.clone()),
                    format!("field '{}' is already declared", def.name),
                    &self.code,
                ));
                continue;
            }
            let index = fields.len() + 1;
            by_name.insert(def.name.clone(), fields.len());
            fields.push(FieldDescriptor {
                index,
                name: def.name,
                data_type: def.data_type,
                required: def.required,
                repeating: def.repeating,
                max_repetitions: def.max_repetitions,
                max_length: def.max_length,
                table: def.table,
            });
        }

        if fields.is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::NoFields,
                format!("segment {} has no fields", self.code),
                &self.code,
            ));
        }

        (
            Arc::new(SegmentDescriptor {
                code: self.code,
                fields,
                by_name,
            }),
            diagnostics,
        )
    }
}

/// What kind of structure a group child is
#[derive(Debug, Clone)]
pub enum ChildShape {
    /// A leaf segment
    Segment(Arc<SegmentDescriptor>),
    /// A nested group
    Group(Arc<GroupDescriptor>),
}

impl ChildShape {
    /// The conventional name of the shape: segment code or group name
    pub fn default_name(&self) -> &str {
        match self {
            Self::Segment(segment) => segment.code(),
            Self::Group(group) => group.name(),
        }
    }
}

/// Metadata for one child slot of a group
#[derive(Debug, Clone)]
pub struct ChildDescriptor {
    /// The name this child is addressed by, unique within the group
    pub name: String,
    /// Whether one instance is created eagerly at group construction
    pub required: bool,
    /// Whether more than one repetition is allowed
    pub repeating: bool,
    /// Segment or nested group
    pub shape: ChildShape,
}

/// Declaration of one group child, fed to [`GroupBuilder::child`]
#[derive(Debug, Clone)]
pub struct ChildDef {
    name: Option<String>,
    required: bool,
    repeating: bool,
    shape: ChildShape,
}

impl ChildDef {
    /// Declare an optional, non-repeating segment child
    pub fn segment(descriptor: &Arc<SegmentDescriptor>) -> Self {
        Self {
            name: None,
            required: false,
            repeating: false,
            shape: ChildShape::Segment(descriptor.clone()),
        }
    }

    /// Declare an optional, non-repeating nested-group child
    pub fn group(descriptor: &Arc<GroupDescriptor>) -> Self {
        Self {
            name: None,
            required: false,
            repeating: false,
            shape: ChildShape::Group(descriptor.clone()),
        }
    }

    /// Address the child by an explicit alias instead of its conventional
    /// name; needed when the same segment type appears twice in one group
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the child required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allow repetitions
    pub fn repeating(mut self) -> Self {
        self.repeating = true;
        self
    }
}

/// Immutable metadata for one group type
#[derive(Debug, Clone)]
pub struct GroupDescriptor {
    name: String,
    children: Vec<ChildDescriptor>,
    by_name: IndexMap<String, usize>,
}

impl GroupDescriptor {
    /// The group name, e.g. `PATIENT_RESULT`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Position of a child in declaration order
    pub fn child_position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Child metadata by name
    pub fn child(&self, name: &str) -> Option<&ChildDescriptor> {
        self.child_position(name).map(|i| &self.children[i])
    }

    /// Child metadata by declaration position
    pub fn child_at(&self, position: usize) -> Option<&ChildDescriptor> {
        self.children.get(position)
    }

    /// All children in declaration order
    pub fn children(&self) -> impl Iterator<Item = &ChildDescriptor> {
        self.children.iter()
    }
}

/// Builder for [`GroupDescriptor`]; same defect policy as [`SegmentBuilder`]
#[derive(Debug)]
pub struct GroupBuilder {
    name: String,
    defs: Vec<ChildDef>,
}

impl GroupBuilder {
    /// Start a group descriptor with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defs: Vec::new(),
        }
    }

    /// Declare the next child, in order
    pub fn child(mut self, def: ChildDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Build the descriptor; always succeeds, defects land in the diagnostics
    pub fn build(self) -> (Arc<GroupDescriptor>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut children = Vec::with_capacity(self.defs.len());
        let mut by_name = IndexMap::new();

        for def in self.defs {
            let name = def
                .name
                .unwrap_or_else(|| def.shape.default_name().to_string());
            if name.is_empty() {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::EmptyName,
                    "child declared with an empty name",
                    &self.name,
                ));
                continue;
            }
            if by_name.contains_key(&name) {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::DuplicateName(name.clone()),
                    format!("child '{name}' is already declared"),
                    &self.name,
                ));
                continue;
            }
            by_name.insert(name.clone(), children.len());
            children.push(ChildDescriptor {
                name,
                required: def.required,
                repeating: def.repeating,
                shape: def.shape,
            });
        }

        if children.is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::NoChildren,
                format!("group {} has no children", self.name),
                &self.name,
            ));
        }

        (
            Arc::new(GroupDescriptor {
                name: self.name,
                children,
                by_name,
            }),
            diagnostics,
        )
    }
}

/// Immutable metadata for one message structure
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    message_type: MessageType,
    version: V2Version,
    root: Arc<GroupDescriptor>,
}

impl MessageDescriptor {
    /// The message type this descriptor governs
    pub fn message_type(&self) -> &MessageType {
        &self.message_type
    }

    /// The HL7 version this descriptor belongs to
    pub fn version(&self) -> V2Version {
        self.version
    }

    /// The root group descriptor
    pub fn root(&self) -> &Arc<GroupDescriptor> {
        &self.root
    }
}

/// Builder for [`MessageDescriptor`]: a named root group plus identity
#[derive(Debug)]
pub struct MessageBuilder {
    message_type: MessageType,
    version: V2Version,
    root: GroupBuilder,
}

impl MessageBuilder {
    /// Start a message descriptor; the root group is named after the
    /// structure id (e.g. `ADT_A01`)
    pub fn new(version: V2Version, message_type: MessageType) -> Self {
        let root = GroupBuilder::new(message_type.structure_id());
        Self {
            message_type,
            version,
            root,
        }
    }

    /// Declare the next top-level child, in order
    pub fn child(mut self, def: ChildDef) -> Self {
        self.root = self.root.child(def);
        self
    }

    /// Build the descriptor; always succeeds, defects land in the diagnostics
    pub fn build(self) -> (Arc<MessageDescriptor>, Diagnostics) {
        let (root, diagnostics) = self.root.build();
        (
            Arc::new(MessageDescriptor {
                message_type: self.message_type,
                version: self.version,
                root,
            }),
            diagnostics,
        )
    }
}
