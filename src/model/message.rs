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

//! The message root
//!
//! A message is the root group of one HL7 transaction plus the identity
//! every node needs for context lookups: version and message type. The
//! identity travels as a shared [`MessageContext`] handed to each node at
//! creation, so any segment or group can answer "which message am I part
//! of" without a parent pointer. Dropping the message drops the whole tree.

use std::sync::Arc;

use super::group::{Group, Repetitions, Structure};
use super::segment::Segment;
use crate::descriptor::MessageDescriptor;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::registry::DescriptorRegistry;
use crate::tables::CodeTableProvider;
use crate::version::{MessageType, V2Version};

/// Identity shared by every node of one message tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    version: V2Version,
    message_type: MessageType,
}

impl MessageContext {
    /// Create a context for one message
    pub fn new(version: V2Version, message_type: MessageType) -> Self {
        Self {
            version,
            message_type,
        }
    }

    /// The HL7 version the message conforms to
    pub fn version(&self) -> V2Version {
        self.version
    }

    /// The message type the message carries
    pub fn message_type(&self) -> &MessageType {
        &self.message_type
    }
}

/// One HL7 transaction: the root of a structure tree
#[derive(Debug, Clone)]
pub struct Message {
    descriptor: Arc<MessageDescriptor>,
    context: Arc<MessageContext>,
    root: Group,
}

impl Message {
    /// Build an empty message from a descriptor; required structures exist
    /// immediately, recursively
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        let context = Arc::new(MessageContext::new(
            descriptor.version(),
            descriptor.message_type().clone(),
        ));
        let root = Group::new(descriptor.root().clone(), context.clone());
        Self {
            descriptor,
            context,
            root,
        }
    }

    /// Build an empty message for a registered message type
    pub fn for_type(
        registry: &DescriptorRegistry,
        version: V2Version,
        message_type: &MessageType,
    ) -> Result<Self> {
        let descriptor = registry.message(version, message_type)?;
        Ok(Self::new(descriptor))
    }

    /// The descriptor this message was built from
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// The context shared by every node of this tree
    pub fn context(&self) -> &Arc<MessageContext> {
        &self.context
    }

    /// The HL7 version the message conforms to
    pub fn version(&self) -> V2Version {
        self.context.version()
    }

    /// The message type the message carries
    pub fn message_type(&self) -> &MessageType {
        self.context.message_type()
    }

    /// The root group
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// The root group, mutable
    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// First repetition of a top-level child; see [`Group::structure`]
    pub fn structure(&self, name: &str) -> Result<&Structure> {
        self.root.structure(name)
    }

    /// First repetition of a top-level child, created on demand
    pub fn structure_mut(&mut self, name: &str) -> Result<&mut Structure> {
        self.root.structure_mut(name)
    }

    /// A specific top-level repetition; see [`Group::structure_rep`]
    pub fn structure_rep(&self, name: &str, rep: usize) -> Result<&Structure> {
        self.root.structure_rep(name, rep)
    }

    /// A specific top-level repetition, created on demand
    pub fn structure_rep_mut(&mut self, name: &str, rep: usize) -> Result<&mut Structure> {
        self.root.structure_rep_mut(name, rep)
    }

    /// All current repetitions of a top-level child
    pub fn structures(&self, name: &str) -> Result<&[Structure]> {
        self.root.structures(name)
    }

    /// Number of populated repetitions of a top-level child
    pub fn repetitions_used(&self, name: &str) -> Result<usize> {
        self.root.repetitions_used(name)
    }

    /// Lazy iteration over a top-level child's repetitions
    pub fn repetitions(&self, name: &str) -> Result<Repetitions<'_>> {
        self.root.repetitions(name)
    }

    /// Append a top-level repetition; see [`Group::add_structure`]
    pub fn add_structure(&mut self, name: &str) -> Result<&mut Structure> {
        self.root.add_structure(name)
    }

    /// Remove a top-level repetition; later repetitions shift down
    pub fn remove_repetition(&mut self, name: &str, rep: usize) -> Result<Structure> {
        self.root.remove_repetition(name, rep)
    }

    /// First repetition of a top-level segment child
    pub fn segment(&self, name: &str) -> Result<&Segment> {
        self.root.segment(name)
    }

    /// First repetition of a top-level segment child, created on demand
    pub fn segment_mut(&mut self, name: &str) -> Result<&mut Segment> {
        self.root.segment_mut(name)
    }

    /// First repetition of a top-level group child
    pub fn group(&self, name: &str) -> Result<&Group> {
        self.root.group(name)
    }

    /// First repetition of a top-level group child, created on demand
    pub fn group_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.root.group_mut(name)
    }

    /// Advisory validation of the whole tree
    pub fn validate(&self, tables: Option<&dyn CodeTableProvider>) -> Diagnostics {
        self.root.validate(tables).into_iter().collect()
    }
}
