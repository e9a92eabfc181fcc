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

//! Runtime group instances and the structure tree
//!
//! A group owns an ordered list of child slots, one per descriptor entry,
//! each holding 0..N instances. Required children exist from construction,
//! recursively; optional ones appear on first mutable access. All navigation
//! is by child name against the group's descriptor — a name the descriptor
//! does not know is an error, never a silent miss.

use std::iter::FusedIterator;
use std::sync::Arc;

use super::message::MessageContext;
use super::segment::Segment;
use crate::descriptor::{ChildDescriptor, ChildShape, GroupDescriptor};
use crate::diagnostics::Diagnostic;
use crate::error::{Hl7v2Error, Result};
use crate::tables::CodeTableProvider;

/// One node of the structure tree: a leaf segment or a nested group
#[derive(Debug, Clone)]
pub enum Structure {
    /// A leaf segment
    Segment(Segment),
    /// A nested group
    Group(Group),
}

impl Structure {
    /// The conventional name of this node: segment code or group name
    pub fn name(&self) -> &str {
        match self {
            Self::Segment(segment) => segment.code(),
            Self::Group(group) => group.name(),
        }
    }

    /// Whether this node is a leaf segment
    pub fn is_segment(&self) -> bool {
        matches!(self, Self::Segment(_))
    }

    /// Narrow to a segment
    pub fn as_segment(&self) -> Result<&Segment> {
        match self {
            Self::Segment(segment) => Ok(segment),
            Self::Group(group) => Err(Hl7v2Error::type_mismatch_with_context(
                "segment",
                "group",
                group.name(),
            )),
        }
    }

    /// Narrow to a mutable segment
    pub fn as_segment_mut(&mut self) -> Result<&mut Segment> {
        match self {
            Self::Segment(segment) => Ok(segment),
            Self::Group(group) => Err(Hl7v2Error::type_mismatch_with_context(
                "segment",
                "group",
                group.name(),
            )),
        }
    }

    /// Narrow to a group
    pub fn as_group(&self) -> Result<&Group> {
        match self {
            Self::Group(group) => Ok(group),
            Self::Segment(segment) => Err(Hl7v2Error::type_mismatch_with_context(
                "group",
                "segment",
                segment.code(),
            )),
        }
    }

    /// Narrow to a mutable group
    pub fn as_group_mut(&mut self) -> Result<&mut Group> {
        match self {
            Self::Group(group) => Ok(group),
            Self::Segment(segment) => Err(Hl7v2Error::type_mismatch_with_context(
                "group",
                "segment",
                segment.code(),
            )),
        }
    }

    pub(crate) fn instantiate(child: &ChildDescriptor, context: Arc<MessageContext>) -> Self {
        match &child.shape {
            ChildShape::Segment(descriptor) => {
                Self::Segment(Segment::new(descriptor.clone(), context))
            }
            ChildShape::Group(descriptor) => Self::Group(Group::new(descriptor.clone(), context)),
        }
    }

    pub(crate) fn validate(&self, tables: Option<&dyn CodeTableProvider>) -> Vec<Diagnostic> {
        match self {
            Self::Segment(segment) => segment.validate(tables),
            Self::Group(group) => group.validate(tables),
        }
    }
}

/// A lazy, restartable walk over the current repetitions of one child
///
/// No snapshot is taken: each step reads the live repetition list (which
/// cannot change while the borrow is held). Cheap to clone and re-obtain.
#[derive(Debug, Clone)]
pub struct Repetitions<'a> {
    slot: &'a [Structure],
    next: usize,
}

impl<'a> Iterator for Repetitions<'a> {
    type Item = &'a Structure;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.slot.get(self.next)?;
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.slot.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Repetitions<'_> {}
impl FusedIterator for Repetitions<'_> {}

/// One runtime group instance
#[derive(Debug, Clone)]
pub struct Group {
    descriptor: Arc<GroupDescriptor>,
    context: Arc<MessageContext>,
    slots: Vec<Vec<Structure>>,
}

impl Group {
    /// Create a group with the first repetition of every required child,
    /// recursively
    pub(crate) fn new(descriptor: Arc<GroupDescriptor>, context: Arc<MessageContext>) -> Self {
        let mut slots: Vec<Vec<Structure>> = Vec::with_capacity(descriptor.child_count());
        for child in descriptor.children() {
            let mut slot = Vec::new();
            if child.required {
                slot.push(Structure::instantiate(child, context.clone()));
            }
            slots.push(slot);
        }
        Self {
            descriptor,
            context,
            slots,
        }
    }

    /// The group name, e.g. `PATIENT_RESULT`
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The descriptor this instance was built from
    pub fn descriptor(&self) -> &Arc<GroupDescriptor> {
        &self.descriptor
    }

    /// The owning message's context
    pub fn context(&self) -> &Arc<MessageContext> {
        &self.context
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.descriptor
            .child_position(name)
            .ok_or_else(|| Hl7v2Error::unknown_child(name, self.descriptor.name()))
    }

    /// The first repetition of a child; fails if it was never populated
    pub fn structure(&self, name: &str) -> Result<&Structure> {
        let pos = self.position(name)?;
        self.slots[pos]
            .first()
            .ok_or_else(|| Hl7v2Error::missing_structure(name))
    }

    /// The first repetition of a child, created on demand; calling twice
    /// without adding returns the same instance
    pub fn structure_mut(&mut self, name: &str) -> Result<&mut Structure> {
        let pos = self.position(name)?;
        let child = self.descriptor.child_at(pos);
        let slot = &mut self.slots[pos];
        if slot.is_empty() {
            if let Some(child) = child {
                slot.push(Structure::instantiate(child, self.context.clone()));
            }
        }
        Ok(&mut slot[0])
    }

    /// An existing repetition of a child
    pub fn structure_rep(&self, name: &str, rep: usize) -> Result<&Structure> {
        let pos = self.position(name)?;
        let slot = &self.slots[pos];
        if rep < slot.len() {
            return Ok(&slot[rep]);
        }
        let child = self.descriptor.child_at(pos);
        if rep >= 1 && child.is_some_and(|c| !c.repeating) {
            return Err(Hl7v2Error::not_repeatable(name));
        }
        Err(Hl7v2Error::repetition_out_of_range(name, rep, slot.len()))
    }

    /// A repetition of a child, created on demand: `rep == count` appends
    /// one new repetition, `rep > count` fails (never skip ahead)
    pub fn structure_rep_mut(&mut self, name: &str, rep: usize) -> Result<&mut Structure> {
        let pos = self.position(name)?;
        let child = self.descriptor.child_at(pos);
        let slot = &mut self.slots[pos];
        if rep < slot.len() {
            return Ok(&mut slot[rep]);
        }
        if rep >= 1 && child.is_some_and(|c| !c.repeating) {
            return Err(Hl7v2Error::not_repeatable(name));
        }
        if rep > slot.len() {
            return Err(Hl7v2Error::repetition_out_of_range(name, rep, slot.len()));
        }
        if let Some(child) = child {
            slot.push(Structure::instantiate(child, self.context.clone()));
        }
        let last = slot.len() - 1;
        Ok(&mut slot[last])
    }

    /// All current repetitions of a child; empty for an untouched optional
    pub fn structures(&self, name: &str) -> Result<&[Structure]> {
        let pos = self.position(name)?;
        Ok(self.slots[pos].as_slice())
    }

    /// Number of populated repetitions of a child
    pub fn repetitions_used(&self, name: &str) -> Result<usize> {
        let pos = self.position(name)?;
        Ok(self.slots[pos].len())
    }

    /// Lazy iteration over the current repetitions of a child
    pub fn repetitions(&self, name: &str) -> Result<Repetitions<'_>> {
        let pos = self.position(name)?;
        Ok(Repetitions {
            slot: self.slots[pos].as_slice(),
            next: 0,
        })
    }

    /// Append a new repetition; fails on a populated non-repeating child
    pub fn add_structure(&mut self, name: &str) -> Result<&mut Structure> {
        let pos = self.position(name)?;
        let count = self.slots[pos].len();
        self.structure_rep_mut(name, count)
    }

    /// Remove one repetition and return it; later repetitions shift down
    /// by one index
    pub fn remove_repetition(&mut self, name: &str, rep: usize) -> Result<Structure> {
        let pos = self.position(name)?;
        let slot = &mut self.slots[pos];
        if rep >= slot.len() {
            return Err(Hl7v2Error::repetition_out_of_range(name, rep, slot.len()));
        }
        Ok(slot.remove(rep))
    }

    /// The first repetition of a segment child
    pub fn segment(&self, name: &str) -> Result<&Segment> {
        self.structure(name)?.as_segment()
    }

    /// The first repetition of a segment child, created on demand
    pub fn segment_mut(&mut self, name: &str) -> Result<&mut Segment> {
        self.structure_mut(name)?.as_segment_mut()
    }

    /// The first repetition of a nested-group child
    pub fn group(&self, name: &str) -> Result<&Group> {
        self.structure(name)?.as_group()
    }

    /// The first repetition of a nested-group child, created on demand
    pub fn group_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.structure_mut(name)?.as_group_mut()
    }

    /// Advisory validation of the whole subtree
    pub fn validate(&self, tables: Option<&dyn CodeTableProvider>) -> Vec<Diagnostic> {
        let mut findings = Vec::new();
        for slot in &self.slots {
            for structure in slot {
                findings.extend(structure.validate(tables));
            }
        }
        findings
    }
}
