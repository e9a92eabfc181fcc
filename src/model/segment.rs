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

//! Runtime segment instances
//!
//! A segment owns one repetition list per registered field. Repetition
//! indices are dense and 0-based; requesting the index equal to the current
//! count appends exactly one repetition, anything further out fails.

use std::sync::Arc;

use smallvec::SmallVec;

use super::field::Field;
use super::message::MessageContext;
use crate::descriptor::SegmentDescriptor;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::error::{Hl7v2Error, Result};
use crate::model::value::Value;
use crate::tables::CodeTableProvider;

/// Repetition storage for one field slot; almost all slots hold 0 or 1
type FieldSlot = SmallVec<[Field; 1]>;

/// One runtime segment instance
#[derive(Debug, Clone)]
pub struct Segment {
    descriptor: Arc<SegmentDescriptor>,
    context: Arc<MessageContext>,
    slots: Vec<FieldSlot>,
}

impl Segment {
    /// Create a segment with one empty repetition per required field
    pub(crate) fn new(descriptor: Arc<SegmentDescriptor>, context: Arc<MessageContext>) -> Self {
        let mut slots: Vec<FieldSlot> = Vec::with_capacity(descriptor.field_count());
        for field in descriptor.fields() {
            let mut slot = FieldSlot::new();
            if field.required {
                slot.push(Field::from_descriptor(field));
            }
            slots.push(slot);
        }
        Self {
            descriptor,
            context,
            slots,
        }
    }

    /// The segment code, e.g. `PID`
    pub fn code(&self) -> &str {
        self.descriptor.code()
    }

    /// The descriptor this instance was built from
    pub fn descriptor(&self) -> &Arc<SegmentDescriptor> {
        &self.descriptor
    }

    /// The owning message's context
    pub fn context(&self) -> &Arc<MessageContext> {
        &self.context
    }

    fn label(&self, index: usize) -> String {
        format!("{}-{index}", self.descriptor.code())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if self.descriptor.field(index).is_none() {
            return Err(Hl7v2Error::unknown_field(
                self.descriptor.code(),
                index,
                self.descriptor.field_count(),
            ));
        }
        Ok(())
    }

    /// An existing field repetition (1-based field index, 0-based repetition)
    pub fn field(&self, index: usize, rep: usize) -> Result<&Field> {
        self.check_index(index)?;
        let slot = &self.slots[index - 1];
        if rep < slot.len() {
            return Ok(&slot[rep]);
        }
        let desc = self.descriptor.field(index);
        if rep >= 1 && desc.is_some_and(|d| !d.repeating) {
            return Err(Hl7v2Error::not_repeatable(self.label(index)));
        }
        Err(Hl7v2Error::repetition_out_of_range(
            self.label(index),
            rep,
            slot.len(),
        ))
    }

    /// A field repetition, created on demand: `rep == count` appends one
    /// new repetition, `rep > count` fails
    pub fn field_mut(&mut self, index: usize, rep: usize) -> Result<&mut Field> {
        self.check_index(index)?;
        let label = self.label(index);
        let desc = self.descriptor.field(index);
        let slot = &mut self.slots[index - 1];
        if rep < slot.len() {
            return Ok(&mut slot[rep]);
        }
        if rep > slot.len() {
            if rep >= 1 && desc.is_some_and(|d| !d.repeating) {
                return Err(Hl7v2Error::not_repeatable(label));
            }
            return Err(Hl7v2Error::repetition_out_of_range(label, rep, slot.len()));
        }
        // rep == count: append exactly one
        if let Some(desc) = desc {
            if !desc.repeating && !slot.is_empty() {
                return Err(Hl7v2Error::not_repeatable(label));
            }
            if let Some(max) = desc.max_repetitions {
                if slot.len() >= max {
                    return Err(Hl7v2Error::repetition_limit(label, max));
                }
            }
            slot.push(Field::from_descriptor(desc));
        }
        let last = slot.len() - 1;
        Ok(&mut slot[last])
    }

    /// Append a new repetition of a repeating field
    pub fn add_field(&mut self, index: usize) -> Result<&mut Field> {
        self.check_index(index)?;
        let count = self.slots[index - 1].len();
        self.field_mut(index, count)
    }

    /// All current repetitions of a field
    pub fn fields(&self, index: usize) -> Result<&[Field]> {
        self.check_index(index)?;
        Ok(self.slots[index - 1].as_slice())
    }

    /// Number of populated repetitions of a field; 0 for an untouched
    /// optional field
    pub fn repetitions_used(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        Ok(self.slots[index - 1].len())
    }

    /// Remove one repetition; later repetitions shift down by one index
    pub fn remove_repetition(&mut self, index: usize, rep: usize) -> Result<Field> {
        self.check_index(index)?;
        let slot = &mut self.slots[index - 1];
        if rep >= slot.len() {
            let label = format!("{}-{index}", self.descriptor.code());
            return Err(Hl7v2Error::repetition_out_of_range(label, rep, slot.len()));
        }
        Ok(slot.remove(rep))
    }

    /// Set the first repetition of a field, creating it when needed
    pub fn set_field(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.field_mut(index, 0)?.set_value(value);
        Ok(())
    }

    /// Advisory validation of every populated field against its metadata
    pub fn validate(&self, tables: Option<&dyn CodeTableProvider>) -> Vec<Diagnostic> {
        let mut findings = Vec::new();
        for desc in self.descriptor.fields() {
            let slot = &self.slots[desc.index - 1];
            let subject = format!("{}-{}", self.descriptor.code(), desc.index);
            if desc.required && slot.iter().all(Field::is_empty) {
                findings.push(Diagnostic::warning(
                    DiagnosticCode::RequiredFieldEmpty,
                    format!("required field {subject} ({}) is empty", desc.name),
                    subject.clone(),
                ));
            }
            for field in slot {
                findings.extend(field.validate(&subject, tables));
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDef, SegmentBuilder};
    use crate::model::datatype::DataType;
    use crate::version::{MessageType, V2Version};

    fn test_context() -> Arc<MessageContext> {
        Arc::new(MessageContext::new(
            V2Version::V2_5,
            MessageType::new("ADT", "A01"),
        ))
    }

    /// Segment with fields `[SI required, XPN required, XAD optional]`
    fn sample_segment() -> Segment {
        let (descriptor, diagnostics) = SegmentBuilder::new("ZPN")
            .field(FieldDef::new("Set ID", DataType::Si).required())
            .field(FieldDef::new("Name", DataType::Xpn).required())
            .field(FieldDef::new("Address", DataType::Xad))
            .build();
        assert!(diagnostics.is_empty());
        Segment::new(descriptor, test_context())
    }

    #[test]
    fn test_required_fields_exist_after_construction() {
        let segment = sample_segment();
        assert_eq!(segment.repetitions_used(1).unwrap(), 1);
        assert_eq!(segment.repetitions_used(2).unwrap(), 1);
        assert_eq!(segment.repetitions_used(3).unwrap(), 0);
        assert!(segment.field(1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_index_fails() {
        let segment = sample_segment();
        assert!(matches!(
            segment.field(4, 0),
            Err(Hl7v2Error::UnknownField { index: 4, count: 3, .. })
        ));
        assert!(matches!(
            segment.repetitions_used(0),
            Err(Hl7v2Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_optional_field_created_on_first_write() {
        let mut segment = sample_segment();
        segment.set_field(3, "12 Main St").unwrap();
        assert_eq!(segment.repetitions_used(3).unwrap(), 1);
        assert_eq!(segment.field(3, 0).unwrap().value().as_text().unwrap(), "12 Main St");
    }

    #[test]
    fn test_non_repeating_field_refuses_second_repetition() {
        let mut segment = sample_segment();
        segment.set_field(3, "12 Main St").unwrap();
        assert!(matches!(
            segment.field_mut(3, 1),
            Err(Hl7v2Error::NotRepeatable { .. })
        ));
        assert!(matches!(
            segment.field(3, 1),
            Err(Hl7v2Error::NotRepeatable { .. })
        ));
    }

    #[test]
    fn test_append_only_one_ahead() {
        let (descriptor, _) = SegmentBuilder::new("ZRP")
            .field(FieldDef::new("Codes", DataType::St).repeating())
            .build();
        let mut segment = Segment::new(descriptor, test_context());
        assert!(matches!(
            segment.field_mut(1, 1),
            Err(Hl7v2Error::RepetitionOutOfRange { requested: 1, count: 0, .. })
        ));
        segment.field_mut(1, 0).unwrap().set_value("a");
        segment.field_mut(1, 1).unwrap().set_value("b");
        assert_eq!(segment.repetitions_used(1).unwrap(), 2);
    }

    #[test]
    fn test_max_repetitions_enforced() {
        let (descriptor, _) = SegmentBuilder::new("ZRP")
            .field(FieldDef::new("Codes", DataType::St).max_repetitions(2))
            .build();
        let mut segment = Segment::new(descriptor, test_context());
        segment.add_field(1).unwrap();
        segment.add_field(1).unwrap();
        assert!(matches!(
            segment.add_field(1),
            Err(Hl7v2Error::RepetitionLimit { max: 2, .. })
        ));
    }

    #[test]
    fn test_removal_shifts_later_repetitions_down() {
        let (descriptor, _) = SegmentBuilder::new("ZRP")
            .field(FieldDef::new("Codes", DataType::St).repeating())
            .build();
        let mut segment = Segment::new(descriptor, test_context());
        for value in ["a", "b", "c"] {
            segment.add_field(1).unwrap().set_value(value);
        }
        let removed = segment.remove_repetition(1, 1).unwrap();
        assert_eq!(removed.value().as_text().unwrap(), "b");
        assert_eq!(segment.repetitions_used(1).unwrap(), 2);
        assert_eq!(segment.field(1, 1).unwrap().value().as_text().unwrap(), "c");
    }

    #[test]
    fn test_validate_flags_required_empty() {
        let segment = sample_segment();
        let findings = segment.validate(None);
        assert_eq!(findings.len(), 2);
        assert!(findings
            .iter()
            .all(|d| matches!(d.code, DiagnosticCode::RequiredFieldEmpty)));
    }
}
