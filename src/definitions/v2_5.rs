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

//! HL7 v2.5 built-in descriptors
//!
//! Leading fields of the segments the built-in message structures use,
//! with v2.5 cardinalities, lengths and table numbers.

use std::sync::Arc;

use crate::descriptor::{
    ChildDef, FieldDef, GroupBuilder, MessageBuilder, SegmentBuilder, SegmentDescriptor,
};
use crate::model::datatype::DataType;
use crate::registry::DescriptorRegistry;
use crate::version::{MessageType, V2Version};

/// Register every v2.5 built-in segment and message structure
pub fn register(registry: &DescriptorRegistry) {
    let msh = msh();
    let evn = evn();
    let pid = pid();
    let nk1 = nk1();
    let pv1 = pv1();
    let orc = orc();
    let obr = obr();
    let obx = obx();

    for segment in [&msh, &evn, &pid, &nk1, &pv1, &orc, &obr, &obx] {
        registry.register_segment(V2Version::V2_5, segment.clone());
    }

    let (adt_a01, diagnostics) =
        MessageBuilder::new(V2Version::V2_5, MessageType::new("ADT", "A01"))
            .child(ChildDef::segment(&msh).required())
            .child(ChildDef::segment(&evn).required())
            .child(ChildDef::segment(&pid).required())
            .child(ChildDef::segment(&nk1).repeating())
            .child(ChildDef::segment(&pv1).required())
            .child(ChildDef::segment(&obx).repeating())
            .build();
    debug_assert!(diagnostics.is_empty(), "{diagnostics}");
    registry.register_message(adt_a01);

    let (observation, diagnostics) = GroupBuilder::new("OBSERVATION")
        .child(ChildDef::segment(&obx).required())
        .build();
    debug_assert!(diagnostics.is_empty(), "{diagnostics}");

    let (order_observation, diagnostics) = GroupBuilder::new("ORDER_OBSERVATION")
        .child(ChildDef::segment(&orc))
        .child(ChildDef::segment(&obr).required())
        .child(ChildDef::group(&observation).repeating())
        .build();
    debug_assert!(diagnostics.is_empty(), "{diagnostics}");

    let (patient, diagnostics) = GroupBuilder::new("PATIENT")
        .child(ChildDef::segment(&pid).required())
        .child(ChildDef::segment(&nk1).repeating())
        .build();
    debug_assert!(diagnostics.is_empty(), "{diagnostics}");

    let (patient_result, diagnostics) = GroupBuilder::new("PATIENT_RESULT")
        .child(ChildDef::group(&patient))
        .child(ChildDef::group(&order_observation).required().repeating())
        .build();
    debug_assert!(diagnostics.is_empty(), "{diagnostics}");

    let (oru_r01, diagnostics) =
        MessageBuilder::new(V2Version::V2_5, MessageType::new("ORU", "R01"))
            .child(ChildDef::segment(&msh).required())
            .child(ChildDef::group(&patient_result).required().repeating())
            .build();
    debug_assert!(diagnostics.is_empty(), "{diagnostics}");
    registry.register_message(oru_r01);
}

fn built(builder: SegmentBuilder) -> Arc<SegmentDescriptor> {
    let (descriptor, diagnostics) = builder.build();
    debug_assert!(diagnostics.is_empty(), "{diagnostics}");
    descriptor
}

/// MSH - Message Header
pub fn msh() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("MSH")
            .field(FieldDef::new("Field Separator", DataType::St).required().max_length(1))
            .field(FieldDef::new("Encoding Characters", DataType::St).required().max_length(4))
            .field(FieldDef::new("Sending Application", DataType::Hd).max_length(227))
            .field(FieldDef::new("Sending Facility", DataType::Hd).max_length(227))
            .field(FieldDef::new("Receiving Application", DataType::Hd).max_length(227))
            .field(FieldDef::new("Receiving Facility", DataType::Hd).max_length(227))
            .field(FieldDef::new("Date/Time of Message", DataType::Dtm).required().max_length(26))
            .field(FieldDef::new("Security", DataType::St).max_length(40))
            .field(FieldDef::new("Message Type", DataType::Msg).required().max_length(15))
            .field(FieldDef::new("Message Control ID", DataType::St).required().max_length(20))
            .field(FieldDef::new("Processing ID", DataType::Pt).required().max_length(3))
            .field(FieldDef::new("Version ID", DataType::Vid).required().max_length(60)),
    )
}

/// EVN - Event Type
pub fn evn() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("EVN")
            .field(FieldDef::new("Event Type Code", DataType::Id).max_length(3).table(3))
            .field(FieldDef::new("Recorded Date/Time", DataType::Dtm).required().max_length(26))
            .field(FieldDef::new("Date/Time Planned Event", DataType::Dtm).max_length(26))
            .field(FieldDef::new("Event Reason Code", DataType::Is).max_length(3).table(62))
            .field(FieldDef::new("Operator ID", DataType::Xcn).repeating().max_length(246).table(188))
            .field(FieldDef::new("Event Occurred", DataType::Dtm).max_length(26)),
    )
}

/// PID - Patient Identification
pub fn pid() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("PID")
            .field(FieldDef::new("Set ID - PID", DataType::Si).max_length(4))
            .field(FieldDef::new("Patient ID", DataType::Cx).max_length(20))
            .field(FieldDef::new("Patient Identifier List", DataType::Cx).required().repeating().max_length(250))
            .field(FieldDef::new("Alternate Patient ID - PID", DataType::Cx).repeating().max_length(20))
            .field(FieldDef::new("Patient Name", DataType::Xpn).required().repeating().max_length(250))
            .field(FieldDef::new("Mother's Maiden Name", DataType::Xpn).repeating().max_length(250))
            .field(FieldDef::new("Date/Time of Birth", DataType::Dtm).max_length(26))
            .field(FieldDef::new("Administrative Sex", DataType::Is).max_length(1).table(1))
            .field(FieldDef::new("Patient Alias", DataType::Xpn).repeating().max_length(250))
            .field(FieldDef::new("Race", DataType::Cwe).repeating().max_length(250).table(5))
            .field(FieldDef::new("Patient Address", DataType::Xad).repeating().max_length(250))
            .field(FieldDef::new("County Code", DataType::Is).max_length(4).table(289))
            .field(FieldDef::new("Phone Number - Home", DataType::Xtn).repeating().max_length(250))
            .field(FieldDef::new("Phone Number - Business", DataType::Xtn).repeating().max_length(250))
            .field(FieldDef::new("Primary Language", DataType::Cwe).max_length(250).table(296))
            .field(FieldDef::new("Marital Status", DataType::Cwe).max_length(250).table(2))
            .field(FieldDef::new("Religion", DataType::Cwe).max_length(250).table(6))
            .field(FieldDef::new("Patient Account Number", DataType::Cx).max_length(250))
            .field(FieldDef::new("SSN Number - Patient", DataType::St).max_length(16)),
    )
}

/// NK1 - Next of Kin / Associated Parties
pub fn nk1() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("NK1")
            .field(FieldDef::new("Set ID - NK1", DataType::Si).required().max_length(4))
            .field(FieldDef::new("Name", DataType::Xpn).repeating().max_length(250))
            .field(FieldDef::new("Relationship", DataType::Cwe).max_length(250).table(63))
            .field(FieldDef::new("Address", DataType::Xad).repeating().max_length(250))
            .field(FieldDef::new("Phone Number", DataType::Xtn).repeating().max_length(250))
            .field(FieldDef::new("Business Phone Number", DataType::Xtn).repeating().max_length(250))
            .field(FieldDef::new("Contact Role", DataType::Cwe).max_length(250).table(131)),
    )
}

/// PV1 - Patient Visit
pub fn pv1() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("PV1")
            .field(FieldDef::new("Set ID - PV1", DataType::Si).max_length(4))
            .field(FieldDef::new("Patient Class", DataType::Is).required().max_length(1).table(4))
            .field(FieldDef::new("Assigned Patient Location", DataType::Pl).max_length(80))
            .field(FieldDef::new("Admission Type", DataType::Is).max_length(2).table(7))
            .field(FieldDef::new("Preadmit Number", DataType::Cx).max_length(250))
            .field(FieldDef::new("Prior Patient Location", DataType::Pl).max_length(80))
            .field(FieldDef::new("Attending Doctor", DataType::Xcn).repeating().max_length(250).table(10))
            .field(FieldDef::new("Referring Doctor", DataType::Xcn).repeating().max_length(250).table(10))
            .field(FieldDef::new("Consulting Doctor", DataType::Xcn).repeating().max_length(250))
            .field(FieldDef::new("Hospital Service", DataType::Is).max_length(3).table(69)),
    )
}

/// ORC - Common Order
pub fn orc() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("ORC")
            .field(FieldDef::new("Order Control", DataType::Id).required().max_length(2).table(119))
            .field(FieldDef::new("Placer Order Number", DataType::Ei).max_length(22))
            .field(FieldDef::new("Filler Order Number", DataType::Ei).max_length(22))
            .field(FieldDef::new("Placer Group Number", DataType::Ei).max_length(22))
            .field(FieldDef::new("Order Status", DataType::Id).max_length(2).table(38))
            .field(FieldDef::new("Response Flag", DataType::Id).max_length(1).table(121)),
    )
}

/// OBR - Observation Request
pub fn obr() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("OBR")
            .field(FieldDef::new("Set ID - OBR", DataType::Si).max_length(4))
            .field(FieldDef::new("Placer Order Number", DataType::Ei).max_length(22))
            .field(FieldDef::new("Filler Order Number", DataType::Ei).max_length(22))
            .field(FieldDef::new("Universal Service Identifier", DataType::Cwe).required().max_length(250))
            .field(FieldDef::new("Priority - OBR", DataType::Id).max_length(2))
            .field(FieldDef::new("Requested Date/Time", DataType::Dtm).max_length(26))
            .field(FieldDef::new("Observation Date/Time", DataType::Dtm).max_length(26)),
    )
}

/// OBX - Observation/Result
pub fn obx() -> Arc<SegmentDescriptor> {
    built(
        SegmentBuilder::new("OBX")
            .field(FieldDef::new("Set ID - OBX", DataType::Si).max_length(4))
            .field(FieldDef::new("Value Type", DataType::Id).max_length(2).table(125))
            .field(FieldDef::new("Observation Identifier", DataType::Cwe).required().max_length(250))
            .field(FieldDef::new("Observation Sub-ID", DataType::St).max_length(20))
            .field(FieldDef::new("Observation Value", DataType::Varies).repeating().max_length(99999))
            .field(FieldDef::new("Units", DataType::Cwe).max_length(250))
            .field(FieldDef::new("References Range", DataType::St).max_length(60))
            .field(FieldDef::new("Abnormal Flags", DataType::Is).repeating().max_length(5).table(78))
            .field(FieldDef::new("Probability", DataType::Nm).max_length(5))
            .field(FieldDef::new("Nature of Abnormal Test", DataType::Id).repeating().max_length(2).table(80))
            .field(FieldDef::new("Observation Result Status", DataType::Id).required().max_length(1).table(85)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_shapes() {
        assert_eq!(msh().field_count(), 12);
        assert_eq!(pid().field_count(), 19);
        assert_eq!(obx().field_count(), 11);

        let pid = pid();
        let identifier_list = pid.field(3).unwrap();
        assert!(identifier_list.required);
        assert!(identifier_list.repeating);
        assert_eq!(pid.field(8).unwrap().table, Some(1));
    }

    #[test]
    fn test_oru_r01_nesting() {
        let registry = DescriptorRegistry::new();
        register(&registry);
        let oru = registry
            .message(V2Version::V2_5, &MessageType::new("ORU", "R01"))
            .unwrap();
        let patient_result = oru.root().child("PATIENT_RESULT").unwrap();
        assert!(patient_result.required);
        assert!(patient_result.repeating);

        let crate::descriptor::ChildShape::Group(patient_result) = &patient_result.shape else {
            panic!("PATIENT_RESULT should be a group");
        };
        assert!(patient_result.child("PATIENT").is_some());
        let order = patient_result.child("ORDER_OBSERVATION").unwrap();
        assert!(order.required);
        assert!(order.repeating);
    }
}
