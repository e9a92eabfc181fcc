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

//! Integration tests navigating realistic admission and result messages

use pretty_assertions::assert_eq;

use octofhir_hl7v2::model::{Message, Structure, V2Timestamp, Value};
use octofhir_hl7v2::version::{MessageType, V2Version};
use octofhir_hl7v2::{CodedValue, Hl7v2Error, standard_registry};

fn adt_a01() -> Message {
    Message::for_type(
        standard_registry(),
        V2Version::V2_5,
        &MessageType::new("ADT", "A01"),
    )
    .expect("ADT_A01 is a built-in structure")
}

fn oru_r01() -> Message {
    Message::for_type(
        standard_registry(),
        V2Version::V2_5,
        &MessageType::new("ORU", "R01"),
    )
    .expect("ORU_R01 is a built-in structure")
}

#[test]
fn test_required_structures_exist_after_construction() {
    let message = adt_a01();
    for name in ["MSH", "EVN", "PID", "PV1"] {
        assert_eq!(message.repetitions_used(name).unwrap(), 1, "{name}");
    }
    for name in ["NK1", "OBX"] {
        assert_eq!(message.repetitions_used(name).unwrap(), 0, "{name}");
    }
}

#[test]
fn test_populate_admission_message() {
    let mut message = adt_a01();

    let msh = message.segment_mut("MSH").unwrap();
    msh.set_field(7, Value::from(V2Timestamp::parse("20240115123000").unwrap()))
        .unwrap();
    msh.set_field(10, "MSG00001").unwrap();

    let pid = message.segment_mut("PID").unwrap();
    pid.set_field(5, "Martinez^Maria^Elena").unwrap();
    pid.set_field(8, Value::from(CodedValue::new("F").with_text("Female")))
        .unwrap();

    // second patient name repetition
    pid.add_field(5).unwrap().set_value("Martinez^M");
    assert_eq!(pid.repetitions_used(5).unwrap(), 2);

    assert_eq!(
        message
            .segment("PID")
            .unwrap()
            .field(5, 1)
            .unwrap()
            .value()
            .as_text()
            .unwrap(),
        "Martinez^M"
    );
}

#[test]
fn test_add_three_obx_then_navigate() {
    let mut message = adt_a01();
    for n in 1..=3u32 {
        let obx = message
            .add_structure("OBX")
            .unwrap()
            .as_segment_mut()
            .unwrap();
        obx.set_field(1, Value::SequenceId(n)).unwrap();
    }

    assert_eq!(message.repetitions_used("OBX").unwrap(), 3);

    let third = message
        .structure_rep("OBX", 2)
        .unwrap()
        .as_segment()
        .unwrap();
    assert_eq!(
        third.field(1, 0).unwrap().value().as_sequence_id().unwrap(),
        3
    );

    assert!(matches!(
        message.structure_rep("OBX", 3),
        Err(Hl7v2Error::RepetitionOutOfRange {
            requested: 3,
            count: 3,
            ..
        })
    ));
}

#[test]
fn test_getting_a_known_repetition_never_creates() {
    let mut message = adt_a01();
    message.add_structure("NK1").unwrap();
    message.add_structure("NK1").unwrap();

    for rep in 0..2 {
        message.structure_rep("NK1", rep).unwrap();
    }
    assert_eq!(message.repetitions_used("NK1").unwrap(), 2);

    // get-or-create at the current count appends exactly one
    message.structure_rep_mut("NK1", 2).unwrap();
    assert_eq!(message.repetitions_used("NK1").unwrap(), 3);
}

#[test]
fn test_non_repeating_structure_refuses_growth() {
    let mut message = adt_a01();
    assert!(matches!(
        message.add_structure("PV1"),
        Err(Hl7v2Error::NotRepeatable { .. })
    ));
    assert!(matches!(
        message.structure_rep("PV1", 1),
        Err(Hl7v2Error::NotRepeatable { .. })
    ));
}

#[test]
fn test_unknown_structure_name_fails() {
    let message = adt_a01();
    assert!(matches!(
        message.structure("ZZZ"),
        Err(Hl7v2Error::UnknownChild { .. })
    ));
}

#[test]
fn test_removal_shifts_repetitions_down() {
    let mut message = adt_a01();
    for n in 1..=3u32 {
        message
            .add_structure("NK1")
            .unwrap()
            .as_segment_mut()
            .unwrap()
            .set_field(1, Value::SequenceId(n))
            .unwrap();
    }

    let removed = message.remove_repetition("NK1", 1).unwrap();
    let removed = removed.as_segment().unwrap();
    assert_eq!(
        removed.field(1, 0).unwrap().value().as_sequence_id().unwrap(),
        2
    );

    assert_eq!(message.repetitions_used("NK1").unwrap(), 2);
    let shifted = message.structure_rep("NK1", 1).unwrap().as_segment().unwrap();
    assert_eq!(
        shifted.field(1, 0).unwrap().value().as_sequence_id().unwrap(),
        3
    );
}

#[test]
fn test_repetition_enumeration_sees_live_list() {
    let mut message = adt_a01();
    for _ in 0..4 {
        message.add_structure("OBX").unwrap();
    }

    let names: Vec<&str> = message
        .repetitions("OBX")
        .unwrap()
        .map(Structure::name)
        .collect();
    assert_eq!(names, vec!["OBX"; 4]);

    // restartable: a fresh walk yields the same repetitions
    assert_eq!(message.repetitions("OBX").unwrap().count(), 4);
}

#[test]
fn test_oru_r01_deep_navigation() {
    let mut message = oru_r01();

    // the required chain exists eagerly: PATIENT_RESULT -> ORDER_OBSERVATION -> OBR
    let patient_result = message.group("PATIENT_RESULT").unwrap();
    assert_eq!(patient_result.repetitions_used("ORDER_OBSERVATION").unwrap(), 1);
    // the optional PATIENT group does not
    assert_eq!(patient_result.repetitions_used("PATIENT").unwrap(), 0);

    let patient_result = message.group_mut("PATIENT_RESULT").unwrap();
    let patient = patient_result.group_mut("PATIENT").unwrap();
    patient
        .segment_mut("PID")
        .unwrap()
        .set_field(5, "Chen^Wei")
        .unwrap();

    let order = patient_result.group_mut("ORDER_OBSERVATION").unwrap();
    order
        .segment_mut("OBR")
        .unwrap()
        .set_field(
            4,
            Value::from(CodedValue::new("2345-7").with_text("Glucose").with_coding_system("LN")),
        )
        .unwrap();

    for n in 1..=2u32 {
        let observation = order
            .add_structure("OBSERVATION")
            .unwrap()
            .as_group_mut()
            .unwrap();
        let obx = observation.segment_mut("OBX").unwrap();
        obx.set_field(1, Value::SequenceId(n)).unwrap();
        obx.set_field(5, Value::Number(rust_decimal::Decimal::new(982, 1)))
            .unwrap();
        obx.set_field(11, Value::coded("F")).unwrap();
    }

    let order = message
        .group("PATIENT_RESULT")
        .unwrap()
        .group("ORDER_OBSERVATION")
        .unwrap();
    assert_eq!(order.repetitions_used("OBSERVATION").unwrap(), 2);

    let second = order
        .structure_rep("OBSERVATION", 1)
        .unwrap()
        .as_group()
        .unwrap();
    let obx = second.segment("OBX").unwrap();
    assert_eq!(obx.field(1, 0).unwrap().value().as_sequence_id().unwrap(), 2);
    assert_eq!(
        obx.field(5, 0).unwrap().value().as_number().unwrap(),
        rust_decimal::Decimal::new(982, 1)
    );
}

#[test]
fn test_typed_narrowing_reports_mismatch() {
    let message = oru_r01();
    let err = message.segment("PATIENT_RESULT").unwrap_err();
    assert!(matches!(err, Hl7v2Error::TypeMismatch { .. }));

    let err = message.group("MSH").unwrap_err();
    assert!(matches!(err, Hl7v2Error::TypeMismatch { .. }));
}

#[test]
fn test_each_message_owns_its_tree() {
    let first = adt_a01();
    let second = adt_a01();
    // same descriptor, distinct contexts and instances
    assert!(std::sync::Arc::ptr_eq(first.descriptor(), second.descriptor()));
    assert!(!std::sync::Arc::ptr_eq(first.context(), second.context()));
}
