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

//! Descriptor-driven HL7 v2.x message structure model
//!
//! One generic engine for Messages, Groups, Segments and typed Field
//! values, parameterized by descriptor tables per HL7 version, instead of
//! one generated class per message structure. Descriptors say what a
//! structure is made of (order, cardinality, types, tables); the runtime
//! tree enforces repetition semantics and typed access on top of them.
//!
//! Wire encoding and decoding is not part of this crate: an encoding
//! engine walks the tree through the same navigation API shown below.
//!
//! ```
//! use octofhir_hl7v2::model::Message;
//! use octofhir_hl7v2::standard_registry;
//! use octofhir_hl7v2::version::{MessageType, V2Version};
//!
//! # fn main() -> Result<(), octofhir_hl7v2::Hl7v2Error> {
//! let mut message = Message::for_type(
//!     standard_registry(),
//!     V2Version::V2_5,
//!     &MessageType::new("ADT", "A01"),
//! )?;
//!
//! // required structures exist from construction
//! assert_eq!(message.repetitions_used("PID")?, 1);
//!
//! // optional repeating ones appear as they are added
//! assert_eq!(message.repetitions_used("NK1")?, 0);
//! message.add_structure("NK1")?;
//!
//! let pid = message.segment_mut("PID")?;
//! pid.set_field(5, "Martinez^Maria")?;
//! assert_eq!(pid.field(5, 0)?.value().as_text()?, "Martinez^Maria");
//! # Ok(())
//! # }
//! ```

pub mod definitions;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod registry;
pub mod tables;
pub mod version;

pub use definitions::standard_registry;
pub use descriptor::{
    ChildDef, ChildDescriptor, ChildShape, FieldDef, FieldDescriptor, GroupBuilder,
    GroupDescriptor, MessageBuilder, MessageDescriptor, SegmentBuilder, SegmentDescriptor,
};
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use error::{Hl7v2Error, Result};
pub use model::{
    CodedValue, DataType, Field, Group, Message, MessageContext, Repetitions, Segment, Structure,
    V2Date, V2Precision, V2Time, V2Timestamp, Value,
};
pub use registry::DescriptorRegistry;
pub use tables::{CodeTableProvider, InMemoryTableProvider};
pub use version::{MessageType, V2Version};
