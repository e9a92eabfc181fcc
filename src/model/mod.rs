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

//! Runtime object model: values, fields, segments, groups, messages

pub mod datatype;
pub mod field;
pub mod group;
pub mod message;
pub mod segment;
pub mod temporal;
pub mod value;

pub use datatype::DataType;
pub use field::Field;
pub use group::{Group, Repetitions, Structure};
pub use message::{Message, MessageContext};
pub use segment::Segment;
pub use temporal::{V2Date, V2Precision, V2Time, V2Timestamp};
pub use value::{CodedValue, Value};
