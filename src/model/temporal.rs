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

//! Precision-aware temporal types for HL7 v2 DT/TM/DTM values
//!
//! HL7 v2 timestamps are truncatable: `2024`, `202401` and
//! `20240115123000.25+0100` are all valid DTM values. Each type here keeps
//! the precision the value was written with, so formatting reproduces the
//! original truncation.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Hl7v2Error, Result};

/// Precision levels for HL7 temporal values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum V2Precision {
    /// Year precision (`YYYY`)
    Year,
    /// Month precision (`YYYYMM`)
    Month,
    /// Day precision (`YYYYMMDD`)
    Day,
    /// Hour precision (`…HH`)
    Hour,
    /// Minute precision (`…HHMM`)
    Minute,
    /// Second precision (`…HHMMSS`)
    Second,
    /// Fractional-second precision (`…HHMMSS.SSS`)
    Millisecond,
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fraction digits scaled to milliseconds; HL7 allows one to four digits.
fn fraction_millis(frac: &str) -> Option<u32> {
    if frac.is_empty() || frac.len() > 4 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut padded = frac.to_string();
    while padded.len() < 3 {
        padded.push('0');
    }
    padded[..3].parse().ok()
}

/// An HL7 DT value with precision tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct V2Date {
    /// The date value; unstated components default to their first value
    pub date: NaiveDate,
    /// The precision of this date
    pub precision: V2Precision,
}

impl V2Date {
    /// Create a new date; precision finer than day is clamped to day
    pub fn new(date: NaiveDate, precision: V2Precision) -> Self {
        Self {
            date,
            precision: precision.min(V2Precision::Day),
        }
    }

    /// Create a date with day precision
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date, V2Precision::Day)
    }

    /// Parse an HL7 DT value: `YYYY`, `YYYYMM` or `YYYYMMDD`
    pub fn parse(s: &str) -> Result<Self> {
        let precision = match s.len() {
            4 => V2Precision::Year,
            6 => V2Precision::Month,
            8 => V2Precision::Day,
            _ => {
                return Err(Hl7v2Error::malformed_date(
                    s,
                    "expected YYYY, YYYYMM or YYYYMMDD",
                ));
            }
        };
        let year = digits(&s[0..4])
            .ok_or_else(|| Hl7v2Error::malformed_date(s, "year is not numeric"))?;
        let month = if s.len() >= 6 {
            digits(&s[4..6]).ok_or_else(|| Hl7v2Error::malformed_date(s, "month is not numeric"))?
        } else {
            1
        };
        let day = if s.len() >= 8 {
            digits(&s[6..8]).ok_or_else(|| Hl7v2Error::malformed_date(s, "day is not numeric"))?
        } else {
            1
        };
        let date = NaiveDate::from_ymd_opt(year as i32, month, day)
            .ok_or_else(|| Hl7v2Error::malformed_date(s, "no such calendar date"))?;
        Ok(Self { date, precision })
    }

    /// Format back to the HL7 compact form at this value's precision
    pub fn format(&self) -> String {
        match self.precision {
            V2Precision::Year => format!("{:04}", self.date.year()),
            V2Precision::Month => format!("{:04}{:02}", self.date.year(), self.date.month()),
            _ => format!(
                "{:04}{:02}{:02}",
                self.date.year(),
                self.date.month(),
                self.date.day()
            ),
        }
    }
}

impl fmt::Display for V2Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl TryFrom<String> for V2Date {
    type Error = Hl7v2Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<V2Date> for String {
    fn from(value: V2Date) -> Self {
        value.format()
    }
}

/// An HL7 TM value with precision tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct V2Time {
    /// The time value; unstated components default to zero
    pub time: NaiveTime,
    /// The precision of this time (hour or finer)
    pub precision: V2Precision,
}

impl V2Time {
    /// Create a new time; precision coarser than hour is clamped to hour
    pub fn new(time: NaiveTime, precision: V2Precision) -> Self {
        Self {
            time,
            precision: precision.max(V2Precision::Hour),
        }
    }

    /// Parse an HL7 TM value: `HH`, `HHMM`, `HHMMSS` or `HHMMSS.S[SSS]`
    pub fn parse(s: &str) -> Result<Self> {
        let (main, frac) = match s.split_once('.') {
            Some((main, frac)) => (main, Some(frac)),
            None => (s, None),
        };
        let precision = match (main.len(), frac) {
            (2, None) => V2Precision::Hour,
            (4, None) => V2Precision::Minute,
            (6, None) => V2Precision::Second,
            (6, Some(_)) => V2Precision::Millisecond,
            _ => {
                return Err(Hl7v2Error::malformed_time(
                    s,
                    "expected HH, HHMM, HHMMSS or HHMMSS.S",
                ));
            }
        };
        let hour =
            digits(&main[0..2]).ok_or_else(|| Hl7v2Error::malformed_time(s, "hour is not numeric"))?;
        let minute = if main.len() >= 4 {
            digits(&main[2..4])
                .ok_or_else(|| Hl7v2Error::malformed_time(s, "minute is not numeric"))?
        } else {
            0
        };
        let second = if main.len() >= 6 {
            digits(&main[4..6])
                .ok_or_else(|| Hl7v2Error::malformed_time(s, "second is not numeric"))?
        } else {
            0
        };
        let milli = match frac {
            Some(frac) => fraction_millis(frac)
                .ok_or_else(|| Hl7v2Error::malformed_time(s, "fraction is not numeric"))?,
            None => 0,
        };
        let time = NaiveTime::from_hms_milli_opt(hour, minute, second, milli)
            .ok_or_else(|| Hl7v2Error::malformed_time(s, "no such time of day"))?;
        Ok(Self { time, precision })
    }

    /// Format back to the HL7 compact form at this value's precision
    pub fn format(&self) -> String {
        match self.precision {
            V2Precision::Minute => format!("{:02}{:02}", self.time.hour(), self.time.minute()),
            V2Precision::Second => format!(
                "{:02}{:02}{:02}",
                self.time.hour(),
                self.time.minute(),
                self.time.second()
            ),
            V2Precision::Millisecond => format!(
                "{:02}{:02}{:02}.{:03}",
                self.time.hour(),
                self.time.minute(),
                self.time.second(),
                self.time.nanosecond() / 1_000_000
            ),
            _ => format!("{:02}", self.time.hour()),
        }
    }
}

impl fmt::Display for V2Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl TryFrom<String> for V2Time {
    type Error = Hl7v2Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<V2Time> for String {
    fn from(value: V2Time) -> Self {
        value.format()
    }
}

/// An HL7 DTM value with precision tracking and optional UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct V2Timestamp {
    /// Date and time; unstated components default to their first value
    pub datetime: NaiveDateTime,
    /// UTC offset when the value carried one
    pub offset: Option<FixedOffset>,
    /// The precision of this timestamp
    pub precision: V2Precision,
}

impl V2Timestamp {
    /// Create a new timestamp without an offset
    pub fn new(datetime: NaiveDateTime, precision: V2Precision) -> Self {
        Self {
            datetime,
            offset: None,
            precision,
        }
    }

    /// Attach a UTC offset
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Parse an HL7 DTM value: `YYYY[MM[DD[HH[MM[SS[.S+]]]]]][±ZZZZ]`
    pub fn parse(s: &str) -> Result<Self> {
        let (main, offset) = match s.get(1..).and_then(|tail| tail.find(['+', '-'])) {
            Some(pos) => {
                let (main, tail) = s.split_at(pos + 1);
                (main, Some(Self::parse_offset(s, tail)?))
            }
            None => (s, None),
        };

        let (body, frac) = match main.split_once('.') {
            Some((body, frac)) => (body, Some(frac)),
            None => (main, None),
        };
        let precision = match (body.len(), frac) {
            (4, None) => V2Precision::Year,
            (6, None) => V2Precision::Month,
            (8, None) => V2Precision::Day,
            (10, None) => V2Precision::Hour,
            (12, None) => V2Precision::Minute,
            (14, None) => V2Precision::Second,
            (14, Some(_)) => V2Precision::Millisecond,
            _ => {
                return Err(Hl7v2Error::malformed_timestamp(
                    s,
                    "expected 4, 6, 8, 10, 12 or 14 leading digits",
                ));
            }
        };

        let date_part = &body[..body.len().min(8)];
        let date = V2Date::parse(date_part)
            .map_err(|_| Hl7v2Error::malformed_timestamp(s, "bad date component"))?
            .date;
        let time = if body.len() > 8 {
            let mut tm = body[8..].to_string();
            if let Some(frac) = frac {
                // TM parsing only accepts a fraction after full seconds
                tm = format!("{tm}.{frac}");
            }
            V2Time::parse(&tm)
                .map_err(|_| Hl7v2Error::malformed_timestamp(s, "bad time component"))?
                .time
        } else {
            NaiveTime::MIN
        };

        Ok(Self {
            datetime: NaiveDateTime::new(date, time),
            offset,
            precision,
        })
    }

    fn parse_offset(full: &str, tail: &str) -> Result<FixedOffset> {
        let (sign, rest) = match tail.as_bytes().first() {
            Some(b'+') => (1, &tail[1..]),
            Some(b'-') => (-1, &tail[1..]),
            _ => return Err(Hl7v2Error::malformed_timestamp(full, "bad offset")),
        };
        if rest.len() != 4 {
            return Err(Hl7v2Error::malformed_timestamp(full, "offset must be ±HHMM"));
        }
        let hours = digits(&rest[0..2])
            .ok_or_else(|| Hl7v2Error::malformed_timestamp(full, "offset hour is not numeric"))?;
        let minutes = digits(&rest[2..4])
            .ok_or_else(|| Hl7v2Error::malformed_timestamp(full, "offset minute is not numeric"))?;
        let seconds = sign * ((hours * 3600 + minutes * 60) as i32);
        FixedOffset::east_opt(seconds)
            .ok_or_else(|| Hl7v2Error::malformed_timestamp(full, "offset out of range"))
    }

    /// Format back to the HL7 compact form at this value's precision
    pub fn format(&self) -> String {
        let date = self.datetime.date();
        let time = self.datetime.time();
        let mut out = match self.precision {
            V2Precision::Year => format!("{:04}", date.year()),
            V2Precision::Month => format!("{:04}{:02}", date.year(), date.month()),
            V2Precision::Day => {
                format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
            }
            V2Precision::Hour => format!(
                "{:04}{:02}{:02}{:02}",
                date.year(),
                date.month(),
                date.day(),
                time.hour()
            ),
            V2Precision::Minute => format!(
                "{:04}{:02}{:02}{:02}{:02}",
                date.year(),
                date.month(),
                date.day(),
                time.hour(),
                time.minute()
            ),
            V2Precision::Second => format!(
                "{:04}{:02}{:02}{:02}{:02}{:02}",
                date.year(),
                date.month(),
                date.day(),
                time.hour(),
                time.minute(),
                time.second()
            ),
            V2Precision::Millisecond => format!(
                "{:04}{:02}{:02}{:02}{:02}{:02}.{:03}",
                date.year(),
                date.month(),
                date.day(),
                time.hour(),
                time.minute(),
                time.second(),
                time.nanosecond() / 1_000_000
            ),
        };
        if let Some(offset) = self.offset {
            let total = offset.local_minus_utc();
            let sign = if total < 0 { '-' } else { '+' };
            let total = total.abs();
            out.push_str(&format!("{sign}{:02}{:02}", total / 3600, (total % 3600) / 60));
        }
        out
    }
}

impl fmt::Display for V2Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl TryFrom<String> for V2Timestamp {
    type Error = Hl7v2Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<V2Timestamp> for String {
    fn from(value: V2Timestamp) -> Self {
        value.format()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024", V2Precision::Year)]
    #[case("202401", V2Precision::Month)]
    #[case("20240115", V2Precision::Day)]
    fn test_date_round_trip(#[case] input: &str, #[case] precision: V2Precision) {
        let date = V2Date::parse(input).unwrap();
        assert_eq!(date.precision, precision);
        assert_eq!(date.format(), input);
    }

    #[rstest]
    #[case("12", V2Precision::Hour)]
    #[case("1230", V2Precision::Minute)]
    #[case("123045", V2Precision::Second)]
    #[case("123045.250", V2Precision::Millisecond)]
    fn test_time_round_trip(#[case] input: &str, #[case] precision: V2Precision) {
        let time = V2Time::parse(input).unwrap();
        assert_eq!(time.precision, precision);
        assert_eq!(time.format(), input);
    }

    #[rstest]
    #[case("2024", V2Precision::Year)]
    #[case("202401", V2Precision::Month)]
    #[case("20240115", V2Precision::Day)]
    #[case("2024011512", V2Precision::Hour)]
    #[case("202401151230", V2Precision::Minute)]
    #[case("20240115123045", V2Precision::Second)]
    #[case("20240115123045.500", V2Precision::Millisecond)]
    fn test_timestamp_round_trip(#[case] input: &str, #[case] precision: V2Precision) {
        let ts = V2Timestamp::parse(input).unwrap();
        assert_eq!(ts.precision, precision);
        assert_eq!(ts.offset, None);
        assert_eq!(ts.format(), input);
    }

    #[rstest]
    #[case("20240115123045+0100", 3600)]
    #[case("20240115123045-0500", -18000)]
    #[case("202401151230+0000", 0)]
    fn test_timestamp_offsets(#[case] input: &str, #[case] seconds: i32) {
        let ts = V2Timestamp::parse(input).unwrap();
        assert_eq!(ts.offset, FixedOffset::east_opt(seconds));
        assert_eq!(ts.format(), input);
    }

    #[test]
    fn test_short_fraction_pads_to_millis() {
        let time = V2Time::parse("123045.2").unwrap();
        assert_eq!(time.time.nanosecond() / 1_000_000, 200);
        assert_eq!(time.format(), "123045.200");
    }

    #[rstest]
    #[case("20241")]
    #[case("2024-01")]
    #[case("20241301")]
    #[case("abcd")]
    fn test_malformed_dates(#[case] input: &str) {
        assert!(matches!(
            V2Date::parse(input),
            Err(Hl7v2Error::MalformedDate { .. })
        ));
    }

    #[rstest]
    #[case("1")]
    #[case("12.5")]
    #[case("256000")]
    fn test_malformed_times(#[case] input: &str) {
        assert!(matches!(
            V2Time::parse(input),
            Err(Hl7v2Error::MalformedTime { .. })
        ));
    }

    #[rstest]
    #[case("20240115123045+01")]
    #[case("202401151")]
    #[case("20240115.5")]
    fn test_malformed_timestamps(#[case] input: &str) {
        assert!(matches!(
            V2Timestamp::parse(input),
            Err(Hl7v2Error::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_unstated_components_default() {
        let ts = V2Timestamp::parse("2024").unwrap();
        assert_eq!(
            ts.datetime,
            NaiveDateTime::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveTime::MIN
            )
        );
    }
}
