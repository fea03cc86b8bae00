//
// Copyright (c) 2025 rustmailer.com (https://rustmailer.com)
//
// This file is part of the Bichon Email Archiving Project
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use chrono::{DateTime, Datelike, DurationRound, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::message::{Flag, UidRange};
use crate::raise_error;

/// One node of an IMAP SEARCH expression.
///
/// Criteria serialize to externally tagged JSON, for example
/// `{"and":[{"flag":{"flag":"seen","is_set":false}},{"size":{"greater_than":1024}}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    All,
    Uid(Vec<UidRange>),
    Size(NumericOperator),
    ModSeq(NumericOperator),
    InternalDate(DateOperator),
    Header { name: String, operator: HeaderOperator },
    Flag { flag: Flag, is_set: bool },
    Text { scope: TextScope, value: String },
    And(Vec<Criterion>),
    Or(Vec<Criterion>),
    Nor(Vec<Criterion>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericOperator {
    Equals(u64),
    GreaterThan(u64),
    LessThan(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateComparison {
    On,
    Before,
    After,
}

/// Granularity at which internal dates are indexed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateResolution {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOperator {
    pub comparison: DateComparison,
    pub resolution: DateResolution,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderOperator {
    Contains(String),
    Exists,
    Address(String),
    Date(DateOperator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextScope {
    /// Message body only.
    Body,
    /// Body and all header lines.
    Full,
}

impl DateResolution {
    pub const ALL: [DateResolution; 7] = [
        DateResolution::Year,
        DateResolution::Month,
        DateResolution::Day,
        DateResolution::Hour,
        DateResolution::Minute,
        DateResolution::Second,
        DateResolution::Millisecond,
    ];

    /// Epoch milliseconds of `date` truncated to this resolution, in UTC.
    pub fn truncate(&self, date: &DateTime<Utc>) -> i64 {
        let start_of = |year: i32, month: u32| {
            NaiveDate::from_ymd_opt(year, month, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc().timestamp_millis())
                .unwrap_or_else(|| date.timestamp_millis())
        };
        let round = |delta: TimeDelta| {
            date.duration_trunc(delta)
                .map(|d| d.timestamp_millis())
                .unwrap_or_else(|_| date.timestamp_millis())
        };
        match self {
            DateResolution::Year => start_of(date.year(), 1),
            DateResolution::Month => start_of(date.year(), date.month()),
            DateResolution::Day => round(TimeDelta::days(1)),
            DateResolution::Hour => round(TimeDelta::hours(1)),
            DateResolution::Minute => round(TimeDelta::minutes(1)),
            DateResolution::Second => round(TimeDelta::seconds(1)),
            DateResolution::Millisecond => date.timestamp_millis(),
        }
    }
}

impl Criterion {
    pub fn all() -> Self {
        Criterion::All
    }

    pub fn uid(ranges: Vec<UidRange>) -> Self {
        Criterion::Uid(ranges)
    }

    pub fn size_equals(size: u64) -> Self {
        Criterion::Size(NumericOperator::Equals(size))
    }

    pub fn size_greater_than(size: u64) -> Self {
        Criterion::Size(NumericOperator::GreaterThan(size))
    }

    pub fn size_less_than(size: u64) -> Self {
        Criterion::Size(NumericOperator::LessThan(size))
    }

    pub fn mod_seq_equals(mod_seq: u64) -> Self {
        Criterion::ModSeq(NumericOperator::Equals(mod_seq))
    }

    pub fn mod_seq_greater_than(mod_seq: u64) -> Self {
        Criterion::ModSeq(NumericOperator::GreaterThan(mod_seq))
    }

    pub fn mod_seq_less_than(mod_seq: u64) -> Self {
        Criterion::ModSeq(NumericOperator::LessThan(mod_seq))
    }

    pub fn internal_date_on(date: DateTime<Utc>, resolution: DateResolution) -> Self {
        Self::internal_date(DateComparison::On, date, resolution)
    }

    pub fn internal_date_before(date: DateTime<Utc>, resolution: DateResolution) -> Self {
        Self::internal_date(DateComparison::Before, date, resolution)
    }

    pub fn internal_date_after(date: DateTime<Utc>, resolution: DateResolution) -> Self {
        Self::internal_date(DateComparison::After, date, resolution)
    }

    fn internal_date(
        comparison: DateComparison,
        date: DateTime<Utc>,
        resolution: DateResolution,
    ) -> Self {
        Criterion::InternalDate(DateOperator {
            comparison,
            resolution,
            date,
        })
    }

    pub fn header_contains(name: impl Into<String>, value: impl Into<String>) -> Self {
        Criterion::Header {
            name: name.into(),
            operator: HeaderOperator::Contains(value.into()),
        }
    }

    pub fn header_exists(name: impl Into<String>) -> Self {
        Criterion::Header {
            name: name.into(),
            operator: HeaderOperator::Exists,
        }
    }

    pub fn address(name: impl Into<String>, value: impl Into<String>) -> Self {
        Criterion::Header {
            name: name.into(),
            operator: HeaderOperator::Address(value.into()),
        }
    }

    pub fn flag_is_set(flag: Flag) -> Self {
        Criterion::Flag { flag, is_set: true }
    }

    pub fn flag_is_unset(flag: Flag) -> Self {
        Criterion::Flag {
            flag,
            is_set: false,
        }
    }

    pub fn body_contains(value: impl Into<String>) -> Self {
        Criterion::Text {
            scope: TextScope::Body,
            value: value.into(),
        }
    }

    pub fn mail_contains(value: impl Into<String>) -> Self {
        Criterion::Text {
            scope: TextScope::Full,
            value: value.into(),
        }
    }

    pub fn and(criteria: Vec<Criterion>) -> Self {
        Criterion::And(criteria)
    }

    pub fn or(criteria: Vec<Criterion>) -> Self {
        Criterion::Or(criteria)
    }

    pub fn nor(criteria: Vec<Criterion>) -> Self {
        Criterion::Nor(criteria)
    }

    pub fn not(criterion: Criterion) -> Self {
        Criterion::Nor(vec![criterion])
    }

    /// Rejects criteria that cannot be answered by the index, before any
    /// snapshot is opened.
    pub fn validate(&self) -> MailSearchResult<()> {
        match self {
            Criterion::Header {
                name,
                operator: HeaderOperator::Date(_),
            } => Err(raise_error!(
                format!(
                    "Date comparisons on header '{}' are not supported by the search index",
                    name
                ),
                ErrorCode::UnsupportedQuery
            )),
            Criterion::Header { name, .. } if name.trim().is_empty() => Err(raise_error!(
                "Header criteria require a header name".into(),
                ErrorCode::InvalidParameter
            )),
            Criterion::Uid(ranges) => match ranges.iter().find(|r| !r.is_well_formed()) {
                Some(range) => Err(raise_error!(
                    format!("Invalid UID range {}:{}", range.from, range.to),
                    ErrorCode::InvalidParameter
                )),
                None => Ok(()),
            },
            Criterion::And(criteria) | Criterion::Or(criteria) | Criterion::Nor(criteria) => {
                criteria.iter().try_for_each(Criterion::validate)
            }
            _ => Ok(()),
        }
    }
}
