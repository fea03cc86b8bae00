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

use std::ops::Bound;

use tantivy::{
    query::{BooleanQuery, EmptyQuery, Occur, Query, RangeQuery, TermQuery},
    schema::{Field, IndexRecordOption},
    Searcher, Term,
};
use tracing::debug;

use crate::modules::criteria::{
    Criterion, DateComparison, DateOperator, HeaderOperator, NumericOperator, TextScope,
};
use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::indexer::analyzer::{header_scope, AnalyzerMode};
use crate::modules::indexer::executor::collect_all_uids;
use crate::modules::indexer::fields::{KIND_FLAGS, KIND_MESSAGE};
use crate::modules::indexer::schema::SchemaTools;
use crate::modules::message::{Flag, MailboxId, UidRange};
use crate::raise_error;

/// Turns a [`Criterion`] tree into a tantivy query scoped to one mailbox.
///
/// Every negation is emitted next to a positive clause bounding the
/// candidate set, since a boolean query made only of `MustNot` clauses
/// matches nothing.
pub struct CriteriaTranslator<'a> {
    searcher: &'a Searcher,
    mailbox: &'a MailboxId,
    mode: AnalyzerMode,
}

impl<'a> CriteriaTranslator<'a> {
    pub fn new(searcher: &'a Searcher, mailbox: &'a MailboxId, mode: AnalyzerMode) -> Self {
        Self {
            searcher,
            mailbox,
            mode,
        }
    }

    pub fn translate(&self, criterion: &Criterion) -> MailSearchResult<Box<dyn Query>> {
        let query = self.build(criterion)?;
        Ok(Box::new(BooleanQuery::new(vec![
            (Occur::Must, mailbox_query(self.mailbox)),
            (Occur::Must, query),
        ])))
    }

    fn build(&self, criterion: &Criterion) -> MailSearchResult<Box<dyn Query>> {
        let f = SchemaTools::message_fields();
        let query = match criterion {
            Criterion::All => all_messages_query(),
            Criterion::Uid(ranges) => uid_ranges_query(ranges),
            Criterion::Size(operator) => numeric_query(f.f_size, operator),
            Criterion::ModSeq(operator) => numeric_query(f.f_mod_seq, operator),
            Criterion::InternalDate(operator) => internal_date_query(operator),
            Criterion::Header { name, operator } => self.header_query(name, operator)?,
            Criterion::Flag { flag, is_set } => self.flag_query(flag, *is_set)?,
            Criterion::Text { scope, value } => self.text_query(*scope, value),
            Criterion::And(criteria) => {
                if criteria.is_empty() {
                    return Ok(all_messages_query());
                }
                let clauses = criteria
                    .iter()
                    .map(|c| Ok((Occur::Must, self.build(c)?)))
                    .collect::<MailSearchResult<Vec<_>>>()?;
                Box::new(BooleanQuery::new(clauses))
            }
            Criterion::Or(criteria) => {
                if criteria.is_empty() {
                    return Ok(Box::new(EmptyQuery));
                }
                let clauses = criteria
                    .iter()
                    .map(|c| Ok((Occur::Should, self.build(c)?)))
                    .collect::<MailSearchResult<Vec<_>>>()?;
                Box::new(BooleanQuery::new(clauses))
            }
            Criterion::Nor(criteria) => {
                let mut clauses = vec![(Occur::Must, all_messages_query())];
                for c in criteria {
                    clauses.push((Occur::MustNot, self.build(c)?));
                }
                Box::new(BooleanQuery::new(clauses))
            }
        };
        Ok(query)
    }

    fn header_query(
        &self,
        name: &str,
        operator: &HeaderOperator,
    ) -> MailSearchResult<Box<dyn Query>> {
        let f = SchemaTools::message_fields();
        let scope = header_scope(name);
        let query = match operator {
            HeaderOperator::Exists => prefix_query(f.f_header, &scope),
            HeaderOperator::Contains(value) => self.scoped_query(&scope, value),
            HeaderOperator::Address(value) => match f.address_role(name.trim()) {
                Some(role) => all_prefixes_query(role, &self.mode.query_terms(value)),
                None => self.scoped_query(&scope, value),
            },
            HeaderOperator::Date(_) => {
                return Err(raise_error!(
                    format!(
                        "Date comparisons on header '{}' are not supported by the search index",
                        name
                    ),
                    ErrorCode::UnsupportedQuery
                ))
            }
        };
        Ok(query)
    }

    /// Header tokens are stored as `name:` followed by the value token.
    fn scoped_query(&self, scope: &str, value: &str) -> Box<dyn Query> {
        let terms: Vec<String> = self
            .mode
            .query_terms(value)
            .into_iter()
            .map(|term| format!("{}{}", scope, term))
            .collect();
        all_prefixes_query(SchemaTools::message_fields().f_header, &terms)
    }

    fn text_query(&self, scope: TextScope, value: &str) -> Box<dyn Query> {
        let f = SchemaTools::message_fields();
        let terms = self.mode.query_terms(value);
        match scope {
            TextScope::Body => all_prefixes_query(f.f_body, &terms),
            TextScope::Full => Box::new(BooleanQuery::new(vec![
                (Occur::Should, all_prefixes_query(f.f_body, &terms)),
                (Occur::Should, all_prefixes_query(f.f_headers, &terms)),
            ])),
        }
    }

    /// Flags live on separate documents, so the matching UIDs are looked up
    /// on the same snapshot first and then applied as a UID criterion.
    fn flag_query(&self, flag: &Flag, is_set: bool) -> MailSearchResult<Box<dyn Query>> {
        let f = SchemaTools::message_fields();
        let token = TermQuery::new(
            Term::from_field_text(f.f_flags, &flag.index_token()),
            IndexRecordOption::Basic,
        );
        let occur = if is_set { Occur::Must } else { Occur::MustNot };
        let query = BooleanQuery::new(vec![
            (Occur::Must, mailbox_query(self.mailbox)),
            (Occur::Must, kind_query(KIND_FLAGS)),
            (occur, Box::new(token) as Box<dyn Query>),
        ]);
        let uids = collect_all_uids(self.searcher, &query).map_err(|e| {
            raise_error!(
                format!(
                    "Flag lookup for {} in mailbox '{}' failed: {}",
                    flag, self.mailbox, e
                ),
                ErrorCode::IndexUnavailable
            )
        })?;
        let ranges = UidRange::compress(uids);
        debug!(
            mailbox_id = %self.mailbox,
            flag = %flag,
            is_set,
            ranges = ranges.len(),
            "Resolved flag criterion to UID ranges"
        );
        Ok(uid_ranges_query(&ranges))
    }
}

pub fn mailbox_query(mailbox: &MailboxId) -> Box<dyn Query> {
    let f = SchemaTools::message_fields();
    Box::new(TermQuery::new(
        Term::from_field_text(f.f_mailbox_id, mailbox.as_str()),
        IndexRecordOption::Basic,
    ))
}

pub fn kind_query(kind: &str) -> Box<dyn Query> {
    let f = SchemaTools::message_fields();
    Box::new(TermQuery::new(
        Term::from_field_text(f.f_kind, kind),
        IndexRecordOption::Basic,
    ))
}

/// Matches the single document of `kind` stored under `key`.
pub fn key_query(key: &str, kind: &str) -> Box<dyn Query> {
    let f = SchemaTools::message_fields();
    Box::new(BooleanQuery::new(vec![
        (
            Occur::Must,
            Box::new(TermQuery::new(
                Term::from_field_text(f.f_id, key),
                IndexRecordOption::Basic,
            )) as Box<dyn Query>,
        ),
        (Occur::Must, kind_query(kind)),
    ]))
}

pub fn uid_range_query(range: UidRange) -> Box<dyn Query> {
    let f = SchemaTools::message_fields();
    Box::new(RangeQuery::new(
        Bound::Included(Term::from_field_u64(f.f_uid, range.from)),
        Bound::Included(Term::from_field_u64(f.f_uid, range.to)),
    ))
}

/// Every content document, whatever the mailbox.
pub fn all_messages_query() -> Box<dyn Query> {
    Box::new(BooleanQuery::new(vec![
        (Occur::Must, uid_range_query(UidRange::all())),
        (Occur::Must, kind_query(KIND_MESSAGE)),
    ]))
}

fn uid_ranges_query(ranges: &[UidRange]) -> Box<dyn Query> {
    if ranges.is_empty() {
        return Box::new(EmptyQuery);
    }
    let any_range = BooleanQuery::new(
        ranges
            .iter()
            .map(|range| (Occur::Should, uid_range_query(*range)))
            .collect(),
    );
    Box::new(BooleanQuery::new(vec![
        (Occur::Must, Box::new(any_range) as Box<dyn Query>),
        (Occur::Must, kind_query(KIND_MESSAGE)),
    ]))
}

fn numeric_query(field: Field, operator: &NumericOperator) -> Box<dyn Query> {
    let (lower, upper) = match *operator {
        NumericOperator::Equals(v) => (Bound::Included(v), Bound::Included(v)),
        NumericOperator::GreaterThan(v) => (Bound::Excluded(v), Bound::Included(u64::MAX)),
        NumericOperator::LessThan(v) => (Bound::Included(0), Bound::Excluded(v)),
    };
    Box::new(RangeQuery::new(
        lower.map(|v| Term::from_field_u64(field, v)),
        upper.map(|v| Term::from_field_u64(field, v)),
    ))
}

fn internal_date_query(operator: &DateOperator) -> Box<dyn Query> {
    let field = SchemaTools::message_fields().internal_date(operator.resolution);
    let value = operator.resolution.truncate(&operator.date);
    let (lower, upper) = match operator.comparison {
        DateComparison::On => (Bound::Included(value), Bound::Included(value)),
        DateComparison::Before => (Bound::Included(i64::MIN), Bound::Excluded(value)),
        DateComparison::After => (Bound::Excluded(value), Bound::Included(i64::MAX)),
    };
    Box::new(RangeQuery::new(
        lower.map(|v| Term::from_field_i64(field, v)),
        upper.map(|v| Term::from_field_i64(field, v)),
    ))
}

fn all_prefixes_query(field: Field, prefixes: &[String]) -> Box<dyn Query> {
    match prefixes {
        [single] => prefix_query(field, single),
        _ => Box::new(BooleanQuery::new(
            prefixes
                .iter()
                .map(|prefix| (Occur::Must, prefix_query(field, prefix)))
                .collect(),
        )),
    }
}

/// Matches documents holding at least one term of `field` starting with
/// `prefix`, as a range over the sorted term dictionary.
pub fn prefix_query(field: Field, prefix: &str) -> Box<dyn Query> {
    let lower = Bound::Included(Term::from_field_text(field, prefix));
    let upper = match prefix_successor(prefix) {
        Some(successor) => Bound::Excluded(Term::from_field_text(field, &successor)),
        None => Bound::Unbounded,
    };
    Box::new(RangeQuery::new(lower, upper))
}

/// Smallest string greater than every string starting with `prefix`.
fn prefix_successor(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        let mut next = last as u32 + 1;
        // skip the surrogate block
        if (0xD800..=0xDFFF).contains(&next) {
            next = 0xE000;
        }
        if let Some(c) = char::from_u32(next) {
            chars.push(c);
            return Some(chars.into_iter().collect());
        }
    }
    None
}
