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

use std::sync::Arc;

use serde::Serialize;
use tantivy::{
    collector::{Count, TopDocs},
    query::{BooleanQuery, Occur, Query},
    DocAddress, Order, Searcher,
};
use tracing::debug;

use crate::modules::criteria::Criterion;
use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::indexer::fields::{F_UID, KIND_FLAGS, KIND_MESSAGE};
use crate::modules::indexer::index::MailIndex;
use crate::modules::indexer::translator::{
    all_messages_query, kind_query, mailbox_query, CriteriaTranslator,
};
use crate::modules::message::MailboxId;
use crate::raise_error;

/// UIDs of the first `limit` documents matching `query`, ascending.
pub fn collect_uids(
    searcher: &Searcher,
    query: &dyn Query,
    limit: usize,
) -> tantivy::Result<Vec<u64>> {
    let docs: Vec<(u64, DocAddress)> = searcher.search(
        query,
        &TopDocs::with_limit(limit.max(1)).order_by_fast_field(F_UID, Order::Asc),
    )?;
    Ok(docs.into_iter().map(|(uid, _)| uid).collect())
}

/// UIDs of every document matching `query`, ascending.
pub fn collect_all_uids(searcher: &Searcher, query: &dyn Query) -> tantivy::Result<Vec<u64>> {
    let total = searcher.search(query, &Count)?;
    if total == 0 {
        return Ok(Vec::new());
    }
    collect_uids(searcher, query, total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub messages: usize,
    pub flags_documents: usize,
    pub segments: usize,
}

#[derive(Clone)]
pub struct SearchExecutor {
    index: Arc<MailIndex>,
}

impl SearchExecutor {
    pub fn new(index: Arc<MailIndex>) -> Self {
        Self { index }
    }

    /// UIDs of the messages of `mailbox` matching `criterion`, ascending and
    /// capped at the configured maximum. Hitting the cap is not an error.
    pub fn search(&self, mailbox: &MailboxId, criterion: &Criterion) -> MailSearchResult<Vec<u64>> {
        criterion.validate()?;
        let searcher = self.index.searcher()?;
        let translator = CriteriaTranslator::new(&searcher, mailbox, self.index.mode());
        let query = translator.translate(criterion)?;
        let limit = self.index.config().max_query_results;
        let uids = collect_uids(&searcher, query.as_ref(), limit).map_err(|e| {
            raise_error!(
                format!("Search in mailbox '{}' failed: {:#?}", mailbox, e),
                ErrorCode::IndexUnavailable
            )
        })?;
        if uids.len() >= limit {
            debug!(mailbox_id = %mailbox, limit, "Search results truncated");
        }
        Ok(uids)
    }

    /// Highest UID indexed for `mailbox`, if it has any message.
    pub fn highest_uid(&self, mailbox: &MailboxId) -> MailSearchResult<Option<u64>> {
        let searcher = self.index.searcher()?;
        let query = BooleanQuery::new(vec![
            (Occur::Must, mailbox_query(mailbox)),
            (Occur::Must, all_messages_query()),
        ]);
        let docs: Vec<(u64, DocAddress)> = searcher
            .search(
                &query,
                &TopDocs::with_limit(1).order_by_fast_field(F_UID, Order::Desc),
            )
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?;
        Ok(docs.first().map(|(uid, _)| *uid))
    }

    pub fn stats(&self) -> MailSearchResult<IndexStats> {
        let searcher = self.index.searcher()?;
        let count = |kind: &str| {
            searcher
                .search(kind_query(kind).as_ref(), &Count)
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))
        };
        Ok(IndexStats {
            messages: count(KIND_MESSAGE)?,
            flags_documents: count(KIND_FLAGS)?,
            segments: searcher.segment_readers().len(),
        })
    }
}
