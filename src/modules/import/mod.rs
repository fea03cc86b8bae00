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

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use mail_parser::MessageParser;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::modules::error::MailSearchResult;
use crate::modules::indexer::manager::MessageSearchIndex;
use crate::modules::message::{Flags, MailboxId, StoredMessage};

pub mod mbox;

#[cfg(test)]
mod mbox_tests;

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FailedImportDetail {
    /// The 0-based position of the failed message in the input
    pub index: usize,
    pub error_message: String,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Total number of messages processed
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// UIDs assigned to the indexed messages, in input order
    pub uids: Vec<u64>,
    pub failed_details: Vec<FailedImportDetail>,
}

impl ImportReport {
    fn record_success(&mut self, uid: u64) {
        self.total += 1;
        self.success += 1;
        self.uids.push(uid);
    }

    fn record_failure(&mut self, index: usize, error_message: String) {
        error!("{}", error_message);
        self.total += 1;
        self.failed += 1;
        self.failed_details.push(FailedImportDetail {
            index,
            error_message,
        });
    }
}

/// Hands out UIDs for appended messages, continuing after the highest UID
/// already indexed in the mailbox unless a first UID is given.
pub struct UidAllocator {
    next: u64,
}

impl UidAllocator {
    pub async fn new(
        index: &MessageSearchIndex,
        mailbox: &MailboxId,
        first_uid: Option<u64>,
    ) -> MailSearchResult<Self> {
        let next = match first_uid {
            Some(uid) => uid,
            None => index
                .highest_uid(mailbox)
                .await?
                .map_or(1, |uid| uid.saturating_add(1)),
        };
        Ok(Self { next })
    }

    pub fn next_uid(&mut self) -> u64 {
        let uid = self.next;
        self.next = self.next.saturating_add(1);
        uid
    }
}

/// Internal date taken from the `Date` header, or the current time when the
/// header is missing or unreadable.
pub fn internal_date_of(raw: &[u8]) -> DateTime<Utc> {
    MessageParser::default()
        .parse_headers(raw)
        .and_then(|message| message.date().map(|date| date.to_timestamp()))
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
        .unwrap_or_else(Utc::now)
}

/// Indexes one raw message under the next UID of the allocator.
pub async fn append_raw(
    index: &MessageSearchIndex,
    mailbox: &MailboxId,
    uids: &mut UidAllocator,
    raw: Vec<u8>,
    flags: &Flags,
) -> MailSearchResult<u64> {
    let uid = uids.next_uid();
    let internal_date = internal_date_of(&raw);
    let message = StoredMessage::new(mailbox.clone(), uid, raw)
        .with_internal_date(internal_date)
        .with_flags(flags.clone());
    index.add(mailbox, &message).await?;
    Ok(uid)
}

pub struct ImportEmls;

impl ImportEmls {
    /// Appends each `.eml` file to `mailbox`. A file that cannot be read or
    /// indexed is reported and skipped; the others are still imported.
    pub async fn do_import(
        index: &MessageSearchIndex,
        mailbox: &MailboxId,
        first_uid: Option<u64>,
        flags: &Flags,
        files: &[PathBuf],
    ) -> MailSearchResult<ImportReport> {
        let mut uids = UidAllocator::new(index, mailbox, first_uid).await?;
        let mut report = ImportReport::default();

        for (position, path) in files.iter().enumerate() {
            let raw = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    report.record_failure(
                        position,
                        format!("Failed to read EML file {:?}: {}", path, e),
                    );
                    continue;
                }
            };
            match append_raw(index, mailbox, &mut uids, raw, flags).await {
                Ok(uid) => report.record_success(uid),
                Err(e) => report.record_failure(
                    position,
                    format!("Failed to index EML file {:?}: {}", path, e),
                ),
            }
        }

        info!(
            mailbox_id = %mailbox,
            total = report.total,
            failed = report.failed,
            "EML import finished"
        );
        Ok(report)
    }
}
