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

use tantivy::{
    query::{BooleanQuery, Occur},
    IndexWriter, TantivyDocument,
};
use tracing::{debug, info};

use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::indexer::document::{doc_key, flags_doc_key, DocumentBuilder};
use crate::modules::indexer::executor::collect_all_uids;
use crate::modules::indexer::fields::{KIND_FLAGS, KIND_MESSAGE};
use crate::modules::indexer::index::MailIndex;
use crate::modules::indexer::translator::{key_query, kind_query, mailbox_query, uid_range_query};
use crate::modules::message::{Flags, MailboxId, MailboxMessage, UidRange};
use crate::modules::mime::MimeStreamDecoder;
use crate::raise_error;

/// Applies message lifecycle events to the index.
pub struct IndexWriterGateway {
    index: Arc<MailIndex>,
    decoder: Arc<dyn MimeStreamDecoder>,
}

impl IndexWriterGateway {
    pub fn new(index: Arc<MailIndex>, decoder: Arc<dyn MimeStreamDecoder>) -> Self {
        Self { index, decoder }
    }

    /// Indexes a newly appended message as a content document and a flags
    /// document. Re-adding the same UID replaces both.
    pub async fn add(
        &self,
        mailbox: &MailboxId,
        message: &dyn MailboxMessage,
    ) -> MailSearchResult<()> {
        if message.mailbox_id() != *mailbox {
            return Err(raise_error!(
                format!(
                    "Message uid={} belongs to mailbox '{}', not '{}'",
                    message.uid(),
                    message.mailbox_id(),
                    mailbox
                ),
                ErrorCode::InvalidParameter
            ));
        }
        let uid = message.uid();
        let builder = DocumentBuilder::new(self.decoder.as_ref());
        let content = builder.content_document(mailbox, message)?;
        let flags = builder.flags_document(mailbox, uid, &message.flags());
        let content_key = doc_key(mailbox, uid);
        let flags_key = flags_doc_key(mailbox, uid);

        self.index
            .write("add", move |writer| {
                replace(writer, &content_key, KIND_MESSAGE, content)?;
                replace(writer, &flags_key, KIND_FLAGS, flags)
            })
            .await?;
        debug!(mailbox_id = %mailbox, uid, "Message indexed");
        Ok(())
    }

    /// Replaces the flags of every message of `mailbox` in `range` with
    /// `flags`. Returns the number of flags documents rewritten.
    ///
    /// The flags documents are looked up under the writer lock, so messages
    /// added but not yet committed are found and concurrent deletes cannot
    /// leave a flags document behind.
    pub async fn update(
        &self,
        mailbox: &MailboxId,
        range: UidRange,
        flags: &Flags,
    ) -> MailSearchResult<usize> {
        let decoder = self.decoder.clone();
        let target = mailbox.clone();
        let flags = flags.clone();
        let applied = self
            .index
            .write_with_snapshot("update", move |writer, searcher| {
                let query = BooleanQuery::new(vec![
                    (Occur::Must, mailbox_query(&target)),
                    (Occur::Must, kind_query(KIND_FLAGS)),
                    (Occur::Must, uid_range_query(range)),
                ]);
                let uids = collect_all_uids(searcher, &query).map_err(|e| {
                    raise_error!(
                        format!("Failed to look up flags documents: {:#?}", e),
                        ErrorCode::IndexUnavailable
                    )
                })?;

                let builder = DocumentBuilder::new(decoder.as_ref());
                let total = uids.len();
                for (applied, uid) in uids.iter().enumerate() {
                    let doc = builder.flags_document(&target, *uid, &flags);
                    replace(writer, &flags_doc_key(&target, *uid), KIND_FLAGS, doc).map_err(
                        |e| {
                            raise_error!(
                                format!(
                                    "Flag update failed at message {} of {} in mailbox '{}': {}",
                                    applied + 1, total, target, e
                                ),
                                ErrorCode::IndexUnavailable
                            )
                        },
                    )?;
                }
                Ok(total)
            })
            .await?;
        if applied == 0 {
            debug!(mailbox_id = %mailbox, range = %range, "No flags documents to update");
        } else {
            debug!(mailbox_id = %mailbox, range = %range, applied, "Flags updated");
        }
        Ok(applied)
    }

    /// Removes both documents of every message of `mailbox` in `range`.
    pub async fn delete(&self, mailbox: &MailboxId, range: UidRange) -> MailSearchResult<()> {
        let query = BooleanQuery::new(vec![
            (Occur::Must, mailbox_query(mailbox)),
            (Occur::Must, uid_range_query(range)),
        ]);
        let target = mailbox.clone();
        self.index
            .write("delete", move |writer| {
                writer.delete_query(Box::new(query)).map_err(|e| {
                    raise_error!(
                        format!("Failed to delete {} from mailbox '{}': {:#?}", range, target, e),
                        ErrorCode::IndexUnavailable
                    )
                })?;
                Ok(())
            })
            .await?;
        info!(mailbox_id = %mailbox, range = %range, "Messages removed from index");
        Ok(())
    }

    pub async fn flush(&self) -> MailSearchResult<()> {
        self.index.flush().await
    }
}

/// Deletes the document of `kind` stored under `key`, then adds `doc`.
fn replace(
    writer: &mut IndexWriter,
    key: &str,
    kind: &str,
    doc: TantivyDocument,
) -> MailSearchResult<()> {
    writer
        .delete_query(key_query(key, kind))
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?;
    writer
        .add_document(doc)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?;
    Ok(())
}
