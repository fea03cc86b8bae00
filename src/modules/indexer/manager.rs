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

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, Mutex},
    task::{self, JoinHandle},
};
use tracing::{error, info};

use crate::modules::criteria::Criterion;
use crate::modules::error::MailSearchResult;
use crate::modules::indexer::executor::{IndexStats, SearchExecutor};
use crate::modules::indexer::gateway::IndexWriterGateway;
use crate::modules::indexer::index::{run_blocking, MailIndex};
use crate::modules::message::{Flags, MailboxId, MailboxMessage, UidRange};
use crate::modules::mime::{MailParserDecoder, MimeStreamDecoder};
use crate::modules::settings::index::IndexConfig;

pub enum CommitMessage {
    Flush,
    Shutdown,
}

struct BackgroundCommitter {
    sender: mpsc::Sender<CommitMessage>,
    handle: JoinHandle<()>,
}

impl BackgroundCommitter {
    fn spawn(index: Arc<MailIndex>, period: Duration) -> Self {
        let (sender, mut receiver) = mpsc::channel::<CommitMessage>(16);
        let handle = task::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    maybe_msg = receiver.recv() => {
                        match maybe_msg {
                            Some(CommitMessage::Flush) => commit_pending(&index).await,
                            Some(CommitMessage::Shutdown) | None => break,
                        }
                    }
                    _ = interval.tick() => commit_pending(&index).await,
                }
            }
        });
        Self { sender, handle }
    }
}

async fn commit_pending(index: &Arc<MailIndex>) {
    if let Err(e) = index.flush().await {
        error!("Background commit failed: {:#?}", e);
    }
}

/// The search index of a mail store: indexing of appended messages, flag
/// updates, expunges and IMAP SEARCH evaluation.
pub struct MessageSearchIndex {
    index: Arc<MailIndex>,
    gateway: IndexWriterGateway,
    executor: SearchExecutor,
    committer: Mutex<Option<BackgroundCommitter>>,
}

impl MessageSearchIndex {
    /// Opens the index with the default `mail-parser` decoder.
    pub async fn open(config: IndexConfig) -> MailSearchResult<Self> {
        Self::open_with_decoder(config, Arc::new(MailParserDecoder)).await
    }

    pub async fn open_with_decoder(
        config: IndexConfig,
        decoder: Arc<dyn MimeStreamDecoder>,
    ) -> MailSearchResult<Self> {
        let index = Arc::new(MailIndex::open(config)?);
        let committer = index
            .config()
            .commit_interval()
            .map(|period| BackgroundCommitter::spawn(index.clone(), period));
        Ok(Self {
            gateway: IndexWriterGateway::new(index.clone(), decoder),
            executor: SearchExecutor::new(index.clone()),
            index,
            committer: Mutex::new(committer),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        self.index.config()
    }

    pub async fn add(
        &self,
        mailbox: &MailboxId,
        message: &dyn MailboxMessage,
    ) -> MailSearchResult<()> {
        self.gateway.add(mailbox, message).await
    }

    pub async fn update(
        &self,
        mailbox: &MailboxId,
        range: UidRange,
        flags: &Flags,
    ) -> MailSearchResult<usize> {
        self.gateway.update(mailbox, range, flags).await
    }

    pub async fn delete(&self, mailbox: &MailboxId, range: UidRange) -> MailSearchResult<()> {
        self.gateway.delete(mailbox, range).await
    }

    pub async fn search(
        &self,
        mailbox: &MailboxId,
        criterion: &Criterion,
    ) -> MailSearchResult<Vec<u64>> {
        let executor = self.executor.clone();
        let mailbox = mailbox.clone();
        let criterion = criterion.clone();
        run_blocking(move || executor.search(&mailbox, &criterion)).await
    }

    pub async fn highest_uid(&self, mailbox: &MailboxId) -> MailSearchResult<Option<u64>> {
        let executor = self.executor.clone();
        let mailbox = mailbox.clone();
        run_blocking(move || executor.highest_uid(&mailbox)).await
    }

    pub async fn stats(&self) -> MailSearchResult<IndexStats> {
        let executor = self.executor.clone();
        run_blocking(move || executor.stats()).await
    }

    /// Makes every write issued so far visible to searches.
    pub async fn flush(&self) -> MailSearchResult<()> {
        self.gateway.flush().await
    }

    /// Stops the background committer, commits and releases the writer.
    pub async fn close(&self) -> MailSearchResult<()> {
        if let Some(committer) = self.committer.lock().await.take() {
            let _ = committer.sender.send(CommitMessage::Shutdown).await;
            if let Err(e) = committer.handle.await {
                error!("Background committer ended abnormally: {:#?}", e);
            }
        }
        self.index.close().await?;
        info!("Message search index shut down");
        Ok(())
    }

    /// Asks the background committer, if any, to commit soon without waiting.
    pub async fn request_commit(&self) {
        if let Some(committer) = self.committer.lock().await.as_ref() {
            let _ = committer.sender.send(CommitMessage::Flush).await;
        }
    }
}
