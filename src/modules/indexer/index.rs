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

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tantivy::{
    directory::MmapDirectory,
    store::{Compressor, ZstdCompressor},
    Index, IndexBuilder, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, Searcher,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::indexer::analyzer::{register_tokenizers, AnalyzerMode};
use crate::modules::indexer::schema::SchemaTools;
use crate::modules::settings::index::IndexConfig;
use crate::raise_error;

/// The tantivy index with its single writer and its reader.
///
/// The writer sits behind an async mutex so that each logical write
/// (add, update, delete) runs alone. It becomes `None` once closed.
pub struct MailIndex {
    index: Index,
    writer: Mutex<Option<IndexWriter>>,
    reader: IndexReader,
    config: IndexConfig,
    mode: AnalyzerMode,
    dirty: AtomicBool,
}

impl MailIndex {
    pub fn open(config: IndexConfig) -> MailSearchResult<Self> {
        config.validate()?;
        let mode = AnalyzerMode::from_config(&config);
        let index = match &config.index_dir {
            Some(dir) => Self::open_or_create_index(dir)?,
            None => IndexBuilder::new()
                .schema(SchemaTools::message_schema())
                .create_in_ram()
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?,
        };
        register_tokenizers(&index, mode);

        let writer = index
            .writer_with_num_threads(config.writer_threads, config.writer_heap_size)
            .map_err(|e| {
                raise_error!(
                    format!(
                        "Failed to create IndexWriter with {} threads and {} bytes: {:#?}",
                        config.writer_threads, config.writer_heap_size, e
                    ),
                    ErrorCode::IndexUnavailable
                )
            })?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| {
                raise_error!(
                    format!("Failed to create IndexReader: {:#?}", e),
                    ErrorCode::IndexUnavailable
                )
            })?;

        info!(
            index_dir = ?config.index_dir,
            substring_analysis = config.substring_analysis,
            commit_interval_secs = ?config.commit_interval_secs,
            "Search index opened"
        );
        Ok(Self {
            index,
            writer: Mutex::new(Some(writer)),
            reader,
            config,
            mode,
            dirty: AtomicBool::new(false),
        })
    }

    fn open_or_create_index(index_dir: &Path) -> MailSearchResult<Index> {
        std::fs::create_dir_all(index_dir)?;
        let directory = MmapDirectory::open(index_dir)
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?;
        let exists = Index::exists(&directory)
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?;
        if exists {
            let index = Index::open(directory).map_err(|e| {
                raise_error!(
                    format!("Failed to open index in {:?}: {:#?}", index_dir, e),
                    ErrorCode::IndexUnavailable
                )
            })?;
            SchemaTools::ensure_compatible(&index.schema())?;
            debug!("Opened existing index in {:?}", index_dir);
            Ok(index)
        } else {
            IndexBuilder::new()
                .schema(SchemaTools::message_schema())
                .settings(IndexSettings {
                    docstore_compression: Compressor::Zstd(ZstdCompressor {
                        compression_level: Some(6),
                    }),
                    docstore_compress_dedicated_thread: true,
                    docstore_blocksize: 2_097_152,
                })
                .open_or_create(directory)
                .map_err(|e| {
                    raise_error!(
                        format!("Failed to create index in {:?}: {:#?}", index_dir, e),
                        ErrorCode::IndexUnavailable
                    )
                })
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn mode(&self) -> AnalyzerMode {
        self.mode
    }

    fn auto_commit(&self) -> bool {
        self.config.commit_interval_secs.is_none()
    }

    /// A point-in-time snapshot including everything committed so far.
    pub fn searcher(&self) -> MailSearchResult<Searcher> {
        self.reader
            .reload()
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?;
        Ok(self.reader.searcher())
    }

    /// Runs one logical write while holding the writer.
    ///
    /// In auto-commit mode the write is committed before the lock is
    /// released, and a failed write is rolled back so no part of it becomes
    /// visible. With a commit interval the write stays pending until the next
    /// [`MailIndex::flush`].
    pub async fn write<T, F>(self: &Arc<Self>, operation: &'static str, f: F) -> MailSearchResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut IndexWriter) -> MailSearchResult<T> + Send + 'static,
    {
        let index = self.clone();
        run_blocking(move || index.write_locked(operation, |_, writer| f(writer))).await
    }

    /// Like [`MailIndex::write`], but `f` also gets a searcher taken under the
    /// writer lock. Pending writes are committed first so the searcher sees
    /// every earlier write and nothing can change it before `f` returns.
    pub async fn write_with_snapshot<T, F>(
        self: &Arc<Self>,
        operation: &'static str,
        f: F,
    ) -> MailSearchResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut IndexWriter, &Searcher) -> MailSearchResult<T> + Send + 'static,
    {
        let index = self.clone();
        run_blocking(move || {
            index.write_locked(operation, |index, writer| {
                if index.dirty.load(Ordering::Acquire) {
                    index.commit(writer)?;
                }
                let searcher = index.searcher()?;
                f(writer, &searcher)
            })
        })
        .await
    }

    fn write_locked<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&Self, &mut IndexWriter) -> MailSearchResult<T>,
    ) -> MailSearchResult<T> {
        let mut guard = self.writer.blocking_lock();
        let writer = guard.as_mut().ok_or_else(|| {
            raise_error!(
                format!("Cannot {}: the index writer is closed", operation),
                ErrorCode::IndexUnavailable
            )
        })?;

        match f(self, writer) {
            Ok(value) => {
                if self.auto_commit() {
                    self.commit(writer)?;
                } else {
                    self.dirty.store(true, Ordering::Release);
                }
                Ok(value)
            }
            Err(e) => {
                if self.auto_commit() {
                    if let Err(rollback) = writer.rollback() {
                        warn!("Rollback after failed {} also failed: {:#?}", operation, rollback);
                    }
                }
                Err(e)
            }
        }
    }

    /// Commits pending writes, if any, and refreshes the reader.
    pub async fn flush(self: &Arc<Self>) -> MailSearchResult<()> {
        let index = self.clone();
        run_blocking(move || {
            let mut guard = index.writer.blocking_lock();
            let writer = guard.as_mut().ok_or_else(|| {
                raise_error!(
                    "Cannot flush: the index writer is closed".into(),
                    ErrorCode::IndexUnavailable
                )
            })?;
            if index.dirty.load(Ordering::Acquire) {
                index.commit(writer)?;
            }
            Ok(())
        })
        .await
    }

    fn commit(&self, writer: &mut IndexWriter) -> MailSearchResult<()> {
        let opstamp = writer.commit().map_err(|e| {
            raise_error!(
                format!("Failed to commit index: {:#?}", e),
                ErrorCode::IndexUnavailable
            )
        })?;
        self.dirty.store(false, Ordering::Release);
        self.reader
            .reload()
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::IndexUnavailable))?;
        debug!(opstamp, "Index committed");
        Ok(())
    }

    /// Commits what is pending, waits for merges and releases the writer.
    /// Later writes fail with `IndexUnavailable`; searches keep working on
    /// the last committed state.
    pub async fn close(self: &Arc<Self>) -> MailSearchResult<()> {
        let index = self.clone();
        run_blocking(move || {
            let mut guard = index.writer.blocking_lock();
            let Some(mut writer) = guard.take() else {
                return Ok(());
            };
            if index.dirty.load(Ordering::Acquire) {
                index.commit(&mut writer)?;
            }
            writer.wait_merging_threads().map_err(|e| {
                raise_error!(
                    format!("Failed waiting for merge threads: {:#?}", e),
                    ErrorCode::IndexUnavailable
                )
            })?;
            info!("Search index closed");
            Ok(())
        })
        .await
    }
}

/// Runs blocking index work off the async worker threads.
pub async fn run_blocking<T, F>(f: F) -> MailSearchResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> MailSearchResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?
}
