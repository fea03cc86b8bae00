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

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::raise_error;

pub const DEFAULT_MAX_QUERY_RESULTS: usize = 100_000;
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 3;
pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 40;
pub const DEFAULT_WRITER_HEAP_SIZE: usize = 64 * 1024 * 1024;
/// tantivy refuses writers with less memory than this per indexing thread.
pub const MIN_WRITER_HEAP_PER_THREAD: usize = 15_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding the index files. `None` keeps the index in memory.
    pub index_dir: Option<PathBuf>,
    pub max_query_results: usize,
    pub min_token_length: usize,
    pub max_token_length: usize,
    /// `true` indexes every substring n-gram so IMAP substring semantics hold;
    /// `false` indexes whitespace-separated words only.
    pub substring_analysis: bool,
    pub writer_heap_size: usize,
    pub writer_threads: usize,
    /// `None` commits after every write, `Some(n)` commits every `n` seconds.
    pub commit_interval_secs: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: None,
            max_query_results: DEFAULT_MAX_QUERY_RESULTS,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
            substring_analysis: true,
            writer_heap_size: DEFAULT_WRITER_HEAP_SIZE,
            writer_threads: num_cpus::get().clamp(1, 4),
            commit_interval_secs: None,
        }
    }
}

impl IndexConfig {
    /// A small single-threaded in-memory configuration.
    pub fn in_memory() -> Self {
        Self {
            writer_heap_size: MIN_WRITER_HEAP_PER_THREAD * 2,
            writer_threads: 1,
            ..Default::default()
        }
    }

    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    pub fn with_max_query_results(mut self, max: usize) -> Self {
        self.max_query_results = max;
        self
    }

    pub fn with_token_lengths(mut self, min: usize, max: usize) -> Self {
        self.min_token_length = min;
        self.max_token_length = max;
        self
    }

    pub fn with_substring_analysis(mut self, enabled: bool) -> Self {
        self.substring_analysis = enabled;
        self
    }

    pub fn with_writer(mut self, heap_size: usize, threads: usize) -> Self {
        self.writer_heap_size = heap_size;
        self.writer_threads = threads;
        self
    }

    pub fn with_commit_interval(mut self, seconds: Option<u64>) -> Self {
        self.commit_interval_secs = seconds;
        self
    }

    pub fn commit_interval(&self) -> Option<Duration> {
        self.commit_interval_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> MailSearchResult<()> {
        if self.max_query_results == 0 {
            return Err(raise_error!(
                "max_query_results must be at least 1".into(),
                ErrorCode::InvalidParameter
            ));
        }
        if self.min_token_length == 0 || self.min_token_length > self.max_token_length {
            return Err(raise_error!(
                format!(
                    "Token lengths must satisfy 1 <= min <= max, got min={} max={}",
                    self.min_token_length, self.max_token_length
                ),
                ErrorCode::InvalidParameter
            ));
        }
        if self.writer_threads == 0 {
            return Err(raise_error!(
                "writer_threads must be at least 1".into(),
                ErrorCode::InvalidParameter
            ));
        }
        if self.writer_heap_size / self.writer_threads < MIN_WRITER_HEAP_PER_THREAD {
            return Err(raise_error!(
                format!(
                    "writer_heap_size {} is too small for {} threads (at least {} bytes per thread)",
                    self.writer_heap_size, self.writer_threads, MIN_WRITER_HEAP_PER_THREAD
                ),
                ErrorCode::InvalidParameter
            ));
        }
        if self.commit_interval_secs == Some(0) {
            return Err(raise_error!(
                "commit_interval_secs must be positive when set".into(),
                ErrorCode::InvalidParameter
            ));
        }
        if let Some(dir) = &self.index_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(raise_error!(
                    format!("Index path {:?} is not a directory", dir),
                    ErrorCode::MissingConfiguration
                ));
            }
        }
        Ok(())
    }
}
