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

use clap::{builder::ValueParser, ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::modules::settings::index::IndexConfig;

#[derive(Debug, Parser)]
#[clap(
    name = "mailsearch",
    about = "Substring search index for IMAP mailboxes",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// mailsearch log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for mailsearch"
    )]
    pub mailsearch_log_level: String,
    /// Enable ANSI logs (default: true)
    #[clap(
        long,
        default_value = "true",
        env,
        action = ArgAction::Set,
        help = "Enable ANSI formatted logs"
    )]
    pub mailsearch_ansi_logs: bool,
    /// Enable log file output (default: false)
    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        action = ArgAction::Set,
        help = "Enable log file output (otherwise logs go to stdout)"
    )]
    pub mailsearch_log_to_file: bool,
    /// Enable JSON logs (default: false)
    #[clap(
        long,
        default_value = "false",
        env,
        action = ArgAction::Set,
        help = "Enable JSON formatted logs"
    )]
    pub mailsearch_json_logs: bool,
    #[clap(
        long,
        default_value = "logs",
        env,
        help = "Directory receiving rolling log files when file logging is enabled"
    )]
    pub mailsearch_log_dir: PathBuf,
    /// Maximum number of log files (default: 5)
    #[clap(
        long,
        default_value = "5",
        env,
        help = "Set the maximum number of retained log files"
    )]
    pub mailsearch_max_log_files: usize,
    #[clap(
        long,
        env,
        help = "Set the directory holding the search index",
        value_parser = ValueParser::new(|s: &str| {
            let path = PathBuf::from(s);
            if path.exists() && !path.is_dir() {
                return Err(format!("Path {:?} is not a directory", path));
            }
            Ok(path)
        })
    )]
    pub mailsearch_index_dir: PathBuf,
    #[clap(
        long,
        default_value = "100000",
        env,
        help = "Maximum number of UIDs returned by a single search"
    )]
    pub mailsearch_max_query_results: usize,
    #[clap(
        long,
        default_value = "3",
        env,
        help = "Shortest substring token indexed"
    )]
    pub mailsearch_min_token_length: usize,
    #[clap(
        long,
        default_value = "40",
        env,
        help = "Longest substring token indexed"
    )]
    pub mailsearch_max_token_length: usize,
    /// Index whole words instead of substrings. Smaller index, weaker matching.
    #[clap(
        long,
        default_value = "false",
        env,
        action = ArgAction::Set,
        help = "Use the whitespace analyzer instead of substring n-grams"
    )]
    pub mailsearch_simple_analyzer: bool,
    #[clap(
        long,
        env,
        help = "Commit buffered writes every N seconds instead of after each write"
    )]
    pub mailsearch_commit_interval: Option<u64>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Append .eml files to a mailbox
    Append {
        #[clap(long)]
        mailbox: String,
        /// UID of the first file; defaults to one past the highest indexed UID
        #[clap(long)]
        uid: Option<u64>,
        /// Flags applied to every appended message, e.g. '\Seen,$Work'
        #[clap(long, value_delimiter = ',')]
        flags: Vec<String>,
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Import every message of an mbox archive into a mailbox
    ImportMbox {
        #[clap(long)]
        mailbox: String,
        #[clap(long, value_delimiter = ',')]
        flags: Vec<String>,
        path: PathBuf,
    },
    /// Search a mailbox with a JSON criterion and print matching UIDs
    Search {
        #[clap(long)]
        mailbox: String,
        criterion: String,
    },
    /// Replace the flags of a UID range
    Flags {
        #[clap(long)]
        mailbox: String,
        #[clap(long)]
        from: u64,
        #[clap(long)]
        to: u64,
        #[clap(value_delimiter = ',')]
        flags: Vec<String>,
    },
    /// Remove a UID range from the index
    Expunge {
        #[clap(long)]
        mailbox: String,
        #[clap(long)]
        from: u64,
        #[clap(long)]
        to: u64,
    },
    /// Print document counts of the index
    Stats,
}

impl Settings {
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::default()
            .with_index_dir(&self.mailsearch_index_dir)
            .with_max_query_results(self.mailsearch_max_query_results)
            .with_token_lengths(
                self.mailsearch_min_token_length,
                self.mailsearch_max_token_length,
            )
            .with_substring_analysis(!self.mailsearch_simple_analyzer)
            .with_commit_interval(self.mailsearch_commit_interval)
    }
}
