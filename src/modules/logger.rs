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

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::modules::{
    error::{code::ErrorCode, MailSearchResult},
    settings::cli::Settings,
};
use crate::raise_error;

/// Installs the global subscriber. The returned guard flushes buffered log
/// lines when dropped, so it must live as long as the process.
pub fn initialize_logging(settings: &Settings) -> MailSearchResult<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.mailsearch_log_level));

    let (writer, guard) = if settings.mailsearch_log_to_file {
        std::fs::create_dir_all(&settings.mailsearch_log_dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("mailsearch")
            .filename_suffix("log")
            .max_log_files(settings.mailsearch_max_log_files)
            .build(&settings.mailsearch_log_dir)
            .map_err(|e| {
                raise_error!(
                    format!("Failed to create log appender: {:#?}", e),
                    ErrorCode::MissingConfiguration
                )
            })?;
        tracing_appender::non_blocking(appender)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    let ansi = settings.mailsearch_ansi_logs && !settings.mailsearch_log_to_file;
    let fmt_layer = if settings.mailsearch_json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| {
            raise_error!(
                format!("Failed to install tracing subscriber: {:#?}", e),
                ErrorCode::InternalError
            )
        })?;
    Ok(guard)
}
