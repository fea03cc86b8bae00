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

use clap::Parser;
use mailsearch::modules::{
    criteria::Criterion,
    error::{code::ErrorCode, MailSearchResult},
    import::{mbox::import_mbox_from_path, ImportEmls},
    indexer::manager::MessageSearchIndex,
    logger,
    message::{Flag, Flags, MailboxId, UidRange},
    settings::cli::{Command, Settings},
};
use mailsearch::raise_error;
use mimalloc::MiMalloc;
use serde::Serialize;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> MailSearchResult<()> {
    let settings = Settings::parse();
    // dropping the guard flushes buffered log lines
    let _guard = logger::initialize_logging(&settings)?;
    info!("Starting mailsearch");
    info!("Version:  {}", env!("CARGO_PKG_VERSION"));

    if let Err(error) = run(settings).await {
        eprintln!("{:?}", error);
        return Err(error);
    }
    Ok(())
}

/// Opens the index, runs one command and always closes the index after it.
async fn run(settings: Settings) -> MailSearchResult<()> {
    let index = MessageSearchIndex::open(settings.index_config()).await?;
    let outcome = execute(&index, settings.command).await;
    let closed = index.close().await;
    outcome?;
    closed
}

async fn execute(index: &MessageSearchIndex, command: Command) -> MailSearchResult<()> {
    match command {
        Command::Append {
            mailbox,
            uid,
            flags,
            files,
        } => {
            let report = ImportEmls::do_import(
                index,
                &MailboxId::new(mailbox),
                uid,
                &parse_flags(&flags),
                &files,
            )
            .await?;
            print_json(&report)
        }
        Command::ImportMbox {
            mailbox,
            flags,
            path,
        } => {
            let report =
                import_mbox_from_path(index, &MailboxId::new(mailbox), &parse_flags(&flags), &path)
                    .await?;
            print_json(&report)
        }
        Command::Search { mailbox, criterion } => {
            let criterion: Criterion = serde_json::from_str(&criterion).map_err(|e| {
                raise_error!(
                    format!("Invalid search criterion: {}", e),
                    ErrorCode::InvalidParameter
                )
            })?;
            for uid in index.search(&MailboxId::new(mailbox), &criterion).await? {
                println!("{}", uid);
            }
            Ok(())
        }
        Command::Flags {
            mailbox,
            from,
            to,
            flags,
        } => {
            let updated = index
                .update(
                    &MailboxId::new(mailbox),
                    UidRange::new(from, to),
                    &parse_flags(&flags),
                )
                .await?;
            println!("{} messages updated", updated);
            Ok(())
        }
        Command::Expunge { mailbox, from, to } => {
            index
                .delete(&MailboxId::new(mailbox), UidRange::new(from, to))
                .await
        }
        Command::Stats => print_json(&index.stats().await?),
    }
}

fn parse_flags(flags: &[String]) -> Flags {
    flags
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .filter_map(|f| f.parse::<Flag>().ok())
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> MailSearchResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
    println!("{}", json);
    Ok(())
}
