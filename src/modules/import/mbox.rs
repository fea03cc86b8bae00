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

use std::{io::SeekFrom, path::Path};

use mbox_reader::MboxFile as Mbox;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::info;

use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::import::{append_raw, ImportReport, UidAllocator};
use crate::modules::indexer::manager::MessageSearchIndex;
use crate::modules::message::{Flags, MailboxId};
use crate::raise_error;

/// Appends every message of an mbox file to `mailbox`, in file order.
pub async fn import_mbox_from_path(
    index: &MessageSearchIndex,
    mailbox: &MailboxId,
    flags: &Flags,
    path: &Path,
) -> MailSearchResult<ImportReport> {
    // an empty file cannot be memory-mapped
    if tokio::fs::metadata(path).await?.len() == 0 {
        info!(path = ?path, "Mbox file is empty");
        return Ok(ImportReport::default());
    }
    let mbox = Mbox::from_file(path).map_err(|e| {
        raise_error!(
            format!("Failed to open mbox file {:?}: {}", path, e),
            ErrorCode::IoError
        )
    })?;
    let mut import = MboxImport {
        index,
        mailbox,
        flags,
        uids: UidAllocator::new(index, mailbox, None).await?,
        report: ImportReport::default(),
    };

    // each entry ends where the next "From " line starts
    let mut last_start = 0;
    let mut position = 0;
    for entry in mbox.iter() {
        import.append(position, last_start, entry.message()).await;
        last_start = entry.offset();
        position += 1;
    }

    // the reader never yields the final message
    let tail = read_from(path, last_start).await?;
    if !tail.iter().all(u8::is_ascii_whitespace) {
        import
            .append(position, last_start, strip_from_line(&tail))
            .await;
    }

    let report = import.report;
    info!(
        mailbox_id = %mailbox,
        path = ?path,
        total = report.total,
        failed = report.failed,
        "Mbox import finished"
    );
    Ok(report)
}

struct MboxImport<'a> {
    index: &'a MessageSearchIndex,
    mailbox: &'a MailboxId,
    flags: &'a Flags,
    uids: UidAllocator,
    report: ImportReport,
}

impl MboxImport<'_> {
    async fn append(&mut self, position: usize, offset: usize, message: Option<&[u8]>) {
        let Some(bytes) = message.filter(|bytes| !bytes.is_empty()) else {
            self.report
                .record_failure(position, format!("Empty mbox entry at offset {}", offset));
            return;
        };
        match append_raw(self.index, self.mailbox, &mut self.uids, bytes.to_vec(), self.flags).await
        {
            Ok(uid) => self.report.record_success(uid),
            Err(e) => self.report.record_failure(
                position,
                format!(
                    "Failed to process message from mbox at offset {}: {}",
                    offset, e
                ),
            ),
        }
    }
}

async fn read_from(path: &Path, offset: usize) -> MailSearchResult<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(offset as u64)).await?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail).await?;
    Ok(tail)
}

/// The message following the "From " separator line, if there is one.
fn strip_from_line(entry: &[u8]) -> Option<&[u8]> {
    if !entry.starts_with(b"From ") {
        return Some(entry);
    }
    entry
        .iter()
        .position(|b| *b == b'\n')
        .map(|newline| &entry[newline + 1..])
}
