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

use std::fs::File;
use std::io::Write;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::modules::criteria::{Criterion, DateResolution};
use crate::modules::import::{internal_date_of, mbox::import_mbox_from_path, ImportEmls};
use crate::modules::indexer::manager::MessageSearchIndex;
use crate::modules::message::{Flag, Flags, MailboxId};
use crate::modules::settings::index::IndexConfig;

const MBOX_CONTENT: &[u8] = b"From MAILER-DAEMON Fri Jul  8 12:08:34 2011
From: John Doe <john.doe@example.com>
To: Mary Roe <mary.roe@example.com>
Subject: Sample message 1
Date: Fri, 8 Jul 2011 12:08:34 -0500 (CDT)

This is a sample message.
From MAILER-DAEMON Fri Jul  8 12:08:34 2011
From: John Doe <john.doe@example.com>
To: Mary Roe <mary.roe@example.com>
Subject: Sample message 2 with attachment
Date: Fri, 8 Jul 2011 12:08:34 -0500 (CDT)
Content-Type: multipart/mixed; boundary=\"boundary\"

--boundary
Content-Type: text/plain; charset=us-ascii

This is a sample message with an attachment.
--boundary
Content-Type: text/plain; charset=us-ascii
Content-Disposition: attachment; filename=\"test.txt\"

This is the attachment.
--boundary--
";

async fn open_index() -> MessageSearchIndex {
    MessageSearchIndex::open(IndexConfig::in_memory()).await.unwrap()
}

async fn search(index: &MessageSearchIndex, mailbox: &MailboxId, criterion: Criterion) -> Vec<u64> {
    index.search(mailbox, &criterion).await.unwrap()
}

#[tokio::test]
async fn test_import_mbox() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let mbox_path = temp_dir.path().join("test.mbox");
    let mut file = File::create(&mbox_path)?;
    file.write_all(MBOX_CONTENT)?;

    let index = open_index().await;
    let mailbox = MailboxId::new("imported_from_mbox");
    let flags = Flags::new().with(Flag::Seen);
    let report = import_mbox_from_path(&index, &mailbox, &flags, &mbox_path)
        .await
        .unwrap();

    assert_eq!(report.total, 2, "Expected to find 2 messages");
    assert_eq!(report.success, 2);
    assert_eq!(report.uids, vec![1, 2]);

    assert_eq!(search(&index, &mailbox, Criterion::body_contains("the attachment.")).await, vec![2]);
    assert_eq!(
        search(&index, &mailbox, Criterion::header_contains("Subject", "sample message 1")).await,
        vec![1]
    );
    assert_eq!(search(&index, &mailbox, Criterion::address("To", "mary.roe@")).await, vec![1, 2]);
    assert_eq!(search(&index, &mailbox, Criterion::flag_is_set(Flag::Seen)).await, vec![1, 2]);
    let sent = Utc.with_ymd_and_hms(2011, 7, 8, 17, 8, 34).unwrap();
    assert_eq!(
        search(&index, &mailbox, Criterion::internal_date_on(sent, DateResolution::Second)).await,
        vec![1, 2]
    );
    Ok(())
}

#[tokio::test]
async fn mbox_import_continues_after_the_highest_uid() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let mbox_path = temp_dir.path().join("again.mbox");
    std::fs::write(&mbox_path, MBOX_CONTENT)?;

    let index = open_index().await;
    let mailbox = MailboxId::new("inbox");
    let flags = Flags::new();
    import_mbox_from_path(&index, &mailbox, &flags, &mbox_path)
        .await
        .unwrap();
    let second = import_mbox_from_path(&index, &mailbox, &flags, &mbox_path)
        .await
        .unwrap();
    assert_eq!(second.uids, vec![3, 4]);
    assert_eq!(
        index.search(&mailbox, &Criterion::all()).await.unwrap(),
        vec![1, 2, 3, 4]
    );
    Ok(())
}

#[tokio::test]
async fn single_message_mbox_is_imported() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let mbox_path = temp_dir.path().join("single.mbox");
    std::fs::write(
        &mbox_path,
        b"From alice@example.com Mon Jan  1 00:00:00 2024\n\
          From: Alice <alice@example.com>\n\
          Subject: Only one\n\
          \n\
          The one and only message.\n",
    )?;

    let index = open_index().await;
    let mailbox = MailboxId::new("inbox");
    let report = import_mbox_from_path(&index, &mailbox, &Flags::new(), &mbox_path)
        .await
        .unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.success, 1);
    assert_eq!(report.uids, vec![1]);
    assert_eq!(search(&index, &mailbox, Criterion::body_contains("only message")).await, vec![1]);
    assert_eq!(
        search(&index, &mailbox, Criterion::header_contains("Subject", "only one")).await,
        vec![1]
    );
    Ok(())
}

#[tokio::test]
async fn empty_mbox_imports_nothing() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let mbox_path = temp_dir.path().join("empty.mbox");
    std::fs::write(&mbox_path, b"")?;

    let index = open_index().await;
    let report = import_mbox_from_path(&index, &MailboxId::new("inbox"), &Flags::new(), &mbox_path)
        .await
        .unwrap();
    assert_eq!(report.total, 0);
    assert!(report.uids.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_mbox_file_is_an_io_error() {
    let index = open_index().await;
    let error = import_mbox_from_path(
        &index,
        &MailboxId::new("inbox"),
        &Flags::new(),
        std::path::Path::new("/nonexistent/mail.mbox"),
    )
    .await
    .unwrap_err();
    assert!(error.is_retryable());
}

#[tokio::test]
async fn eml_import_reports_unreadable_files_and_keeps_going() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let good = temp_dir.path().join("good.eml");
    std::fs::write(
        &good,
        b"From: a@example.com\r\nSubject: Hello\r\n\r\nGood morning\r\n",
    )?;
    let missing = temp_dir.path().join("missing.eml");

    let index = open_index().await;
    let mailbox = MailboxId::new("inbox");
    let report = ImportEmls::do_import(
        &index,
        &mailbox,
        Some(10),
        &Flags::new(),
        &[missing, good],
    )
    .await
    .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.success, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failed_details[0].index, 0);
    assert_eq!(report.uids, vec![10]);
    assert_eq!(
        index
            .search(&mailbox, &Criterion::body_contains("morning"))
            .await
            .unwrap(),
        vec![10]
    );
    Ok(())
}

#[test]
fn internal_date_comes_from_the_date_header() {
    let raw = b"Date: Fri, 8 Jul 2011 12:08:34 -0500\r\nSubject: x\r\n\r\nbody\r\n";
    assert_eq!(
        internal_date_of(raw),
        Utc.with_ymd_and_hms(2011, 7, 8, 17, 8, 34).unwrap()
    );
}
