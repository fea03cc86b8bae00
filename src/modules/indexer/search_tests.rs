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

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::modules::criteria::{
    Criterion, DateComparison, DateOperator, DateResolution, HeaderOperator,
};
use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::indexer::manager::MessageSearchIndex;
use crate::modules::message::{Flag, Flags, MailboxId, StoredMessage, UidRange};
use crate::modules::mime::{ContentHandler, MimeStreamDecoder};
use crate::modules::settings::index::IndexConfig;
use crate::raise_error;

fn raw(subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: Alice Martin <alice@example.com>\r\n\
         To: Bob <bob@example.org>\r\n\
         Subject: {}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         {}\r\n",
        subject, body
    )
    .into_bytes()
}

fn inbox() -> MailboxId {
    MailboxId::new("INBOX")
}

fn message(uid: u64, subject: &str, body: &str) -> StoredMessage {
    StoredMessage::new(inbox(), uid, raw(subject, body))
}

fn date(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
}

async fn open_index() -> MessageSearchIndex {
    MessageSearchIndex::open(IndexConfig::in_memory()).await.unwrap()
}

async fn search(index: &MessageSearchIndex, criterion: Criterion) -> Vec<u64> {
    index.search(&inbox(), &criterion).await.unwrap()
}

/// Three messages with distinct flags, sizes, mod-sequences and dates.
async fn seeded_index() -> MessageSearchIndex {
    let index = open_index().await;
    let messages = vec![
        message(1, "Quarterly budget", "The quarterly budget report is attached.")
            .with_flags(Flags::new().with(Flag::Seen))
            .with_mod_seq(5)
            .with_internal_date(date(2024, 1, 15, 10)),
        message(2, "Lunch", "Shall we meet for lunch tomorrow?")
            .with_mod_seq(10)
            .with_internal_date(date(2024, 1, 16, 9)),
        message(
            3,
            "Re: Quarterly budget",
            "Numbers look fine, ship the budget. A much longer closing remark follows here.",
        )
        .with_flags(
            Flags::new()
                .with(Flag::Seen)
                .with(Flag::Flagged)
                .with(Flag::keyword("$Important")),
        )
        .with_mod_seq(15)
        .with_internal_date(date(2024, 3, 1, 12)),
    ];
    for m in &messages {
        index.add(&inbox(), m).await.unwrap();
    }
    index
}

struct BrokenDecoder;

impl MimeStreamDecoder for BrokenDecoder {
    fn decode(&self, _raw: &[u8], _handler: &mut dyn ContentHandler) -> MailSearchResult<()> {
        Err(raise_error!(
            "unexpected end of multipart".into(),
            ErrorCode::IndexingFailed
        ))
    }
}

#[tokio::test]
async fn all_lists_every_message_in_uid_order() {
    let index = seeded_index().await;
    assert_eq!(search(&index, Criterion::all()).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn body_matches_arbitrary_substrings() {
    let index = seeded_index().await;
    assert_eq!(search(&index, Criterion::body_contains("arterly bud")).await, vec![1]);
    assert_eq!(search(&index, Criterion::body_contains("LUNCH")).await, vec![2]);
    assert_eq!(search(&index, Criterion::body_contains("bu")).await, vec![1, 3]);
    assert!(search(&index, Criterion::body_contains("budgets")).await.is_empty());
}

#[tokio::test]
async fn hello_world_matches_lo_wo() {
    let index = open_index().await;
    index.add(&inbox(), &message(1, "Greeting", "hello world")).await.unwrap();
    assert_eq!(search(&index, Criterion::body_contains("lo wo")).await, vec![1]);
    assert!(search(&index, Criterion::body_contains("lo wa")).await.is_empty());
}

#[tokio::test]
async fn dates_one_second_apart_share_a_day_but_not_a_second() {
    let index = open_index().await;
    let first = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 1).unwrap();
    index
        .add(&inbox(), &message(1, "A", "a").with_internal_date(first))
        .await
        .unwrap();
    index
        .add(&inbox(), &message(2, "B", "b").with_internal_date(second))
        .await
        .unwrap();
    assert_eq!(
        search(&index, Criterion::internal_date_on(first, DateResolution::Day)).await,
        vec![1, 2]
    );
    assert_eq!(
        search(&index, Criterion::internal_date_on(second, DateResolution::Second)).await,
        vec![2]
    );
}

#[tokio::test]
async fn long_values_match_through_overlapping_windows() {
    let index = seeded_index().await;
    let phrase = "A much longer closing remark follows here.";
    assert!(phrase.chars().count() > 40);
    assert_eq!(search(&index, Criterion::body_contains(phrase)).await, vec![3]);
    let altered = "A much longer closing remark follows there.";
    assert!(search(&index, Criterion::body_contains(altered)).await.is_empty());
}

#[tokio::test]
async fn full_text_also_searches_headers() {
    let index = seeded_index().await;
    assert_eq!(
        search(&index, Criterion::body_contains("Quarterly budget")).await,
        vec![1]
    );
    assert_eq!(
        search(&index, Criterion::mail_contains("Re: Quarterly")).await,
        vec![3]
    );
    assert_eq!(
        search(&index, Criterion::mail_contains("alice martin")).await,
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn mailboxes_are_isolated() {
    let index = seeded_index().await;
    let archive = MailboxId::new("Archive");
    let copy = StoredMessage::new(archive.clone(), 1, raw("Lunch", "Lunch again"));
    index.add(&archive, &copy).await.unwrap();

    assert_eq!(
        index.search(&archive, &Criterion::all()).await.unwrap(),
        vec![1]
    );
    assert_eq!(search(&index, Criterion::body_contains("lunch")).await, vec![2]);

    index.delete(&archive, UidRange::one(1)).await.unwrap();
    assert!(index.search(&archive, &Criterion::all()).await.unwrap().is_empty());
    assert_eq!(search(&index, Criterion::all()).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn mailbox_names_cannot_collide_with_flags_keys() {
    let index = seeded_index().await;
    // content key "flags-inbox-1" equals the flags key of inbox uid 1
    let tricky = MailboxId::new("flags-inbox");
    let m = StoredMessage::new(tricky.clone(), 1, raw("Tricky", "tricky mailbox"));
    index.add(&tricky, &m).await.unwrap();
    index
        .update(&inbox(), UidRange::one(1), &Flags::new().with(Flag::Draft))
        .await
        .unwrap();

    assert_eq!(index.search(&tricky, &Criterion::all()).await.unwrap(), vec![1]);
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Draft)).await, vec![1]);
    assert_eq!(search(&index, Criterion::body_contains("quarterly")).await, vec![1]);
}

#[tokio::test]
async fn results_are_capped_at_the_configured_maximum() {
    let index = MessageSearchIndex::open(IndexConfig::in_memory().with_max_query_results(5))
        .await
        .unwrap();
    for uid in 1..=10 {
        index.add(&inbox(), &message(uid, "Bulk", "bulk mail")).await.unwrap();
    }
    assert_eq!(search(&index, Criterion::all()).await, vec![1, 2, 3, 4, 5]);
    // flag lookups are not capped internally
    assert_eq!(
        search(&index, Criterion::flag_is_unset(Flag::Seen)).await,
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(index.highest_uid(&inbox()).await.unwrap(), Some(10));
}

#[tokio::test]
async fn flags_are_matched_set_and_unset() {
    let index = seeded_index().await;
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Seen)).await, vec![1, 3]);
    assert_eq!(search(&index, Criterion::flag_is_unset(Flag::Seen)).await, vec![2]);
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Flagged)).await, vec![3]);
    assert_eq!(
        search(&index, Criterion::flag_is_set(Flag::keyword("$Important"))).await,
        vec![3]
    );
    assert!(search(&index, Criterion::flag_is_set(Flag::keyword("$important")))
        .await
        .is_empty());
    assert_eq!(
        search(&index, Criterion::flag_is_unset(Flag::Deleted)).await,
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn update_replaces_flags_without_touching_content() {
    let index = seeded_index().await;
    let applied = index
        .update(&inbox(), UidRange::new(1, 2), &Flags::new().with(Flag::Answered))
        .await
        .unwrap();
    assert_eq!(applied, 2);

    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Seen)).await, vec![3]);
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Answered)).await, vec![1, 2]);
    assert_eq!(search(&index, Criterion::body_contains("quarterly")).await, vec![1]);
    assert_eq!(search(&index, Criterion::mod_seq_equals(5)).await, vec![1]);

    let stats = index.stats().await.unwrap();
    assert_eq!(stats.messages, 3);
    assert_eq!(stats.flags_documents, 3);
}

#[tokio::test]
async fn update_of_unknown_uids_is_a_no_op() {
    let index = seeded_index().await;
    let applied = index
        .update(&inbox(), UidRange::starting_at(100), &Flags::new().with(Flag::Seen))
        .await
        .unwrap();
    assert_eq!(applied, 0);
    assert_eq!(search(&index, Criterion::all()).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn delete_removes_content_and_flags() {
    let index = seeded_index().await;
    index.delete(&inbox(), UidRange::one(3)).await.unwrap();

    assert_eq!(search(&index, Criterion::all()).await, vec![1, 2]);
    assert_eq!(search(&index, Criterion::uid(vec![UidRange::all()])).await, vec![1, 2]);
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Flagged)).await, Vec::<u64>::new());
    let stats = index.stats().await.unwrap();
    assert_eq!(stats.messages, 2);
    assert_eq!(stats.flags_documents, 2);
    assert_eq!(index.highest_uid(&inbox()).await.unwrap(), Some(2));

    index.delete(&inbox(), UidRange::all()).await.unwrap();
    assert_eq!(index.highest_uid(&inbox()).await.unwrap(), None);
}

#[tokio::test]
async fn adding_the_same_uid_twice_replaces_the_message() {
    let index = seeded_index().await;
    let replacement = message(2, "Dinner", "Dinner instead").with_flags(Flags::new().with(Flag::Seen));
    index.add(&inbox(), &replacement).await.unwrap();
    index.add(&inbox(), &replacement).await.unwrap();

    assert_eq!(search(&index, Criterion::all()).await, vec![1, 2, 3]);
    assert!(search(&index, Criterion::body_contains("lunch")).await.is_empty());
    assert_eq!(search(&index, Criterion::body_contains("dinner")).await, vec![2]);
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Seen)).await, vec![1, 2, 3]);
    assert_eq!(index.stats().await.unwrap().messages, 3);
}

#[tokio::test]
async fn failed_add_leaves_the_index_untouched() {
    let index = MessageSearchIndex::open_with_decoder(
        IndexConfig::in_memory(),
        std::sync::Arc::new(BrokenDecoder),
    )
    .await
    .unwrap();
    let error = index.add(&inbox(), &message(1, "Broken", "body")).await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::IndexingFailed);
    let stats = index.stats().await.unwrap();
    assert_eq!(stats.messages, 0);
    assert_eq!(stats.flags_documents, 0);
}

#[tokio::test]
async fn add_rejects_a_message_of_another_mailbox() {
    let index = open_index().await;
    let stray = StoredMessage::new(MailboxId::new("Sent"), 1, raw("Hi", "there"));
    let error = index.add(&inbox(), &stray).await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::InvalidParameter);
}

#[tokio::test]
async fn message_without_flags_matches_every_unset_flag() {
    let index = open_index().await;
    index.add(&inbox(), &message(7, "Plain", "no flags here")).await.unwrap();
    assert_eq!(search(&index, Criterion::flag_is_unset(Flag::Seen)).await, vec![7]);
    assert!(search(&index, Criterion::flag_is_set(Flag::Seen)).await.is_empty());
}

#[tokio::test]
async fn boolean_operators_combine_criteria() {
    let index = seeded_index().await;
    assert_eq!(
        search(&index, Criterion::not(Criterion::flag_is_set(Flag::Seen))).await,
        vec![2]
    );
    assert_eq!(
        search(
            &index,
            Criterion::nor(vec![
                Criterion::uid(vec![UidRange::one(1)]),
                Criterion::uid(vec![UidRange::one(3)]),
            ])
        )
        .await,
        vec![2]
    );
    assert_eq!(
        search(
            &index,
            Criterion::and(vec![
                Criterion::body_contains("budget"),
                Criterion::flag_is_set(Flag::Flagged),
            ])
        )
        .await,
        vec![3]
    );
    assert_eq!(
        search(
            &index,
            Criterion::or(vec![
                Criterion::body_contains("lunch"),
                Criterion::flag_is_set(Flag::Flagged),
            ])
        )
        .await,
        vec![2, 3]
    );
}

#[tokio::test]
async fn empty_conjunctions_have_fixed_meanings() {
    let index = seeded_index().await;
    assert_eq!(search(&index, Criterion::and(vec![])).await, vec![1, 2, 3]);
    assert!(search(&index, Criterion::or(vec![])).await.is_empty());
    assert_eq!(search(&index, Criterion::nor(vec![])).await, vec![1, 2, 3]);
    assert!(search(&index, Criterion::uid(vec![])).await.is_empty());
}

#[tokio::test]
async fn uid_ranges_select_messages() {
    let index = seeded_index().await;
    assert_eq!(
        search(&index, Criterion::uid(vec![UidRange::one(1), UidRange::starting_at(3)])).await,
        vec![1, 3]
    );
    assert_eq!(
        search(&index, Criterion::uid(vec![UidRange::new(2, 50)])).await,
        vec![2, 3]
    );
}

#[tokio::test]
async fn numeric_criteria_compare_size_and_mod_seq() {
    let index = seeded_index().await;
    assert_eq!(search(&index, Criterion::mod_seq_greater_than(5)).await, vec![2, 3]);
    assert_eq!(search(&index, Criterion::mod_seq_less_than(15)).await, vec![1, 2]);
    assert_eq!(search(&index, Criterion::mod_seq_equals(10)).await, vec![2]);

    let lunch = raw("Lunch", "Shall we meet for lunch tomorrow?").len() as u64;
    assert_eq!(search(&index, Criterion::size_equals(lunch)).await, vec![2]);
    assert_eq!(search(&index, Criterion::size_less_than(lunch)).await, Vec::<u64>::new());
    assert_eq!(search(&index, Criterion::size_greater_than(lunch)).await, vec![1, 3]);
}

#[tokio::test]
async fn internal_dates_compare_at_the_requested_resolution() {
    let index = seeded_index().await;
    let late_on_the_15th = Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 0).unwrap();
    assert_eq!(
        search(&index, Criterion::internal_date_on(late_on_the_15th, DateResolution::Day)).await,
        vec![1]
    );
    assert_eq!(
        search(&index, Criterion::internal_date_on(date(2024, 1, 1, 0), DateResolution::Month))
            .await,
        vec![1, 2]
    );
    assert_eq!(
        search(
            &index,
            Criterion::internal_date_before(date(2024, 1, 16, 0), DateResolution::Day)
        )
        .await,
        vec![1]
    );
    assert_eq!(
        search(
            &index,
            Criterion::internal_date_after(late_on_the_15th, DateResolution::Day)
        )
        .await,
        vec![2, 3]
    );
    assert_eq!(
        search(&index, Criterion::internal_date_on(date(2024, 6, 1, 0), DateResolution::Year))
            .await,
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn header_criteria_are_scoped_to_the_named_header() {
    let index = seeded_index().await;
    assert_eq!(
        search(&index, Criterion::header_contains("Subject", "re: quart")).await,
        vec![3]
    );
    assert!(search(&index, Criterion::header_contains("To", "alice")).await.is_empty());
    assert_eq!(search(&index, Criterion::header_exists("subject")).await, vec![1, 2, 3]);
    assert!(search(&index, Criterion::header_exists("X-Priority")).await.is_empty());
    assert_eq!(
        search(&index, Criterion::address("From", "alice@exa")).await,
        vec![1, 2, 3]
    );
    assert!(search(&index, Criterion::address("Cc", "alice")).await.is_empty());
    assert_eq!(
        search(&index, Criterion::address("Reply-To", "nobody")).await,
        Vec::<u64>::new()
    );
}

#[tokio::test]
async fn header_date_comparisons_are_unsupported() {
    let index = seeded_index().await;
    let criterion = Criterion::Header {
        name: "Date".into(),
        operator: HeaderOperator::Date(DateOperator {
            comparison: DateComparison::Before,
            resolution: DateResolution::Day,
            date: date(2024, 1, 1, 0),
        }),
    };
    let error = index.search(&inbox(), &criterion).await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::UnsupportedQuery);

    let nested = Criterion::or(vec![Criterion::all(), criterion]);
    let error = index.search(&inbox(), &nested).await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::UnsupportedQuery);
}

#[tokio::test]
async fn whitespace_analysis_matches_whole_word_prefixes() {
    let config = IndexConfig::in_memory().with_substring_analysis(false);
    let index = MessageSearchIndex::open(config).await.unwrap();
    index
        .add(&inbox(), &message(1, "Budget", "The quarterly budget report"))
        .await
        .unwrap();
    assert_eq!(search(&index, Criterion::body_contains("budget")).await, vec![1]);
    assert_eq!(search(&index, Criterion::body_contains("Quarterly Budg")).await, vec![1]);
    assert!(search(&index, Criterion::body_contains("udget")).await.is_empty());
}

#[tokio::test]
async fn html_bodies_are_indexed_as_text() {
    let index = open_index().await;
    let raw = b"From: a@example.com\r\nSubject: Newsletter\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<html><body><p>Spring sale starts today</p></body></html>\r\n";
    index
        .add(&inbox(), &StoredMessage::new(inbox(), 1, raw.to_vec()))
        .await
        .unwrap();
    assert_eq!(search(&index, Criterion::body_contains("sale starts")).await, vec![1]);
    assert!(search(&index, Criterion::body_contains("<p>")).await.is_empty());
}

#[tokio::test]
async fn deferred_commits_become_visible_on_flush() {
    let config = IndexConfig::in_memory().with_commit_interval(Some(3600));
    let index = MessageSearchIndex::open(config).await.unwrap();
    index.add(&inbox(), &message(1, "Later", "pending")).await.unwrap();
    assert!(search(&index, Criterion::all()).await.is_empty());
    index.flush().await.unwrap();
    assert_eq!(search(&index, Criterion::all()).await, vec![1]);
    index.close().await.unwrap();
}

#[tokio::test]
async fn deferred_updates_find_uncommitted_messages() {
    let config = IndexConfig::in_memory().with_commit_interval(Some(3600));
    let index = MessageSearchIndex::open(config).await.unwrap();
    index.add(&inbox(), &message(1, "Fresh", "not yet committed")).await.unwrap();

    let applied = index
        .update(&inbox(), UidRange::one(1), &Flags::new().with(Flag::Seen))
        .await
        .unwrap();
    assert_eq!(applied, 1);
    index.flush().await.unwrap();
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Seen)).await, vec![1]);
    let stats = index.stats().await.unwrap();
    assert_eq!(stats.flags_documents, 1);
    index.close().await.unwrap();
}

#[tokio::test]
async fn updates_after_a_pending_delete_leave_no_flags_behind() {
    let config = IndexConfig::in_memory().with_commit_interval(Some(3600));
    let index = MessageSearchIndex::open(config).await.unwrap();
    index.add(&inbox(), &message(5, "Gone", "expunged soon")).await.unwrap();
    index.flush().await.unwrap();
    index.delete(&inbox(), UidRange::one(5)).await.unwrap();

    let applied = index
        .update(&inbox(), UidRange::one(5), &Flags::new().with(Flag::Flagged))
        .await
        .unwrap();
    assert_eq!(applied, 0);
    index.flush().await.unwrap();
    let stats = index.stats().await.unwrap();
    assert_eq!(stats.messages, 0);
    assert_eq!(stats.flags_documents, 0);
    assert!(search(&index, Criterion::flag_is_set(Flag::Flagged)).await.is_empty());
    index.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_and_deletes_keep_documents_paired() {
    let index = std::sync::Arc::new(seeded_index().await);
    let updater = {
        let index = index.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                index
                    .update(&inbox(), UidRange::all(), &Flags::new().with(Flag::Answered))
                    .await
                    .unwrap();
            }
        })
    };
    index.delete(&inbox(), UidRange::one(2)).await.unwrap();
    updater.await.unwrap();

    let stats = index.stats().await.unwrap();
    assert_eq!(stats.messages, 2);
    assert_eq!(stats.flags_documents, 2);
    assert_eq!(search(&index, Criterion::flag_is_set(Flag::Answered)).await, vec![1, 3]);
}

#[tokio::test]
async fn background_committer_publishes_pending_writes() {
    let config = IndexConfig::in_memory().with_commit_interval(Some(1));
    let index = MessageSearchIndex::open(config).await.unwrap();
    index.add(&inbox(), &message(1, "Later", "pending")).await.unwrap();

    let mut visible = Vec::new();
    for _ in 0..50 {
        visible = search(&index, Criterion::all()).await;
        if !visible.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(visible, vec![1]);
    index.close().await.unwrap();
}

#[tokio::test]
async fn requested_commits_run_before_the_next_tick() {
    let config = IndexConfig::in_memory().with_commit_interval(Some(3600));
    let index = MessageSearchIndex::open(config).await.unwrap();
    index.add(&inbox(), &message(1, "Soon", "pending")).await.unwrap();
    index.request_commit().await;

    let mut visible = Vec::new();
    for _ in 0..50 {
        visible = search(&index, Criterion::all()).await;
        if !visible.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(visible, vec![1]);
    index.close().await.unwrap();
}

#[tokio::test]
async fn close_commits_and_rejects_later_writes() {
    let config = IndexConfig::in_memory().with_commit_interval(Some(3600));
    let index = MessageSearchIndex::open(config).await.unwrap();
    index.add(&inbox(), &message(1, "Last", "before close")).await.unwrap();
    index.close().await.unwrap();

    assert_eq!(search(&index, Criterion::all()).await, vec![1]);
    let error = index.add(&inbox(), &message(2, "Late", "after close")).await.unwrap_err();
    assert_eq!(error.code(), ErrorCode::IndexUnavailable);
    assert!(error.is_retryable());
}
