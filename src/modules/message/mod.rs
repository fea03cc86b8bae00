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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

pub mod flags;
pub mod range;

pub use flags::{Flag, Flags};
pub use range::UidRange;

/// Identifier of a mailbox. Always stored lower-cased so that index terms and
/// query terms agree regardless of how callers spell it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MailboxId(String);

impl MailboxId {
    pub fn new(id: impl AsRef<str>) -> Self {
        MailboxId(id.as_ref().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MailboxId {
    fn from(value: String) -> Self {
        MailboxId::new(value)
    }
}

impl From<&str> for MailboxId {
    fn from(value: &str) -> Self {
        MailboxId::new(value)
    }
}

impl From<MailboxId> for String {
    fn from(value: MailboxId) -> Self {
        value.0
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message as the mail store hands it to the index.
pub trait MailboxMessage: Send + Sync {
    fn mailbox_id(&self) -> MailboxId;
    fn uid(&self) -> u64;
    fn internal_date(&self) -> DateTime<Utc>;
    fn mod_seq(&self) -> u64;
    /// Size of the full RFC 822 content in octets.
    fn full_content_octets(&self) -> u64;
    fn full_content(&self) -> Cow<'_, [u8]>;
    fn flags(&self) -> Cow<'_, Flags>;
}

/// An in-memory message, used by the import paths and the CLI.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub mailbox_id: MailboxId,
    pub uid: u64,
    pub internal_date: DateTime<Utc>,
    pub mod_seq: u64,
    pub content: Vec<u8>,
    pub flags: Flags,
}

impl StoredMessage {
    pub fn new(mailbox_id: MailboxId, uid: u64, content: impl Into<Vec<u8>>) -> Self {
        Self {
            mailbox_id,
            uid,
            internal_date: Utc::now(),
            mod_seq: 0,
            content: content.into(),
            flags: Flags::new(),
        }
    }

    pub fn with_internal_date(mut self, internal_date: DateTime<Utc>) -> Self {
        self.internal_date = internal_date;
        self
    }

    pub fn with_mod_seq(mut self, mod_seq: u64) -> Self {
        self.mod_seq = mod_seq;
        self
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl MailboxMessage for StoredMessage {
    fn mailbox_id(&self) -> MailboxId {
        self.mailbox_id.clone()
    }

    fn uid(&self) -> u64 {
        self.uid
    }

    fn internal_date(&self) -> DateTime<Utc> {
        self.internal_date
    }

    fn mod_seq(&self) -> u64 {
        self.mod_seq
    }

    fn full_content_octets(&self) -> u64 {
        self.content.len() as u64
    }

    fn full_content(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.content)
    }

    fn flags(&self) -> Cow<'_, Flags> {
        Cow::Borrowed(&self.flags)
    }
}
