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
use std::{borrow::Cow, collections::BTreeSet, convert::Infallible, fmt, str::FromStr};

/// A message flag: one of the IMAP system flags or a user-defined keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    Answered,
    Deleted,
    Draft,
    Flagged,
    Recent,
    Seen,
    Keyword(String),
}

impl Flag {
    /// The term stored in the flags field of a flags document and looked up
    /// by flag criteria. System flags map to an upper-case backslash form,
    /// keywords are kept verbatim.
    pub fn index_token(&self) -> Cow<'_, str> {
        match self {
            Flag::Answered => Cow::Borrowed("\\ANSWERED"),
            Flag::Deleted => Cow::Borrowed("\\DELETED"),
            Flag::Draft => Cow::Borrowed("\\DRAFT"),
            Flag::Flagged => Cow::Borrowed("\\FLAGGED"),
            Flag::Recent => Cow::Borrowed("\\RECENT"),
            Flag::Seen => Cow::Borrowed("\\SEEN"),
            Flag::Keyword(keyword) => Cow::Borrowed(keyword.as_str()),
        }
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Flag::Keyword(name.into())
    }
}

impl FromStr for Flag {
    type Err = Infallible;

    /// System flags are recognised case-insensitively with their leading
    /// backslash; anything else becomes a keyword.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flag = match s.to_ascii_lowercase().as_str() {
            "\\answered" => Flag::Answered,
            "\\deleted" => Flag::Deleted,
            "\\draft" => Flag::Draft,
            "\\flagged" => Flag::Flagged,
            "\\recent" => Flag::Recent,
            "\\seen" => Flag::Seen,
            _ => Flag::Keyword(s.to_string()),
        };
        Ok(flag)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Recent => write!(f, "\\Recent"),
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Keyword(keyword) => write!(f, "{}", keyword),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags(BTreeSet<Flag>);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, flag: Flag) -> Self {
        self.0.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: Flag) -> bool {
        self.0.insert(flag)
    }

    pub fn remove(&mut self, flag: &Flag) -> bool {
        self.0.remove(flag)
    }

    pub fn contains(&self, flag: &Flag) -> bool {
        self.0.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.0.iter()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
        Flags(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Flags {
    type Item = &'a Flag;
    type IntoIter = std::collections::btree_set::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
