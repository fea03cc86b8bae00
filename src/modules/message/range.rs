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

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive range of UIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UidRange {
    pub from: u64,
    pub to: u64,
}

impl UidRange {
    /// Bounds given in the wrong order are swapped.
    pub fn new(from: u64, to: u64) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn one(uid: u64) -> Self {
        Self { from: uid, to: uid }
    }

    /// `uid:*`
    pub fn starting_at(uid: u64) -> Self {
        Self {
            from: uid,
            to: u64::MAX,
        }
    }

    pub fn all() -> Self {
        Self {
            from: 0,
            to: u64::MAX,
        }
    }

    pub fn contains(&self, uid: u64) -> bool {
        self.from <= uid && uid <= self.to
    }

    pub fn is_well_formed(&self) -> bool {
        self.from <= self.to
    }

    /// Compresses a set of UIDs, in any order and possibly with duplicates,
    /// into the minimal list of ascending, non-adjacent ranges.
    pub fn compress<I>(uids: I) -> Vec<UidRange>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut ranges: Vec<UidRange> = Vec::new();
        for uid in uids.into_iter().sorted_unstable().dedup() {
            match ranges.last_mut() {
                Some(last) if last.to.checked_add(1) == Some(uid) => last.to = uid,
                _ => ranges.push(UidRange::one(uid)),
            }
        }
        ranges
    }
}

impl fmt::Display for UidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from == self.to, self.to == u64::MAX) {
            (true, _) => write!(f, "{}", self.from),
            (false, true) => write!(f, "{}:*", self.from),
            (false, false) => write!(f, "{}:{}", self.from, self.to),
        }
    }
}
