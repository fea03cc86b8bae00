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

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    // Client-side errors (10000–10999)
    InvalidParameter = 10000,
    MissingConfiguration = 10020,
    UnsupportedQuery = 10040,

    // Index errors (60000–60999)
    IndexingFailed = 60000,
    IndexUnavailable = 60010,

    // Internal system errors (70000–70999)
    InternalError = 70000,
    IoError = 70020,
}

impl ErrorCode {
    /// Whether a caller may reasonably retry the failed operation with backoff.
    ///
    /// Query and content problems never become valid on their own, while an
    /// unavailable index or a failing disk may recover.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::IndexUnavailable | ErrorCode::IoError)
    }

    pub fn is_client_error(&self) -> bool {
        (*self as u32) < 20000
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self, *self as u32)
    }
}
