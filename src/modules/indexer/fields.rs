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

use tantivy::schema::Field;

use crate::modules::criteria::DateResolution;

pub const F_ID: &str = "id";
pub const F_KIND: &str = "kind";
pub const F_MAILBOX_ID: &str = "mailbox_id";
pub const F_UID: &str = "uid";
pub const F_MOD_SEQ: &str = "mod_seq";
pub const F_SIZE: &str = "size";
pub const F_FLAGS: &str = "flags";
pub const F_HEADERS: &str = "headers";
pub const F_HEADER: &str = "header";
pub const F_BODY: &str = "body";
pub const F_FROM: &str = "from";
pub const F_TO: &str = "to";
pub const F_CC: &str = "cc";
pub const F_BCC: &str = "bcc";

pub const F_INTERNAL_DATE_YEAR: &str = "internal_date_year";
pub const F_INTERNAL_DATE_MONTH: &str = "internal_date_month";
pub const F_INTERNAL_DATE_DAY: &str = "internal_date_day";
pub const F_INTERNAL_DATE_HOUR: &str = "internal_date_hour";
pub const F_INTERNAL_DATE_MINUTE: &str = "internal_date_minute";
pub const F_INTERNAL_DATE_SECOND: &str = "internal_date_second";
pub const F_INTERNAL_DATE_MILLISECOND: &str = "internal_date_millisecond";

/// Value of [`F_KIND`] on content documents.
pub const KIND_MESSAGE: &str = "message";
/// Value of [`F_KIND`] on flags documents.
pub const KIND_FLAGS: &str = "flags";

pub struct MessageFields {
    pub f_id: Field,
    pub f_kind: Field,
    pub f_mailbox_id: Field,
    pub f_uid: Field,
    pub f_mod_seq: Field,
    pub f_size: Field,
    pub f_flags: Field,
    pub f_headers: Field,
    pub f_header: Field,
    pub f_body: Field,
    pub f_from: Field,
    pub f_to: Field,
    pub f_cc: Field,
    pub f_bcc: Field,
    pub f_internal_date_year: Field,
    pub f_internal_date_month: Field,
    pub f_internal_date_day: Field,
    pub f_internal_date_hour: Field,
    pub f_internal_date_minute: Field,
    pub f_internal_date_second: Field,
    pub f_internal_date_millisecond: Field,
}

impl MessageFields {
    pub fn internal_date(&self, resolution: DateResolution) -> Field {
        match resolution {
            DateResolution::Year => self.f_internal_date_year,
            DateResolution::Month => self.f_internal_date_month,
            DateResolution::Day => self.f_internal_date_day,
            DateResolution::Hour => self.f_internal_date_hour,
            DateResolution::Minute => self.f_internal_date_minute,
            DateResolution::Second => self.f_internal_date_second,
            DateResolution::Millisecond => self.f_internal_date_millisecond,
        }
    }

    /// Address field fed by the header `name`, if it is one of the four
    /// address roles.
    pub fn address_role(&self, name: &str) -> Option<Field> {
        match name.to_ascii_lowercase().as_str() {
            F_FROM => Some(self.f_from),
            F_TO => Some(self.f_to),
            F_CC => Some(self.f_cc),
            F_BCC => Some(self.f_bcc),
            _ => None,
        }
    }
}
