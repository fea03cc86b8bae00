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

use std::sync::{Arc, LazyLock};

use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::indexer::analyzer::{HEADER_TOKENIZER, SUBSTRING_TOKENIZER};
use crate::modules::indexer::fields::*;
use crate::raise_error;
use tantivy::schema::{
    IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING,
};

static MESSAGE_FIELDS: LazyLock<Arc<MessageFields>> = LazyLock::new(|| {
    let (_, fields) = SchemaTools::create_message_schema();
    Arc::new(fields)
});

pub struct SchemaTools;

impl SchemaTools {
    pub fn message_schema() -> Schema {
        let (schema, _) = Self::create_message_schema();
        schema
    }

    pub fn message_fields() -> &'static MessageFields {
        &MESSAGE_FIELDS
    }

    pub fn create_message_schema() -> (Schema, MessageFields) {
        let mut builder = Schema::builder();
        // Document key, replaced on re-index
        let f_id = builder.add_text_field(F_ID, STRING | STORED);
        // Content or flags document
        let f_kind = builder.add_text_field(F_KIND, STRING);
        let f_mailbox_id = builder.add_text_field(F_MAILBOX_ID, STRING | STORED);
        // UID: numeric, result ordering and range filtering
        let f_uid = builder.add_u64_field(F_UID, INDEXED | STORED | FAST);
        let f_mod_seq = builder.add_u64_field(F_MOD_SEQ, INDEXED | FAST);
        let f_size = builder.add_u64_field(F_SIZE, INDEXED | FAST);
        // One exact token per flag
        let f_flags = builder.add_text_field(F_FLAGS, STRING);
        // Substring-searchable text
        let f_headers = builder.add_text_field(F_HEADERS, analyzed(SUBSTRING_TOKENIZER));
        let f_header = builder.add_text_field(F_HEADER, analyzed(HEADER_TOKENIZER));
        let f_body = builder.add_text_field(F_BODY, analyzed(SUBSTRING_TOKENIZER));
        let f_from = builder.add_text_field(F_FROM, analyzed(SUBSTRING_TOKENIZER));
        let f_to = builder.add_text_field(F_TO, analyzed(SUBSTRING_TOKENIZER));
        let f_cc = builder.add_text_field(F_CC, analyzed(SUBSTRING_TOKENIZER));
        let f_bcc = builder.add_text_field(F_BCC, analyzed(SUBSTRING_TOKENIZER));
        // Internal date truncated to each resolution, epoch millis
        let f_internal_date_year = builder.add_i64_field(F_INTERNAL_DATE_YEAR, INDEXED | FAST);
        let f_internal_date_month = builder.add_i64_field(F_INTERNAL_DATE_MONTH, INDEXED | FAST);
        let f_internal_date_day = builder.add_i64_field(F_INTERNAL_DATE_DAY, INDEXED | FAST);
        let f_internal_date_hour = builder.add_i64_field(F_INTERNAL_DATE_HOUR, INDEXED | FAST);
        let f_internal_date_minute =
            builder.add_i64_field(F_INTERNAL_DATE_MINUTE, INDEXED | FAST);
        let f_internal_date_second =
            builder.add_i64_field(F_INTERNAL_DATE_SECOND, INDEXED | FAST);
        let f_internal_date_millisecond =
            builder.add_i64_field(F_INTERNAL_DATE_MILLISECOND, INDEXED | FAST);
        let fields = MessageFields {
            f_id,
            f_kind,
            f_mailbox_id,
            f_uid,
            f_mod_seq,
            f_size,
            f_flags,
            f_headers,
            f_header,
            f_body,
            f_from,
            f_to,
            f_cc,
            f_bcc,
            f_internal_date_year,
            f_internal_date_month,
            f_internal_date_day,
            f_internal_date_hour,
            f_internal_date_minute,
            f_internal_date_second,
            f_internal_date_millisecond,
        };
        (builder.build(), fields)
    }

    /// Ensures an index found on disk was written with this schema.
    pub fn ensure_compatible(existing: &Schema) -> MailSearchResult<()> {
        let expected = Self::message_schema();
        for (field, entry) in expected.fields() {
            match existing.get_field(entry.name()) {
                Ok(found) if found == field => {}
                _ => {
                    return Err(raise_error!(
                        format!(
                            "Existing index is incompatible: field '{}' is missing or misplaced",
                            entry.name()
                        ),
                        ErrorCode::IndexUnavailable
                    ))
                }
            }
        }
        Ok(())
    }
}

fn analyzed(tokenizer: &str) -> TextOptions {
    TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(tokenizer)
            .set_index_option(IndexRecordOption::Basic),
    )
}
