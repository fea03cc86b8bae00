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

use encoding_rs::{Encoding, UTF_8};
use tantivy::TantivyDocument;
use tracing::warn;

use crate::modules::criteria::DateResolution;
use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::modules::indexer::analyzer::HEADER_NAME_SEPARATOR;
use crate::modules::indexer::fields::{MessageFields, KIND_FLAGS, KIND_MESSAGE};
use crate::modules::indexer::schema::SchemaTools;
use crate::modules::message::{Flags, MailboxId, MailboxMessage};
use crate::modules::mime::{BodyPart, ContentHandler, HeaderField, MimeStreamDecoder};
use crate::raise_error;

const HTML_TEXT_WIDTH: usize = 10_000;

/// Key of the content document of a message: `<mailbox>-<uid>`.
pub fn doc_key(mailbox: &MailboxId, uid: u64) -> String {
    let mut buffer = itoa::Buffer::new();
    format!("{}-{}", mailbox, buffer.format(uid))
}

/// Key of the flags document of a message: `flags-<mailbox>-<uid>`.
pub fn flags_doc_key(mailbox: &MailboxId, uid: u64) -> String {
    format!("{}-{}", KIND_FLAGS, doc_key(mailbox, uid))
}

pub struct DocumentBuilder<'a> {
    fields: &'static MessageFields,
    decoder: &'a dyn MimeStreamDecoder,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(decoder: &'a dyn MimeStreamDecoder) -> Self {
        Self {
            fields: SchemaTools::message_fields(),
            decoder,
        }
    }

    /// Builds the immutable content document. Fails with `IndexingFailed`
    /// when the content cannot be decoded; nothing is written in that case.
    pub fn content_document(
        &self,
        mailbox: &MailboxId,
        message: &dyn MailboxMessage,
    ) -> MailSearchResult<TantivyDocument> {
        let fields = self.fields;
        let uid = message.uid();
        let mut doc = TantivyDocument::new();
        doc.add_text(fields.f_id, doc_key(mailbox, uid));
        doc.add_text(fields.f_kind, KIND_MESSAGE);
        doc.add_text(fields.f_mailbox_id, mailbox.as_str());
        doc.add_u64(fields.f_uid, uid);
        doc.add_u64(fields.f_mod_seq, message.mod_seq());
        doc.add_u64(fields.f_size, message.full_content_octets());

        let internal_date = message.internal_date();
        for resolution in DateResolution::ALL {
            doc.add_i64(
                fields.internal_date(resolution),
                resolution.truncate(&internal_date),
            );
        }

        let mut collector = ContentCollector { fields, doc };
        self.decoder
            .decode(&message.full_content(), &mut collector)
            .map_err(|e| {
                raise_error!(
                    format!(
                        "Failed to decode message uid={} in mailbox '{}': {}",
                        uid, mailbox, e
                    ),
                    ErrorCode::IndexingFailed
                )
            })?;
        Ok(collector.doc)
    }

    /// Builds the mutable flags document from the current flag set.
    pub fn flags_document(&self, mailbox: &MailboxId, uid: u64, flags: &Flags) -> TantivyDocument {
        let fields = self.fields;
        let mut doc = TantivyDocument::new();
        doc.add_text(fields.f_id, flags_doc_key(mailbox, uid));
        doc.add_text(fields.f_kind, KIND_FLAGS);
        doc.add_text(fields.f_mailbox_id, mailbox.as_str());
        doc.add_u64(fields.f_uid, uid);
        for flag in flags {
            doc.add_text(fields.f_flags, flag.index_token());
        }
        doc
    }
}

struct ContentCollector {
    fields: &'static MessageFields,
    doc: TantivyDocument,
}

impl ContentHandler for ContentCollector {
    fn header(&mut self, field: HeaderField) {
        self.doc.add_text(
            self.fields.f_headers,
            format!("{}: {}", field.name, field.value),
        );
        self.doc.add_text(
            self.fields.f_header,
            format!("{}{}{}", field.name, HEADER_NAME_SEPARATOR, field.value),
        );
        if let (Some(role), Some(addresses)) =
            (self.fields.address_role(&field.name), &field.addresses)
        {
            for address in addresses {
                self.doc.add_text(role, address);
            }
        }
    }

    fn body_part(&mut self, part: BodyPart) {
        if let Some(text) = body_text(&part) {
            self.doc.add_text(self.fields.f_body, text);
        }
    }
}

fn body_text(part: &BodyPart) -> Option<String> {
    if part.media_type != "text" && part.media_type != "message" {
        return None;
    }
    let encoding = part
        .charset
        .as_deref()
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (decoded, _, _) = encoding.decode(&part.contents);
    if !part.is_html() {
        return Some(decoded.into_owned());
    }
    match html2text::from_read(decoded.as_bytes(), HTML_TEXT_WIDTH) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Failed to convert html body to text, indexing markup: {:#?}", e);
            Some(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::message::{Flag, StoredMessage};
    use crate::modules::mime::MailParserDecoder;
    use tantivy::schema::Value;

    fn texts(doc: &TantivyDocument, field: tantivy::schema::Field) -> Vec<String> {
        doc.get_all(field)
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn keys_follow_the_documented_format() {
        let inbox = MailboxId::new("INBOX");
        assert_eq!(doc_key(&inbox, 42), "inbox-42");
        assert_eq!(flags_doc_key(&inbox, 42), "flags-inbox-42");
    }

    #[test]
    fn content_document_carries_headers_addresses_and_body() {
        let raw = b"From: Alice <alice@example.com>\r\nTo: bob@example.com\r\nSubject: Budget\r\n\r\nSee the numbers.\r\n";
        let message = StoredMessage::new(MailboxId::new("inbox"), 7, raw.to_vec()).with_mod_seq(3);
        let decoder = MailParserDecoder;
        let doc = DocumentBuilder::new(&decoder)
            .content_document(&MailboxId::new("inbox"), &message)
            .unwrap();
        let fields = SchemaTools::message_fields();

        assert_eq!(texts(&doc, fields.f_id), vec!["inbox-7"]);
        assert_eq!(texts(&doc, fields.f_kind), vec![KIND_MESSAGE]);
        assert!(texts(&doc, fields.f_headers).contains(&"Subject: Budget".to_string()));
        assert!(texts(&doc, fields.f_header).contains(&"Subject:Budget".to_string()));
        assert_eq!(texts(&doc, fields.f_from), vec!["Alice <alice@example.com>"]);
        assert_eq!(texts(&doc, fields.f_to), vec!["bob@example.com"]);
        assert!(texts(&doc, fields.f_body)[0].contains("See the numbers."));
        assert_eq!(
            doc.get_first(fields.f_size).and_then(|v| v.as_u64()),
            Some(raw.len() as u64)
        );
        assert_eq!(doc.get_first(fields.f_mod_seq).and_then(|v| v.as_u64()), Some(3));
        assert!(texts(&doc, fields.f_flags).is_empty());
    }

    #[test]
    fn html_bodies_are_indexed_as_text() {
        let raw = b"Subject: html\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<html><body><p>Quarterly <b>numbers</b></p></body></html>\r\n";
        let message = StoredMessage::new(MailboxId::new("inbox"), 1, raw.to_vec());
        let decoder = MailParserDecoder;
        let doc = DocumentBuilder::new(&decoder)
            .content_document(&MailboxId::new("inbox"), &message)
            .unwrap();
        let body = texts(&doc, SchemaTools::message_fields().f_body).join(" ");
        assert!(body.contains("Quarterly"));
        assert!(!body.contains("<b>"));
    }

    #[test]
    fn legacy_charsets_are_decoded() {
        let part = BodyPart {
            media_type: "text".into(),
            sub_type: "plain".into(),
            charset: Some("iso-8859-1".into()),
            contents: vec![0x63, 0x61, 0x66, 0xE9],
        };
        assert_eq!(body_text(&part).as_deref(), Some("café"));
        let image = BodyPart {
            media_type: "image".into(),
            ..part
        };
        assert!(body_text(&image).is_none());
    }

    #[test]
    fn flags_document_holds_only_flag_tokens() {
        let decoder = MailParserDecoder;
        let flags = Flags::new().with(Flag::Seen).with(Flag::keyword("$Work"));
        let doc = DocumentBuilder::new(&decoder).flags_document(&MailboxId::new("Sent"), 9, &flags);
        let fields = SchemaTools::message_fields();
        assert_eq!(texts(&doc, fields.f_id), vec!["flags-sent-9"]);
        assert_eq!(texts(&doc, fields.f_kind), vec![KIND_FLAGS]);
        let mut tokens = texts(&doc, fields.f_flags);
        tokens.sort();
        assert_eq!(tokens, vec!["$Work", "\\SEEN"]);
        assert!(texts(&doc, fields.f_body).is_empty());
    }
}
