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

use mail_parser::{HeaderValue, Message, MessageParser, MimeHeaders, PartType};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::modules::common::AddrVec;
use crate::modules::error::{code::ErrorCode, MailSearchResult};
use crate::raise_error;

/// Nested `message/rfc822` parts deeper than this are not descended into.
const MAX_DEPTH: usize = 10;

static FOLDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]+").expect("folding pattern is valid"));

/// One top-level header of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderField {
    pub name: String,
    /// Decoded and unfolded value.
    pub value: String,
    /// Set for address headers (From, To, Cc, Bcc, Reply-To, ...).
    pub addresses: Option<Vec<String>>,
}

/// One leaf part with textual content.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPart {
    pub media_type: String,
    pub sub_type: String,
    pub charset: Option<String>,
    pub contents: Vec<u8>,
}

impl BodyPart {
    pub fn is_html(&self) -> bool {
        self.media_type == "text" && self.sub_type == "html"
    }
}

/// Receives decoded structure from a [`MimeStreamDecoder`].
pub trait ContentHandler {
    fn header(&mut self, field: HeaderField);
    fn body_part(&mut self, part: BodyPart);
}

/// Parses raw RFC 822 content into header and body events.
pub trait MimeStreamDecoder: Send + Sync {
    fn decode(&self, raw: &[u8], handler: &mut dyn ContentHandler) -> MailSearchResult<()>;
}

/// Default decoder backed by `mail-parser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MailParserDecoder;

impl MimeStreamDecoder for MailParserDecoder {
    fn decode(&self, raw: &[u8], handler: &mut dyn ContentHandler) -> MailSearchResult<()> {
        let message = MessageParser::default().parse(raw).ok_or_else(|| {
            raise_error!(
                "Failed to parse message content".into(),
                ErrorCode::IndexingFailed
            )
        })?;

        for header in message.headers() {
            let raw_value = message
                .raw_message()
                .get(header.offset_start as usize..header.offset_end as usize)
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            let (value, addresses) = match header.value() {
                HeaderValue::Text(text) => (unfold(text), None),
                HeaderValue::TextList(list) => (unfold(&list.join(", ")), None),
                HeaderValue::Address(address) => {
                    let addresses = AddrVec::from(address).to_strings();
                    (addresses.join(", "), Some(addresses))
                }
                _ => (unfold(&raw_value), None),
            };
            handler.header(HeaderField {
                name: header.name().to_string(),
                value,
                addresses,
            });
        }

        walk_parts(&message, handler, 0);
        Ok(())
    }
}

fn walk_parts(message: &Message<'_>, handler: &mut dyn ContentHandler, depth: usize) {
    if depth > MAX_DEPTH {
        debug!("Skipping message parts nested deeper than {}", MAX_DEPTH);
        return;
    }
    for part in message.parts.iter() {
        let (media_type, sub_type, charset) = match part.content_type() {
            Some(ct) => (
                ct.ctype().to_ascii_lowercase(),
                ct.subtype().unwrap_or("plain").to_ascii_lowercase(),
                ct.attribute("charset").map(|c| c.to_string()),
            ),
            None => ("text".to_string(), "plain".to_string(), None),
        };
        match &part.body {
            PartType::Text(text) => handler.body_part(BodyPart {
                media_type,
                sub_type,
                charset: Some("utf-8".into()),
                contents: text.as_bytes().to_vec(),
            }),
            PartType::Html(html) => handler.body_part(BodyPart {
                media_type: "text".into(),
                sub_type: "html".into(),
                charset: Some("utf-8".into()),
                contents: html.as_bytes().to_vec(),
            }),
            PartType::Binary(bytes) | PartType::InlineBinary(bytes) if media_type == "text" => {
                handler.body_part(BodyPart {
                    media_type,
                    sub_type,
                    charset,
                    contents: bytes.to_vec(),
                })
            }
            PartType::Message(nested) => walk_parts(nested, handler, depth + 1),
            _ => {}
        }
    }
}

/// Joins folded header lines into one.
pub fn unfold(value: &str) -> String {
    FOLDING.replace_all(value, " ").trim().to_string()
}
