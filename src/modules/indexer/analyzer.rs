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

//! Tokenizers for the analyzed text fields.
//!
//! In substring mode every text is lower-cased, split into sentences and
//! expanded into all character n-grams between the configured minimum and
//! maximum length. A substring search then becomes a prefix lookup over
//! those n-grams: any substring of a sentence is a prefix of some n-gram
//! starting at the same character. Whitespace mode indexes lower-cased
//! words only.

use tantivy::{
    tokenizer::{TextAnalyzer, Token, TokenStream, Tokenizer},
    Index,
};

use crate::modules::settings::index::IndexConfig;

pub const SUBSTRING_TOKENIZER: &str = "imap_substring";
pub const HEADER_TOKENIZER: &str = "imap_header";
pub const HEADER_NAME_SEPARATOR: char = ':';

/// Sentence delimiters, kept at the end of the sentence they close.
/// Line breaks also end a sentence but are dropped.
const SENTENCE_DELIMITERS: [char; 9] = ['，', '。', '！', '？', '；', ',', '!', '?', ';'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerMode {
    Substring { min: usize, max: usize },
    Whitespace,
}

impl AnalyzerMode {
    pub fn from_config(config: &IndexConfig) -> Self {
        if config.substring_analysis {
            AnalyzerMode::Substring {
                min: config.min_token_length.max(1),
                max: config.max_token_length.max(config.min_token_length.max(1)),
            }
        } else {
            AnalyzerMode::Whitespace
        }
    }

    /// Token texts produced for `text`, in emission order.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.tokens(text).into_iter().map(|t| t.text).collect()
    }

    pub fn tokens(&self, text: &str) -> Vec<Token> {
        match *self {
            AnalyzerMode::Substring { min, max } => substring_tokens(text, min, max),
            AnalyzerMode::Whitespace => whitespace_tokens(text),
        }
    }

    /// Prefixes that must all be present in a field for it to contain `value`.
    ///
    /// Values longer than the longest indexed n-gram are covered by
    /// overlapping windows of maximal length.
    pub fn query_terms(&self, value: &str) -> Vec<String> {
        match *self {
            AnalyzerMode::Substring { max, .. } => {
                let lowered = value.to_lowercase();
                let chars: Vec<char> = lowered.chars().collect();
                if chars.len() <= max {
                    return vec![lowered];
                }
                let step = (max - 1).max(1);
                let mut terms = Vec::new();
                let mut start = 0;
                loop {
                    let end = (start + max).min(chars.len());
                    terms.push(chars[end - max..end].iter().collect());
                    if end == chars.len() {
                        break;
                    }
                    start += step;
                }
                terms
            }
            AnalyzerMode::Whitespace => {
                let words: Vec<String> =
                    value.split_whitespace().map(|w| w.to_lowercase()).collect();
                if words.is_empty() {
                    vec![String::new()]
                } else {
                    words
                }
            }
        }
    }
}

/// Lower-cased header name followed by the separator, the prefix of every
/// token of that header.
pub fn header_scope(name: &str) -> String {
    format!("{}{}", name.trim().to_lowercase(), HEADER_NAME_SEPARATOR)
}

fn sentences(text: &str) -> Vec<(usize, &str)> {
    fn push<'a>(out: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
        let sentence = &text[start..end];
        let trimmed = sentence.trim_start();
        if !trimmed.is_empty() {
            out.push((start + sentence.len() - trimmed.len(), trimmed));
        }
    }

    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' || c == '\r' {
            push(&mut out, text, start, i);
            start = i + c.len_utf8();
        } else if SENTENCE_DELIMITERS.contains(&c) {
            let end = i + c.len_utf8();
            push(&mut out, text, start, end);
            start = end;
        }
    }
    push(&mut out, text, start, text.len());
    out
}

fn substring_tokens(text: &str, min: usize, max: usize) -> Vec<Token> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut position = 0;
    for (offset, sentence) in sentences(&lowered) {
        let bounds: Vec<usize> = sentence
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(sentence.len()))
            .collect();
        let char_count = bounds.len() - 1;
        if char_count < min {
            tokens.push(token(sentence, offset, 0, sentence.len(), position));
            position += 1;
            continue;
        }
        for from in 0..char_count {
            for len in min..=max {
                let to = from + len;
                if to > char_count {
                    break;
                }
                tokens.push(token(sentence, offset, bounds[from], bounds[to], position));
            }
            position += 1;
        }
    }
    tokens
}

fn whitespace_tokens(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut position = 0;
    let mut word_start: Option<usize> = None;
    let mut push = |start: usize, end: usize, position: &mut usize| {
        tokens.push(Token {
            offset_from: start,
            offset_to: end,
            position: *position,
            text: text[start..end].to_lowercase(),
            position_length: 1,
        });
        *position += 1;
    };
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), word_start) {
            (true, Some(start)) => {
                push(start, i, &mut position);
                word_start = None;
            }
            (false, None) => word_start = Some(i),
            _ => {}
        }
    }
    if let Some(start) = word_start {
        push(start, text.len(), &mut position);
    }
    tokens
}

fn token(sentence: &str, offset: usize, from: usize, to: usize, position: usize) -> Token {
    Token {
        offset_from: offset + from,
        offset_to: offset + to,
        position,
        text: sentence[from..to].to_string(),
        position_length: 1,
    }
}

/// Tokens of a `name:value` header line: a bare `name:` marker followed by
/// every token of the value, each prefixed with `name:`.
fn header_tokens(mode: &AnalyzerMode, text: &str) -> Vec<Token> {
    let (name, value) = text
        .split_once(HEADER_NAME_SEPARATOR)
        .unwrap_or((text, ""));
    let scope = header_scope(name);
    let value_offset = text.len() - value.len();

    let mut tokens = vec![Token {
        offset_from: 0,
        offset_to: value_offset,
        position: 0,
        text: scope.clone(),
        position_length: 1,
    }];
    tokens.extend(mode.tokens(value).into_iter().map(|mut token| {
        token.text = format!("{}{}", scope, token.text);
        token.position += 1;
        token.offset_from += value_offset;
        token.offset_to += value_offset;
        token
    }));
    tokens
}

/// Hands out a pre-computed token list.
pub struct VecTokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl VecTokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }
}

impl TokenStream for VecTokenStream {
    fn advance(&mut self) -> bool {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.cursor - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.cursor - 1]
    }
}

#[derive(Debug, Clone)]
pub struct SubstringTokenizer {
    mode: AnalyzerMode,
}

impl Tokenizer for SubstringTokenizer {
    type TokenStream<'a> = VecTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        VecTokenStream::new(self.mode.tokens(text))
    }
}

#[derive(Debug, Clone)]
pub struct HeaderScopedTokenizer {
    mode: AnalyzerMode,
}

impl Tokenizer for HeaderScopedTokenizer {
    type TokenStream<'a> = VecTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        VecTokenStream::new(header_tokens(&self.mode, text))
    }
}

pub fn register_tokenizers(index: &Index, mode: AnalyzerMode) {
    let manager = index.tokenizers();
    manager.register(
        SUBSTRING_TOKENIZER,
        TextAnalyzer::builder(SubstringTokenizer { mode }).build(),
    );
    manager.register(
        HEADER_TOKENIZER,
        TextAnalyzer::builder(HeaderScopedTokenizer { mode }).build(),
    );
}
