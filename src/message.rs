//! Parametrized message parsing for DCS payloads
//!
//! The image-protocol hooks carry an HTTP-like message: unique header
//! key/value pairs followed by an optional body.
//!
//! - headers and body are separated by `;`
//! - header entries are separated by `,`
//! - header name and value are separated by `=`
//! - a value (or body) starting with `!` holds base64 for raw bytes
//!
//! Header names therefore cannot contain `;`, `,` or `=`, and plain values
//! cannot contain `;` or `,`. Duplicate names overwrite earlier ones. Inputs
//! like `,first=Foo,second,,,another=value,also=;some body` are valid.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;

use crate::extension::{HookOutput, ParserExtension};

pub const MAX_KEY_LENGTH: usize = 64;
pub const MAX_VALUE_LENGTH: usize = 512;
pub const MAX_HEADER_COUNT: usize = 32;
pub const MAX_BODY_LENGTH: usize = 8 * 1024 * 1024;

/// A parsed message: unique headers plus an optional body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    headers: HashMap<String, Vec<u8>>,
    body: Vec<u8>,
}

impl Message {
    pub fn new(headers: HashMap<String, Vec<u8>>, body: Vec<u8>) -> Self {
        Message { headers, body }
    }

    pub fn headers(&self) -> &HashMap<String, Vec<u8>> {
        &self.headers
    }

    /// Value of header `key`, if present
    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers.get(key).map(Vec::as_slice)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ParamKey,
    ParamValue,
    BodyStart,
    Body,
}

/// Single-pass parser assembling a [`Message`] from streamed characters.
///
/// Oversized keys, values, headers and body content are dropped quietly; a
/// malformed base64 value keeps its raw bytes without the `!` prefix.
pub struct MessageParser {
    state: State,
    key: String,
    value: String,
    headers: HashMap<String, Vec<u8>>,
    body: Vec<u8>,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageParser {
    pub fn new() -> Self {
        MessageParser {
            state: State::ParamKey,
            key: String::new(),
            value: String::new(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Parse a complete input in one go
    pub fn parse(input: &str) -> Message {
        let mut parser = MessageParser::new();
        parser.start();
        for ch in input.chars() {
            parser.pass(ch);
        }
        parser.finish()
    }

    fn step(&mut self, ch: char) {
        match self.state {
            State::ParamKey => match ch {
                ',' => self.flush_header(),
                ';' => {
                    self.flush_header();
                    self.state = State::BodyStart;
                }
                '=' => self.state = State::ParamValue,
                _ => {
                    if self.key.len() < MAX_KEY_LENGTH {
                        self.key.push(ch);
                    }
                }
            },
            State::ParamValue => match ch {
                ',' => {
                    self.flush_header();
                    self.state = State::ParamKey;
                }
                ';' => {
                    self.flush_header();
                    self.state = State::BodyStart;
                }
                _ => {
                    if self.value.len() < MAX_VALUE_LENGTH {
                        self.value.push(ch);
                    }
                }
            },
            State::BodyStart => {
                self.state = State::Body;
                self.push_body(ch);
            }
            State::Body => self.push_body(ch),
        }
    }

    fn push_body(&mut self, ch: char) {
        if self.body.len() < MAX_BODY_LENGTH {
            // DCS bodies are byte streams; the producer hands each byte
            // through as a char, so keep the low byte.
            self.body.push(ch as u8);
        }
    }

    /// Commit the pending key/value pair, decoding a `!`-prefixed value
    fn flush_header(&mut self) {
        let has_space = self.headers.len() < MAX_HEADER_COUNT || self.headers.contains_key(&self.key);
        if !self.key.is_empty() && has_space {
            let key = std::mem::take(&mut self.key);
            let value = std::mem::take(&mut self.value);
            self.headers.insert(key, decode_escaped(value.into_bytes()));
        } else {
            if !self.key.is_empty() {
                debug!("message header limit reached, dropping {:?}", self.key);
            }
            self.key.clear();
            self.value.clear();
        }
    }

    /// Finish parsing and return the assembled message, resetting the parser
    pub fn finish(&mut self) -> Message {
        match self.state {
            State::ParamKey | State::ParamValue => self.flush_header(),
            State::BodyStart => {}
            State::Body => self.body = decode_escaped(std::mem::take(&mut self.body)),
        }
        let message = Message::new(
            std::mem::take(&mut self.headers),
            std::mem::take(&mut self.body),
        );
        self.state = State::ParamKey;
        message
    }
}

/// Decode a `!`-prefixed base64 payload; on failure keep the raw bytes
/// without the prefix.
fn decode_escaped(raw: Vec<u8>) -> Vec<u8> {
    match raw.split_first() {
        Some((b'!', encoded)) => BASE64.decode(encoded).unwrap_or_else(|err| {
            debug!("invalid base64 in message payload: {err}");
            encoded.to_vec()
        }),
        _ => raw,
    }
}

impl ParserExtension for MessageParser {
    fn start(&mut self) {
        self.state = State::ParamKey;
        self.key.clear();
        self.value.clear();
        self.headers.clear();
        self.body.clear();
    }

    fn pass(&mut self, ch: char) {
        self.step(ch);
    }

    fn finalize(&mut self) -> HookOutput {
        HookOutput::Message(self.finish())
    }
}
