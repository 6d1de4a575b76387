//! DCS sub-parser plumbing
//!
//! While a DCS hook is open the sequencer owns exactly one
//! [`ParserExtension`] and feeds it every `put` character. `finalize` hands
//! the parsed payload back as a [`HookOutput`] value; the sequencer routes it
//! to the matching screen operation. The extension is dropped on unhook.

use crate::message::Message;
use crate::sixel::ImageData;

/// Payload produced by a finished DCS sub-parser
#[derive(Debug, Clone)]
pub enum HookOutput {
    /// Nothing to deliver
    None,
    /// Collected string (DECRQSS)
    Text(String),
    /// Parsed message (image protocol)
    Message(Message),
    /// Completed bitmap (sixel)
    Image(ImageData),
}

/// A sub-parser hooked between DCS entry and String Terminator
pub trait ParserExtension {
    /// Called once when the hook opens
    fn start(&mut self);

    /// Called for every payload character
    fn pass(&mut self, ch: char);

    /// Called when the hook closes; returns the parsed payload
    fn finalize(&mut self) -> HookOutput;
}

/// Collects the raw payload into a string, capped at `max_length`.
/// Used for DECRQSS, whose payloads are tiny setting names.
pub struct StringCollector {
    collected: String,
    max_length: usize,
}

impl StringCollector {
    pub fn new(max_length: usize) -> Self {
        StringCollector {
            collected: String::new(),
            max_length,
        }
    }
}

impl ParserExtension for StringCollector {
    fn start(&mut self) {
        self.collected.clear();
    }

    fn pass(&mut self, ch: char) {
        if self.collected.len() + ch.len_utf8() <= self.max_length {
            self.collected.push(ch);
        }
    }

    fn finalize(&mut self) -> HookOutput {
        HookOutput::Text(std::mem::take(&mut self.collected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_collector() {
        let mut collector = StringCollector::new(16);
        collector.start();
        for ch in "\"q".chars() {
            collector.pass(ch);
        }
        match collector.finalize() {
            HookOutput::Text(text) => assert_eq!(text, "\"q"),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_string_collector_cap() {
        let mut collector = StringCollector::new(4);
        collector.start();
        for ch in "abcdefgh".chars() {
            collector.pass(ch);
        }
        match collector.finalize() {
            HookOutput::Text(text) => assert_eq!(text, "abcd"),
            other => panic!("unexpected output: {other:?}"),
        }
    }
}
