//! Sequencer - the semantic analyzer layer
//!
//! The byte-stream producer drives the [`Sequencer`] through the event entry
//! points (`clear`, `collect`, `param`, `dispatch_csi`, `hook`, ...); the
//! sequencer assembles the current [`Sequence`], resolves it against the
//! function registry and applies it to the screen through the
//! [`Performer`](crate::performer::Performer).
//!
//! Synchronized output (DEC private mode 2026) turns the sequencer into a
//! queue: prints, batchable control functions and completed sixel images are
//! held back and replayed in order when the mode is reset, so the screen
//! never shows a half-drawn frame. Side-effect-free queries keep applying
//! immediately.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::color::{Palette, Rgba};
use crate::extension::{HookOutput, ParserExtension, StringCollector};
use crate::functions::{self, Function};
use crate::message::{Message, MessageParser};
use crate::performer::{self, ApplyResult, Performer};
use crate::screen::{Coordinate, ImageAlignment, ImageFormat, ImageResize, Screen, Size};
use crate::sequence::{FunctionCategory, Sequence, MAX_OSC_LENGTH};
use crate::sixel::{ImageData, SixelImageBuilder, SixelParser};

/// Default ceiling for the synchronized-output queue, in entries
pub const DEFAULT_MAX_BATCH_SIZE: usize = 4096;

/// One deferred item of a synchronized-output batch
#[derive(Debug, Clone)]
pub enum BatchItem {
    /// A printable character
    Character(char),
    /// A completed control sequence
    Sequence(Sequence),
    /// A completed sixel image
    Image(ImageData),
}

/// The sequencer owns the current sequence, the hooked DCS sub-parser and
/// the synchronized-output queue. The screen is borrowed per call.
pub struct Sequencer {
    sequence: Sequence,
    batching: bool,
    batched: Vec<BatchItem>,
    max_batch_size: usize,
    instruction_counter: u64,
    hooked_parser: Option<Box<dyn ParserExtension>>,
    hooked_function: Option<Function>,
    image_palette: Rc<RefCell<Palette>>,
    use_private_color_registers: bool,
    max_image_size: Size,
    max_image_register_count: usize,
    background_color: Rgba,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Sequencer {
            sequence: Sequence::new(),
            batching: false,
            batched: Vec::new(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            instruction_counter: 0,
            hooked_parser: None,
            hooked_function: None,
            image_palette: Rc::new(RefCell::new(Palette::default())),
            use_private_color_registers: false,
            max_image_size: Size::new(800, 600),
            max_image_register_count: 256,
            background_color: Rgba::TRANSPARENT,
        }
    }

    // -- configuration -------------------------------------------------------

    pub fn set_max_image_size(&mut self, size: Size) {
        self.max_image_size = size;
    }

    pub fn set_max_image_register_count(&mut self, count: usize) {
        self.max_image_register_count = count;
    }

    pub fn set_use_private_color_registers(&mut self, value: bool) {
        self.use_private_color_registers = value;
    }

    pub fn set_background_color(&mut self, color: Rgba) {
        self.background_color = color;
    }

    /// Cap on the synchronized-output queue. When an enqueue would exceed it
    /// the queue is flushed eagerly; ordering is preserved, only the
    /// tear-free guarantee degrades for that frame.
    pub fn set_max_batch_size(&mut self, entries: usize) {
        self.max_batch_size = entries.max(1);
    }

    /// Monotonic count of applied instructions, for external pacing
    pub fn instruction_counter(&self) -> u64 {
        self.instruction_counter
    }

    pub fn reset_instruction_counter(&mut self) {
        self.instruction_counter = 0;
    }

    /// True while synchronized output is buffering
    pub fn is_batching(&self) -> bool {
        self.batching
    }

    /// The sequence currently under assembly
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// True while a DCS sub-parser is hooked
    pub fn is_hooked(&self) -> bool {
        self.hooked_parser.is_some()
    }

    // -- producer entry points -----------------------------------------------

    /// The producer reports a parse error; the stream continues
    pub fn error(&mut self, message: &str) {
        warn!("parser error: {message}");
    }

    /// Print one character, or queue it while batching
    pub fn print(&mut self, screen: &mut dyn Screen, ch: char) {
        if self.batching {
            self.enqueue(screen, BatchItem::Character(ch));
        } else {
            self.instruction_counter += 1;
            screen.write_text(ch);
        }
    }

    /// Execute a C0 control byte. While batching, the control becomes a
    /// synthetic C0 sequence so it keeps its place in the queue.
    pub fn execute(&mut self, screen: &mut dyn Screen, control: u8) {
        if self.batching {
            self.sequence.clear();
            self.sequence.set_category(FunctionCategory::C0);
            self.sequence.set_final_char(control as char);
            self.handle_sequence(screen);
            return;
        }

        self.instruction_counter += 1;
        match control {
            0x07 => screen.event_listener().bell(),
            0x08 => screen.backspace(),
            0x09 => screen.move_cursor_to_next_tab(),
            0x0A => screen.linefeed(),
            // xterm treats VT and FF as an index.
            0x0B | 0x0C => screen.index(),
            0x0D => screen.move_cursor_to_begin_of_line(),
            0x37 => screen.save_cursor(),
            0x38 => screen.restore_cursor(),
            _ => debug!("unsupported control code 0x{control:02X}"),
        }
    }

    /// Reset the current sequence (start of a new control sequence)
    pub fn clear(&mut self) {
        self.sequence.clear();
    }

    /// Collect an intermediate character
    pub fn collect(&mut self, ch: char) {
        self.sequence.push_intermediate(ch);
    }

    /// Collect the private-parameter leader (`?`, `>`, `=`)
    pub fn collect_leader(&mut self, leader: u8) {
        self.sequence.set_leader(leader);
    }

    /// Feed one parameter byte: digits accumulate, `;` and `:` separate
    pub fn param(&mut self, byte: u8) {
        match byte {
            b';' => self.sequence.next_parameter(),
            b':' => self.sequence.next_sub_parameter(),
            b'0'..=b'9' => self.sequence.accumulate_digit(byte - b'0'),
            _ => debug!("ignoring parameter byte 0x{byte:02X}"),
        }
    }

    pub fn dispatch_esc(&mut self, screen: &mut dyn Screen, final_char: char) {
        self.sequence.set_category(FunctionCategory::Esc);
        self.sequence.set_final_char(final_char);
        self.handle_sequence(screen);
    }

    pub fn dispatch_csi(&mut self, screen: &mut dyn Screen, final_char: char) {
        self.sequence.set_category(FunctionCategory::Csi);
        self.sequence.set_final_char(final_char);
        self.handle_sequence(screen);
    }

    pub fn start_osc(&mut self) {
        self.sequence.set_category(FunctionCategory::Osc);
    }

    /// Accumulate one OSC payload character, bounded by [`MAX_OSC_LENGTH`]
    pub fn put_osc(&mut self, ch: char) {
        if self.sequence.intermediates().len() + ch.len_utf8() < MAX_OSC_LENGTH {
            self.sequence.push_intermediate(ch);
        }
    }

    /// Split the leading numeric code off the OSC payload and dispatch
    pub fn dispatch_osc(&mut self, screen: &mut dyn Screen) {
        let payload = self.sequence.intermediates();
        let digits = payload.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 && !payload.is_empty() && !payload.starts_with(';') {
            warn!("unknown OSC sequence: {}", self.sequence.text());
            self.sequence.clear();
            return;
        }

        let code: u32 = payload[..digits].parse().unwrap_or(0);
        let mut rest = &payload[digits..];
        if let Some(stripped) = rest.strip_prefix(';') {
            rest = stripped;
        }
        let rest = rest.to_string();
        self.sequence.push_parameter(code);
        self.sequence.set_intermediates(rest);
        self.handle_sequence(screen);
    }

    /// Open a DCS hook: resolve the function and attach its sub-parser
    pub fn hook(&mut self, final_char: char) {
        self.instruction_counter += 1;
        self.sequence.set_category(FunctionCategory::Dcs);
        self.sequence.set_final_char(final_char);

        let function = match functions::resolve(&self.sequence) {
            Some(function) => function,
            None => {
                warn!("unknown VT sequence: {}", self.sequence.text());
                return;
            }
        };

        let mut parser: Box<dyn ParserExtension> = match function {
            Function::DecSixel => Box::new(self.hook_sixel()),
            Function::DecRqss => Box::new(StringCollector::new(MAX_OSC_LENGTH)),
            Function::ImageUpload
            | Function::ImageRender
            | Function::ImageRelease
            | Function::ImageOneshot => Box::new(MessageParser::new()),
            other => {
                debug!("DCS function {other:?} takes no payload");
                return;
            }
        };
        parser.start();
        self.hooked_parser = Some(parser);
        self.hooked_function = Some(function);
    }

    /// Forward one DCS payload character; a no-op without an open hook
    pub fn put(&mut self, ch: char) {
        if let Some(parser) = self.hooked_parser.as_mut() {
            parser.pass(ch);
        }
    }

    /// Close the DCS hook and deliver its payload; a no-op without one
    pub fn unhook(&mut self, screen: &mut dyn Screen) {
        if let Some(mut parser) = self.hooked_parser.take() {
            let output = parser.finalize();
            if let Some(function) = self.hooked_function.take() {
                self.route_hook_output(screen, function, output);
            }
        }
        self.sequence.clear();
    }

    // -- internals -----------------------------------------------------------

    fn hook_sixel(&mut self) -> SixelParser {
        let pa = self.sequence.param_or(0, 1);
        let pb = self.sequence.param_or(1, 2);

        let aspect_vertical = match pa {
            7..=9 => 1,
            5 | 6 => 2,
            3 | 4 => 3,
            2 => 5,
            _ => 2,
        };
        let background = if pb == 1 {
            self.background_color
        } else {
            Rgba::TRANSPARENT
        };
        let palette = if self.use_private_color_registers {
            Rc::new(RefCell::new(Palette::with_registers(
                self.max_image_register_count.min(4096),
            )))
        } else {
            Rc::clone(&self.image_palette)
        };

        SixelParser::new(SixelImageBuilder::new(
            self.max_image_size,
            aspect_vertical,
            background,
            palette,
        ))
    }

    fn handle_sequence(&mut self, screen: &mut dyn Screen) {
        self.instruction_counter += 1;

        match functions::resolve(&self.sequence) {
            Some(function) => {
                if function == Function::DecSm && self.sequence.contains_parameter(2026) {
                    self.batching = true;
                    self.apply(screen, function);
                } else if function == Function::DecRm && self.sequence.contains_parameter(2026) {
                    self.batching = false;
                    self.flush_batched(screen);
                    self.apply(screen, function);
                } else if self.batching && functions::is_batchable(function) {
                    let deferred = BatchItem::Sequence(self.sequence.clone());
                    self.enqueue(screen, deferred);
                } else {
                    self.apply(screen, function);
                }
                screen.verify_state();
            }
            None => warn!("unknown VT sequence: {}", self.sequence.text()),
        }

        self.sequence.clear();
    }

    fn apply(&mut self, screen: &mut dyn Screen, function: Function) {
        match Performer::new(screen).apply(function, &self.sequence) {
            ApplyResult::Ok => {}
            ApplyResult::Invalid => {
                debug!("invalid sequence: {}", self.sequence.text());
            }
            ApplyResult::Unsupported => {
                debug!("unsupported sequence: {}", self.sequence.text());
            }
        }
    }

    fn enqueue(&mut self, screen: &mut dyn Screen, item: BatchItem) {
        if self.batched.len() >= self.max_batch_size {
            debug!("batch queue cap reached, flushing early");
            self.flush_batched(screen);
        }
        self.batched.push(item);
    }

    /// Replay the queue in insertion order
    fn flush_batched(&mut self, screen: &mut dyn Screen) {
        for item in std::mem::take(&mut self.batched) {
            match item {
                BatchItem::Character(ch) => {
                    self.instruction_counter += 1;
                    screen.write_text(ch);
                }
                BatchItem::Sequence(seq) => match functions::resolve(&seq) {
                    Some(function) => {
                        if Performer::new(screen).apply(function, &seq) != ApplyResult::Ok {
                            debug!("deferred sequence failed: {}", seq.text());
                        }
                    }
                    None => warn!("unknown VT sequence: {}", seq.text()),
                },
                BatchItem::Image(image) => screen.sixel_image(image),
            }
        }
    }

    fn route_hook_output(
        &mut self,
        screen: &mut dyn Screen,
        function: Function,
        output: HookOutput,
    ) {
        match (function, output) {
            (Function::DecRqss, HookOutput::Text(data)) => {
                match performer::status_string_from(&data) {
                    Some(value) => screen.request_status_string(value),
                    None => debug!("invalid status string request: {data:?}"),
                }
            }
            (Function::DecSixel, HookOutput::Image(image)) => {
                if self.batching {
                    self.enqueue(screen, BatchItem::Image(image));
                } else {
                    screen.sixel_image(image);
                }
            }
            (Function::ImageUpload, HookOutput::Message(mut message)) => {
                let format = image_format(&message);
                let size = Size::new(
                    header_number(&message, "w", 0),
                    header_number(&message, "h", 0),
                );
                let name = match message.header("n") {
                    Some(name) => String::from_utf8_lossy(name).into_owned(),
                    None => {
                        debug!("image upload without a name");
                        return;
                    }
                };
                let valid = match format {
                    ImageFormat::Png => size.width == 0 && size.height == 0,
                    _ => size.width > 0 && size.height > 0,
                };
                if valid {
                    screen.upload_image(&name, format, size, message.take_body());
                } else {
                    debug!("image upload with inconsistent size: {size:?}");
                }
            }
            (Function::ImageRender, HookOutput::Message(message)) => {
                let name = message
                    .header("n")
                    .map(|n| String::from_utf8_lossy(n).into_owned())
                    .unwrap_or_default();
                let extent = Size::new(
                    header_number(&message, "c", 0),
                    header_number(&message, "r", 0),
                );
                let offset = Coordinate {
                    row: header_number(&message, "y", 0),
                    col: header_number(&message, "x", 0),
                };
                let size = Size::new(
                    header_number(&message, "w", 0),
                    header_number(&message, "h", 0),
                );
                screen.render_image(
                    &name,
                    extent,
                    offset,
                    size,
                    image_alignment(&message),
                    image_resize(&message),
                    message.header("l").is_some(),
                    message.header("s").is_some(),
                );
            }
            (Function::ImageRelease, HookOutput::Message(message)) => {
                if let Some(name) = message.header("n") {
                    let name = String::from_utf8_lossy(name).into_owned();
                    screen.release_image(&name);
                }
            }
            (Function::ImageOneshot, HookOutput::Message(mut message)) => {
                let format = image_format(&message);
                let size = Size::new(
                    header_number(&message, "w", 0),
                    header_number(&message, "h", 0),
                );
                let extent = Size::new(
                    header_number(&message, "c", 0),
                    header_number(&message, "r", 0),
                );
                let alignment = image_alignment(&message);
                let resize = image_resize(&message);
                let auto_scroll = message.header("l").is_some();
                screen.render_inline_image(
                    format,
                    size,
                    message.take_body(),
                    extent,
                    alignment,
                    resize,
                    auto_scroll,
                );
            }
            (function, output) => {
                debug!("dropping hook payload {output:?} for {function:?}");
            }
        }
    }
}

/// Read a decimal header value; absent or malformed values read as `default`
fn header_number(message: &Message, key: &str, default: u32) -> u32 {
    match message.header(key) {
        Some(bytes) => {
            let mut value: u32 = 0;
            for byte in bytes {
                if !byte.is_ascii_digit() {
                    return default;
                }
                value = value
                    .saturating_mul(10)
                    .saturating_add(u32::from(byte - b'0'));
            }
            if bytes.is_empty() {
                default
            } else {
                value
            }
        }
        None => default,
    }
}

fn image_format(message: &Message) -> ImageFormat {
    match message.header("f") {
        Some(b"1") => ImageFormat::Rgb,
        Some(b"2") => ImageFormat::Rgba,
        Some(b"3") => ImageFormat::Png,
        Some(other) => {
            debug!("unknown image format {other:?}, assuming RGB");
            ImageFormat::Rgb
        }
        None => ImageFormat::Rgb,
    }
}

fn image_alignment(message: &Message) -> ImageAlignment {
    match message.header("a") {
        Some(b"1") => ImageAlignment::TopStart,
        Some(b"2") => ImageAlignment::TopCenter,
        Some(b"3") => ImageAlignment::TopEnd,
        Some(b"4") => ImageAlignment::MiddleStart,
        Some(b"5") | None => ImageAlignment::MiddleCenter,
        Some(b"6") => ImageAlignment::MiddleEnd,
        Some(b"7") => ImageAlignment::BottomStart,
        Some(b"8") => ImageAlignment::BottomCenter,
        Some(b"9") => ImageAlignment::BottomEnd,
        Some(other) => {
            debug!("unknown image alignment {other:?}");
            ImageAlignment::MiddleCenter
        }
    }
}

fn image_resize(message: &Message) -> ImageResize {
    match message.header("z") {
        Some(b"0") | None => ImageResize::NoResize,
        Some(b"1") => ImageResize::ResizeToFit,
        Some(b"2") => ImageResize::ResizeToFill,
        Some(b"3") => ImageResize::StretchToFill,
        Some(other) => {
            debug!("unknown image resize policy {other:?}");
            ImageResize::NoResize
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    use super::*;
    use crate::screen::recording::RecordingScreen;

    fn csi(s: &mut Sequencer, screen: &mut dyn Screen, body: &str, final_char: char) {
        s.clear();
        for byte in body.bytes() {
            match byte {
                b'<'..=b'?' => s.collect_leader(byte),
                b'0'..=b'9' | b';' | b':' => s.param(byte),
                _ => s.collect(byte as char),
            }
        }
        s.dispatch_csi(screen, final_char);
    }

    fn osc(s: &mut Sequencer, screen: &mut dyn Screen, payload: &str) {
        s.clear();
        s.start_osc();
        for ch in payload.chars() {
            s.put_osc(ch);
        }
        s.dispatch_osc(screen);
    }

    fn dcs(s: &mut Sequencer, screen: &mut dyn Screen, body: &str, final_char: char, payload: &str) {
        s.clear();
        for byte in body.bytes() {
            match byte {
                b'0'..=b'9' | b';' | b':' => s.param(byte),
                _ => s.collect(byte as char),
            }
        }
        s.hook(final_char);
        for ch in payload.chars() {
            s.put(ch);
        }
        s.unhook(screen);
    }

    #[test]
    fn test_print_writes_immediately() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        s.print(&mut screen, 'A');
        assert_eq!(screen.events, ["write_text(A)"]);
        assert_eq!(s.instruction_counter(), 1);
    }

    #[test]
    fn test_execute_control_codes() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        s.execute(&mut screen, 0x07);
        s.execute(&mut screen, 0x08);
        s.execute(&mut screen, 0x0A);
        s.execute(&mut screen, 0x0D);
        assert_eq!(
            screen.events,
            ["bell", "backspace", "linefeed", "move_cursor_to_begin_of_line"]
        );
    }

    #[test]
    fn test_csi_dispatch_applies_and_clears() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        csi(&mut s, &mut screen, "3;5", 'H');
        assert_eq!(screen.events, ["move_cursor_to(3,5)"]);
        assert_eq!(s.sequence(), &Sequence::new());
    }

    #[test]
    fn test_unknown_sequence_is_dropped() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        csi(&mut s, &mut screen, "", 'y');
        assert!(screen.events.is_empty());
        assert_eq!(s.sequence(), &Sequence::new());
    }

    #[test]
    fn test_esc_dispatch() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        s.clear();
        s.dispatch_esc(&mut screen, '7');
        s.clear();
        s.collect('#');
        s.dispatch_esc(&mut screen, '8');
        assert_eq!(screen.events, ["save_cursor", "screen_alignment_pattern"]);
    }

    #[test]
    fn test_osc_title() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        osc(&mut s, &mut screen, "2;hello");
        assert_eq!(screen.events, ["set_window_title(hello)"]);
    }

    #[test]
    fn test_osc_payload_truncated() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        let long = "2;".to_string() + &"x".repeat(2 * MAX_OSC_LENGTH);
        osc(&mut s, &mut screen, &long);
        let title = "x".repeat(MAX_OSC_LENGTH - 3);
        assert_eq!(screen.events, [format!("set_window_title({title})")]);
    }

    #[test]
    fn test_osc_without_code_is_dropped() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        osc(&mut s, &mut screen, "Lsome-icon-name");
        assert!(screen.events.is_empty());
        assert_eq!(s.sequence(), &Sequence::new());
    }

    #[test]
    fn test_batching_defers_until_reset() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();

        csi(&mut s, &mut screen, "?2026", 'h');
        assert!(s.is_batching());
        assert_eq!(screen.events, ["set_mode(BatchedRendering,true)"]);

        csi(&mut s, &mut screen, "", 'H');
        csi(&mut s, &mut screen, "1;1", 'H');
        s.print(&mut screen, 'X');
        // Nothing beyond the mode switch reached the screen yet.
        assert_eq!(screen.events.len(), 1);

        csi(&mut s, &mut screen, "?2026", 'l');
        assert!(!s.is_batching());
        assert_eq!(
            screen.events,
            [
                "set_mode(BatchedRendering,true)",
                "move_cursor_to(1,1)",
                "move_cursor_to(1,1)",
                "write_text(X)",
                "set_mode(BatchedRendering,false)",
            ]
        );
    }

    #[test]
    fn test_batching_equivalence_with_empty_batch() {
        // {DECSM 2026; A; B; DECRM 2026} produces the same screen effects as
        // {DECSM 2026; DECRM 2026; A; B} for batchable A and B.
        let drive_batched = |batch: bool| {
            let mut s = Sequencer::new();
            let mut screen = RecordingScreen::new();
            csi(&mut s, &mut screen, "?2026", 'h');
            if !batch {
                csi(&mut s, &mut screen, "?2026", 'l');
            }
            csi(&mut s, &mut screen, "2", 'J');
            csi(&mut s, &mut screen, "4;2", 'H');
            if batch {
                csi(&mut s, &mut screen, "?2026", 'l');
            }
            screen.events
        };

        let batched = drive_batched(true);
        let unbatched = drive_batched(false);
        let strip = |events: Vec<String>| {
            events
                .into_iter()
                .filter(|e| !e.starts_with("set_mode(BatchedRendering"))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(batched), strip(unbatched));
    }

    #[test]
    fn test_queries_bypass_batching() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        csi(&mut s, &mut screen, "?2026", 'h');
        csi(&mut s, &mut screen, "6", 'n');
        assert_eq!(
            screen.events,
            ["set_mode(BatchedRendering,true)", "report_cursor_position"]
        );
    }

    #[test]
    fn test_c0_batched_as_synthetic_sequence() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        csi(&mut s, &mut screen, "?2026", 'h');
        s.execute(&mut screen, 0x0D);
        // BEL is not batchable and rings through immediately.
        s.execute(&mut screen, 0x07);
        assert_eq!(
            screen.events,
            ["set_mode(BatchedRendering,true)", "bell"]
        );
        csi(&mut s, &mut screen, "?2026", 'l');
        assert_eq!(
            screen.events,
            [
                "set_mode(BatchedRendering,true)",
                "bell",
                "move_cursor_to_begin_of_line",
                "set_mode(BatchedRendering,false)",
            ]
        );
    }

    #[test]
    fn test_batch_cap_flushes_early() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        s.set_max_batch_size(4);
        csi(&mut s, &mut screen, "?2026", 'h');
        for _ in 0..6 {
            s.print(&mut screen, 'x');
        }
        // The first four were flushed to make room; two are still queued.
        assert_eq!(
            screen.events.iter().filter(|e| *e == "write_text(x)").count(),
            4
        );
        assert!(s.is_batching());
        csi(&mut s, &mut screen, "?2026", 'l');
        assert_eq!(
            screen.events.iter().filter(|e| *e == "write_text(x)").count(),
            6
        );
    }

    #[test]
    fn test_decrqss_hook() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        dcs(&mut s, &mut screen, "$", 'q', "m");
        assert_eq!(screen.events, ["request_status_string(Sgr)"]);
        assert!(!s.is_hooked());
    }

    #[test]
    fn test_put_without_hook_is_ignored() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        s.put('x');
        s.unhook(&mut screen);
        assert!(screen.events.is_empty());
        assert!(!s.is_hooked());
    }

    #[test]
    fn test_image_upload_hook() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        let payload = format!("n=logo,f=3;!{}", BASE64.encode("abc"));
        dcs(&mut s, &mut screen, "", 'u', &payload);
        assert_eq!(screen.events, ["upload_image(logo,Png,0x0,abc)"]);
        assert!(!s.is_hooked());
    }

    #[test]
    fn test_image_upload_requires_consistent_size() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        // RGB without dimensions is dropped.
        dcs(&mut s, &mut screen, "", 'u', "n=logo,f=1;xyz");
        assert!(screen.events.is_empty());
    }

    #[test]
    fn test_image_render_hook() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        dcs(&mut s, &mut screen, "", 'r', "n=logo,r=10,c=20,x=1,y=2,w=3,h=4,a=1,z=2,l=,s=");
        assert_eq!(
            screen.events,
            ["render_image(logo,20x10,2,1,3x4,TopStart,ResizeToFill,true,true)"]
        );
    }

    #[test]
    fn test_image_release_hook() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        dcs(&mut s, &mut screen, "", 'd', "n=logo");
        assert_eq!(screen.events, ["release_image(logo)"]);
    }

    #[test]
    fn test_sixel_hook_applies_image() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        dcs(&mut s, &mut screen, "", 'q', "#1;2;100;0;0~~");
        assert_eq!(screen.events, ["sixel_image(2x6)"]);
        assert!(!s.is_hooked());
    }

    #[test]
    fn test_sixel_image_batched() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        csi(&mut s, &mut screen, "?2026", 'h');
        dcs(&mut s, &mut screen, "", 'q', "#1;2;100;0;0~");
        assert_eq!(screen.events, ["set_mode(BatchedRendering,true)"]);
        csi(&mut s, &mut screen, "?2026", 'l');
        assert_eq!(
            screen.events,
            [
                "set_mode(BatchedRendering,true)",
                "sixel_image(1x6)",
                "set_mode(BatchedRendering,false)",
            ]
        );
    }

    #[test]
    fn test_shared_palette_survives_across_images() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        // First image defines register 5; the second paints with it.
        dcs(&mut s, &mut screen, "", 'q', "#5;2;0;100;0@");
        dcs(&mut s, &mut screen, "", 'q', "#5@");
        assert_eq!(s.image_palette.borrow().color(5), crate::color::Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_private_palette_does_not_leak() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        s.set_use_private_color_registers(true);
        dcs(&mut s, &mut screen, "", 'q', "#5;2;0;100;0@");
        assert_eq!(
            s.image_palette.borrow().color(5),
            crate::color::Rgb::new(51, 204, 204)
        );
    }

    #[test]
    fn test_instruction_counter() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        s.print(&mut screen, 'a');
        s.execute(&mut screen, 0x0A);
        csi(&mut s, &mut screen, "", 'H');
        assert_eq!(s.instruction_counter(), 3);
        s.reset_instruction_counter();
        assert_eq!(s.instruction_counter(), 0);
    }

    #[test]
    fn test_clipboard_via_osc() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        osc(&mut s, &mut screen, &format!("52;c;{}", BASE64.encode("snippet")));
        assert_eq!(screen.events, ["copy_to_clipboard(snippet)"]);
    }

    #[test]
    fn test_hyperlink_via_osc() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        osc(&mut s, &mut screen, "8;id=7;https://example.com");
        osc(&mut s, &mut screen, "8;;");
        assert_eq!(
            screen.events,
            ["hyperlink(7,https://example.com)", "hyperlink(,)"]
        );
    }

    #[test]
    fn test_notify_via_osc() {
        let mut s = Sequencer::new();
        let mut screen = RecordingScreen::new();
        osc(&mut s, &mut screen, "777;notify;Title;Body");
        assert_eq!(screen.events, ["notify(Title,Body)"]);
    }
}
