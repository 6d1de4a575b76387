//! Dashi VT - a terminal control-sequence engine
//!
//! This crate is the semantic core of a terminal emulator: it consumes the
//! event stream of an external VT parser (print characters, C0 controls,
//! ESC/CSI/DCS/OSC boundaries and payloads) and dispatches each completed
//! sequence to an abstract screen.
//!
//! # Architecture
//!
//! - `sequence`: the record one control sequence is assembled into
//! - `functions`: the registry resolving sequences to function identities
//! - `performer`: per-function application onto the [`Screen`] trait
//! - `sequencer`: the producer-facing controller, including synchronized
//!   output (DEC private mode 2026) and DCS sub-parser hooks
//! - `message`: the `key=value,...;body` payload parser used by the DCS
//!   image protocol
//! - `sixel`: bounded sixel image assembly
//!
//! The byte-stream parser and the concrete screen implementation live
//! outside this crate; the screen is borrowed per call.
//!
//! # Example
//!
//! ```
//! use dashi_vt::{Screen, Sequencer};
//!
//! struct NullScreen;
//! impl dashi_vt::EventListener for NullScreen {}
//! impl Screen for NullScreen {
//!     fn event_listener(&mut self) -> &mut dyn dashi_vt::EventListener {
//!         self
//!     }
//! }
//!
//! let mut screen = NullScreen;
//! let mut sequencer = Sequencer::new();
//!
//! // The producer saw "ESC [ 2 J": erase the whole display.
//! sequencer.clear();
//! sequencer.param(b'2');
//! sequencer.dispatch_csi(&mut screen, 'J');
//! ```

pub mod color;
pub mod extension;
pub mod functions;
pub mod message;
pub mod modes;
pub mod performer;
pub mod screen;
pub mod sequence;
pub mod sequencer;
pub mod sixel;

pub use color::{Color, NamedColor, Palette, Rgb, Rgba};
pub use extension::{HookOutput, ParserExtension, StringCollector};
pub use functions::Function;
pub use message::{Message, MessageParser};
pub use modes::Mode;
pub use performer::{ApplyResult, Performer};
pub use screen::{EventListener, Screen, Size};
pub use sequence::{FunctionCategory, Sequence};
pub use sequencer::{BatchItem, Sequencer};
pub use sixel::ImageData;
