//! Screen interface
//!
//! The engine drives an abstract screen through the [`Screen`] trait; the
//! concrete grid/cell implementation lives outside this crate. Every method
//! has a no-op default so screens only implement what they support, the same
//! shape the `vte` handler trait uses.
//!
//! Host-facing effects (bell, clipboard, window resize) go through the
//! screen's [`EventListener`]; the engine holds no reference back to the
//! embedder.

use serde::{Deserialize, Serialize};

use crate::color::{Color, Rgb};
use crate::modes::Mode;
use crate::sixel::ImageData;

/// A width/height pair, in pixels or cells depending on context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }
}

/// A grid position, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: u32,
    pub col: u32,
}

/// Cursor blink behavior (DECSCUSR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorDisplay {
    Steady,
    Blink,
}

/// Cursor shape (DECSCUSR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorShape {
    Block,
    Underscore,
    Bar,
}

/// Charset slot selected by SCS / single shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharsetTable {
    G0,
    G1,
    G2,
    G3,
}

/// Character set designated into a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharsetId {
    /// DEC Special Character and Line Drawing
    Special,
    Usascii,
}

/// Colors addressable through OSC dynamic-color commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicColorName {
    DefaultForeground,
    DefaultBackground,
    TextCursor,
    MouseForeground,
    MouseBackground,
    HighlightForeground,
    HighlightBackground,
}

/// Graphics rendition changes produced by SGR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicsRendition {
    /// Reset style and colors
    Reset,
    Bold,
    Faint,
    Italic,
    Underline,
    Blinking,
    Inverse,
    Hidden,
    CrossedOut,
    DoublyUnderlined,
    CurlyUnderlined,
    DottedUnderline,
    DashedUnderline,
    /// Neither bold nor faint
    Normal,
    NoItalic,
    NoUnderline,
    NoBlinking,
    NoInverse,
    NoHidden,
    NoCrossedOut,
    Framed,
    Overline,
    NoFramed,
    NoOverline,
}

/// TBC - which tab stops to clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalTabClear {
    AllTabs,
    UnderCursor,
}

/// Area whose pixel size is being requested (XTWINOPS 14)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelSizeArea {
    CellArea,
    TextArea,
    WindowArea,
}

/// Setting named by a DECRQSS request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusString {
    Sgr,
    DecScl,
    DecScusr,
    DecSca,
    DecStbm,
    DecSlrm,
    DecSlpp,
    DecScpp,
    DecSnls,
}

/// XTSMGRAPHICS item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmGraphicsItem {
    ColorRegisters,
    SixelGeometry,
    RegisGeometry,
}

/// XTSMGRAPHICS action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmGraphicsAction {
    Read,
    ResetToDefault,
    SetToValue,
    ReadLimit,
}

/// XTSMGRAPHICS value operand; scalar for color registers, a size for the
/// geometry items, absent for reads and resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmGraphicsValue {
    None,
    Number(u32),
    Size(Size),
}

/// Pixel format of an uploaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Rgb,
    Rgba,
    Png,
}

/// Placement alignment of a rendered image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageAlignment {
    TopStart,
    TopCenter,
    TopEnd,
    MiddleStart,
    MiddleCenter,
    MiddleEnd,
    BottomStart,
    BottomCenter,
    BottomEnd,
}

/// Resize policy of a rendered image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageResize {
    NoResize,
    ResizeToFit,
    ResizeToFill,
    StretchToFill,
}

/// Host-facing effects raised by the screen on the engine's behalf
pub trait EventListener {
    fn bell(&mut self) {}

    fn copy_to_clipboard(&mut self, _data: &[u8]) {}

    /// Request a window resize; `(0, 0)` means "full display size"
    fn resize_window(&mut self, _width: u32, _height: u32, _in_pixels: bool) {}
}

/// The abstract screen the engine dispatches into.
///
/// All methods default to no-ops; reports (`device_status_report`,
/// `request_*`) are expected to answer through whatever reply channel the
/// screen owns.
#[allow(unused_variables)]
pub trait Screen {
    // -- text and C0 --------------------------------------------------------

    fn write_text(&mut self, ch: char) {}

    fn backspace(&mut self) {}

    fn move_cursor_to_next_tab(&mut self) {}

    fn linefeed(&mut self) {}

    fn index(&mut self) {}

    fn reverse_index(&mut self) {}

    fn back_index(&mut self) {}

    fn forward_index(&mut self) {}

    fn move_cursor_to_begin_of_line(&mut self) {}

    // -- cursor --------------------------------------------------------------

    fn save_cursor(&mut self) {}

    fn restore_cursor(&mut self) {}

    fn move_cursor_up(&mut self, n: u32) {}

    fn move_cursor_down(&mut self, n: u32) {}

    fn move_cursor_forward(&mut self, n: u32) {}

    fn move_cursor_backward(&mut self, n: u32) {}

    /// 1-based row and column
    fn move_cursor_to(&mut self, row: u32, col: u32) {}

    fn move_cursor_to_line(&mut self, row: u32) {}

    fn move_cursor_to_column(&mut self, col: u32) {}

    fn move_cursor_to_next_line(&mut self, n: u32) {}

    fn move_cursor_to_prev_line(&mut self, n: u32) {}

    fn cursor_forward_tab(&mut self, n: u32) {}

    fn cursor_backward_tab(&mut self, n: u32) {}

    fn set_cursor_style(&mut self, display: CursorDisplay, shape: CursorShape) {}

    // -- editing -------------------------------------------------------------

    fn insert_characters(&mut self, n: u32) {}

    fn insert_lines(&mut self, n: u32) {}

    fn insert_columns(&mut self, n: u32) {}

    fn delete_characters(&mut self, n: u32) {}

    fn delete_lines(&mut self, n: u32) {}

    fn delete_columns(&mut self, n: u32) {}

    fn erase_characters(&mut self, n: u32) {}

    fn scroll_up(&mut self, n: u32) {}

    fn scroll_down(&mut self, n: u32) {}

    // -- erase scopes --------------------------------------------------------

    fn clear_to_end_of_screen(&mut self) {}

    fn clear_to_begin_of_screen(&mut self) {}

    fn clear_screen(&mut self) {}

    fn clear_scrollback_buffer(&mut self) {}

    fn clear_to_end_of_line(&mut self) {}

    fn clear_to_begin_of_line(&mut self) {}

    fn clear_line(&mut self) {}

    // -- modes and margins ---------------------------------------------------

    fn set_mode(&mut self, mode: Mode, enabled: bool) {}

    fn save_modes(&mut self, modes: &[Mode]) {}

    fn restore_modes(&mut self, modes: &[Mode]) {}

    /// `None` margins select the screen edge
    fn set_top_bottom_margin(&mut self, top: Option<u32>, bottom: Option<u32>) {}

    fn set_left_right_margin(&mut self, left: Option<u32>, right: Option<u32>) {}

    fn resize_columns(&mut self, columns: u32, clear: bool) {}

    // -- tabs ----------------------------------------------------------------

    fn horizontal_tab_set(&mut self) {}

    fn horizontal_tab_clear(&mut self, which: HorizontalTabClear) {}

    fn request_tab_stops(&mut self) {}

    // -- rendition and colors ------------------------------------------------

    fn set_graphics_rendition(&mut self, rendition: GraphicsRendition) {}

    fn set_foreground_color(&mut self, color: Color) {}

    fn set_background_color(&mut self, color: Color) {}

    fn set_underline_color(&mut self, color: Color) {}

    fn set_dynamic_color(&mut self, name: DynamicColorName, color: Rgb) {}

    fn request_dynamic_color(&mut self, name: DynamicColorName) {}

    fn reset_dynamic_color(&mut self, name: DynamicColorName) {}

    // -- charsets ------------------------------------------------------------

    fn designate_charset(&mut self, table: CharsetTable, charset: CharsetId) {}

    fn single_shift_select(&mut self, table: CharsetTable) {}

    fn application_keypad_mode(&mut self, enable: bool) {}

    // -- reports -------------------------------------------------------------

    fn device_status_report(&mut self) {}

    fn report_cursor_position(&mut self) {}

    fn report_extended_cursor_position(&mut self) {}

    fn send_device_attributes(&mut self) {}

    fn send_terminal_id(&mut self) {}

    fn request_pixel_size(&mut self, area: PixelSizeArea) {}

    fn request_status_string(&mut self, value: StatusString) {}

    // -- window --------------------------------------------------------------

    fn set_window_title(&mut self, title: &str) {}

    fn save_window_title(&mut self) {}

    fn restore_window_title(&mut self) {}

    // -- OSC extensions ------------------------------------------------------

    /// Empty URI ends the active hyperlink
    fn hyperlink(&mut self, id: &str, uri: &str) {}

    fn notify(&mut self, title: &str, body: &str) {}

    // -- graphics ------------------------------------------------------------

    fn sm_graphics(&mut self, item: SmGraphicsItem, action: SmGraphicsAction, value: SmGraphicsValue) {}

    fn sixel_image(&mut self, image: ImageData) {}

    fn upload_image(&mut self, name: &str, format: ImageFormat, size: Size, data: Vec<u8>) {}

    #[allow(clippy::too_many_arguments)]
    fn render_image(
        &mut self,
        name: &str,
        extent: Size,
        offset: Coordinate,
        size: Size,
        alignment: ImageAlignment,
        resize: ImageResize,
        auto_scroll: bool,
        request_status: bool,
    ) {
    }

    #[allow(clippy::too_many_arguments)]
    fn render_inline_image(
        &mut self,
        format: ImageFormat,
        size: Size,
        data: Vec<u8>,
        extent: Size,
        alignment: ImageAlignment,
        resize: ImageResize,
        auto_scroll: bool,
    ) {
    }

    fn release_image(&mut self, name: &str) {}

    // -- resets and diagnostics ----------------------------------------------

    fn screen_alignment_pattern(&mut self) {}

    fn set_mark(&mut self) {}

    fn reset_soft(&mut self) {}

    fn reset_hard(&mut self) {}

    fn dump_state(&mut self) {}

    /// Invariant-checking hook, called after every handled sequence
    fn verify_state(&mut self) {}

    // -- host events ---------------------------------------------------------

    fn event_listener(&mut self) -> &mut dyn EventListener;
}
