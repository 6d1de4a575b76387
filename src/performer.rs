//! Function performer
//!
//! Translates a resolved control function plus its assembled [`Sequence`]
//! into calls on the [`Screen`]. Unacceptable parameters come back as
//! `Invalid`, recognized-but-unimplemented functions as `Unsupported`; the
//! caller logs both and the stream continues either way.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::{Color, NamedColor, Rgb};
use crate::functions::Function;
use crate::modes;
use crate::modes::Mode;
use crate::screen::{
    CharsetId, CharsetTable, CursorDisplay, CursorShape, DynamicColorName, GraphicsRendition,
    HorizontalTabClear, PixelSizeArea, Screen, Size, SmGraphicsAction, SmGraphicsItem,
    SmGraphicsValue, StatusString,
};
use crate::sequence::Sequence;

/// Outcome of applying one control function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    Ok,
    Invalid,
    Unsupported,
}

/// Applies control functions to a screen
pub struct Performer<'a> {
    screen: &'a mut dyn Screen,
}

impl<'a> Performer<'a> {
    pub fn new(screen: &'a mut dyn Screen) -> Self {
        Performer { screen }
    }

    /// Apply one resolved function
    pub fn apply(&mut self, function: Function, seq: &Sequence) -> ApplyResult {
        use Function::*;
        match function {
            // C0
            Bel => self.screen.event_listener().bell(),
            Bs => self.screen.backspace(),
            Tab => self.screen.move_cursor_to_next_tab(),
            Lf => self.screen.linefeed(),
            // xterm treats both VT and FF as an index.
            Vt | Ff => self.screen.index(),
            Cr => self.screen.move_cursor_to_begin_of_line(),

            // ESC
            ScsG0Special => self.screen.designate_charset(CharsetTable::G0, CharsetId::Special),
            ScsG0Usascii => self.screen.designate_charset(CharsetTable::G0, CharsetId::Usascii),
            ScsG1Special => self.screen.designate_charset(CharsetTable::G1, CharsetId::Special),
            ScsG1Usascii => self.screen.designate_charset(CharsetTable::G1, CharsetId::Usascii),
            DecAln => self.screen.screen_alignment_pattern(),
            DecBi => self.screen.back_index(),
            DecFi => self.screen.forward_index(),
            DecKpam => self.screen.application_keypad_mode(true),
            DecKpnm => self.screen.application_keypad_mode(false),
            DecRs => self.screen.restore_cursor(),
            DecSc => self.screen.save_cursor(),
            Hts => self.screen.horizontal_tab_set(),
            Ind => self.screen.index(),
            Nel => self.screen.move_cursor_to_next_line(1),
            Ri => self.screen.reverse_index(),
            Ris => self.screen.reset_hard(),
            Ss2 => self.screen.single_shift_select(CharsetTable::G2),
            Ss3 => self.screen.single_shift_select(CharsetTable::G3),

            // CSI
            AnsiSysSc => self.screen.restore_cursor(),
            Cbt => self.screen.cursor_backward_tab(seq.param_or(0, 1)),
            Cha => self.screen.move_cursor_to_column(seq.param_or(0, 1)),
            Cht => self.screen.cursor_forward_tab(seq.param_or(0, 1)),
            Cnl => self.screen.move_cursor_to_next_line(seq.param_or(0, 1)),
            Cpl => self.screen.move_cursor_to_prev_line(seq.param_or(0, 1)),
            Cpr => return self.device_status(seq),
            Cub => self.screen.move_cursor_backward(seq.param_or(0, 1)),
            Cud => self.screen.move_cursor_down(seq.param_or(0, 1)),
            Cuf => self.screen.move_cursor_forward(seq.param_or(0, 1)),
            Cup | Hvp => self
                .screen
                .move_cursor_to(seq.param_or(0, 1), seq.param_or(1, 1)),
            Cuu => self.screen.move_cursor_up(seq.param_or(0, 1)),
            Da1 => self.screen.send_device_attributes(),
            Da2 => self.screen.send_terminal_id(),
            Da3 => return ApplyResult::Unsupported,
            Dch => self.screen.delete_characters(seq.param_or(0, 1)),
            DecDc => self.screen.delete_columns(seq.param_or(0, 1)),
            DecIc => self.screen.insert_columns(seq.param_or(0, 1)),
            DecModeRestore => {
                let restored = dec_modes(seq);
                self.screen.restore_modes(&restored);
            }
            DecModeSave => {
                let saved = dec_modes(seq);
                self.screen.save_modes(&saved);
            }
            DecRm => return self.set_dec_modes(seq, false),
            DecRqm => return request_dec_mode(seq.param(0)),
            DecRqmAnsi => return request_ansi_mode(seq.param(0)),
            DecRqpsr => return self.presentation_state_report(seq),
            DecScl => return ApplyResult::Unsupported,
            DecScpp => {
                let columns = seq.param_or(0, 80);
                if columns != 80 && columns != 132 {
                    return ApplyResult::Invalid;
                }
                self.screen.resize_columns(columns, false);
            }
            DecScusr => return self.cursor_style(seq),
            DecSlrm => self
                .screen
                .set_left_right_margin(seq.param_opt(0), seq.param_opt(1)),
            DecSm => return self.set_dec_modes(seq, true),
            DecStbm => self
                .screen
                .set_top_bottom_margin(seq.param_opt(0), seq.param_opt(1)),
            DecStr => self.screen.reset_soft(),
            DecXcpr => {
                if seq.param(0) != 6 {
                    return ApplyResult::Invalid;
                }
                self.screen.report_extended_cursor_position();
            }
            Dl => self.screen.delete_lines(seq.param_or(0, 1)),
            Ech => self.screen.erase_characters(seq.param_or(0, 1)),
            Ed => return self.erase_in_display(seq),
            El => return self.erase_in_line(seq),
            Hpa => self.screen.move_cursor_to_column(seq.param_or(0, 1)),
            Hpr => self.screen.move_cursor_forward(seq.param_or(0, 1)),
            Ich => self.screen.insert_characters(seq.param_or(0, 1)),
            Il => self.screen.insert_lines(seq.param_or(0, 1)),
            Rm => return self.set_ansi_modes(seq, false),
            ScoSc => self.screen.save_cursor(),
            Sd => self.screen.scroll_down(seq.param_or(0, 1)),
            SetMark => self.screen.set_mark(),
            Sgr => return self.select_graphic_rendition(seq),
            Sm => return self.set_ansi_modes(seq, true),
            Su => self.screen.scroll_up(seq.param_or(0, 1)),
            Tbc => return self.tab_clear(seq),
            Vpa => self.screen.move_cursor_to_line(seq.param_or(0, 1)),
            WinManip => return self.window_manipulation(seq),
            XtSmGraphics => return self.sm_graphics(seq),

            // DCS (the data-string path; streamed payloads go through hooks)
            DecRqss => return self.request_status_string(seq.data_string()),

            // OSC
            SetTitle | SetWinTitle => self.screen.set_window_title(seq.intermediates()),
            SetIcon | SetXProp | ColorSpecial => return ApplyResult::Unsupported,
            Hyperlink => return self.hyperlink(seq),
            ColorFg => return self.dynamic_color(seq, DynamicColorName::DefaultForeground),
            ColorBg => return self.dynamic_color(seq, DynamicColorName::DefaultBackground),
            ColorCursor => return self.dynamic_color(seq, DynamicColorName::TextCursor),
            ColorMouseFg => return self.dynamic_color(seq, DynamicColorName::MouseForeground),
            ColorMouseBg => return self.dynamic_color(seq, DynamicColorName::MouseBackground),
            ColorHighlightBg => {
                return self.dynamic_color(seq, DynamicColorName::HighlightBackground)
            }
            ColorHighlightFg => {
                return self.dynamic_color(seq, DynamicColorName::HighlightForeground)
            }
            Clipboard => return self.clipboard(seq),
            ResetColorFg => self
                .screen
                .reset_dynamic_color(DynamicColorName::DefaultForeground),
            ResetColorBg => self
                .screen
                .reset_dynamic_color(DynamicColorName::DefaultBackground),
            ResetColorCursor => self.screen.reset_dynamic_color(DynamicColorName::TextCursor),
            ResetColorMouseFg => self
                .screen
                .reset_dynamic_color(DynamicColorName::MouseForeground),
            ResetColorMouseBg => self
                .screen
                .reset_dynamic_color(DynamicColorName::MouseBackground),
            ResetColorHighlightBg => self
                .screen
                .reset_dynamic_color(DynamicColorName::HighlightBackground),
            ResetColorHighlightFg => self
                .screen
                .reset_dynamic_color(DynamicColorName::HighlightForeground),
            Notify => return self.notify(seq),
            DumpState => self.screen.dump_state(),

            _ => return ApplyResult::Unsupported,
        }
        ApplyResult::Ok
    }

    // -- modes ----------------------------------------------------------------

    fn set_dec_modes(&mut self, seq: &Sequence, enable: bool) -> ApplyResult {
        let mut result = ApplyResult::Ok;
        for i in 0..seq.parameter_count() {
            match modes::dec_mode(seq.param(i)) {
                Some(mode) => self.screen.set_mode(mode, enable),
                None => {
                    debug!("unknown DEC mode {}", seq.param(i));
                    result = ApplyResult::Invalid;
                }
            }
        }
        result
    }

    fn set_ansi_modes(&mut self, seq: &Sequence, enable: bool) -> ApplyResult {
        let mut result = ApplyResult::Ok;
        for i in 0..seq.parameter_count() {
            match modes::ansi_mode(seq.param(i)) {
                Some(Mode::Insert) => self.screen.set_mode(Mode::Insert, enable),
                Some(_) | None => {
                    debug!("unsupported ANSI mode {}", seq.param(i));
                    result = ApplyResult::Unsupported;
                }
            }
        }
        result
    }

    // -- reports --------------------------------------------------------------

    fn device_status(&mut self, seq: &Sequence) -> ApplyResult {
        match seq.param(0) {
            5 => self.screen.device_status_report(),
            6 => self.screen.report_cursor_position(),
            _ => return ApplyResult::Unsupported,
        }
        ApplyResult::Ok
    }

    fn presentation_state_report(&mut self, seq: &Sequence) -> ApplyResult {
        if seq.parameter_count() != 1 {
            return ApplyResult::Invalid;
        }
        match seq.param(0) {
            2 => {
                self.screen.request_tab_stops();
                ApplyResult::Ok
            }
            // 1 would be DECCIR, which this engine does not report.
            _ => ApplyResult::Invalid,
        }
    }

    fn request_status_string(&mut self, data: &str) -> ApplyResult {
        match status_string_from(data) {
            Some(value) => {
                self.screen.request_status_string(value);
                ApplyResult::Ok
            }
            None => ApplyResult::Invalid,
        }
    }

    // -- cursor style ---------------------------------------------------------

    fn cursor_style(&mut self, seq: &Sequence) -> ApplyResult {
        if seq.parameter_count() > 1 {
            return ApplyResult::Invalid;
        }
        let (display, shape) = match seq.param_or(0, 1) {
            0 | 1 => (CursorDisplay::Blink, CursorShape::Block),
            2 => (CursorDisplay::Steady, CursorShape::Block),
            3 => (CursorDisplay::Blink, CursorShape::Underscore),
            4 => (CursorDisplay::Steady, CursorShape::Underscore),
            5 => (CursorDisplay::Blink, CursorShape::Bar),
            6 => (CursorDisplay::Steady, CursorShape::Bar),
            _ => return ApplyResult::Invalid,
        };
        self.screen.set_cursor_style(display, shape);
        ApplyResult::Ok
    }

    // -- erase ----------------------------------------------------------------

    fn erase_in_display(&mut self, seq: &Sequence) -> ApplyResult {
        if seq.parameter_count() == 0 {
            self.screen.clear_to_end_of_screen();
            return ApplyResult::Ok;
        }
        for i in 0..seq.parameter_count() {
            match seq.param(i) {
                0 => self.screen.clear_to_end_of_screen(),
                1 => self.screen.clear_to_begin_of_screen(),
                2 => self.screen.clear_screen(),
                3 => self.screen.clear_scrollback_buffer(),
                other => debug!("ignoring ED scope {other}"),
            }
        }
        ApplyResult::Ok
    }

    fn erase_in_line(&mut self, seq: &Sequence) -> ApplyResult {
        match seq.param(0) {
            0 => self.screen.clear_to_end_of_line(),
            1 => self.screen.clear_to_begin_of_line(),
            2 => self.screen.clear_line(),
            _ => return ApplyResult::Invalid,
        }
        ApplyResult::Ok
    }

    fn tab_clear(&mut self, seq: &Sequence) -> ApplyResult {
        if seq.parameter_count() != 1 {
            self.screen.horizontal_tab_clear(HorizontalTabClear::AllTabs);
            return ApplyResult::Ok;
        }
        match seq.param(0) {
            0 => self
                .screen
                .horizontal_tab_clear(HorizontalTabClear::UnderCursor),
            3 => self.screen.horizontal_tab_clear(HorizontalTabClear::AllTabs),
            _ => return ApplyResult::Invalid,
        }
        ApplyResult::Ok
    }

    // -- window manipulation --------------------------------------------------

    fn window_manipulation(&mut self, seq: &Sequence) -> ApplyResult {
        match seq.parameter_count() {
            3 => match seq.param(0) {
                4 => self
                    .screen
                    .event_listener()
                    .resize_window(seq.param(2), seq.param(1), true),
                8 => self
                    .screen
                    .event_listener()
                    .resize_window(seq.param(2), seq.param(1), false),
                22 => self.screen.save_window_title(),
                23 => self.screen.restore_window_title(),
                _ => return ApplyResult::Unsupported,
            },
            1 => match seq.param(0) {
                // Without dimensions, 4/8 request the full display size.
                4 => self.screen.event_listener().resize_window(0, 0, true),
                8 => self.screen.event_listener().resize_window(0, 0, false),
                14 => self.screen.request_pixel_size(PixelSizeArea::TextArea),
                _ => return ApplyResult::Unsupported,
            },
            _ => return ApplyResult::Unsupported,
        }
        ApplyResult::Ok
    }

    fn sm_graphics(&mut self, seq: &Sequence) -> ApplyResult {
        let item = match seq.param(0) {
            1 => SmGraphicsItem::ColorRegisters,
            2 => SmGraphicsItem::SixelGeometry,
            3 => SmGraphicsItem::RegisGeometry,
            _ => return ApplyResult::Invalid,
        };
        let action = match seq.param(1) {
            1 => SmGraphicsAction::Read,
            2 => SmGraphicsAction::ResetToDefault,
            3 => SmGraphicsAction::SetToValue,
            4 => SmGraphicsAction::ReadLimit,
            _ => return ApplyResult::Invalid,
        };
        let value = match action {
            SmGraphicsAction::SetToValue => match item {
                SmGraphicsItem::ColorRegisters => SmGraphicsValue::Number(seq.param_or(2, 0)),
                _ => SmGraphicsValue::Size(Size::new(seq.param_or(2, 0), seq.param_or(3, 0))),
            },
            _ => SmGraphicsValue::None,
        };
        self.screen.sm_graphics(item, action, value);
        ApplyResult::Ok
    }

    // -- OSC payloads ---------------------------------------------------------

    fn hyperlink(&mut self, seq: &Sequence) -> ApplyResult {
        // hyperlink ::= params ';' URI, params ::= pair (':' pair)*
        let value = seq.intermediates();
        match value.split_once(';') {
            Some((params, uri)) => {
                let id = params
                    .split(':')
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(key, _)| *key == "id")
                    .map(|(_, v)| v)
                    .unwrap_or("");
                self.screen.hyperlink(id, uri);
            }
            None => self.screen.hyperlink("", ""),
        }
        ApplyResult::Ok
    }

    fn clipboard(&mut self, seq: &Sequence) -> ApplyResult {
        // Only writing the clipboard is supported, never reading it back.
        let parts: Vec<&str> = seq.intermediates().split(';').collect();
        if parts.len() != 2 || parts[0] != "c" {
            return ApplyResult::Invalid;
        }
        match BASE64.decode(parts[1]) {
            Ok(data) => {
                self.screen.event_listener().copy_to_clipboard(&data);
                ApplyResult::Ok
            }
            Err(err) => {
                debug!("invalid base64 in clipboard payload: {err}");
                ApplyResult::Invalid
            }
        }
    }

    fn notify(&mut self, seq: &Sequence) -> ApplyResult {
        let parts: Vec<&str> = seq.intermediates().splitn(3, ';').collect();
        match parts.as_slice() {
            ["notify", title, body] => {
                self.screen.notify(title, body);
                ApplyResult::Ok
            }
            _ => ApplyResult::Unsupported,
        }
    }

    fn dynamic_color(&mut self, seq: &Sequence, name: DynamicColorName) -> ApplyResult {
        let value = seq.intermediates();
        if value == "?" {
            self.screen.request_dynamic_color(name);
            return ApplyResult::Ok;
        }
        match parse_color(value) {
            Some(color) => {
                self.screen.set_dynamic_color(name, color);
                ApplyResult::Ok
            }
            None => ApplyResult::Invalid,
        }
    }

    // -- SGR ------------------------------------------------------------------

    fn select_graphic_rendition(&mut self, seq: &Sequence) -> ApplyResult {
        if seq.parameter_count() == 0 {
            self.screen.set_graphics_rendition(GraphicsRendition::Reset);
            return ApplyResult::Ok;
        }

        let mut i = 0;
        while i < seq.parameter_count() {
            match seq.param(i) {
                0 => self.screen.set_graphics_rendition(GraphicsRendition::Reset),
                1 => self.screen.set_graphics_rendition(GraphicsRendition::Bold),
                2 => self.screen.set_graphics_rendition(GraphicsRendition::Faint),
                3 => self.screen.set_graphics_rendition(GraphicsRendition::Italic),
                4 => self.underline_style(seq, i),
                5 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::Blinking),
                7 => self.screen.set_graphics_rendition(GraphicsRendition::Inverse),
                8 => self.screen.set_graphics_rendition(GraphicsRendition::Hidden),
                9 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::CrossedOut),
                21 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::DoublyUnderlined),
                22 => self.screen.set_graphics_rendition(GraphicsRendition::Normal),
                23 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::NoItalic),
                24 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::NoUnderline),
                25 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::NoBlinking),
                27 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::NoInverse),
                28 => self.screen.set_graphics_rendition(GraphicsRendition::NoHidden),
                29 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::NoCrossedOut),
                code @ 30..=37 => {
                    if let Some(named) = NamedColor::from_sgr_normal((code - 30) as u8) {
                        self.screen.set_foreground_color(Color::Named(named));
                    }
                }
                38 => {
                    if let Some(color) = embedded_color(seq, &mut i) {
                        self.screen.set_foreground_color(color);
                    }
                }
                39 => self.screen.set_foreground_color(Color::Default),
                code @ 40..=47 => {
                    if let Some(named) = NamedColor::from_sgr_normal((code - 40) as u8) {
                        self.screen.set_background_color(Color::Named(named));
                    }
                }
                48 => {
                    if let Some(color) = embedded_color(seq, &mut i) {
                        self.screen.set_background_color(color);
                    }
                }
                49 => self.screen.set_background_color(Color::Default),
                51 => self.screen.set_graphics_rendition(GraphicsRendition::Framed),
                53 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::Overline),
                54 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::NoFramed),
                55 => self
                    .screen
                    .set_graphics_rendition(GraphicsRendition::NoOverline),
                58 => {
                    if let Some(color) = embedded_color(seq, &mut i) {
                        self.screen.set_underline_color(color);
                    }
                }
                code @ 90..=97 => {
                    if let Some(named) = NamedColor::from_sgr_bright((code - 90) as u8) {
                        self.screen.set_foreground_color(Color::Named(named));
                    }
                }
                code @ 100..=107 => {
                    if let Some(named) = NamedColor::from_sgr_bright((code - 100) as u8) {
                        self.screen.set_background_color(Color::Named(named));
                    }
                }
                other => debug!("ignoring SGR code {other}"),
            }
            i += 1;
        }
        ApplyResult::Ok
    }

    /// SGR 4 with a sub-parameter selects the underline style (4:0 .. 4:5)
    fn underline_style(&mut self, seq: &Sequence, i: usize) {
        let rendition = if seq.sub_parameter_count(i) >= 1 {
            match seq.subparam(i, 0) {
                0 => GraphicsRendition::NoUnderline,
                2 => GraphicsRendition::DoublyUnderlined,
                3 => GraphicsRendition::CurlyUnderlined,
                4 => GraphicsRendition::DottedUnderline,
                5 => GraphicsRendition::DashedUnderline,
                _ => GraphicsRendition::Underline,
            }
        } else {
            GraphicsRendition::Underline
        };
        self.screen.set_graphics_rendition(rendition);
    }
}

/// Decode the color argument embedded after SGR 38/48/58.
///
/// Handles the sub-parameter forms `38:5:n`, `38:2:r:g:b` and
/// `38:2:cs:r:g:b` (color-space slot ignored) entirely within group `*i`,
/// and the legacy forms `38;5;n` / `38;2;r;g;b` which consume the following
/// groups, advancing `*i` past them. Out-of-range channels discard the color
/// but still consume its parameters.
fn embedded_color(seq: &Sequence, i: &mut usize) -> Option<Color> {
    let group = *i;

    if seq.sub_parameter_count(group) >= 1 {
        return match seq.subparam(group, 0) {
            5 => {
                let index = seq.subparam(group, 1);
                (index <= 255).then(|| Color::Indexed(index as u8))
            }
            2 => {
                let (r, g, b) = match seq.sub_parameter_count(group) {
                    4 => (
                        seq.subparam(group, 1),
                        seq.subparam(group, 2),
                        seq.subparam(group, 3),
                    ),
                    n if n >= 5 => (
                        seq.subparam(group, 2),
                        seq.subparam(group, 3),
                        seq.subparam(group, 4),
                    ),
                    _ => return None,
                };
                (r <= 255 && g <= 255 && b <= 255)
                    .then(|| Color::Rgb(Rgb::new(r as u8, g as u8, b as u8)))
            }
            other => {
                debug!("unsupported color mode {other}");
                None
            }
        };
    }

    if group + 1 >= seq.parameter_count() {
        return None;
    }
    match seq.param(group + 1) {
        5 => {
            if group + 2 >= seq.parameter_count() {
                *i = group + 1;
                return None;
            }
            *i = group + 2;
            let index = seq.param(group + 2);
            (index <= 255).then(|| Color::Indexed(index as u8))
        }
        2 => {
            if group + 4 >= seq.parameter_count() {
                *i = seq.parameter_count() - 1;
                return None;
            }
            *i = group + 4;
            let (r, g, b) = (
                seq.param(group + 2),
                seq.param(group + 3),
                seq.param(group + 4),
            );
            (r <= 255 && g <= 255 && b <= 255)
                .then(|| Color::Rgb(Rgb::new(r as u8, g as u8, b as u8)))
        }
        other => {
            debug!("unsupported color mode {other}");
            *i = group + 1;
            None
        }
    }
}

/// Map a DECRQSS setting name to its identity. Shared by the streaming hook
/// and the data-string path.
pub(crate) fn status_string_from(data: &str) -> Option<StatusString> {
    match data {
        "m" => Some(StatusString::Sgr),
        "\"p" => Some(StatusString::DecScl),
        " q" => Some(StatusString::DecScusr),
        "\"q" => Some(StatusString::DecSca),
        "r" => Some(StatusString::DecStbm),
        "s" => Some(StatusString::DecSlrm),
        "t" => Some(StatusString::DecSlpp),
        "$|" => Some(StatusString::DecScpp),
        "*|" => Some(StatusString::DecSnls),
        _ => None,
    }
}

/// Parse the `rgb:RRRR/GGGG/BBBB` dynamic-color literal (exactly 18 bytes);
/// each 16-bit group keeps its low byte.
pub(crate) fn parse_color(value: &str) -> Option<Rgb> {
    let bytes = value.as_bytes();
    if bytes.len() != 18 || !value.starts_with("rgb:") || bytes[8] != b'/' || bytes[13] != b'/' {
        return None;
    }
    let r = u16::from_str_radix(&value[4..8], 16).ok()?;
    let g = u16::from_str_radix(&value[9..13], 16).ok()?;
    let b = u16::from_str_radix(&value[14..18], 16).ok()?;
    Some(Rgb::new(
        (r & 0xFF) as u8,
        (g & 0xFF) as u8,
        (b & 0xFF) as u8,
    ))
}

fn dec_modes(seq: &Sequence) -> Vec<Mode> {
    (0..seq.parameter_count())
        .filter_map(|i| modes::dec_mode(seq.param(i)))
        .collect()
}

fn request_dec_mode(mode: u32) -> ApplyResult {
    match mode {
        1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 18 | 19 | 25 | 34 | 35 | 36 | 42 | 57 | 60 | 61 | 64
        | 66 | 67 | 68 | 69 | 73 | 81 | 95 | 96 | 97 | 98 | 99 | 100 | 101 | 102 | 103 | 104
        | 106 | 2026 => ApplyResult::Unsupported,
        _ => ApplyResult::Invalid,
    }
}

fn request_ansi_mode(mode: u32) -> ApplyResult {
    match mode {
        1..=5 | 7 | 10..=20 => ApplyResult::Unsupported,
        _ => ApplyResult::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::recording::RecordingScreen;
    use crate::sequence::FunctionCategory;

    fn csi(params: &str, leader: Option<u8>, final_char: char) -> Sequence {
        let mut seq = Sequence::new();
        seq.set_category(FunctionCategory::Csi);
        if let Some(leader) = leader {
            seq.set_leader(leader);
        }
        for byte in params.bytes() {
            match byte {
                b';' => seq.next_parameter(),
                b':' => seq.next_sub_parameter(),
                b'0'..=b'9' => seq.accumulate_digit(byte - b'0'),
                _ => unreachable!("test input"),
            }
        }
        seq.set_final_char(final_char);
        seq
    }

    fn osc(code: u32, payload: &str) -> Sequence {
        let mut seq = Sequence::new();
        seq.set_category(FunctionCategory::Osc);
        seq.push_parameter(code);
        seq.set_intermediates(payload.to_string());
        seq
    }

    fn apply(seq: &Sequence, function: Function) -> (RecordingScreen, ApplyResult) {
        let mut screen = RecordingScreen::new();
        let result = Performer::new(&mut screen).apply(function, seq);
        (screen, result)
    }

    #[test]
    fn test_cursor_motion_defaults() {
        let (screen, result) = apply(&csi("", None, 'A'), Function::Cuu);
        assert_eq!(result, ApplyResult::Ok);
        assert_eq!(screen.events, ["move_cursor_up(1)"]);

        // An explicit 0 also selects the default.
        let (screen, _) = apply(&csi("0", None, 'B'), Function::Cud);
        assert_eq!(screen.events, ["move_cursor_down(1)"]);
    }

    #[test]
    fn test_hvp_behaves_as_cup() {
        let (screen, _) = apply(&csi("3;5", None, 'f'), Function::Hvp);
        assert_eq!(screen.events, ["move_cursor_to(3,5)"]);
    }

    #[test]
    fn test_erase_scopes() {
        let (screen, _) = apply(&csi("2", None, 'J'), Function::Ed);
        assert_eq!(screen.events, ["clear_screen"]);

        let (screen, _) = apply(&csi("3", None, 'J'), Function::Ed);
        assert_eq!(screen.events, ["clear_scrollback_buffer"]);

        let (screen, result) = apply(&csi("7", None, 'K'), Function::El);
        assert_eq!(result, ApplyResult::Invalid);
        assert!(screen.events.is_empty());
    }

    #[test]
    fn test_sgr_truecolor_legacy_form() {
        let (screen, result) = apply(&csi("38;2;10;20;30", None, 'm'), Function::Sgr);
        assert_eq!(result, ApplyResult::Ok);
        assert_eq!(screen.events, ["set_foreground_color(rgb(10,20,30))"]);
    }

    #[test]
    fn test_sgr_truecolor_subparam_form() {
        let (screen, _) = apply(&csi("38:2:10:20:30", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_foreground_color(rgb(10,20,30))"]);
    }

    #[test]
    fn test_sgr_truecolor_with_colorspace_slot() {
        let (screen, _) = apply(&csi("38:2:0:10:20:30", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_foreground_color(rgb(10,20,30))"]);
    }

    #[test]
    fn test_sgr_indexed_both_forms() {
        let (screen, _) = apply(&csi("38;5;196", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_foreground_color(indexed(196))"]);

        let (screen, _) = apply(&csi("48:5:42", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_background_color(indexed(42))"]);
    }

    #[test]
    fn test_sgr_color_consumes_following_codes() {
        let (screen, _) = apply(&csi("38;2;1;2;3;1", None, 'm'), Function::Sgr);
        assert_eq!(
            screen.events,
            ["set_foreground_color(rgb(1,2,3))", "set_graphics_rendition(Bold)"]
        );

        let (screen, _) = apply(&csi("38:2:1:2:3;1", None, 'm'), Function::Sgr);
        assert_eq!(
            screen.events,
            ["set_foreground_color(rgb(1,2,3))", "set_graphics_rendition(Bold)"]
        );
    }

    #[test]
    fn test_sgr_out_of_range_channel_discards_color() {
        let (screen, result) = apply(&csi("38;2;300;0;0;1", None, 'm'), Function::Sgr);
        assert_eq!(result, ApplyResult::Ok);
        assert_eq!(screen.events, ["set_graphics_rendition(Bold)"]);
    }

    #[test]
    fn test_sgr_underline_styles() {
        let (screen, _) = apply(&csi("4:3", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_graphics_rendition(CurlyUnderlined)"]);

        let (screen, _) = apply(&csi("4:0", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_graphics_rendition(NoUnderline)"]);

        let (screen, _) = apply(&csi("4", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_graphics_rendition(Underline)"]);
    }

    #[test]
    fn test_sgr_underline_color() {
        let (screen, _) = apply(&csi("58:5:9", None, 'm'), Function::Sgr);
        assert_eq!(screen.events, ["set_underline_color(indexed(9))"]);
    }

    #[test]
    fn test_sgr_named_colors() {
        let (screen, _) = apply(&csi("31;42;97", None, 'm'), Function::Sgr);
        assert_eq!(
            screen.events,
            [
                "set_foreground_color(named(Red))",
                "set_background_color(named(Green))",
                "set_foreground_color(named(BrightWhite))"
            ]
        );
    }

    #[test]
    fn test_sgr_reset_is_idempotent() {
        let (mut screen, _) = apply(&csi("0", None, 'm'), Function::Sgr);
        let first = screen.events.clone();
        screen.events.clear();
        let result = Performer::new(&mut screen).apply(Function::Sgr, &csi("0", None, 'm'));
        assert_eq!(result, ApplyResult::Ok);
        assert_eq!(screen.events, first);
        assert_eq!(screen.events, ["set_graphics_rendition(Reset)"]);
    }

    #[test]
    fn test_dec_mode_set_and_unknown() {
        let (screen, result) = apply(&csi("25", Some(b'?'), 'h'), Function::DecSm);
        assert_eq!(result, ApplyResult::Ok);
        assert_eq!(screen.events, ["set_mode(VisibleCursor,true)"]);

        let (screen, result) = apply(&csi("9999", Some(b'?'), 'l'), Function::DecRm);
        assert_eq!(result, ApplyResult::Invalid);
        assert!(screen.events.is_empty());
    }

    #[test]
    fn test_mode_save_restore_skips_unmapped() {
        let (screen, _) = apply(&csi("25;9999;7", Some(b'?'), 's'), Function::DecModeSave);
        assert_eq!(screen.events, ["save_modes([VisibleCursor, AutoWrap])"]);
    }

    #[test]
    fn test_device_status() {
        let (screen, _) = apply(&csi("5", None, 'n'), Function::Cpr);
        assert_eq!(screen.events, ["device_status_report"]);

        let (screen, _) = apply(&csi("6", None, 'n'), Function::Cpr);
        assert_eq!(screen.events, ["report_cursor_position"]);

        let (screen, _) = apply(&csi("6", Some(b'?'), 'n'), Function::DecXcpr);
        assert_eq!(screen.events, ["report_extended_cursor_position"]);
    }

    #[test]
    fn test_window_manipulation() {
        let (screen, _) = apply(&csi("4;600;800", None, 't'), Function::WinManip);
        assert_eq!(screen.events, ["resize_window(800,600,true)"]);

        let (screen, _) = apply(&csi("8;24;80", None, 't'), Function::WinManip);
        assert_eq!(screen.events, ["resize_window(80,24,false)"]);

        let (screen, _) = apply(&csi("14", None, 't'), Function::WinManip);
        assert_eq!(screen.events, ["request_pixel_size(TextArea)"]);

        let (screen, _) = apply(&csi("22;0;0", None, 't'), Function::WinManip);
        assert_eq!(screen.events, ["save_window_title"]);

        let (_, result) = apply(&csi("99", None, 't'), Function::WinManip);
        assert_eq!(result, ApplyResult::Unsupported);
    }

    #[test]
    fn test_sm_graphics() {
        let (screen, _) = apply(&csi("1;1", Some(b'?'), 'S'), Function::XtSmGraphics);
        assert_eq!(screen.events, ["sm_graphics(ColorRegisters,Read,None)"]);

        let (screen, _) = apply(&csi("1;3;256", Some(b'?'), 'S'), Function::XtSmGraphics);
        assert_eq!(
            screen.events,
            ["sm_graphics(ColorRegisters,SetToValue,Number(256))"]
        );

        let (screen, _) = apply(&csi("2;3;640;480", Some(b'?'), 'S'), Function::XtSmGraphics);
        assert_eq!(
            screen.events,
            ["sm_graphics(SixelGeometry,SetToValue,Size(Size { width: 640, height: 480 }))"]
        );

        let (_, result) = apply(&csi("9;1", Some(b'?'), 'S'), Function::XtSmGraphics);
        assert_eq!(result, ApplyResult::Invalid);
    }

    #[test]
    fn test_cursor_style() {
        let (screen, _) = apply(&csi("3", None, 'q'), Function::DecScusr);
        assert_eq!(screen.events, ["set_cursor_style(Blink,Underscore)"]);

        // Default (absent parameter) is the blinking block.
        let (screen, _) = apply(&csi("", None, 'q'), Function::DecScusr);
        assert_eq!(screen.events, ["set_cursor_style(Blink,Block)"]);

        let (_, result) = apply(&csi("9", None, 'q'), Function::DecScusr);
        assert_eq!(result, ApplyResult::Invalid);
    }

    #[test]
    fn test_request_mode_answers() {
        assert_eq!(
            apply(&csi("6", Some(b'?'), 'p'), Function::DecRqm).1,
            ApplyResult::Unsupported
        );
        assert_eq!(
            apply(&csi("999", Some(b'?'), 'p'), Function::DecRqm).1,
            ApplyResult::Invalid
        );
    }

    #[test]
    fn test_decrqss_mapping() {
        let mut seq = Sequence::new();
        seq.set_category(FunctionCategory::Dcs);
        seq.set_data_string("m".to_string());
        let (screen, result) = apply(&seq, Function::DecRqss);
        assert_eq!(result, ApplyResult::Ok);
        assert_eq!(screen.events, ["request_status_string(Sgr)"]);

        let mut bad = Sequence::new();
        bad.set_category(FunctionCategory::Dcs);
        bad.set_data_string("zz".to_string());
        assert_eq!(apply(&bad, Function::DecRqss).1, ApplyResult::Invalid);
    }

    #[test]
    fn test_hyperlink_with_id() {
        let (screen, _) = apply(&osc(8, "id=42:foo=bar;http://example.com"), Function::Hyperlink);
        assert_eq!(screen.events, ["hyperlink(42,http://example.com)"]);
    }

    #[test]
    fn test_hyperlink_reset() {
        let (screen, _) = apply(&osc(8, ";"), Function::Hyperlink);
        assert_eq!(screen.events, ["hyperlink(,)"]);
    }

    #[test]
    fn test_clipboard_copy() {
        let payload = format!("c;{}", BASE64.encode("hello"));
        let (screen, result) = apply(&osc(52, &payload), Function::Clipboard);
        assert_eq!(result, ApplyResult::Ok);
        assert_eq!(screen.events, ["copy_to_clipboard(hello)"]);
    }

    #[test]
    fn test_clipboard_rejects_reads_and_junk() {
        assert_eq!(apply(&osc(52, "c;?**?"), Function::Clipboard).1, ApplyResult::Invalid);
        assert_eq!(apply(&osc(52, "p;aGk="), Function::Clipboard).1, ApplyResult::Invalid);
    }

    #[test]
    fn test_notify() {
        let (screen, _) = apply(&osc(777, "notify;Title;Body text"), Function::Notify);
        assert_eq!(screen.events, ["notify(Title,Body text)"]);

        assert_eq!(
            apply(&osc(777, "unknown;x;y"), Function::Notify).1,
            ApplyResult::Unsupported
        );
    }

    #[test]
    fn test_dynamic_color_set_query_reset() {
        let (screen, _) = apply(&osc(10, "rgb:12FF/3400/5678"), Function::ColorFg);
        assert_eq!(
            screen.events,
            ["set_dynamic_color(DefaultForeground,rgb(255,0,120))"]
        );

        let (screen, _) = apply(&osc(11, "?"), Function::ColorBg);
        assert_eq!(screen.events, ["request_dynamic_color(DefaultBackground)"]);

        let (screen, _) = apply(&osc(112, ""), Function::ResetColorCursor);
        assert_eq!(screen.events, ["reset_dynamic_color(TextCursor)"]);

        assert_eq!(
            apply(&osc(10, "rgb:12/34/56"), Function::ColorFg).1,
            ApplyResult::Invalid
        );
    }

    #[test]
    fn test_window_title() {
        let (screen, _) = apply(&osc(2, "hello world"), Function::SetWinTitle);
        assert_eq!(screen.events, ["set_window_title(hello world)"]);
    }

    #[test]
    fn test_parse_color_literal() {
        assert_eq!(parse_color("rgb:FFFF/0000/8080"), Some(Rgb::new(255, 0, 128)));
        assert_eq!(parse_color("rgb:FF/00/80"), None);
        assert_eq!(parse_color("rgbFFFF/0000/8080!"), None);
        assert_eq!(parse_color("rgb:GGGG/0000/8080"), None);
    }
}
