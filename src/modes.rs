//! Terminal mode identities
//!
//! ANSI and DEC private modes selected by SM/RM and DECSM/DECRM. The engine
//! only maps mode numbers to identities; the screen implementation owns the
//! actual flag state and the save/restore stack.

use serde::{Deserialize, Serialize};

/// A settable terminal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    // ANSI modes
    /// KAM - Keyboard Action Mode (2)
    KeyboardAction,
    /// IRM - Insert Mode (4)
    Insert,
    /// SRM - Send/Receive Mode (12)
    SendReceive,
    /// LNM - Automatic Newline (20)
    AutomaticNewline,

    // DEC private modes
    /// DECCKM - Application Cursor Keys (?1)
    ApplicationCursorKeys,
    /// DECANM - Designate US-ASCII charsets (?2)
    DesignateCharsetUsascii,
    /// DECCOLM - 132 Column Mode (?3)
    Columns132,
    /// DECSCLM - Smooth Scroll (?4)
    SmoothScroll,
    /// DECSCNM - Reverse Video (?5)
    ReverseVideo,
    /// DECOM - Origin Mode (?6)
    Origin,
    /// DECAWM - Auto Wrap (?7)
    AutoWrap,
    /// X10 mouse protocol (?9)
    MouseProtocolX10,
    /// Show toolbar (?10)
    ShowToolbar,
    /// Blinking cursor (?12)
    BlinkingCursor,
    /// DECPEX - Printer Extent (?19)
    PrinterExtend,
    /// DECTCEM - Visible Cursor (?25)
    VisibleCursor,
    /// Show scrollbar (?30)
    ShowScrollbar,
    /// Allow 80 -> 132 column switching (?40)
    AllowColumns80To132,
    /// Alternate screen buffer (?47, ?1047)
    UseAlternateScreen,
    /// DECLRMM - Left/Right Margin Mode (?69)
    LeftRightMargin,
    /// Sixel scrolling (?80)
    SixelScrolling,
    /// Normal mouse tracking (?1000)
    MouseProtocolNormalTracking,
    /// Highlight mouse tracking (?1001)
    MouseProtocolHighlightTracking,
    /// Button-event mouse tracking (?1002)
    MouseProtocolButtonTracking,
    /// Any-event mouse tracking (?1003)
    MouseProtocolAnyEventTracking,
    /// Focus in/out reporting (?1004)
    FocusTracking,
    /// UTF-8 extended mouse encoding (?1005)
    MouseExtended,
    /// SGR extended mouse encoding (?1006)
    MouseSgr,
    /// Alternate scroll in the alternate screen (?1007)
    MouseAlternateScroll,
    /// URXVT extended mouse encoding (?1015)
    MouseUrxvt,
    /// Save cursor as part of alt-screen switching (?1048)
    SaveCursor,
    /// Alt screen with cursor save/restore and clear (?1049)
    ExtendedAltScreen,
    /// Private color registers for sixel (?1070)
    UsePrivateColorRegisters,
    /// Bracketed paste (?2004)
    BracketedPaste,
    /// Synchronized output (?2026)
    BatchedRendering,
}

/// Map a DEC private mode number (CSI ? Pm h/l) to its identity
pub fn dec_mode(number: u32) -> Option<Mode> {
    match number {
        1 => Some(Mode::ApplicationCursorKeys),
        2 => Some(Mode::DesignateCharsetUsascii),
        3 => Some(Mode::Columns132),
        4 => Some(Mode::SmoothScroll),
        5 => Some(Mode::ReverseVideo),
        6 => Some(Mode::Origin),
        7 => Some(Mode::AutoWrap),
        9 => Some(Mode::MouseProtocolX10),
        10 => Some(Mode::ShowToolbar),
        12 => Some(Mode::BlinkingCursor),
        19 => Some(Mode::PrinterExtend),
        25 => Some(Mode::VisibleCursor),
        30 => Some(Mode::ShowScrollbar),
        40 => Some(Mode::AllowColumns80To132),
        47 => Some(Mode::UseAlternateScreen),
        69 => Some(Mode::LeftRightMargin),
        80 => Some(Mode::SixelScrolling),
        1000 => Some(Mode::MouseProtocolNormalTracking),
        1001 => Some(Mode::MouseProtocolHighlightTracking),
        1002 => Some(Mode::MouseProtocolButtonTracking),
        1003 => Some(Mode::MouseProtocolAnyEventTracking),
        1004 => Some(Mode::FocusTracking),
        1005 => Some(Mode::MouseExtended),
        1006 => Some(Mode::MouseSgr),
        1007 => Some(Mode::MouseAlternateScroll),
        1015 => Some(Mode::MouseUrxvt),
        1047 => Some(Mode::UseAlternateScreen),
        1048 => Some(Mode::SaveCursor),
        1049 => Some(Mode::ExtendedAltScreen),
        1070 => Some(Mode::UsePrivateColorRegisters),
        2004 => Some(Mode::BracketedPaste),
        2026 => Some(Mode::BatchedRendering),
        _ => None,
    }
}

/// Map an ANSI mode number (CSI Pm h/l) to its identity
pub fn ansi_mode(number: u32) -> Option<Mode> {
    match number {
        2 => Some(Mode::KeyboardAction),
        4 => Some(Mode::Insert),
        12 => Some(Mode::SendReceive),
        20 => Some(Mode::AutomaticNewline),
        _ => None,
    }
}
