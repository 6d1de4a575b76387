//! Control-function registry
//!
//! Maps an assembled [`Sequence`] to a closed [`Function`] identity. ESC, CSI
//! and DCS functions resolve through a static table keyed on leader,
//! intermediate, final character and parameter count range; C0 controls and
//! OSC codes resolve through direct lookups. Unknown sequences resolve to
//! `None` and are reported by the caller.

use serde::{Deserialize, Serialize};

use crate::sequence::{FunctionCategory, Sequence, MAX_PARAMETERS};

/// Identity of a recognized control function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    // C0
    /// EOT - End of Transmission
    Eot,
    /// BEL - Bell
    Bel,
    /// BS - Backspace
    Bs,
    /// TAB - Horizontal Tab
    Tab,
    /// LF - Line Feed
    Lf,
    /// VT - Vertical Tab (xterm performs an index)
    Vt,
    /// FF - Form Feed (xterm performs an index)
    Ff,
    /// CR - Carriage Return
    Cr,
    /// SO - Shift Out
    So,
    /// SI - Shift In
    Si,

    // ESC
    /// Set G0 to DEC Special Character and Line Drawing
    ScsG0Special,
    /// Set G0 to US-ASCII
    ScsG0Usascii,
    /// Set G1 to DEC Special Character and Line Drawing
    ScsG1Special,
    /// Set G1 to US-ASCII
    ScsG1Usascii,
    /// DECALN - Screen Alignment Pattern
    DecAln,
    /// DECBI - Back Index
    DecBi,
    /// DECFI - Forward Index
    DecFi,
    /// DECKPAM - Keypad Application Mode
    DecKpam,
    /// DECKPNM - Keypad Numeric Mode
    DecKpnm,
    /// DECRS - Restore Cursor
    DecRs,
    /// DECSC - Save Cursor
    DecSc,
    /// HTS - Horizontal Tab Set
    Hts,
    /// IND - Index
    Ind,
    /// NEL - Next Line
    Nel,
    /// RI - Reverse Index
    Ri,
    /// RIS - Reset to Initial State (hard reset)
    Ris,
    /// SS2 - Single Shift Select G2
    Ss2,
    /// SS3 - Single Shift Select G3
    Ss3,

    // CSI
    /// Save Cursor (ANSI.SYS variant of CSI u)
    AnsiSysSc,
    /// CBT - Cursor Backward Tabulation
    Cbt,
    /// CHA - Cursor Horizontal Absolute
    Cha,
    /// CHT - Cursor Horizontal Forward Tabulation
    Cht,
    /// CNL - Cursor Next Line
    Cnl,
    /// CPL - Cursor Previous Line
    Cpl,
    /// DSR - Device Status Report / Cursor Position Report request
    Cpr,
    /// CUB - Cursor Backward
    Cub,
    /// CUD - Cursor Down
    Cud,
    /// CUF - Cursor Forward
    Cuf,
    /// CUP - Cursor Position
    Cup,
    /// CUU - Cursor Up
    Cuu,
    /// DA1 - Primary Device Attributes
    Da1,
    /// DA2 - Secondary Device Attributes
    Da2,
    /// DA3 - Tertiary Device Attributes
    Da3,
    /// DCH - Delete Characters
    Dch,
    /// DECDC - Delete Columns
    DecDc,
    /// DECIC - Insert Columns
    DecIc,
    /// Restore saved DEC private modes
    DecModeRestore,
    /// Save DEC private modes
    DecModeSave,
    /// DECRM - Reset DEC private mode
    DecRm,
    /// DECRQM - Request DEC private mode state
    DecRqm,
    /// DECRQM (ANSI) - Request ANSI mode state
    DecRqmAnsi,
    /// DECRQPSR - Request Presentation State Report
    DecRqpsr,
    /// DECSCL - Set Conformance Level
    DecScl,
    /// DECSCPP - Select 80 or 132 Columns per Page
    DecScpp,
    /// DECSCUSR - Set Cursor Style
    DecScusr,
    /// DECSLRM - Set Left/Right Margins
    DecSlrm,
    /// DECSM - Set DEC private mode
    DecSm,
    /// DECSTBM - Set Top/Bottom Margins
    DecStbm,
    /// DECSTR - Soft Terminal Reset
    DecStr,
    /// DECXCPR - Request Extended Cursor Position
    DecXcpr,
    /// DL - Delete Lines
    Dl,
    /// ECH - Erase Characters
    Ech,
    /// ED - Erase in Display
    Ed,
    /// EL - Erase in Line
    El,
    /// HPA - Horizontal Position Absolute
    Hpa,
    /// HPR - Horizontal Position Relative
    Hpr,
    /// HVP - Horizontal and Vertical Position (behaves as CUP)
    Hvp,
    /// ICH - Insert Characters
    Ich,
    /// IL - Insert Lines
    Il,
    /// RM - Reset ANSI mode
    Rm,
    /// SCOSC - Save Cursor
    ScoSc,
    /// SD - Scroll Down
    Sd,
    /// Set Vertical Mark
    SetMark,
    /// SGR - Select Graphic Rendition
    Sgr,
    /// SM - Set ANSI mode
    Sm,
    /// SU - Scroll Up
    Su,
    /// TBC - Tab Clear
    Tbc,
    /// VPA - Vertical Position Absolute
    Vpa,
    /// Window manipulation (XTWINOPS)
    WinManip,
    /// XTSMGRAPHICS - graphics settings read/write
    XtSmGraphics,

    // DCS
    /// DECRQSS - Request Status String
    DecRqss,
    /// DECSIXEL - Sixel Graphics Image
    DecSixel,
    /// Image protocol: upload a named image
    ImageUpload,
    /// Image protocol: render a named image
    ImageRender,
    /// Image protocol: release a named image
    ImageRelease,
    /// Image protocol: upload and render an unnamed image
    ImageOneshot,

    // OSC
    /// OSC 0 - Set icon name and window title
    SetTitle,
    /// OSC 1 - Set icon name
    SetIcon,
    /// OSC 2 - Set window title
    SetWinTitle,
    /// OSC 3 - Set X11 property
    SetXProp,
    /// OSC 8 - Hyperlink
    Hyperlink,
    /// OSC 10 - Set/request default foreground color
    ColorFg,
    /// OSC 11 - Set/request default background color
    ColorBg,
    /// OSC 12 - Set/request text cursor color
    ColorCursor,
    /// OSC 13 - Set/request mouse foreground color
    ColorMouseFg,
    /// OSC 14 - Set/request mouse background color
    ColorMouseBg,
    /// OSC 17 - Set/request highlight background color
    ColorHighlightBg,
    /// OSC 19 - Set/request highlight foreground color
    ColorHighlightFg,
    /// OSC 52 - Clipboard access
    Clipboard,
    /// OSC 106 - Enable/disable special color
    ColorSpecial,
    /// OSC 110 - Reset default foreground color
    ResetColorFg,
    /// OSC 111 - Reset default background color
    ResetColorBg,
    /// OSC 112 - Reset text cursor color
    ResetColorCursor,
    /// OSC 113 - Reset mouse foreground color
    ResetColorMouseFg,
    /// OSC 114 - Reset mouse background color
    ResetColorMouseBg,
    /// OSC 117 - Reset highlight background color
    ResetColorHighlightBg,
    /// OSC 119 - Reset highlight foreground color
    ResetColorHighlightFg,
    /// OSC 777 - Desktop notification
    Notify,
    /// OSC 888 - Dump internal state
    DumpState,
}

/// One registry entry for the table-driven categories (ESC, CSI, DCS)
#[derive(Debug, Clone, Copy)]
struct FunctionDef {
    category: FunctionCategory,
    leader: Option<u8>,
    intermediate: Option<u8>,
    final_char: char,
    min_params: usize,
    max_params: usize,
    function: Function,
}

const fn esc(intermediate: Option<u8>, final_char: char, function: Function) -> FunctionDef {
    FunctionDef {
        category: FunctionCategory::Esc,
        leader: None,
        intermediate,
        final_char,
        min_params: 0,
        max_params: 0,
        function,
    }
}

const fn csi(
    leader: Option<u8>,
    min_params: usize,
    max_params: usize,
    intermediate: Option<u8>,
    final_char: char,
    function: Function,
) -> FunctionDef {
    FunctionDef {
        category: FunctionCategory::Csi,
        leader,
        intermediate,
        final_char,
        min_params,
        max_params,
        function,
    }
}

const fn dcs(
    min_params: usize,
    max_params: usize,
    intermediate: Option<u8>,
    final_char: char,
    function: Function,
) -> FunctionDef {
    FunctionDef {
        category: FunctionCategory::Dcs,
        leader: None,
        intermediate,
        final_char,
        min_params,
        max_params,
        function,
    }
}

/// Registry of ESC, CSI and DCS functions. C0 and OSC resolve separately.
const FUNCTIONS: &[FunctionDef] = &[
    // ESC
    esc(Some(b'('), '0', Function::ScsG0Special),
    esc(Some(b'('), 'B', Function::ScsG0Usascii),
    esc(Some(b')'), '0', Function::ScsG1Special),
    esc(Some(b')'), 'B', Function::ScsG1Usascii),
    esc(Some(b'#'), '8', Function::DecAln),
    esc(None, '6', Function::DecBi),
    esc(None, '9', Function::DecFi),
    esc(None, '=', Function::DecKpam),
    esc(None, '>', Function::DecKpnm),
    esc(None, '8', Function::DecRs),
    esc(None, '7', Function::DecSc),
    esc(None, 'H', Function::Hts),
    esc(None, 'D', Function::Ind),
    esc(None, 'E', Function::Nel),
    esc(None, 'M', Function::Ri),
    esc(None, 'c', Function::Ris),
    esc(None, 'N', Function::Ss2),
    esc(None, 'O', Function::Ss3),
    // CSI
    csi(None, 0, 0, None, 'u', Function::AnsiSysSc),
    csi(None, 0, 1, None, 'Z', Function::Cbt),
    csi(None, 0, 1, None, 'G', Function::Cha),
    csi(None, 0, 1, None, 'I', Function::Cht),
    csi(None, 0, 1, None, 'E', Function::Cnl),
    csi(None, 0, 1, None, 'F', Function::Cpl),
    csi(None, 1, 1, None, 'n', Function::Cpr),
    csi(None, 0, 1, None, 'D', Function::Cub),
    csi(None, 0, 1, None, 'B', Function::Cud),
    csi(None, 0, 1, None, 'C', Function::Cuf),
    csi(None, 0, 2, None, 'H', Function::Cup),
    csi(None, 0, 1, None, 'A', Function::Cuu),
    csi(None, 0, 1, None, 'c', Function::Da1),
    csi(Some(b'>'), 0, 1, None, 'c', Function::Da2),
    csi(Some(b'='), 0, 1, None, 'c', Function::Da3),
    csi(None, 0, 1, None, 'P', Function::Dch),
    csi(None, 0, 1, Some(b'\''), '~', Function::DecDc),
    csi(None, 0, 1, Some(b'\''), '}', Function::DecIc),
    csi(Some(b'?'), 0, MAX_PARAMETERS, None, 'r', Function::DecModeRestore),
    csi(Some(b'?'), 0, MAX_PARAMETERS, None, 's', Function::DecModeSave),
    csi(Some(b'?'), 1, MAX_PARAMETERS, None, 'l', Function::DecRm),
    csi(Some(b'?'), 1, 1, Some(b'$'), 'p', Function::DecRqm),
    csi(None, 1, 1, Some(b'$'), 'p', Function::DecRqmAnsi),
    csi(None, 1, 1, Some(b'$'), 'w', Function::DecRqpsr),
    csi(None, 2, 2, Some(b'"'), 'p', Function::DecScl),
    csi(None, 0, 1, Some(b'$'), '|', Function::DecScpp),
    csi(None, 0, 1, Some(b' '), 'q', Function::DecScusr),
    csi(None, 2, 2, None, 's', Function::DecSlrm),
    csi(Some(b'?'), 1, MAX_PARAMETERS, None, 'h', Function::DecSm),
    csi(None, 0, 2, None, 'r', Function::DecStbm),
    csi(None, 0, 0, Some(b'!'), 'p', Function::DecStr),
    csi(Some(b'?'), 1, 1, None, 'n', Function::DecXcpr),
    csi(None, 0, 1, None, 'M', Function::Dl),
    csi(None, 0, 1, None, 'X', Function::Ech),
    csi(None, 0, MAX_PARAMETERS, None, 'J', Function::Ed),
    csi(None, 0, 1, None, 'K', Function::El),
    csi(None, 0, 1, None, '`', Function::Hpa),
    csi(None, 0, 1, None, 'a', Function::Hpr),
    csi(None, 0, 2, None, 'f', Function::Hvp),
    csi(None, 0, 1, None, '@', Function::Ich),
    csi(None, 0, 1, None, 'L', Function::Il),
    csi(None, 1, MAX_PARAMETERS, None, 'l', Function::Rm),
    csi(None, 0, 0, None, 's', Function::ScoSc),
    csi(None, 0, 1, None, 'T', Function::Sd),
    csi(Some(b'>'), 0, 0, None, 'M', Function::SetMark),
    csi(None, 0, MAX_PARAMETERS, None, 'm', Function::Sgr),
    csi(None, 1, MAX_PARAMETERS, None, 'h', Function::Sm),
    csi(None, 0, 1, None, 'S', Function::Su),
    csi(None, 0, 1, None, 'g', Function::Tbc),
    csi(None, 0, 1, None, 'd', Function::Vpa),
    csi(None, 1, 3, None, 't', Function::WinManip),
    csi(Some(b'?'), 2, 4, None, 'S', Function::XtSmGraphics),
    // DCS
    dcs(0, 0, Some(b'$'), 'q', Function::DecRqss),
    dcs(0, 3, None, 'q', Function::DecSixel),
    dcs(0, 0, None, 'u', Function::ImageUpload),
    dcs(0, 0, None, 'r', Function::ImageRender),
    dcs(0, 0, None, 'd', Function::ImageRelease),
    dcs(0, 0, None, 's', Function::ImageOneshot),
];

fn c0_function(control: char) -> Option<Function> {
    match control {
        '\x04' => Some(Function::Eot),
        '\x07' => Some(Function::Bel),
        '\x08' => Some(Function::Bs),
        '\x09' => Some(Function::Tab),
        '\x0A' => Some(Function::Lf),
        '\x0B' => Some(Function::Vt),
        '\x0C' => Some(Function::Ff),
        '\x0D' => Some(Function::Cr),
        '\x0E' => Some(Function::So),
        '\x0F' => Some(Function::Si),
        _ => None,
    }
}

fn osc_function(code: u32) -> Option<Function> {
    match code {
        0 => Some(Function::SetTitle),
        1 => Some(Function::SetIcon),
        2 => Some(Function::SetWinTitle),
        3 => Some(Function::SetXProp),
        8 => Some(Function::Hyperlink),
        10 => Some(Function::ColorFg),
        11 => Some(Function::ColorBg),
        12 => Some(Function::ColorCursor),
        13 => Some(Function::ColorMouseFg),
        14 => Some(Function::ColorMouseBg),
        17 => Some(Function::ColorHighlightBg),
        19 => Some(Function::ColorHighlightFg),
        52 => Some(Function::Clipboard),
        106 => Some(Function::ColorSpecial),
        110 => Some(Function::ResetColorFg),
        111 => Some(Function::ResetColorBg),
        112 => Some(Function::ResetColorCursor),
        113 => Some(Function::ResetColorMouseFg),
        114 => Some(Function::ResetColorMouseBg),
        117 => Some(Function::ResetColorHighlightBg),
        119 => Some(Function::ResetColorHighlightFg),
        777 => Some(Function::Notify),
        888 => Some(Function::DumpState),
        _ => None,
    }
}

/// Resolve an assembled sequence to its function identity
pub fn resolve(seq: &Sequence) -> Option<Function> {
    match seq.category() {
        FunctionCategory::C0 => c0_function(seq.final_char()),
        FunctionCategory::Osc => osc_function(seq.param(0)),
        category => {
            // Multi-character intermediates are intentionally unsupported.
            let intermediate = match seq.intermediates().as_bytes() {
                [byte] => Some(*byte),
                [] => None,
                _ => return None,
            };
            let argc = seq.parameter_count();
            FUNCTIONS
                .iter()
                .find(|def| {
                    def.category == category
                        && def.leader == seq.leader()
                        && def.intermediate == intermediate
                        && def.final_char == seq.final_char()
                        && def.min_params <= argc
                        && argc <= def.max_params
                })
                .map(|def| def.function)
        }
    }
}

/// True for functions that may be deferred by synchronized output (mode
/// 2026). Side-effect-free queries and mode changes apply immediately.
pub fn is_batchable(function: Function) -> bool {
    use Function::*;
    matches!(
        function,
        Bs | Tab
            | Lf
            | Vt
            | Ff
            | Cr
            | ScsG0Special
            | ScsG0Usascii
            | ScsG1Special
            | ScsG1Usascii
            | DecAln
            | DecBi
            | DecFi
            | DecRs
            | DecSc
            | Hts
            | Ind
            | Nel
            | Ri
            | Ss2
            | Ss3
            | AnsiSysSc
            | Cbt
            | Cha
            | Cht
            | Cnl
            | Cpl
            | Cub
            | Cud
            | Cuf
            | Cup
            | Cuu
            | Dch
            | DecDc
            | DecIc
            | DecScusr
            | DecSlrm
            | DecStbm
            | Dl
            | Ech
            | Ed
            | El
            | Hpa
            | Hpr
            | Hvp
            | Ich
            | Il
            | ScoSc
            | Sd
            | SetMark
            | Sgr
            | Su
            | Tbc
            | Vpa
            | Hyperlink
            | ResetColorFg
            | ResetColorBg
            | ResetColorCursor
            | ResetColorMouseFg
            | ResetColorMouseBg
            | ResetColorHighlightBg
            | ResetColorHighlightFg
    )
}
