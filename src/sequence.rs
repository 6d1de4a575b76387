//! Control-sequence record
//!
//! A [`Sequence`] holds one control function while the producer assembles it:
//! the category, an optional leader byte, parameter groups (with colon
//! sub-parameters), intermediate characters, the final character, and the DCS
//! data string. The producer mutates it through the `next_parameter` /
//! `next_sub_parameter` / `accumulate_digit` entry points; the performer only
//! reads it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of parameter groups, and of sub-values per group
pub const MAX_PARAMETERS: usize = 16;

/// Maximum accumulated OSC payload length in bytes
pub const MAX_OSC_LENGTH: usize = 512;

/// The five syntactic classes a control function can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FunctionCategory {
    #[default]
    C0,
    Esc,
    Csi,
    Osc,
    Dcs,
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionCategory::C0 => "C0",
            FunctionCategory::Esc => "ESC",
            FunctionCategory::Csi => "CSI",
            FunctionCategory::Osc => "OSC",
            FunctionCategory::Dcs => "DCS",
        };
        f.write_str(name)
    }
}

/// One control sequence under assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    category: FunctionCategory,
    leader: Option<u8>,
    parameters: Vec<Vec<u32>>,
    intermediates: String,
    final_char: char,
    data_string: String,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequence {
    pub fn new() -> Self {
        Sequence {
            category: FunctionCategory::C0,
            leader: None,
            parameters: Vec::with_capacity(MAX_PARAMETERS),
            intermediates: String::new(),
            final_char: '\0',
            data_string: String::new(),
        }
    }

    /// Reset to the initial state: empty parameters, intermediates and data
    /// string, no leader, final char 0, category C0.
    pub fn clear(&mut self) {
        self.category = FunctionCategory::C0;
        self.leader = None;
        self.parameters.clear();
        self.intermediates.clear();
        self.final_char = '\0';
        self.data_string.clear();
    }

    // -- mutators driven by the producer ------------------------------------

    pub fn set_category(&mut self, category: FunctionCategory) {
        self.category = category;
    }

    pub fn set_leader(&mut self, leader: u8) {
        self.leader = Some(leader);
    }

    pub fn set_final_char(&mut self, final_char: char) {
        self.final_char = final_char;
    }

    pub fn push_intermediate(&mut self, ch: char) {
        self.intermediates.push(ch);
    }

    pub fn set_intermediates(&mut self, intermediates: String) {
        self.intermediates = intermediates;
    }

    pub fn set_data_string(&mut self, data: String) {
        self.data_string = data;
    }

    /// Append a complete parameter group with a single value
    pub fn push_parameter(&mut self, value: u32) {
        if self.parameters.len() < MAX_PARAMETERS {
            self.parameters.push(vec![value]);
        }
    }

    /// Start the next parameter group (a `;` from the producer)
    pub fn next_parameter(&mut self) {
        self.ensure_group();
        if self.parameters.len() < MAX_PARAMETERS {
            self.parameters.push(vec![0]);
        }
    }

    /// Start the next sub-parameter within the current group (a `:`)
    pub fn next_sub_parameter(&mut self) {
        self.ensure_group();
        if let Some(group) = self.parameters.last_mut() {
            if group.len() < MAX_PARAMETERS {
                group.push(0);
            }
        }
    }

    /// Accumulate a decimal digit onto the current value, saturating instead
    /// of wrapping on overflow.
    pub fn accumulate_digit(&mut self, digit: u8) {
        self.ensure_group();
        if let Some(value) = self.parameters.last_mut().and_then(|g| g.last_mut()) {
            *value = value.saturating_mul(10).saturating_add(u32::from(digit));
        }
    }

    fn ensure_group(&mut self) {
        if self.parameters.is_empty() {
            self.parameters.push(vec![0]);
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn category(&self) -> FunctionCategory {
        self.category
    }

    pub fn leader(&self) -> Option<u8> {
        self.leader
    }

    pub fn intermediates(&self) -> &str {
        &self.intermediates
    }

    pub fn final_char(&self) -> char {
        self.final_char
    }

    pub fn data_string(&self) -> &str {
        &self.data_string
    }

    pub fn parameters(&self) -> &[Vec<u32>] {
        &self.parameters
    }

    /// Number of parameter groups
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Number of sub-values of group `index`, not counting the primary value
    pub fn sub_parameter_count(&self, index: usize) -> usize {
        self.parameters
            .get(index)
            .map(|g| g.len().saturating_sub(1))
            .unwrap_or(0)
    }

    /// Primary value of group `index`, or 0 when the group is absent
    pub fn param(&self, index: usize) -> u32 {
        self.parameters
            .get(index)
            .and_then(|g| g.first())
            .copied()
            .unwrap_or(0)
    }

    /// Primary value of group `index`, or `None` when the group is absent or
    /// holds 0. A stored 0 reads as absent, so callers asking `param_or` get
    /// the default for explicit-zero parameters too.
    pub fn param_opt(&self, index: usize) -> Option<u32> {
        match self.parameters.get(index).and_then(|g| g.first()) {
            Some(0) | None => None,
            Some(&value) => Some(value),
        }
    }

    /// Primary value of group `index`, or `default` when absent or 0
    pub fn param_or(&self, index: usize, default: u32) -> u32 {
        self.param_opt(index).unwrap_or(default)
    }

    /// The `sub`-th sub-value of group `index` (0-based, after the primary
    /// value), or 0 when absent
    pub fn subparam(&self, index: usize, sub: usize) -> u32 {
        self.parameters
            .get(index)
            .and_then(|g| g.get(sub + 1))
            .copied()
            .unwrap_or(0)
    }

    /// True iff any group's primary value equals `value`
    pub fn contains_parameter(&self, value: u32) -> bool {
        self.parameters.iter().any(|g| g.first() == Some(&value))
    }

    // -- textual forms ------------------------------------------------------

    /// Serialize back to the canonical byte form: category prefix, leader,
    /// parameters (`;` between groups, `:` between sub-values), intermediates,
    /// final character, and the data string terminated by ST.
    pub fn raw(&self) -> String {
        let mut out = String::new();

        match self.category {
            FunctionCategory::C0 => {}
            FunctionCategory::Esc => out.push('\x1b'),
            FunctionCategory::Csi => out.push_str("\x1b["),
            FunctionCategory::Dcs => out.push_str("\x1bP"),
            FunctionCategory::Osc => out.push_str("\x1b]"),
        }

        if let Some(leader) = self.leader {
            out.push(leader as char);
        }

        if self.has_explicit_parameters() {
            for (i, group) in self.parameters.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                for (k, value) in group.iter().enumerate() {
                    if k > 0 {
                        out.push(':');
                    }
                    out.push_str(&value.to_string());
                }
            }
        }

        if self.category == FunctionCategory::Osc {
            if !self.intermediates.is_empty() {
                out.push(';');
                out.push_str(&self.intermediates);
            }
            out.push_str("\x1b\\");
            return out;
        }

        out.push_str(&self.intermediates);

        if self.final_char != '\0' {
            out.push(self.final_char);
        }

        if !self.data_string.is_empty() {
            out.push_str(&self.data_string);
            out.push_str("\x1b\\");
        }

        out
    }

    /// Human-readable debug form, e.g. `CSI ? 25 h`
    pub fn text(&self) -> String {
        let mut out = self.category.to_string();

        if let Some(leader) = self.leader {
            out.push(' ');
            out.push(leader as char);
        }

        if self.has_explicit_parameters() {
            out.push(' ');
            for (i, group) in self.parameters.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                for (k, value) in group.iter().enumerate() {
                    if k > 0 {
                        out.push(':');
                    }
                    out.push_str(&value.to_string());
                }
            }
        }

        if !self.intermediates.is_empty() {
            out.push(' ');
            out.push_str(&self.intermediates);
        }

        if self.final_char != '\0' {
            out.push(' ');
            out.push(self.final_char);
        }

        if !self.data_string.is_empty() {
            out.push_str(" \"");
            for ch in self.data_string.chars() {
                out.extend(ch.escape_debug());
            }
            out.push_str("\" ST");
        }

        out
    }

    /// A single defaulted group serializes to nothing, matching the producer's
    /// view that `CSI H` and `CSI 0 H` are the same sequence.
    fn has_explicit_parameters(&self) -> bool {
        self.parameter_count() > 1
            || (self.parameter_count() == 1 && self.parameters[0] != [0])
    }
}
