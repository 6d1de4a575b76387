//! Sixel image assembly
//!
//! A DCS `q` hook feeds the payload through [`SixelParser`], which drives a
//! [`SixelImageBuilder`]: an RGBA canvas bounded by the configured maximum
//! image size. Color registers live in a [`Palette`] that is either shared
//! with the sequencer or private to the image (mode ?1070).
//!
//! The decoder covers the single-pass core of the format: data characters,
//! `!` repeat, `"` raster attributes, `#` color define/select, `$` and `-`.
//! Malformed input is logged and skipped; it never aborts the stream.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use thiserror::Error;

use crate::color::{Palette, Rgb, Rgba};
use crate::extension::{HookOutput, ParserExtension};
use crate::screen::Size;

/// A completed RGBA image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        ImageData {
            width,
            height,
            rgba,
        }
    }

    /// Read one pixel; out-of-range coordinates read transparent black
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        if x >= self.width || y >= self.height {
            return (0, 0, 0, 0);
        }
        let idx = ((y * self.width + x) * 4) as usize;
        match self.rgba.get(idx..idx + 4) {
            Some(px) => (px[0], px[1], px[2], px[3]),
            None => (0, 0, 0, 0),
        }
    }
}

/// Malformed sixel input; logged by the hook and skipped
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SixelError {
    #[error("{0:?} is not valid in sixel data")]
    InvalidCharacter(char),
    #[error("sixel repeat introducer without a count")]
    MissingRepeatCount,
    #[error("unsupported sixel color format {0}")]
    UnsupportedColorFormat(u32),
}

/// RGBA canvas for one sixel image, clamped to a maximum size.
///
/// The canvas allocates the full maximum up front and tracks the painted
/// extent; `take` crops to what was actually used.
pub struct SixelImageBuilder {
    max_size: Size,
    aspect_vertical: u32,
    background: Rgba,
    palette: Rc<RefCell<Palette>>,
    canvas: Vec<u8>,
    width: u32,
    height: u32,
}

impl SixelImageBuilder {
    pub fn new(
        max_size: Size,
        aspect_vertical: u32,
        background: Rgba,
        palette: Rc<RefCell<Palette>>,
    ) -> Self {
        let pixels = (max_size.width as usize) * (max_size.height as usize);
        let mut canvas = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            canvas.extend_from_slice(&[background.r, background.g, background.b, background.a]);
        }
        SixelImageBuilder {
            max_size,
            aspect_vertical: aspect_vertical.max(1),
            background,
            palette,
            canvas,
            width: 0,
            height: 0,
        }
    }

    pub fn aspect_vertical(&self) -> u32 {
        self.aspect_vertical
    }

    pub fn palette(&self) -> &Rc<RefCell<Palette>> {
        &self.palette
    }

    /// Grow the painted extent without writing pixels (raster attributes)
    pub fn hint_size(&mut self, width: u32, height: u32) {
        self.width = self.width.max(width.min(self.max_size.width));
        self.height = self.height.max(height.min(self.max_size.height));
    }

    /// Paint one pixel; writes outside the maximum size are dropped
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if x >= self.max_size.width || y >= self.max_size.height {
            return;
        }
        let idx = ((y * self.max_size.width + x) * 4) as usize;
        self.canvas[idx] = color.r;
        self.canvas[idx + 1] = color.g;
        self.canvas[idx + 2] = color.b;
        self.canvas[idx + 3] = 0xFF;
        self.width = self.width.max(x + 1);
        self.height = self.height.max(y + 1);
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Crop the canvas to the painted extent and hand the image out,
    /// resetting the builder.
    pub fn take(&mut self) -> ImageData {
        let width = self.width;
        let height = self.height;
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let start = ((y * self.max_size.width) * 4) as usize;
            rgba.extend_from_slice(&self.canvas[start..start + (width * 4) as usize]);
        }
        let background = self.background;
        for px in self.canvas.chunks_exact_mut(4) {
            px.copy_from_slice(&[background.r, background.g, background.b, background.a]);
        }
        self.width = 0;
        self.height = 0;
        ImageData::new(width, height, rgba)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    RepeatCount,
    ColorIntroducer,
    RasterAttributes,
}

/// Streaming sixel decoder feeding a [`SixelImageBuilder`]
pub struct SixelParser {
    builder: SixelImageBuilder,
    state: State,
    x: u32,
    y: u32,
    repeat: u32,
    color: Rgb,
    params: Vec<u32>,
}

impl SixelParser {
    pub fn new(builder: SixelImageBuilder) -> Self {
        let color = builder.palette().borrow().color(0);
        SixelParser {
            builder,
            state: State::Data,
            x: 0,
            y: 0,
            repeat: 1,
            color,
            params: Vec::new(),
        }
    }

    fn step(&mut self, ch: char) -> Result<(), SixelError> {
        match self.state {
            State::Data => self.data_char(ch),
            State::RepeatCount => match ch {
                '0'..='9' => {
                    self.accumulate(ch);
                    Ok(())
                }
                _ => {
                    let count = match self.params.first() {
                        Some(&count) => count,
                        None => return Err(SixelError::MissingRepeatCount),
                    };
                    self.repeat = count.max(1);
                    self.state = State::Data;
                    self.step(ch)
                }
            },
            State::ColorIntroducer => match ch {
                '0'..='9' => {
                    self.accumulate(ch);
                    Ok(())
                }
                ';' => {
                    self.params.push(0);
                    Ok(())
                }
                _ => {
                    let result = self.finish_color();
                    self.state = State::Data;
                    result?;
                    self.step(ch)
                }
            },
            State::RasterAttributes => match ch {
                '0'..='9' => {
                    self.accumulate(ch);
                    Ok(())
                }
                ';' => {
                    self.params.push(0);
                    Ok(())
                }
                _ => {
                    // "Pan;Pad;Ph;Pv - only the pixel extent matters here.
                    if self.params.len() >= 4 {
                        self.builder.hint_size(self.params[2], self.params[3]);
                    }
                    self.state = State::Data;
                    self.step(ch)
                }
            },
        }
    }

    fn accumulate(&mut self, ch: char) {
        if self.params.is_empty() {
            self.params.push(0);
        }
        if let Some(last) = self.params.last_mut() {
            *last = last
                .saturating_mul(10)
                .saturating_add(u32::from(ch as u8 - b'0'));
        }
    }

    fn data_char(&mut self, ch: char) -> Result<(), SixelError> {
        match ch {
            '!' => {
                self.params.clear();
                self.state = State::RepeatCount;
                Ok(())
            }
            '#' => {
                self.params.clear();
                self.params.push(0);
                self.state = State::ColorIntroducer;
                Ok(())
            }
            '"' => {
                self.params.clear();
                self.params.push(0);
                self.state = State::RasterAttributes;
                Ok(())
            }
            '$' => {
                self.x = 0;
                Ok(())
            }
            '-' => {
                self.x = 0;
                self.y += 6 * self.builder.aspect_vertical();
                Ok(())
            }
            '?'..='~' => {
                self.paint(ch as u8 - 0x3F);
                Ok(())
            }
            '\n' | '\r' | '\x1b' => Ok(()),
            _ => Err(SixelError::InvalidCharacter(ch)),
        }
    }

    /// Paint one sixel column (six vertical pixels), `repeat` times
    fn paint(&mut self, bits: u8) {
        let aspect = self.builder.aspect_vertical();
        for _ in 0..self.repeat {
            for bit in 0..6 {
                if bits & (1 << bit) != 0 {
                    let base = self.y + bit * aspect;
                    for row in 0..aspect {
                        self.builder.set_pixel(self.x, base + row, self.color);
                    }
                }
            }
            self.x += 1;
        }
        self.repeat = 1;
    }

    /// `#Pc` selects a register; `#Pc;2;Pr;Pg;Pb` defines one (RGB percent)
    fn finish_color(&mut self) -> Result<(), SixelError> {
        let params = std::mem::take(&mut self.params);
        let register = params.first().copied().unwrap_or(0) as usize;
        if params.len() >= 5 {
            match params[1] {
                2 => {
                    let scale = |v: u32| ((v.min(100) * 255) / 100) as u8;
                    let color = Rgb::new(scale(params[2]), scale(params[3]), scale(params[4]));
                    self.builder.palette().borrow_mut().set_color(register, color);
                }
                format => return Err(SixelError::UnsupportedColorFormat(format)),
            }
        }
        self.color = self.builder.palette().borrow().color(register);
        Ok(())
    }
}

impl ParserExtension for SixelParser {
    fn start(&mut self) {
        self.state = State::Data;
        self.x = 0;
        self.y = 0;
        self.repeat = 1;
        self.params.clear();
    }

    fn pass(&mut self, ch: char) {
        if let Err(err) = self.step(ch) {
            debug!("sixel: {err}");
            self.state = State::Data;
        }
    }

    fn finalize(&mut self) -> HookOutput {
        // Close any still-open introducer so trailing colors count.
        if self.state == State::ColorIntroducer {
            if let Err(err) = self.finish_color() {
                warn!("sixel: {err}");
            }
            self.state = State::Data;
        }
        HookOutput::Image(self.builder.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(max: Size) -> SixelParser {
        let palette = Rc::new(RefCell::new(Palette::default()));
        SixelParser::new(SixelImageBuilder::new(max, 1, Rgba::TRANSPARENT, palette))
    }

    fn feed(parser: &mut SixelParser, input: &str) {
        for ch in input.chars() {
            parser.pass(ch);
        }
    }

    fn image(parser: &mut SixelParser) -> ImageData {
        match parser.finalize() {
            HookOutput::Image(image) => image,
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_single_column() {
        let mut p = parser(Size::new(10, 10));
        p.start();
        // Define register 1 as pure red, select it, paint all six bits.
        feed(&mut p, "#1;2;100;0;0~");
        let img = image(&mut p);
        assert_eq!(img.width, 1);
        assert_eq!(img.height, 6);
        for y in 0..6 {
            assert_eq!(img.pixel(0, y), (255, 0, 0, 255));
        }
    }

    #[test]
    fn test_repeat() {
        let mut p = parser(Size::new(10, 10));
        p.start();
        // '@' paints only the top bit; repeated 4 times.
        feed(&mut p, "#1;2;0;100;0!4@");
        let img = image(&mut p);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 1);
        for x in 0..4 {
            assert_eq!(img.pixel(x, 0), (0, 255, 0, 255));
        }
    }

    #[test]
    fn test_carriage_return_and_newline() {
        let mut p = parser(Size::new(10, 20));
        p.start();
        // Paint, return to column 0, then next sixel row.
        feed(&mut p, "#1;2;0;0;100@$@-@");
        let img = image(&mut p);
        assert_eq!(img.pixel(0, 0), (0, 0, 255, 255));
        assert_eq!(img.pixel(0, 6), (0, 0, 255, 255));
        assert_eq!(img.height, 7);
    }

    #[test]
    fn test_raster_attributes_hint_size() {
        let mut p = parser(Size::new(100, 100));
        p.start();
        feed(&mut p, "\"1;1;8;12@");
        let img = image(&mut p);
        assert_eq!(img.width, 8);
        assert_eq!(img.height, 12);
    }

    #[test]
    fn test_clamped_to_max_size() {
        let mut p = parser(Size::new(2, 6));
        p.start();
        feed(&mut p, "#1;2;100;100;100!10~-~");
        let img = image(&mut p);
        assert_eq!(img.width, 2);
        assert_eq!(img.height, 6);
    }

    #[test]
    fn test_invalid_character_skipped() {
        let mut p = parser(Size::new(10, 10));
        p.start();
        feed(&mut p, "\u{1}@");
        let img = image(&mut p);
        assert_eq!(img.width, 1);
    }

    #[test]
    fn test_shared_palette_persists_definitions() {
        let palette = Rc::new(RefCell::new(Palette::default()));
        let builder = SixelImageBuilder::new(
            Size::new(4, 6),
            1,
            Rgba::TRANSPARENT,
            Rc::clone(&palette),
        );
        let mut p = SixelParser::new(builder);
        p.start();
        feed(&mut p, "#9;2;100;0;100@");
        let _ = image(&mut p);
        assert_eq!(palette.borrow().color(9), Rgb::new(255, 0, 255));
    }

    #[test]
    fn test_vertical_aspect_scales_rows() {
        let palette = Rc::new(RefCell::new(Palette::default()));
        let builder = SixelImageBuilder::new(Size::new(4, 20), 2, Rgba::TRANSPARENT, palette);
        let mut p = SixelParser::new(builder);
        p.start();
        feed(&mut p, "#1;2;100;0;0C");
        // 'C' = 0x43 - 0x3F = bits 0b100: bit 2 set, doubled vertically.
        let img = image(&mut p);
        assert_eq!(img.pixel(0, 4), (255, 0, 0, 255));
        assert_eq!(img.pixel(0, 5), (255, 0, 0, 255));
        assert_eq!(img.pixel(0, 3), (0, 0, 0, 0));
    }
}
