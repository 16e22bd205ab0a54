//! Glyph sources for the text rasterizer.
//!
//! The rasterizer only needs per-character coverage bitmaps and a few line
//! metrics, so it talks to fonts through the small [`GlyphSource`] trait.
//!
//! | Source | Availability | Look |
//! |--------|--------------|------|
//! | [`BitmapFont`] | Always | 5x7 block capitals, crisp pixel edges |
//! | `OutlineFont` | feature `fontdue` | Any TTF/OTF file, antialiased |
//!
//! The bitmap font exists so an engine can always be mounted, even with no
//! font file on disk. It covers `A-Z`, `0-9` and `! ? . , - ' : / & +`.
//! Lowercase letters are drawn as capitals and anything else is blank space.

/// A rasterized glyph.
///
/// `coverage` is row-major, `width * height` bytes, 0 = empty, 255 = solid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
    /// Horizontal offset from the pen position to the bitmap's left edge.
    pub left: f32,
    /// Vertical offset from the line's top edge to the bitmap's top edge.
    pub top: f32,
    /// How far the pen moves after this glyph.
    pub advance: f32,
}

impl Glyph {
    /// A glyph that draws nothing but still advances the pen.
    pub fn blank(advance: f32) -> Self {
        Self {
            advance,
            ..Default::default()
        }
    }

    /// Coverage at `(x, y)`, 0 outside the bitmap.
    #[inline]
    pub fn coverage_at(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage[y * self.width + x]
    }
}

/// Vertical metrics of one text line at a given pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Distance from the line top to the baseline.
    pub ascent: f32,
    /// Distance from the baseline to the line bottom (positive).
    pub descent: f32,
}

impl LineMetrics {
    #[inline]
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Anything that can turn characters into coverage bitmaps.
pub trait GlyphSource {
    /// Rasterize `ch` at `px` pixels per em.
    fn glyph(&self, ch: char, px: f32) -> Glyph;

    /// Line metrics at `px` pixels per em.
    fn line_metrics(&self, px: f32) -> LineMetrics;

    /// How far the pen moves after `ch` at `px`.
    ///
    /// The default rasterizes the glyph; sources that know their metrics
    /// should override it.
    fn advance(&self, ch: char, px: f32) -> f32 {
        self.glyph(ch, px).advance
    }

    /// Total advance of `line` at `px`.
    fn measure(&self, line: &str, px: f32) -> f32 {
        line.chars().map(|c| self.advance(c, px)).sum()
    }
}

// ========== Bitmap font ==========

const GLYPH_COLS: usize = 5;
const GLYPH_ROWS: usize = 7;
/// Cells per em. A 100 px font draws 10 px cells.
const CELLS_PER_EM: f32 = 10.0;
/// Advance in cells, one column of spacing after each glyph.
const ADVANCE_CELLS: f32 = 6.0;

/// Built-in 5x7 block font.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFont;

impl BitmapFont {
    pub fn new() -> Self {
        Self
    }

    /// Row bits for a character, bit 4 is the leftmost column.
    fn rows(ch: char) -> Option<[u8; GLYPH_ROWS]> {
        let rows = match ch.to_ascii_uppercase() {
            'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
            'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
            'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
            'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
            'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
            'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
            'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
            'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
            'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
            'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
            'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
            'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
            'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
            'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
            'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
            'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
            'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
            'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
            'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
            'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
            'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
            'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
            'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
            'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
            'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
            'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
            '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
            '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
            '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
            '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
            '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
            '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
            '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
            '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
            '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
            '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
            '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
            '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
            '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
            ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000],
            '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
            '\'' => [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
            ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
            '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
            '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
            '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
            _ => return None,
        };
        Some(rows)
    }

    /// Whether `ch` has a visible glyph.
    pub fn covers(ch: char) -> bool {
        Self::rows(ch).is_some()
    }

    fn cell(px: f32) -> usize {
        (px / CELLS_PER_EM).floor().max(1.0) as usize
    }
}

impl GlyphSource for BitmapFont {
    fn glyph(&self, ch: char, px: f32) -> Glyph {
        let cell = Self::cell(px);
        let advance = ADVANCE_CELLS * cell as f32;

        let Some(rows) = Self::rows(ch) else {
            return Glyph::blank(advance);
        };

        let width = GLYPH_COLS * cell;
        let height = GLYPH_ROWS * cell;
        let mut coverage = vec![0u8; width * height];

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..cell {
                    let y = row * cell + dy;
                    let start = y * width + col * cell;
                    coverage[start..start + cell].fill(255);
                }
            }
        }

        Glyph {
            width,
            height,
            coverage,
            left: 0.0,
            top: 0.0,
            advance,
        }
    }

    fn line_metrics(&self, px: f32) -> LineMetrics {
        LineMetrics {
            ascent: (GLYPH_ROWS * Self::cell(px)) as f32,
            descent: 0.0,
        }
    }

    fn advance(&self, _ch: char, px: f32) -> f32 {
        ADVANCE_CELLS * Self::cell(px) as f32
    }
}

// ========== Outline font ==========

/// A TTF/OTF font rasterized with `fontdue`.
#[cfg(feature = "fontdue")]
pub struct OutlineFont {
    font: fontdue::Font,
}

#[cfg(feature = "fontdue")]
impl OutlineFont {
    /// Parse font data.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, crate::error::FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(crate::error::FontError::Parse)?;
        Ok(Self { font })
    }

    /// Read and parse a font file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::FontError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }
}

#[cfg(feature = "fontdue")]
impl GlyphSource for OutlineFont {
    fn glyph(&self, ch: char, px: f32) -> Glyph {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        let line = self.line_metrics(px);
        // fontdue's ymin is the bitmap bottom relative to the baseline, y up
        let top = line.ascent - (metrics.ymin as f32 + metrics.height as f32);
        Glyph {
            width: metrics.width,
            height: metrics.height,
            coverage,
            left: metrics.xmin as f32,
            top,
            advance: metrics.advance_width,
        }
    }

    fn line_metrics(&self, px: f32) -> LineMetrics {
        match self.font.horizontal_line_metrics(px) {
            Some(m) => LineMetrics {
                ascent: m.ascent,
                descent: -m.descent,
            },
            None => LineMetrics {
                ascent: px * 0.8,
                descent: px * 0.2,
            },
        }
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font.metrics(ch, px).advance_width
    }
}

/// Glyph source for an optional font file.
///
/// Falls back to the bitmap font, with a warning, when there is no path, the
/// file cannot be loaded, or outline fonts are not compiled in.
pub fn load_glyphs(path: Option<&std::path::Path>) -> Box<dyn GlyphSource> {
    let Some(path) = path else {
        return Box::new(BitmapFont::new());
    };

    #[cfg(feature = "fontdue")]
    {
        match OutlineFont::load(path) {
            Ok(font) => {
                log::debug!("Loaded outline font {}", path.display());
                return Box::new(font);
            }
            Err(e) => log::warn!("{}: {}, using the bitmap font", path.display(), e),
        }
    }
    #[cfg(not(feature = "fontdue"))]
    log::warn!(
        "Font {} ignored: built without the `fontdue` feature",
        path.display()
    );

    Box::new(BitmapFont::new())
}
