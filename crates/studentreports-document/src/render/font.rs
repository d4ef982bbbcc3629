// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text faces: the built-in Helvetica pair, or TrueType fonts named by the
// template and embedded in the document.

use std::path::Path;

use printpdf::{BuiltinFont, FontId, Op, ParsedFont, PdfDocument, PdfWarnMsg, Pt, TextItem};
use tracing::debug;

use studentreports_core::error::{ReportError, Result};

use super::layout::{Helvetica, Measure, is_win_ansi};
use crate::template::FontFaces;

/// One face text can be written in.
pub enum TextFace {
    Builtin(BuiltinFont),
    Embedded {
        id: FontId,
        font: Box<ParsedFont>,
        /// File name, for error messages.
        name: String,
    },
}

impl TextFace {
    /// Parse a TrueType/OpenType file and register it with `doc`.
    pub fn embed(doc: &mut PdfDocument, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| ReportError::RenderFailed(format!("font {}: {e}", path.display())))?;
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let font = ParsedFont::from_bytes(&bytes, 0, &mut warnings).ok_or_else(|| {
            ReportError::RenderFailed(format!("font {}: not a usable TrueType font", path.display()))
        })?;
        let id = doc.add_font(&font);
        debug!(path = %path.display(), warnings = warnings.len(), "font embedded");
        Ok(Self::Embedded {
            id,
            font: Box::new(font),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        })
    }

    pub fn name(&self) -> String {
        match self {
            Self::Builtin(font) => format!("{font:?}"),
            Self::Embedded { name, .. } => name.clone(),
        }
    }

    /// Whether the face has a glyph for `c`.
    pub fn covers(&self, c: char) -> bool {
        match self {
            Self::Builtin(_) => is_win_ansi(c),
            Self::Embedded { font, .. } => font.lookup_glyph_index(c as u32).is_some(),
        }
    }

    /// The first character of `text` the face cannot show.
    pub fn first_uncovered(&self, text: &str) -> Option<char> {
        text.chars().find(|&c| !self.covers(c))
    }

    /// Select the face at `size` and write `text` at the current cursor.
    pub fn write_ops(&self, text: &str, size: f32) -> [Op; 2] {
        let items = vec![TextItem::Text(text.to_string())];
        match self {
            Self::Builtin(font) => [
                Op::SetFontSizeBuiltinFont {
                    size: Pt(size),
                    font: *font,
                },
                Op::WriteTextBuiltinFont { items, font: *font },
            ],
            Self::Embedded { id, .. } => [
                Op::SetFontSize {
                    size: Pt(size),
                    font: id.clone(),
                },
                Op::WriteText {
                    items,
                    font: id.clone(),
                },
            ],
        }
    }
}

impl Measure for TextFace {
    fn advance_pt(&self, c: char, font_pt: f32) -> f32 {
        match self {
            Self::Builtin(_) => Helvetica.advance_pt(c, font_pt),
            Self::Embedded { font, .. } => {
                let units_per_em = f32::from(font.font_metrics.units_per_em.max(1));
                font.lookup_glyph_index(c as u32)
                    .map(|glyph| f32::from(font.get_horizontal_advance(glyph)) / units_per_em * font_pt)
                    .unwrap_or(0.0)
            }
        }
    }
}

/// The regular face used for cells and the bold face used for the title
/// and column headings.
pub struct Faces {
    pub regular: TextFace,
    pub bold: TextFace,
}

impl Faces {
    /// Embed the template's fonts. A missing bold face reuses the regular file.
    pub fn load(doc: &mut PdfDocument, fonts: &FontFaces) -> Result<Self> {
        let regular = match &fonts.regular {
            Some(path) => TextFace::embed(doc, path)?,
            None => TextFace::Builtin(BuiltinFont::Helvetica),
        };
        let bold = match (&fonts.bold, &fonts.regular) {
            (Some(path), _) | (None, Some(path)) => TextFace::embed(doc, path)?,
            (None, None) => TextFace::Builtin(BuiltinFont::HelveticaBold),
        };
        Ok(Self { regular, bold })
    }

    pub fn builtin() -> Self {
        Self {
            regular: TextFace::Builtin(BuiltinFont::Helvetica),
            bold: TextFace::Builtin(BuiltinFont::HelveticaBold),
        }
    }
}
