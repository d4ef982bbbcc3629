// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Receipt layout arithmetic, kept free of PDF types so it can be tested alone.
//
// All lengths are PDF points measured from the top of the page downwards.

use std::ops::Range;

use studentreports_core::error::{ReportError, Result};
use studentreports_core::types::{MM_PER_INCH, POINTS_PER_INCH};

use crate::template::{Alignment, ReportTemplate};

/// Tallest page a PDF viewer or spooler is required to accept (200 in).
pub const MAX_PAGE_HEIGHT_PT: f32 = 200.0 * POINTS_PER_INCH;

/// Horizontal breathing room inside each table cell.
pub const CELL_PADDING_PT: f32 = 1.0;

const ELLIPSIS: &str = "...";

pub fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_INCH * POINTS_PER_INCH
}

pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_INCH * MM_PER_INCH
}

/// Vertical and horizontal measurements derived from a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub page_width_pt: f32,
    pub padding_pt: f32,
    pub font_pt: f32,
    pub line_pt: f32,
    pub title_font_pt: f32,
    /// Zero when the template has no title.
    pub title_line_pt: f32,
    /// Zero when the template has no logo.
    pub logo_pt: f32,
    /// Space between the header block and the table.
    pub gap_pt: f32,
    /// Space taken by the rule under the column headings.
    pub rule_pt: f32,
}

impl Metrics {
    pub fn new(template: &ReportTemplate, page_width_pt: f32) -> Self {
        let style = &template.style;
        let has_title = template.header.title_parameter.is_some();
        let has_logo = template.header.logo_parameter.is_some();
        Self {
            page_width_pt,
            padding_pt: mm_to_pt(style.padding_mm),
            font_pt: style.font_size_pt,
            line_pt: style.font_size_pt * 1.25 + mm_to_pt(style.row_spacing_mm),
            title_font_pt: style.title_font_size_pt,
            title_line_pt: if has_title { style.title_font_size_pt * 1.5 } else { 0.0 },
            logo_pt: if has_logo { mm_to_pt(template.header.logo_height_mm) } else { 0.0 },
            gap_pt: if has_title || has_logo { mm_to_pt(2.0) } else { 0.0 },
            rule_pt: 2.0,
        }
    }

    /// Logo, title and the gap below them. Only the first page carries it.
    pub fn preamble_pt(&self) -> f32 {
        self.logo_pt + self.title_line_pt + self.gap_pt
    }

    /// Column headings plus the rule below them. Repeated on every page.
    pub fn table_header_pt(&self) -> f32 {
        self.line_pt + self.rule_pt
    }

    /// Everything on a page except the data rows.
    pub fn fixed_pt(&self, first: bool) -> f32 {
        let preamble = if first { self.preamble_pt() } else { 0.0 };
        2.0 * self.padding_pt + preamble + self.table_header_pt()
    }

    pub fn printable_width_pt(&self) -> f32 {
        (self.page_width_pt - 2.0 * self.padding_pt).max(0.0)
    }
}

/// The rows one page holds and how tall the page is.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice {
    /// The first page carries the logo and title.
    pub first: bool,
    pub rows: Range<usize>,
    pub height_pt: f32,
}

/// Split `row_count` rows into pages.
///
/// With `fixed_height_pt` every page has that height. Without it each page is
/// as tall as its content, up to [`MAX_PAGE_HEIGHT_PT`]. Zero rows still give
/// one page carrying only the header.
pub fn paginate(
    metrics: &Metrics,
    row_count: usize,
    fixed_height_pt: Option<f32>,
) -> Result<Vec<PageSlice>> {
    let limit = fixed_height_pt.unwrap_or(MAX_PAGE_HEIGHT_PT);
    let mut pages = Vec::new();
    let mut start = 0;

    loop {
        let first = pages.is_empty();
        let fixed = metrics.fixed_pt(first);
        let room = ((limit - fixed) / metrics.line_pt).floor();
        if room < 1.0 && (row_count > start || fixed > limit) {
            return Err(ReportError::RenderFailed(format!(
                "page height {:.1} mm cannot hold the header and one row",
                pt_to_mm(limit)
            )));
        }

        let end = (start + room as usize).min(row_count);
        let height_pt = match fixed_height_pt {
            Some(h) => h,
            None => fixed + (end - start) as f32 * metrics.line_pt,
        };
        pages.push(PageSlice {
            first,
            rows: start..end,
            height_pt,
        });

        if end >= row_count {
            return Ok(pages);
        }
        start = end;
    }
}

/// Left edge and width of every column, in template order.
pub fn column_bounds(template: &ReportTemplate, metrics: &Metrics) -> Vec<(f32, f32)> {
    let total = template.total_column_width();
    let printable = metrics.printable_width_pt();
    let mut x = metrics.padding_pt;
    template
        .columns
        .iter()
        .map(|column| {
            let width = printable * column.width / total;
            let bounds = (x, width);
            x += width;
            bounds
        })
        .collect()
}

/// Horizontal advance of individual characters in a font face.
pub trait Measure {
    fn advance_pt(&self, c: char, font_pt: f32) -> f32;

    fn width_pt(&self, text: &str, font_pt: f32) -> f32 {
        text.chars().map(|c| self.advance_pt(c, font_pt)).sum()
    }
}

/// The built-in Helvetica face, measured from its AFM widths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

/// Advance widths of U+0020..=U+007E in 1/1000 em.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Width used for Latin-1 letters outside ASCII.
const HELVETICA_DEFAULT: u16 = 556;

impl Measure for Helvetica {
    fn advance_pt(&self, c: char, font_pt: f32) -> f32 {
        let units = match c {
            ' '..='~' => HELVETICA_ASCII[c as usize - 0x20],
            _ => HELVETICA_DEFAULT,
        };
        f32::from(units) / 1000.0 * font_pt
    }
}

/// Characters outside the Latin-1 range that WinAnsiEncoding still maps.
const WIN_ANSI_EXTRAS: &[char] = &[
    '€', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', 'Ž', '‘', '’', '“', '”', '•',
    '–', '—', '˜', '™', 'š', '›', 'œ', 'ž', 'Ÿ',
];

/// Whether the built-in Type1 faces can show `c`.
pub fn is_win_ansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}') || WIN_ANSI_EXTRAS.contains(&c)
}

/// Collapse line breaks and other control characters to spaces; a cell is
/// one line.
pub fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Cut `text` so it fits `width_pt`, marking the cut with an ellipsis.
pub fn fit_text(text: &str, width_pt: f32, font_pt: f32, face: &dyn Measure) -> String {
    if face.width_pt(text, font_pt) <= width_pt {
        return text.to_string();
    }

    let ellipsis_pt = face.width_pt(ELLIPSIS, font_pt);
    let (budget, marker) = if ellipsis_pt < width_pt {
        (width_pt - ellipsis_pt, ELLIPSIS)
    } else {
        (width_pt, "")
    };

    let mut cut = String::new();
    let mut used = 0.0;
    for c in text.chars() {
        let advance = face.advance_pt(c, font_pt);
        if used + advance > budget {
            break;
        }
        used += advance;
        cut.push(c);
    }
    if !marker.is_empty() {
        cut.truncate(cut.trim_end().len());
        cut.push_str(marker);
    }
    cut
}

/// Horizontal start of `text` inside a cell.
pub fn aligned_x(
    align: Alignment,
    cell_x: f32,
    cell_width: f32,
    text_width_pt: f32,
) -> f32 {
    let inner_x = cell_x + CELL_PADDING_PT;
    let inner_width = (cell_width - 2.0 * CELL_PADDING_PT).max(0.0);
    let slack = (inner_width - text_width_pt).max(0.0);
    match align {
        Alignment::Left => inner_x,
        Alignment::Center => inner_x + slack / 2.0,
        Alignment::Right => inner_x + slack,
    }
}
