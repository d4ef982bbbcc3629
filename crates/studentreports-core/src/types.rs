// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Domain types flowing through the fetch → render → print pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Millimetres per inch.
pub const MM_PER_INCH: f32 = 25.4;

/// PDF user-space units (points) per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single column value as read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Text shown in a report cell. Null renders as the empty string and
    /// blobs as lowercase hex.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(v) => v.to_string(),
            Self::Real(v) => v.to_string(),
            Self::Text(v) => v.clone(),
            Self::Blob(v) => hex::encode(v),
        }
    }
}

/// One student row, kept as ordered `(column, value)` pairs.
///
/// The pipeline never interprets the columns; the report template decides
/// which ones are shown and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    columns: Vec<(String, FieldValue)>,
}

impl StudentRecord {
    pub fn new(columns: Vec<(String, FieldValue)>) -> Self {
        Self { columns }
    }

    /// Look up a column by name. Column names compare case-insensitively, as
    /// SQL identifiers do.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Cell text for `column`; empty when the column is absent.
    pub fn display(&self, column: &str) -> String {
        self.get(column).map(FieldValue::display).unwrap_or_default()
    }

    pub fn columns(&self) -> &[(String, FieldValue)] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Rows bound to a template's single named tabular slot.
#[derive(Debug, Clone)]
pub struct DataSource {
    pub name: String,
    pub rows: Vec<StudentRecord>,
}

impl DataSource {
    pub fn new(name: impl Into<String>, rows: Vec<StudentRecord>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Named report parameters (parameter name → string value).
pub type ReportParameters = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Rendered output
// ---------------------------------------------------------------------------

/// A complete PDF held in memory.
///
/// Produced once per request and moved into the print dispatcher, which
/// consumes it. It is never written to disk.
#[derive(Debug)]
pub struct RenderedDocument {
    bytes: Vec<u8>,
    page_count: usize,
    digest: String,
}

impl RenderedDocument {
    pub fn new(bytes: Vec<u8>, page_count: usize) -> Self {
        let digest = crate::integrity::digest(&bytes);
        Self {
            bytes,
            page_count,
            digest,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Page count as laid out by the renderer.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// SHA-256 of the PDF bytes, lowercase hex.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

/// Name of a logical printer device known to the host print subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrinterTarget(String);

impl PrinterTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrinterTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Paper height of a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperHeight {
    /// Continuous roll: each page is as tall as its content.
    Dynamic,
    /// Cut sheet of the given height, in hundredths of a millimetre.
    Fixed(u32),
}

/// Paper size and margins asserted on every print job.
///
/// Lengths are in hundredths of a millimetre, the unit IPP uses for
/// `media-size` and the media margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperGeometry {
    pub width_hmm: u32,
    pub height: PaperHeight,
    pub margin_top_hmm: u32,
    pub margin_bottom_hmm: u32,
    pub margin_left_hmm: u32,
    pub margin_right_hmm: u32,
}

impl PaperGeometry {
    /// A receipt roll of the given width with dynamic height and no margins.
    /// Widths beyond `u32::MAX` hundredths of a millimetre saturate.
    pub fn roll(width_mm: u32) -> Self {
        Self {
            width_hmm: width_mm.saturating_mul(100),
            height: PaperHeight::Dynamic,
            margin_top_hmm: 0,
            margin_bottom_hmm: 0,
            margin_left_hmm: 0,
            margin_right_hmm: 0,
        }
    }

    /// Width of the printable area (paper width minus side margins) in
    /// PDF points.
    pub fn printable_width_pt(&self) -> f32 {
        let hmm = self
            .width_hmm
            .saturating_sub(self.margin_left_hmm + self.margin_right_hmm);
        hmm_to_pt(hmm)
    }
}

impl Default for PaperGeometry {
    fn default() -> Self {
        Self::roll(80)
    }
}

/// Convert hundredths of a millimetre to PDF points.
pub fn hmm_to_pt(hmm: u32) -> f32 {
    hmm as f32 / 100.0 / MM_PER_INCH * POINTS_PER_INCH
}

/// Convert PDF points to hundredths of a millimetre, rounded.
pub fn pt_to_hmm(pt: f32) -> u32 {
    (pt / POINTS_PER_INCH * MM_PER_INCH * 100.0).round().max(0.0) as u32
}

/// Unique identifier for a dispatched print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a print job accepted by the spooler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintReceipt {
    pub job_id: JobId,
    /// Job number assigned by the spooler (IPP `job-id`).
    pub spooler_job_id: i32,
    pub printer: PrinterTarget,
    /// Physical pages emitted; always equals the document's page count.
    pub pages: usize,
    pub document_digest: String,
    pub submitted_at: DateTime<Utc>,
}
