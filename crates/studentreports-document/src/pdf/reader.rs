// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspection: page count and physical page size of an in-memory PDF,
// using the `lopdf` crate.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};

use studentreports_core::error::{ReportError, Result};

/// How far up the page tree inheritable attributes are looked for.
const MAX_TREE_DEPTH: usize = 32;

/// Native size of one page in PDF points, after `/Rotate` is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// A parsed PDF whose pages can be measured.
pub struct PdfInspector {
    document: Document,
}

impl PdfInspector {
    /// Parse PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|e| ReportError::DocumentCorrupt(format!("failed to parse PDF: {e}")))?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Size of every page, in page order.
    ///
    /// A document without pages, or a page without a usable MediaBox, is
    /// corrupt.
    pub fn page_sizes(&self) -> Result<Vec<PageSize>> {
        let pages = self.document.get_pages();
        if pages.is_empty() {
            return Err(ReportError::DocumentCorrupt("document has no pages".into()));
        }
        // `get_pages` is keyed by 1-based page number, so values iterate in order.
        pages
            .iter()
            .map(|(&number, &id)| self.page_size(number, id))
            .collect()
    }

    fn page_size(&self, number: u32, id: ObjectId) -> Result<PageSize> {
        let corrupt = |reason: String| ReportError::DocumentCorrupt(format!("page {number}: {reason}"));

        let media_box = self
            .inherited(id, b"MediaBox")
            .ok_or_else(|| corrupt("no MediaBox".into()))?;
        let values = self
            .document
            .dereference(media_box)
            .ok()
            .and_then(|(_, obj)| obj.as_array().ok())
            .ok_or_else(|| corrupt("MediaBox is not an array".into()))?;
        if values.len() != 4 {
            return Err(corrupt(format!("MediaBox has {} entries", values.len())));
        }
        let mut rect = [0.0f32; 4];
        for (slot, value) in rect.iter_mut().zip(values) {
            *slot = self
                .number(value)
                .ok_or_else(|| corrupt("MediaBox entry is not a number".into()))?;
        }

        let width = (rect[2] - rect[0]).abs();
        let height = (rect[3] - rect[1]).abs();
        if !(width > 0.0 && height > 0.0) {
            return Err(corrupt(format!("degenerate MediaBox {width}x{height}")));
        }

        let rotate = self
            .inherited(id, b"Rotate")
            .and_then(|obj| self.number(obj))
            .map(|deg| deg as i64)
            .unwrap_or(0);
        let size = if rotate.rem_euclid(180) == 90 {
            PageSize {
                width_pt: height,
                height_pt: width,
            }
        } else {
            PageSize {
                width_pt: width,
                height_pt: height,
            }
        };
        Ok(size)
    }

    /// Look `key` up on the page, then on each ancestor `/Pages` node.
    fn inherited(&self, page: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.document.get_dictionary(page).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            current = self.parent(current)?;
        }
        None
    }

    fn parent(&self, node: &Dictionary) -> Option<&Dictionary> {
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        self.document.get_dictionary(parent).ok()
    }

    fn number(&self, obj: &Object) -> Option<f32> {
        match self.document.dereference(obj).ok()?.1 {
            Object::Integer(v) => Some(*v as f32),
            Object::Real(v) => Some(*v as f32),
            _ => None,
        }
    }
}
