// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report-definition model.
//
// A template is a small, versioned JSON document describing one tabular
// receipt: the name of its data slot, the parameters it expects, the header
// block and the columns. Loading validates structure; binding validates that
// the caller supplies exactly what the template declares.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use studentreports_core::error::{ReportError, Result};
use studentreports_core::types::{DataSource, ReportParameters};

/// The only template format revision this renderer understands.
pub const TEMPLATE_VERSION: u32 = 1;

/// Prefix marking a parameter value as a local image file reference.
const FILE_REFERENCE_PREFIX: &str = "File:";

/// A parsed, structurally valid report definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportTemplate {
    pub version: u32,
    pub name: String,
    /// Name of the single tabular data slot.
    pub dataset: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    pub header: HeaderLayout,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub style: TextStyle,
    /// TrueType files to write text in. Absent faces use built-in Helvetica,
    /// which covers Western European text only.
    #[serde(default)]
    pub fonts: FontFaces,
    /// Fixed page height. Absent means one continuous page sized to content.
    #[serde(default)]
    pub page_height_mm: Option<f32>,
}

/// Font files, relative to the template's directory when loaded from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontFaces {
    #[serde(default)]
    pub regular: Option<PathBuf>,
    /// Title and column headings. Falls back to `regular`.
    #[serde(default)]
    pub bold: Option<PathBuf>,
}

impl FontFaces {
    fn resolve_against(&mut self, base: &Path) {
        for face in [&mut self.regular, &mut self.bold].into_iter().flatten() {
            *face = base.join(&*face);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: ParameterKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    #[default]
    Text,
    /// The value is an image reference such as `File:/srv/imgs/Logo.png`.
    Image,
}

/// What sits above the table on the first page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderLayout {
    #[serde(default)]
    pub title_parameter: Option<String>,
    #[serde(default)]
    pub logo_parameter: Option<String>,
    #[serde(default = "default_logo_height_mm")]
    pub logo_height_mm: f32,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self {
            title_parameter: None,
            logo_parameter: None,
            logo_height_mm: default_logo_height_mm(),
        }
    }
}

fn default_logo_height_mm() -> f32 {
    16.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDefinition {
    /// Record column whose value fills the cell (case-insensitive).
    pub field: String,
    pub header: String,
    /// Relative width; columns share the printable width in proportion.
    #[serde(default = "default_column_width")]
    pub width: f32,
    #[serde(default)]
    pub align: Alignment,
}

fn default_column_width() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TextStyle {
    pub font_size_pt: f32,
    pub title_font_size_pt: f32,
    /// Extra vertical space added to every table line.
    pub row_spacing_mm: f32,
    /// Horizontal inset of the table from the paper edge.
    pub padding_mm: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size_pt: 7.5,
            title_font_size_pt: 11.0,
            row_spacing_mm: 1.2,
            padding_mm: 2.0,
        }
    }
}

impl ReportTemplate {
    /// Read and validate a template file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReportError::TemplateNotFound(path.to_path_buf()),
            _ => ReportError::Io(e),
        })?;
        let mut template = Self::from_json(&raw)?;
        if let Some(dir) = path.parent() {
            template.fonts.resolve_against(dir);
        }
        debug!(
            name = %template.name,
            columns = template.columns.len(),
            "template loaded"
        );
        Ok(template)
    }

    /// Parse and validate a template from JSON bytes.
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let template: Self = serde_json::from_slice(raw)
            .map_err(|e| ReportError::TemplateInvalid(format!("parse: {e}")))?;
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(ReportError::TemplateInvalid(reason));

        if self.version != TEMPLATE_VERSION {
            return invalid(format!(
                "unsupported version {} (expected {TEMPLATE_VERSION})",
                self.version
            ));
        }
        if self.dataset.trim().is_empty() {
            return invalid("dataset name is empty".into());
        }
        if self.columns.is_empty() {
            return invalid("no columns declared".into());
        }
        for column in &self.columns {
            if !(column.width.is_finite() && column.width > 0.0) {
                return invalid(format!(
                    "column `{}` has non-positive width {}",
                    column.field, column.width
                ));
            }
        }

        let mut seen = BTreeSet::new();
        for parameter in &self.parameters {
            if !seen.insert(parameter.name.as_str()) {
                return invalid(format!("parameter `{}` declared twice", parameter.name));
            }
        }
        if let Some(title) = &self.header.title_parameter {
            self.expect_parameter(title, ParameterKind::Text)?;
        }
        if let Some(logo) = &self.header.logo_parameter {
            self.expect_parameter(logo, ParameterKind::Image)?;
            if !(self.header.logo_height_mm.is_finite() && self.header.logo_height_mm > 0.0) {
                return invalid(format!(
                    "logo height {} must be positive",
                    self.header.logo_height_mm
                ));
            }
        }

        let style = &self.style;
        if !(style.font_size_pt > 0.0 && style.title_font_size_pt > 0.0) {
            return invalid("font sizes must be positive".into());
        }
        if style.row_spacing_mm < 0.0 || style.padding_mm < 0.0 {
            return invalid("row spacing and padding cannot be negative".into());
        }
        if let Some(height) = self.page_height_mm {
            if !(height.is_finite() && height > 0.0) {
                return invalid(format!("page height {height} must be positive"));
            }
        }
        Ok(())
    }

    fn expect_parameter(&self, name: &str, kind: ParameterKind) -> Result<()> {
        match self.parameters.iter().find(|p| p.name == name) {
            Some(p) if p.kind == kind => Ok(()),
            Some(p) => Err(ReportError::TemplateInvalid(format!(
                "header parameter `{name}` is {:?}, expected {kind:?}",
                p.kind
            ))),
            None => Err(ReportError::TemplateInvalid(format!(
                "header refers to undeclared parameter `{name}`"
            ))),
        }
    }

    /// Check that the caller's data slot and parameters match this template.
    pub fn bind(&self, data: &DataSource, parameters: &ReportParameters) -> Result<()> {
        if data.name != self.dataset {
            return Err(ReportError::RenderFailed(format!(
                "data source `{}` does not match template dataset `{}`",
                data.name, self.dataset
            )));
        }

        let declared: BTreeSet<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        let supplied: BTreeSet<&str> = parameters.keys().map(String::as_str).collect();

        if let Some(missing) = declared.difference(&supplied).next() {
            return Err(ReportError::RenderFailed(format!(
                "parameter `{missing}` is declared but was not supplied"
            )));
        }
        if let Some(extra) = supplied.difference(&declared).next() {
            return Err(ReportError::RenderFailed(format!(
                "parameter `{extra}` is not declared by template `{}`",
                self.name
            )));
        }
        Ok(())
    }

    /// Sum of the relative column widths.
    pub fn total_column_width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }
}

/// Resolve an image parameter value to a local path.
///
/// Only `File:` references are understood; anything else yields `None`.
pub fn file_reference(value: &str) -> Option<PathBuf> {
    let prefix = value.get(..FILE_REFERENCE_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(FILE_REFERENCE_PREFIX) {
        return None;
    }
    let rest = value[FILE_REFERENCE_PREFIX.len()..].trim();
    // Accept the URI spelling `file:///srv/...` as well as `File:/srv/...`.
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    if rest.is_empty() {
        None
    } else {
        Some(PathBuf::from(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT_TEMPLATE: &str = r##"{
        "version": 1,
        "name": "Student",
        "dataset": "studentDataSet",
        "parameters": [
            { "name": "ReportName" },
            { "name": "Logo", "kind": "image" }
        ],
        "header": { "title_parameter": "ReportName", "logo_parameter": "Logo" },
        "columns": [
            { "field": "Id", "header": "#", "width": 0.6, "align": "right" },
            { "field": "Name", "header": "Name", "width": 3 },
            { "field": "Score", "header": "Score", "align": "right" }
        ]
    }"##;

    fn params(pairs: &[(&str, &str)]) -> ReportParameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_student_template_with_defaults() {
        let template = ReportTemplate::from_json(STUDENT_TEMPLATE.as_bytes()).expect("valid");
        assert_eq!(template.dataset, "studentDataSet");
        assert_eq!(template.columns.len(), 3);
        assert_eq!(template.columns[2].width, 1.0);
        assert_eq!(template.columns[1].align, Alignment::Left);
        assert_eq!(template.header.logo_height_mm, 16.0);
        assert!(template.page_height_mm.is_none());
        assert!((template.total_column_width() - 4.6).abs() < 1e-6);
    }

    #[test]
    fn load_missing_file_is_template_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Reports").join("Student.report.json");
        let err = ReportTemplate::load(&path).expect_err("no such file");
        assert!(matches!(err, ReportError::TemplateNotFound(p) if p == path));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Student.report.json");
        std::fs::write(&path, STUDENT_TEMPLATE).expect("write template");
        let template = ReportTemplate::load(&path).expect("load");
        assert_eq!(template.name, "Student");
    }

    #[test]
    fn malformed_json_is_template_invalid() {
        let err = ReportTemplate::from_json(b"{ not json").expect_err("bad json");
        assert!(matches!(err, ReportError::TemplateInvalid(_)));
    }

    #[test]
    fn structural_faults_are_template_invalid() {
        let cases = [
            STUDENT_TEMPLATE.replace("\"version\": 1", "\"version\": 2"),
            STUDENT_TEMPLATE.replace("\"width\": 3", "\"width\": 0"),
            STUDENT_TEMPLATE.replace("\"kind\": \"image\"", "\"kind\": \"text\""),
            STUDENT_TEMPLATE.replace("\"title_parameter\": \"ReportName\"", "\"title_parameter\": \"Title\""),
            r#"{ "version": 1, "name": "x", "dataset": "d", "columns": [] }"#.to_string(),
        ];
        for json in cases {
            let err = ReportTemplate::from_json(json.as_bytes()).expect_err(&json);
            assert!(matches!(err, ReportError::TemplateInvalid(_)), "{json}");
        }
    }

    #[test]
    fn bind_accepts_exact_parameter_set() {
        let template = ReportTemplate::from_json(STUDENT_TEMPLATE.as_bytes()).expect("valid");
        let data = DataSource::new("studentDataSet", Vec::new());
        let parameters = params(&[("ReportName", "Students Report"), ("Logo", "File:/x.png")]);
        template.bind(&data, &parameters).expect("binds");
    }

    #[test]
    fn bind_rejects_mismatches() {
        let template = ReportTemplate::from_json(STUDENT_TEMPLATE.as_bytes()).expect("valid");
        let good = params(&[("ReportName", "r"), ("Logo", "File:/x.png")]);

        let wrong_slot = DataSource::new("otherDataSet", Vec::new());
        assert!(matches!(
            template.bind(&wrong_slot, &good),
            Err(ReportError::RenderFailed(_))
        ));

        let data = DataSource::new("studentDataSet", Vec::new());
        let missing = params(&[("ReportName", "r")]);
        assert!(matches!(
            template.bind(&data, &missing),
            Err(ReportError::RenderFailed(_))
        ));

        let extra = params(&[("ReportName", "r"), ("Logo", "File:/x.png"), ("Footer", "f")]);
        assert!(matches!(
            template.bind(&data, &extra),
            Err(ReportError::RenderFailed(_))
        ));
    }

    #[test]
    fn file_references() {
        assert_eq!(
            file_reference("File:/srv/imgs/Logo.png"),
            Some(PathBuf::from("/srv/imgs/Logo.png"))
        );
        assert_eq!(
            file_reference("file:///srv/imgs/Logo.png"),
            Some(PathBuf::from("/srv/imgs/Logo.png"))
        );
        assert_eq!(file_reference("https://example.org/logo.png"), None);
        assert_eq!(file_reference("File:"), None);
        assert_eq!(file_reference(""), None);
    }

    #[test]
    fn shipped_student_template_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../wwwroot/Reports/Student.report.json");
        let template = ReportTemplate::load(&path).expect("shipped template loads");
        assert_eq!(template.dataset, "studentDataSet");
        assert_eq!(template.header.title_parameter.as_deref(), Some("ReportName"));
        assert_eq!(template.header.logo_parameter.as_deref(), Some("Logo"));
        assert_eq!(template.columns.len(), 4);
    }

    #[test]
    fn font_paths_resolve_against_the_template_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Student.report.json");
        let json = STUDENT_TEMPLATE.replacen(
            "\"columns\"",
            r#""fonts": { "regular": "fonts/Regular.ttf", "bold": "/opt/fonts/Bold.ttf" }, "columns""#,
            1,
        );
        std::fs::write(&path, json).expect("write template");

        let template = ReportTemplate::load(&path).expect("load");
        assert_eq!(
            template.fonts.regular.as_deref(),
            Some(dir.path().join("fonts/Regular.ttf").as_path())
        );
        assert_eq!(template.fonts.bold.as_deref(), Some(Path::new("/opt/fonts/Bold.ttf")));
    }
}
