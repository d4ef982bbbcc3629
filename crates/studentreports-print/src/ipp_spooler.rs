// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS spooler over IPP, using the `ipp` crate's async client.
//
//   - Get-Printer-Attributes  (RFC 8011 §4.2.5) when a job is opened
//   - Print-Job               (RFC 8011 §4.2.1) when a job is submitted
//   - CUPS-Get-Printers       (CUPS extension) for printer enumeration
//
// Rasterized pages are wrapped in a single PDF whose pages carry their exact
// printed size; the job asserts custom roll media with zero margins and
// asks the printer not to scale.

use std::collections::BTreeMap;
use std::io::Cursor;

use async_trait::async_trait;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument, warn};

use studentreports_core::error::{ReportError, Result};
use studentreports_core::traits::PrinterDirectory;
use studentreports_core::types::{PaperGeometry, PaperHeight, PrinterTarget, pt_to_hmm};
use studentreports_document::RasterPdfWriter;

use crate::spooler::{EmittedPage, PageSequence, SpoolJob, Spooler};

/// IPP `printer-state` value for a stopped printer.
const PRINTER_STATE_STOPPED: i32 = 5;

const DOCUMENT_FORMAT_PDF: &str = "application/pdf";

/// Spooler and printer directory backed by a CUPS server.
#[derive(Debug, Clone)]
pub struct IppSpooler {
    /// Server root, e.g. `ipp://localhost:631`.
    server: String,
}

impl IppSpooler {
    /// Target the CUPS server at `server_uri`.
    pub fn new(server_uri: &str) -> Result<Self> {
        let server = server_uri.trim_end_matches('/').to_string();
        parse_uri(&server)?;
        Ok(Self { server })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// IPP URI of a CUPS queue.
    pub fn printer_uri(&self, printer: &PrinterTarget) -> Result<Uri> {
        parse_uri(&format!(
            "{}/printers/{}",
            self.server,
            encode_path_segment(printer.name())
        ))
    }
}

fn parse_uri(raw: &str) -> Result<Uri> {
    raw.parse()
        .map_err(|e| ReportError::PrinterUnavailable(format!("invalid URI '{raw}': {e}")))
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[async_trait]
impl Spooler for IppSpooler {
    #[instrument(skip(self, paper), fields(printer = %printer))]
    async fn open(
        &self,
        printer: &PrinterTarget,
        paper: &PaperGeometry,
    ) -> Result<Box<dyn SpoolJob>> {
        let uri = self.printer_uri(printer)?;
        let operation = IppOperationBuilder::get_printer_attributes(uri.clone())
            .attributes(&["printer-state", "printer-is-accepting-jobs"])
            .build();
        let client = AsyncIppClient::new(uri.clone());

        debug!("sending Get-Printer-Attributes");
        let response = client.send(operation).await.map_err(|e| {
            ReportError::PrinterUnavailable(format!("{printer}: spooler unreachable: {e}"))
        })?;

        let code = response.header().status_code();
        if !code.is_success() {
            error!(status = ?code, "Get-Printer-Attributes failed");
            return Err(ReportError::PrinterUnavailable(format!(
                "{printer}: not installed ({code:?})"
            )));
        }
        check_ready(response.attributes())
            .map_err(|reason| ReportError::PrinterUnavailable(format!("{printer}: {reason}")))?;

        info!("printer ready, job opened");
        Ok(Box::new(IppSpoolJob {
            uri,
            printer: printer.clone(),
            paper: *paper,
            pages: PageSequence::default(),
        }))
    }
}

#[async_trait]
impl PrinterDirectory for IppSpooler {
    #[instrument(skip(self), fields(server = %self.server))]
    async fn installed_printers(&self) -> Result<Vec<String>> {
        let uri = parse_uri(&self.server)?;
        let client = AsyncIppClient::new(uri);

        debug!("sending CUPS-Get-Printers");
        let response = client
            .send(IppOperationBuilder::cups().get_printers())
            .await
            .map_err(|e| ReportError::PrinterUnavailable(format!("CUPS-Get-Printers: {e}")))?;

        let code = response.header().status_code();
        if !code.is_success() {
            error!(status = ?code, "CUPS-Get-Printers failed");
            return Err(ReportError::PrinterUnavailable(format!(
                "CUPS-Get-Printers returned status {code:?}"
            )));
        }

        let names = printer_names(response.attributes());
        debug!(count = names.len(), "printers enumerated");
        Ok(names)
    }
}

/// A CUPS job collecting raster pages until submission.
struct IppSpoolJob {
    uri: Uri,
    printer: PrinterTarget,
    paper: PaperGeometry,
    pages: PageSequence,
}

#[async_trait]
impl SpoolJob for IppSpoolJob {
    fn emit_page(&mut self, page: EmittedPage) -> Result<()> {
        debug!(
            page = page.index,
            has_more_pages = page.has_more_pages,
            "page emitted"
        );
        self.pages.push(page)
    }

    #[instrument(skip(self), fields(printer = %self.printer, pages = self.pages.len()))]
    async fn submit(self: Box<Self>, job_name: &str) -> Result<i32> {
        let height_hmm = match self.paper.height {
            PaperHeight::Fixed(hmm) => hmm,
            PaperHeight::Dynamic => pt_to_hmm(self.pages.max_height_pt()),
        };
        let media = media_col(&self.paper, height_hmm);
        let pages = self.pages.finish()?;
        let document = RasterPdfWriter::new(job_name).write(&pages)?;

        let operation = IppOperationBuilder::print_job(self.uri.clone(), IppPayload::new(Cursor::new(document)))
            .job_title(job_name)
            .document_format(DOCUMENT_FORMAT_PDF)
            .attribute(IppAttribute::new("media-col", media))
            .attribute(IppAttribute::new(
                "print-scaling",
                IppValue::Keyword("none".into()),
            ))
            .build();
        let client = AsyncIppClient::new(self.uri.clone());

        info!(height_hmm, "sending Print-Job");
        let response = client.send(operation).await.map_err(|e| {
            ReportError::PrinterUnavailable(format!("{}: Print-Job: {e}", self.printer))
        })?;

        let code = response.header().status_code();
        if !code.is_success() {
            error!(status = ?code, "Print-Job rejected");
            return Err(ReportError::PrinterUnavailable(format!(
                "{}: Print-Job returned status {code:?}",
                self.printer
            )));
        }

        let job_id = extract_job_id(response.attributes()).unwrap_or_else(|| {
            warn!("Print-Job response carried no job-id");
            0
        });
        info!(job_id, "print job accepted by spooler");
        Ok(job_id)
    }
}

// ---------------------------------------------------------------------------
// Attribute helpers
// ---------------------------------------------------------------------------

/// Custom roll media: size and margins in hundredths of a millimetre.
fn media_col(paper: &PaperGeometry, height_hmm: u32) -> IppValue {
    let dimension = |v: u32| IppValue::Integer(i32::try_from(v).unwrap_or(i32::MAX));

    let mut size = BTreeMap::new();
    size.insert("x-dimension".into(), dimension(paper.width_hmm));
    size.insert("y-dimension".into(), dimension(height_hmm));

    let mut media = BTreeMap::new();
    media.insert("media-size".into(), IppValue::Collection(size));
    media.insert("media-top-margin".into(), dimension(paper.margin_top_hmm));
    media.insert("media-bottom-margin".into(), dimension(paper.margin_bottom_hmm));
    media.insert("media-left-margin".into(), dimension(paper.margin_left_hmm));
    media.insert("media-right-margin".into(), dimension(paper.margin_right_hmm));
    IppValue::Collection(media)
}

/// Reject printers that are stopped or refusing jobs.
fn check_ready(attrs: &IppAttributes) -> std::result::Result<(), String> {
    for group in attrs.groups_of(DelimiterTag::PrinterAttributes) {
        let attributes = group.attributes();
        if let Some(attr) = attributes.get("printer-state")
            && let IppValue::Enum(state) = attr.value()
            && *state == PRINTER_STATE_STOPPED
        {
            return Err("printer is stopped".into());
        }
        if let Some(attr) = attributes.get("printer-is-accepting-jobs")
            && let IppValue::Boolean(false) = attr.value()
        {
            return Err("printer is not accepting jobs".into());
        }
    }
    Ok(())
}

/// `printer-name` of every printer group, in response order.
fn printer_names(attrs: &IppAttributes) -> Vec<String> {
    attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .filter_map(|group| group.attributes().get("printer-name"))
        .map(|attr| attr.value().to_string())
        .collect()
}

fn extract_job_id(attrs: &IppAttributes) -> Option<i32> {
    for group in attrs.groups_of(DelimiterTag::JobAttributes) {
        if let Some(attr) = group.attributes().get("job-id")
            && let IppValue::Integer(id) = attr.value()
        {
            return Some(*id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::ops::Deref;

    use super::*;

    fn member<'a, K: Deref<Target = str>>(
        collection: &'a BTreeMap<K, IppValue>,
        key: &str,
    ) -> Option<&'a IppValue> {
        collection
            .iter()
            .find(|(name, _)| &***name == key)
            .map(|(_, value)| value)
    }

    fn printer_group(attributes: Vec<IppAttribute>) -> IppAttributes {
        let mut attrs = IppAttributes::new();
        for attribute in attributes {
            attrs.add(DelimiterTag::PrinterAttributes, attribute);
        }
        attrs
    }

    #[test]
    fn printer_uri_escapes_names() {
        let spooler = IppSpooler::new("ipp://localhost:631/").expect("valid server");
        let uri = spooler
            .printer_uri(&PrinterTarget::new("Front Desk #2"))
            .expect("valid uri");
        assert_eq!(uri.to_string(), "ipp://localhost:631/printers/Front%20Desk%20%232");

        let uri = spooler
            .printer_uri(&PrinterTarget::new("Bullzip_PDF_Printer"))
            .expect("valid uri");
        assert_eq!(uri.path(), "/printers/Bullzip_PDF_Printer");
    }

    #[test]
    fn invalid_server_is_printer_unavailable() {
        let err = IppSpooler::new("not a uri at all").expect_err("bad uri");
        assert!(matches!(err, ReportError::PrinterUnavailable(_)));
    }

    #[test]
    fn media_col_asserts_roll_size_and_zero_margins() {
        let IppValue::Collection(media) = media_col(&PaperGeometry::roll(80), 43_210) else {
            panic!("media-col must be a collection");
        };
        let Some(IppValue::Collection(size)) = member(&media, "media-size") else {
            panic!("media-size must be a collection");
        };
        assert_eq!(member(size, "x-dimension"), Some(&IppValue::Integer(8000)));
        assert_eq!(member(size, "y-dimension"), Some(&IppValue::Integer(43_210)));
        for margin in [
            "media-top-margin",
            "media-bottom-margin",
            "media-left-margin",
            "media-right-margin",
        ] {
            assert_eq!(member(&media, margin), Some(&IppValue::Integer(0)), "{margin}");
        }
    }

    #[test]
    fn stopped_or_refusing_printers_are_not_ready() {
        let idle = printer_group(vec![
            IppAttribute::new("printer-state", IppValue::Enum(3)),
            IppAttribute::new("printer-is-accepting-jobs", IppValue::Boolean(true)),
        ]);
        assert!(check_ready(&idle).is_ok());

        let stopped = printer_group(vec![IppAttribute::new("printer-state", IppValue::Enum(5))]);
        assert!(check_ready(&stopped).is_err());

        let refusing = printer_group(vec![IppAttribute::new(
            "printer-is-accepting-jobs",
            IppValue::Boolean(false),
        )]);
        assert!(check_ready(&refusing).is_err());
    }

    #[test]
    fn job_id_is_read_from_job_attributes() {
        let mut attrs = IppAttributes::new();
        attrs.add(
            DelimiterTag::JobAttributes,
            IppAttribute::new("job-id", IppValue::Integer(42)),
        );
        assert_eq!(extract_job_id(&attrs), Some(42));
        assert_eq!(extract_job_id(&IppAttributes::new()), None);
    }

    #[tokio::test]
    async fn unreachable_server_is_printer_unavailable() {
        // Port 9 (discard) on loopback is closed on test hosts.
        let spooler = IppSpooler::new("ipp://127.0.0.1:9").expect("valid server");
        let err = spooler
            .open(&PrinterTarget::new("Bullzip_PDF_Printer"), &PaperGeometry::default())
            .await
            .err()
            .expect("no spooler listening");
        assert!(matches!(err, ReportError::PrinterUnavailable(_)));
    }
}
