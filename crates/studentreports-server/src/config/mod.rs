// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration layer: typed settings with layered precedence
// (defaults → files → environment → CLI).

mod cli;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use studentreports_core::config::ReportConfig;

pub use cli::{CliArgs, Command, DatabaseOverride, MigrateArgs, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "studentreports";
const ENV_PREFIX: &str = "STUDENTREPORTS";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_PATH: &str = "students.db";
const DEFAULT_CUPS_URI: &str = "ipp://localhost:631";
const DEFAULT_PDFTOPPM_PATH: &str = "pdftoppm";
const MIN_RASTER_DPI: u32 = 72;
const MAX_RASTER_DPI: u32 = 1200;
const MAX_PAPER_WIDTH_MM: u32 = 1000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub report: ReportConfig,
    pub printer: PrinterSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PrinterSettings {
    pub cups_uri: String,
    pub pdftoppm_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration from the process arguments, returning both.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    report: RawReportSettings,
    printer: RawPrinterSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_database_override(&overrides.database);
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(root) = overrides.web_root.as_ref() {
            self.report.web_root = Some(root.clone());
        }
        if let Some(name) = overrides.printer_name.as_ref() {
            self.printer.name = Some(name.clone());
        }
        if let Some(uri) = overrides.cups_uri.as_ref() {
            self.printer.cups_uri = Some(uri.clone());
        }
        if let Some(path) = overrides.pdftoppm_path.as_ref() {
            self.printer.pdftoppm_path = Some(path.clone());
        }
        if let Some(dpi) = overrides.raster_dpi {
            self.printer.raster_dpi = Some(dpi);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(path) = overrides.database_path.as_ref() {
            self.database.path = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            report,
            printer,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let database = build_database_settings(database)?;
        let report = build_report_config(report, &printer)?;
        let printer = build_printer_settings(printer)?;

        Ok(Self {
            server,
            logging,
            database,
            report,
            printer,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;
    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let path = database
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid("database.path", "must not be empty"));
    }
    Ok(DatabaseSettings { path })
}

/// The report pipeline's view of the settings. Printer name, paper width
/// and resolution live under `[printer]` but belong to the report config.
fn build_report_config(
    report: RawReportSettings,
    printer: &RawPrinterSettings,
) -> Result<ReportConfig, LoadError> {
    let defaults = ReportConfig::default();

    let printer_name = printer
        .name
        .as_deref()
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or(defaults.printer_name);
    if printer_name.is_empty() {
        return Err(LoadError::invalid("printer.name", "must not be empty"));
    }

    let paper_width_mm = printer.paper_width_mm.unwrap_or(defaults.paper_width_mm);
    if !(1..=MAX_PAPER_WIDTH_MM).contains(&paper_width_mm) {
        return Err(LoadError::invalid(
            "printer.paper_width_mm",
            format!("must be between 1 and {MAX_PAPER_WIDTH_MM}"),
        ));
    }

    let raster_dpi = printer.raster_dpi.unwrap_or(defaults.raster_dpi);
    if !(MIN_RASTER_DPI..=MAX_RASTER_DPI).contains(&raster_dpi) {
        return Err(LoadError::invalid(
            "printer.raster_dpi",
            format!("must be between {MIN_RASTER_DPI} and {MAX_RASTER_DPI}"),
        ));
    }

    let dataset_name = report.dataset_name.unwrap_or(defaults.dataset_name);
    if dataset_name.trim().is_empty() {
        return Err(LoadError::invalid("report.dataset_name", "must not be empty"));
    }

    Ok(ReportConfig {
        web_root: report.web_root.unwrap_or(defaults.web_root),
        template_path: report.template_path.unwrap_or(defaults.template_path),
        logo_path: report.logo_path.unwrap_or(defaults.logo_path),
        report_title: report.title.unwrap_or(defaults.report_title),
        dataset_name,
        printer_name,
        paper_width_mm,
        raster_dpi,
    })
}

fn build_printer_settings(printer: RawPrinterSettings) -> Result<PrinterSettings, LoadError> {
    let cups_uri = printer
        .cups_uri
        .unwrap_or_else(|| DEFAULT_CUPS_URI.to_string());
    if !(cups_uri.starts_with("ipp://") || cups_uri.starts_with("ipps://")) {
        return Err(LoadError::invalid(
            "printer.cups_uri",
            format!("`{cups_uri}` is not an ipp:// or ipps:// address"),
        ));
    }
    let pdftoppm_path = printer
        .pdftoppm_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PDFTOPPM_PATH));
    Ok(PrinterSettings {
        cups_uri,
        pdftoppm_path,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawReportSettings {
    web_root: Option<PathBuf>,
    template_path: Option<PathBuf>,
    logo_path: Option<PathBuf>,
    title: Option<String>,
    dataset_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPrinterSettings {
    name: Option<String>,
    cups_uri: Option<String>,
    pdftoppm_path: Option<PathBuf>,
    paper_width_mm: Option<u32>,
    raster_dpi: Option<u32>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

#[cfg(test)]
mod tests;
