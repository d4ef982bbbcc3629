// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface of the `studentreports` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the studentreports binary.
#[derive(Debug, Parser)]
#[command(
    name = "studentreports",
    version,
    about = "Prints the student report on a receipt printer"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "STUDENTREPORTS_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service (the default).
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the SQLite database path.
    #[arg(long = "database-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the directory the template and logo paths are resolved against.
    #[arg(long = "web-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub web_root: Option<PathBuf>,

    /// Override the printer the report is sent to.
    #[arg(long = "printer-name", value_name = "NAME")]
    pub printer_name: Option<String>,

    /// Override the CUPS server address.
    #[arg(long = "printer-cups-uri", value_name = "URI")]
    pub cups_uri: Option<String>,

    /// Override the pdftoppm executable used to rasterize pages.
    #[arg(long = "printer-pdftoppm-path", value_name = "PATH", value_hint = ValueHint::ExecutablePath)]
    pub pdftoppm_path: Option<PathBuf>,

    /// Override the rasterization resolution.
    #[arg(long = "printer-raster-dpi", value_name = "DPI")]
    pub raster_dpi: Option<u32>,
}
