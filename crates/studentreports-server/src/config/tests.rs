// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::path::Path;

use super::*;

#[test]
fn defaults_match_the_deployed_service() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:5000");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.database.path, Path::new("students.db"));
    assert_eq!(settings.report.printer_name, "Bullzip_PDF_Printer");
    assert_eq!(settings.report.paper_width_mm, 80);
    assert_eq!(settings.report.raster_dpi, 300);
    assert_eq!(settings.printer.cups_uri, "ipp://localhost:631");
    assert_eq!(settings.printer.pdftoppm_path, Path::new("pdftoppm"));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.printer.name = Some("FromFile".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        printer_name: Some("Front_Desk".to_string()),
        log_level: Some("debug".to_string()),
        database: DatabaseOverride {
            database_path: Some(PathBuf::from("/var/lib/students.db")),
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.report.printer_name, "Front_Desk");
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.database.path, Path::new("/var/lib/students.db"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn invalid_values_are_rejected_with_their_key() {
    let cases: Vec<(RawSettings, &str)> = vec![
        (
            RawSettings {
                server: RawServerSettings {
                    port: Some(0),
                    ..Default::default()
                },
                ..Default::default()
            },
            "server.port",
        ),
        (
            RawSettings {
                logging: RawLoggingSettings {
                    level: Some("loud".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
            "logging.level",
        ),
        (
            RawSettings {
                printer: RawPrinterSettings {
                    raster_dpi: Some(10),
                    ..Default::default()
                },
                ..Default::default()
            },
            "printer.raster_dpi",
        ),
        (
            RawSettings {
                printer: RawPrinterSettings {
                    name: Some("   ".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
            "printer.name",
        ),
        (
            RawSettings {
                printer: RawPrinterSettings {
                    cups_uri: Some("http://localhost:631".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
            "printer.cups_uri",
        ),
        (
            RawSettings {
                printer: RawPrinterSettings {
                    paper_width_mm: Some(0),
                    ..Default::default()
                },
                ..Default::default()
            },
            "printer.paper_width_mm",
        ),
        (
            RawSettings {
                printer: RawPrinterSettings {
                    paper_width_mm: Some(50_000_000),
                    ..Default::default()
                },
                ..Default::default()
            },
            "printer.paper_width_mm",
        ),
    ];

    for (raw, expected_key) in cases {
        match Settings::from_raw(raw) {
            Err(LoadError::Invalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected invalid `{expected_key}`, got {other:?}"),
        }
    }
}

#[test]
fn config_file_layer_is_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        r#"
[server]
port = 8080

[report]
web_root = "/srv/reports"

[printer]
name = "Kitchen"
raster_dpi = 203
"#,
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "studentreports",
        "--config-file",
        path.to_str().expect("utf-8 path"),
        "serve",
        "--printer-name",
        "Override",
    ]);
    let settings = load(&args).expect("load");

    assert_eq!(settings.server.addr.port(), 8080);
    assert_eq!(settings.report.web_root, Path::new("/srv/reports"));
    assert_eq!(settings.report.raster_dpi, 203);
    assert_eq!(settings.report.printer_name, "Override");
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["studentreports"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from(["studentreports", "migrate", "--database-path", "/tmp/s.db"]);
    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_path.as_deref(),
                Some(Path::new("/tmp/s.db"))
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
