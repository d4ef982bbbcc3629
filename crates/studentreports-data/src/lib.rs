// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// studentreports-data: the relational side of the pipeline, reading student
// rows and bringing the schema up to date at boot.

pub mod migrations;
pub mod source;

pub use migrations::migrate;
pub use source::SqliteRecordSource;
