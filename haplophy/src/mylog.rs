// Copyright (c) 2024 10X Genomics, Inc. All rights reserved.

// Custom logger

use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// Log `<time> [LEVEL] - message` lines to stderr at Info, or Debug when
/// `verbose` is set.  `RUST_LOG` directives take precedence.
pub fn init_log(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
