use std::{fs, path::Path};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;
pub mod writer;

pub use formatter::*;
pub use writer::*;

use crate::configs::Config;

/// Installs the global subscriber: coloured stdout plus an optional pruned
/// log file. `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &Config) {
    let logging = &config.logging;
    let log_level = logging.level.as_deref().unwrap_or("info");

    let filter_str = match logging.filters.as_deref() {
        Some(filters) if !filters.is_empty() => {
            format!("{},hyper=warn,reqwest=warn,{}", log_level, filters)
        }
        _ => format!("{},hyper=warn,reqwest=warn", log_level),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    // stdout may carry the downloaded bytes, so console logs go to stderr.
    let console_layer = fmt::layer()
        .event_format(CustomFormatter::new(true))
        .with_writer(std::io::stderr)
        .with_ansi(true);

    let file_layer = logging.file.as_ref().map(|file_config| {
        if let Some(parent) = Path::new(&file_config.path).parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Failed to create log directory: {}", e);
            }
        }

        fmt::layer()
            .with_writer(CircularFileWriter::new(
                file_config.path.clone(),
                file_config.max_lines,
            ))
            .event_format(CustomFormatter::new(false))
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
