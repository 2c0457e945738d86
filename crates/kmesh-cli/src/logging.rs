use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Maps `-v` occurrences to a level; `--quiet` silences everything.
fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: compact diagnostics on stderr, plus a plain-text copy in
/// `log_file` when one is given. Grid output owns stdout.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // `Option<Layer>` is itself a layer, so both cases share one subscriber type.
    let file_layer = log_file
        .map(|path| {
            File::create(path)
                .map(|file| fmt::layer().with_writer(file).with_ansi(false))
                .map_err(CliError::Io)
        })
        .transpose()?;

    tracing_subscriber::registry()
        .with(level_for(verbosity, quiet))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    fn install_once() {
        INIT.call_once(|| {
            setup_logging(2, false, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    fn verbosity_count_selects_level() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(1, false), LevelFilter::INFO);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(7, false), LevelFilter::TRACE);
        assert_eq!(level_for(3, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn second_install_is_an_error_not_a_panic() {
        install_once();
        info!("kgrid: 2 x 2 x 2");

        let result = setup_logging(1, false, None);
        assert!(matches!(result, Err(CliError::Other(_))));
    }

    #[test]
    #[serial]
    fn log_file_receives_plain_text_events() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("kmesh.log");
        let file = File::create(&log_path).unwrap();

        let subscriber =
            tracing_subscriber::registry().with(fmt::layer().with_writer(file).with_ansi(false));
        tracing::subscriber::with_default(subscriber, || {
            debug!("kvec0 density: 12.000");
        });

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("DEBUG"));
        assert!(content.contains("kvec0 density: 12.000"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    #[serial]
    fn log_file_in_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("no-such-dir").join("kmesh.log");

        let result = setup_logging(0, false, Some(&log_path));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
