//! Logging setup for the `nutrilog` binary.
//!
//! Command output goes to stdout; diagnostics go to stderr through
//! `tracing`. Only warnings show by default so they don't bury the
//! command's own output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events follow the verbosity flag
const OWN_TARGETS: [&str; 2] = ["nutrilog_core", "nutrilog_cli"];

/// Filter directive for a `-v` count
///
/// Other crates (reqwest, hyper) stay at `warn` at every level.
pub fn directive_for(verbosity: u8) -> String {
    let level = match verbosity {
        0 => return "warn".to_string(),
        1 => "info",
        _ => "debug",
    };

    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{}={}", target, level));
    }
    directive
}

/// Install the global subscriber
///
/// `RUST_LOG`, when set, replaces the verbosity-derived filter.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive_for(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new(directive_for(2)))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_by_default() {
        assert_eq!(directive_for(0), "warn");
    }

    #[test]
    fn test_verbosity_raises_own_crates_only() {
        assert_eq!(
            directive_for(1),
            "warn,nutrilog_core=info,nutrilog_cli=info"
        );
        assert_eq!(directive_for(2), directive_for(5));
        assert!(directive_for(2).starts_with("warn,"));
        assert!(directive_for(2).contains("nutrilog_core=debug"));
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in 0..3 {
            assert!(EnvFilter::try_new(directive_for(verbosity)).is_ok());
        }
        init_test();
        init_test();
    }
}
