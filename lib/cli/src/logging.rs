//! Logging set-up for the `vtfs` binary.

use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output flags shared by every subcommand.
#[derive(Debug, Default, Clone, clap::Parser)]
pub struct Output {
    /// Log more (-v for info, -vv for debug, -vvv for trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Output {
    /// The level logged when `$RUST_LOG` isn't set. Warnings always get
    /// through so failed remote syncs are visible.
    pub fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Initialize logging based on the `$RUST_LOG` environment variable,
    /// falling back to the verbosity flags.
    pub fn initialize_logging(&self) {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .with_ansi(should_emit_colors())
            .with_writer(std::io::stderr)
            .compact();

        let filter_layer = EnvFilter::builder()
            .with_default_directive(self.level().into())
            .from_env_lossy();

        // A second initialization (tests) keeps the first subscriber.
        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    }
}

/// Check whether we should emit ANSI escape codes for log formatting.
fn should_emit_colors() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}
