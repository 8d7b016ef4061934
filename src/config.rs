//! Command line configuration.

use clap::{Arg, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusKind {
    System,
    Session,
}

impl BusKind {
    pub fn name(&self) -> &'static str {
        match *self {
            Self::System => "system",
            Self::Session => "session",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bus: BusKind,
    /// Signals that may wait between the bus and the watcher.
    pub queue_size: usize,
    pub swaymsg: String,
    pub dry_run: bool,
    pub apply_initial: bool,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bus: BusKind::System,
            queue_size: 10,
            swaymsg: "swaymsg".into(),
            dry_run: false,
            apply_initial: false,
            verbose: false,
        }
    }
}

pub fn command() -> Command<'static> {
    Command::new("rot8d")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rotates sway outputs and touch input when iio-sensor-proxy reports a new orientation")
        .arg(
            Arg::new("session")
                .long("session")
                .help("Talk to the session bus instead of the system bus"),
        )
        .arg(
            Arg::new("queue-size")
                .long("queue-size")
                .value_name("N")
                .takes_value(true)
                .default_value("10")
                .help("Orientation signals buffered before the bus reader waits"),
        )
        .arg(
            Arg::new("swaymsg")
                .long("swaymsg")
                .value_name("PROGRAM")
                .takes_value(true)
                .default_value("swaymsg")
                .help("Program used to send commands to the compositor"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Log rotation commands instead of sending them"),
        )
        .arg(
            Arg::new("initial")
                .long("initial")
                .help("Apply the current orientation right after claiming the sensor"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every command and signal"),
        )
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Config> {
        let defaults = Config::default();

        let queue_size = match matches.value_of("queue-size") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| Error::Config(format!("--queue-size {}: {}", raw, e)))?,
            None => defaults.queue_size,
        };
        if queue_size == 0 {
            return Err(Error::Config("--queue-size must be at least 1".into()));
        }

        Ok(Config {
            bus: if matches.is_present("session") {
                BusKind::Session
            } else {
                BusKind::System
            },
            queue_size,
            swaymsg: matches
                .value_of("swaymsg")
                .map(String::from)
                .unwrap_or(defaults.swaymsg),
            dry_run: matches.is_present("dry-run"),
            apply_initial: matches.is_present("initial"),
            verbose: matches.is_present("verbose"),
        })
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// `rust_log` (the RUST_LOG value) wins when set; otherwise the
    /// level comes from `--verbose`.
    pub fn log_filter(&self, rust_log: Option<&str>) -> EnvFilter {
        rust_log
            .filter(|directives| !directives.trim().is_empty())
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(self.log_level()))
    }
}
