//! Error types for rot8d
//!
//! Every failure travels up to `main` as a value, which logs it once
//! and picks the exit code.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to connect to the {bus} bus: {source}")]
    Connection {
        bus: &'static str,
        #[source]
        source: zbus::Error,
    },

    #[error("Failed to get sensor proxy object from the bus: {0}")]
    Resolution(#[source] zbus::Error),

    #[error("Sensor service {0} is not running")]
    ServiceNotFound(&'static str),

    #[error("Failed to check whether device has an accelerometer: {0}")]
    Query(#[source] zbus::Error),

    #[error("No accelerometer found")]
    NoAccelerometer,

    #[error("Failed to claim accelerometer: {0}")]
    Claim(#[source] zbus::Error),

    #[error("Failed to release accelerometer: {0}")]
    Release(#[source] zbus::Error),

    #[error("Failed setting up watch for orientation: {0}")]
    Subscription(#[source] zbus::Error),

    #[error("Undecodable orientation signal: {0}")]
    Decode(String),

    #[error("Unrecognized orientation: {0}")]
    UnrecognizedOrientation(String),

    #[error("Unable to rotate: `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Orientation watcher stopped delivering events")]
    WatcherStopped,
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::Connection { .. }
            | Self::Resolution(_)
            | Self::ServiceNotFound(_)
            | Self::Query(_)
            | Self::NoAccelerometer
            | Self::Claim(_)
            | Self::Release(_)
            | Self::Subscription(_)
            | Self::Decode(_) => 2,
            Self::UnrecognizedOrientation(_) => 3,
            Self::Command { .. } => 4,
            Self::WatcherStopped => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
