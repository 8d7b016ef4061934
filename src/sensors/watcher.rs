use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use zbus::zvariant::{OwnedValue, Value};
use zbus::Message;

use super::ORIENTATION_PROPERTY;
use crate::error::{Error, Result};

/// Body of an `org.freedesktop.DBus.Properties.PropertiesChanged` signal.
#[derive(Debug, Default)]
pub struct PropertiesChanged {
    pub interface: String,
    pub changed: HashMap<String, OwnedValue>,
    pub invalidated: Vec<String>,
}

impl PropertiesChanged {
    pub fn decode(msg: &Message) -> Result<Self> {
        let (interface, changed, invalidated) = msg
            .body::<(String, HashMap<String, OwnedValue>, Vec<String>)>()
            .map_err(|e| Error::Decode(e.to_string()))?;
        Ok(PropertiesChanged {
            interface,
            changed,
            invalidated,
        })
    }

    /// The new orientation, if this change carries one.
    pub fn orientation(&self) -> Result<Option<String>> {
        let value = match self.changed.get(ORIENTATION_PROPERTY) {
            Some(value) => value,
            None => return Ok(None),
        };
        match &**value {
            Value::Str(s) => Ok(Some(strip_bus_quotes(s.as_str()).to_owned())),
            other => Err(Error::Decode(format!(
                "{} is `{}`, expected a string",
                ORIENTATION_PROPERTY,
                other.value_signature()
            ))),
        }
    }
}

/// Remove one pair of enclosing double quotes, if present.
pub fn strip_bus_quotes(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(raw)
}

/// Turns the signal subscription into a stream of orientation names.
pub struct OrientationWatcher<S> {
    signals: S,
    orientations: mpsc::Sender<String>,
}

impl<S> OrientationWatcher<S>
where
    S: Stream<Item = zbus::Result<Arc<Message>>> + Send + Unpin,
{
    pub fn new(signals: S, orientations: mpsc::Sender<String>) -> Self {
        OrientationWatcher {
            signals,
            orientations,
        }
    }

    /// Runs until the subscription ends or nobody listens anymore.
    pub async fn run(self) {
        let changes = self.signals.filter_map(|msg| async move {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("error reading orientation signal: {}", e);
                    return None;
                }
            };
            match PropertiesChanged::decode(&msg) {
                Ok(changed) => Some(changed),
                Err(e) => {
                    debug!("discarding signal: {}", e);
                    None
                }
            }
        });
        if forward(changes, self.orientations).await {
            warn!("orientation signal stream ended");
        }
    }
}

/// Send each orientation found in `changes` to `orientations`, in order.
///
/// Waits for the receiver whenever it is busy. Returns `false` once the
/// receiver is gone and `true` when `changes` runs dry.
pub async fn forward<S>(changes: S, orientations: mpsc::Sender<String>) -> bool
where
    S: Stream<Item = PropertiesChanged>,
{
    tokio::pin!(changes);
    while let Some(changed) = changes.next().await {
        let orientation = match changed.orientation() {
            Ok(Some(orientation)) => orientation,
            Ok(None) => {
                trace!(
                    "no {} in change of {} (invalidated: {:?})",
                    ORIENTATION_PROPERTY,
                    changed.interface,
                    changed.invalidated
                );
                continue;
            }
            Err(e) => {
                debug!("discarding signal: {}", e);
                continue;
            }
        };
        debug!("sensor reports {}", orientation);
        if orientations.send(orientation).await.is_err() {
            debug!("orientation receiver closed");
            return false;
        }
    }
    true
}
