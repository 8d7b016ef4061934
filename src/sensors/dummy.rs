//! Dummy sensor bus.
//!
//! This is purely for testing or debugging.
//! It logs every call on the bus and on the sensor, in order, and lets
//! the caller push signals by hand.

use std::collections::HashMap;
use std::sync::Arc;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use zbus::zvariant::Value;
use zbus::{Message, MessageBuilder};

use super::{
    Accelerometer, SensorBus, ORIENTATION_PROPERTY, PROPERTIES_CHANGED, PROPERTIES_INTERFACE,
    SENSOR_PATH, SENSOR_SERVICE,
};
use crate::error::{Error, Result};

pub type SignalFeed = UnboundedSender<zbus::Result<Arc<Message>>>;
type Signals = UnboundedReceiver<zbus::Result<Arc<Message>>>;
type EventLog = Arc<Mutex<Vec<String>>>;

/// A `PropertiesChanged` signal carrying a new orientation.
pub fn orientation_signal(orientation: &str) -> zbus::Result<Arc<Message>> {
    let changed = HashMap::from([(ORIENTATION_PROPERTY, Value::from(orientation))]);
    let msg = MessageBuilder::signal(SENSOR_PATH, PROPERTIES_INTERFACE, PROPERTIES_CHANGED)?
        .build(&(SENSOR_SERVICE, changed, Vec::<&str>::new()))?;
    Ok(Arc::new(msg))
}

pub struct DummyBus {
    running: bool,
    sensor: DummySensor,
    signals: Mutex<Option<Signals>>,
}

#[derive(Clone)]
pub struct DummySensor {
    has_accelerometer: bool,
    current: String,
    claim_fails: bool,
    feed: SignalFeed,
    events: EventLog,
}

impl DummyBus {
    /// A running sensor service with an accelerometer, plus the sender
    /// side of its signal stream.
    pub fn new() -> (Self, SignalFeed) {
        let (feed, signals) = unbounded();
        let bus = DummyBus {
            running: true,
            sensor: DummySensor {
                has_accelerometer: true,
                current: "undefined".into(),
                claim_fails: false,
                feed: feed.clone(),
                events: Arc::new(Mutex::new(Vec::new())),
            },
            signals: Mutex::new(Some(signals)),
        };
        (bus, feed)
    }

    pub fn not_running(mut self) -> Self {
        self.running = false;
        self
    }

    pub fn without_accelerometer(mut self) -> Self {
        self.sensor.has_accelerometer = false;
        self
    }

    pub fn refusing_claim(mut self) -> Self {
        self.sensor.claim_fails = true;
        self
    }

    /// What `AccelerometerOrientation` reads before any signal.
    pub fn with_current(mut self, orientation: &str) -> Self {
        self.sensor.current = orientation.to_owned();
        self
    }

    /// Calls seen so far. A release made while the signal stream was
    /// still being read is logged as `release while watching`.
    pub async fn events(&self) -> Vec<String> {
        self.sensor.events.lock().await.clone()
    }

    async fn log(&self, event: &str) {
        self.sensor.log(event).await
    }
}

impl DummySensor {
    async fn log(&self, event: &str) {
        self.events.lock().await.push(event.to_owned());
    }
}

#[async_trait::async_trait]
impl SensorBus for DummyBus {
    type Sensor = DummySensor;
    type Signals = Signals;

    async fn resolve_sensor_service(&self) -> Result<DummySensor> {
        self.log("resolve").await;
        if !self.running {
            return Err(Error::ServiceNotFound(SENSOR_SERVICE));
        }
        Ok(self.sensor.clone())
    }

    async fn subscribe_orientation_changes(&self) -> Result<Signals> {
        self.log("subscribe").await;
        self.signals
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::Subscription(zbus::Error::Failure("already subscribed".into())))
    }
}

#[async_trait::async_trait]
impl Accelerometer for DummySensor {
    async fn has_accelerometer(&self) -> Result<bool> {
        self.log("has_accelerometer").await;
        Ok(self.has_accelerometer)
    }

    async fn claim_accelerometer(&self) -> Result<()> {
        self.log("claim").await;
        if self.claim_fails {
            return Err(Error::Claim(zbus::Error::Failure("claim refused".into())));
        }
        Ok(())
    }

    async fn release_accelerometer(&self) {
        if self.feed.is_closed() {
            self.log("release").await;
        } else {
            self.log("release while watching").await;
        }
    }

    async fn current_orientation(&self) -> Result<String> {
        self.log("current_orientation").await;
        Ok(self.current.clone())
    }
}
