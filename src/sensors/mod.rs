//! Sensors
//!
//! Orientation comes from iio-sensor-proxy over D-Bus. [`BusSession`]
//! owns the connection and performs the claim/release handshake, and
//! [`watcher::OrientationWatcher`] turns property-change signals into
//! orientation names.
//!
//! Capability queries and the claim run on the main task and finish
//! before the watcher is spawned. After that the watcher is the only
//! reader of the subscription stream.

pub mod dummy;
pub mod proxy;
pub mod watcher;

use std::sync::Arc;

use futures::stream::Stream;
use tracing::{debug, info, warn};
use zbus::fdo::DBusProxy;
use zbus::names::BusName;
use zbus::{
    CacheProperties, Connection, ConnectionBuilder, MatchRule, Message, MessageStream, MessageType,
};

use crate::config::BusKind;
use crate::error::{Error, Result};
use proxy::SensorServiceProxy;

pub const SENSOR_SERVICE: &str = "net.hadess.SensorProxy";
pub const SENSOR_PATH: &str = "/net/hadess/SensorProxy";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
pub const PROPERTIES_CHANGED: &str = "PropertiesChanged";
pub const ORIENTATION_PROPERTY: &str = "AccelerometerOrientation";

/// The lease handshake and queries offered by the sensor service.
#[async_trait::async_trait]
pub trait Accelerometer: Send + Sync {
    async fn has_accelerometer(&self) -> Result<bool>;

    async fn claim_accelerometer(&self) -> Result<()>;

    /// Best effort: a failure is logged, never returned.
    async fn release_accelerometer(&self);

    async fn current_orientation(&self) -> Result<String>;
}

/// Where the sensor service and its orientation signals are found.
#[async_trait::async_trait]
pub trait SensorBus: Send + Sync {
    type Sensor: Accelerometer;
    type Signals: Stream<Item = zbus::Result<Arc<Message>>> + Send + Unpin + 'static;

    /// Find the sensor service. Fails if nobody owns its bus name.
    async fn resolve_sensor_service(&self) -> Result<Self::Sensor>;

    /// Install the PropertiesChanged filter for the sensor object.
    ///
    /// Signals sent before this returns are not seen.
    async fn subscribe_orientation_changes(&self) -> Result<Self::Signals>;
}

pub struct BusSession {
    conn: Connection,
    queue_size: usize,
}

impl BusSession {
    /// Connect to the bus. `queue_size` bounds how many signals may wait
    /// for the watcher; once full, the bus reader waits too.
    pub async fn connect(bus: BusKind, queue_size: usize) -> Result<Self> {
        let builder = match bus {
            BusKind::System => ConnectionBuilder::system(),
            BusKind::Session => ConnectionBuilder::session(),
        };
        let conn = builder
            .map(|b| b.max_queued(queue_size))
            .map_err(|source| Error::Connection {
                bus: bus.name(),
                source,
            })?
            .build()
            .await
            .map_err(|source| Error::Connection {
                bus: bus.name(),
                source,
            })?;
        debug!("connected to the {} bus", bus.name());
        Ok(BusSession { conn, queue_size })
    }
}

#[async_trait::async_trait]
impl SensorBus for BusSession {
    type Sensor = SensorService;
    type Signals = MessageStream;

    async fn resolve_sensor_service(&self) -> Result<SensorService> {
        let name = BusName::try_from(SENSOR_SERVICE).map_err(|e| Error::Resolution(e.into()))?;
        let running = DBusProxy::new(&self.conn)
            .await
            .map_err(Error::Resolution)?
            .name_has_owner(name)
            .await
            .map_err(|e| Error::Resolution(e.into()))?;
        if !running {
            return Err(Error::ServiceNotFound(SENSOR_SERVICE));
        }

        let proxy = SensorServiceProxy::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(Error::Resolution)?;
        Ok(SensorService { proxy })
    }

    async fn subscribe_orientation_changes(&self) -> Result<MessageStream> {
        let rule = orientation_rule().map_err(Error::Subscription)?;
        let stream = MessageStream::for_match_rule(rule, &self.conn, Some(self.queue_size))
            .await
            .map_err(Error::Subscription)?;
        debug!("watching {} on {}", PROPERTIES_CHANGED, SENSOR_PATH);
        Ok(stream)
    }
}

fn orientation_rule() -> zbus::Result<MatchRule<'static>> {
    Ok(MatchRule::builder()
        .msg_type(MessageType::Signal)
        .sender(SENSOR_SERVICE)?
        .path(SENSOR_PATH)?
        .interface(PROPERTIES_INTERFACE)?
        .member(PROPERTIES_CHANGED)?
        .build())
}

/// Handle to the sensor service object.
pub struct SensorService {
    proxy: SensorServiceProxy<'static>,
}

#[async_trait::async_trait]
impl Accelerometer for SensorService {
    async fn has_accelerometer(&self) -> Result<bool> {
        self.proxy.has_accelerometer().await.map_err(Error::Query)
    }

    async fn claim_accelerometer(&self) -> Result<()> {
        self.proxy
            .claim_accelerometer()
            .await
            .map_err(Error::Claim)?;
        info!("claimed accelerometer");
        Ok(())
    }

    async fn release_accelerometer(&self) {
        match self.proxy.release_accelerometer().await {
            Ok(()) => info!("released accelerometer"),
            Err(e) => warn!("{}", Error::Release(e)),
        }
    }

    async fn current_orientation(&self) -> Result<String> {
        self.proxy
            .accelerometer_orientation()
            .await
            .map_err(Error::Query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_matches_sensor_properties_changed() -> zbus::Result<()> {
        let rule = orientation_rule()?.to_string();
        for component in [
            "type='signal'",
            "sender='net.hadess.SensorProxy'",
            "path='/net/hadess/SensorProxy'",
            "interface='org.freedesktop.DBus.Properties'",
            "member='PropertiesChanged'",
        ] {
            assert!(rule.contains(component), "{} lacks {}", rule, component);
        }
        Ok(())
    }
}
