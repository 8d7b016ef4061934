//! Startup, the watch loop and shutdown, in that order.

use std::future::Future;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backends::sway::SwayMsg;
use crate::backends::ControlSurface;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::orientation::Orientation;
use crate::reaction::ReactionLoop;
use crate::sensors::watcher::OrientationWatcher;
use crate::sensors::{Accelerometer, BusSession, SensorBus};

/// Run until a fatal error or SIGINT/SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let session = BusSession::connect(config.bus, config.queue_size).await?;
    let surface = SwayMsg::new(&config.swaymsg, config.dry_run);
    react(&session, surface, config.apply_initial, shutdown_signal()).await
}

/// Drive `surface` from the sensor on `bus` until `shutdown` resolves or
/// something fails.
///
/// The accelerometer is claimed only after the subscription is in place.
/// Once claimed it is released on every exit path, after the watcher
/// has stopped reading the bus.
pub async fn react<B, C, F>(bus: &B, surface: C, apply_initial: bool, shutdown: F) -> Result<()>
where
    B: SensorBus,
    C: ControlSurface,
    F: Future<Output = ()>,
{
    let sensor = bus.resolve_sensor_service().await?;
    if !sensor.has_accelerometer().await? {
        return Err(Error::NoAccelerometer);
    }
    let signals = bus.subscribe_orientation_changes().await?;

    sensor.claim_accelerometer().await?;

    let (tx, rx) = mpsc::channel(1);
    let watcher = tokio::spawn(OrientationWatcher::new(signals, tx).run());
    let mut reaction = ReactionLoop::new(surface, rx);

    let result = watch(&sensor, &mut reaction, apply_initial, shutdown).await;

    // A watcher stuck on a full channel keeps the bus queue full, and
    // with it the reply to the release below.
    drop(reaction);
    watcher.abort();
    let _ = watcher.await;

    sensor.release_accelerometer().await;
    result
}

async fn watch<A, C, F>(
    sensor: &A,
    reaction: &mut ReactionLoop<C>,
    apply_initial: bool,
    shutdown: F,
) -> Result<()>
where
    A: Accelerometer,
    C: ControlSurface,
    F: Future<Output = ()>,
{
    if apply_initial {
        let current = sensor.current_orientation().await?;
        if current.parse::<Orientation>().is_ok() {
            reaction.react(&current).await?;
        } else {
            debug!("skipping initial orientation {}", current);
        }
    }

    info!("waiting for orientation changes");
    reaction.run_until(shutdown).await
}

async fn shutdown_signal() {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!("cannot listen for SIGTERM: {}", e);
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            return;
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("cannot listen for SIGINT: {}", e);
                terminate.recv().await;
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::dummy::DummySurface;
    use crate::backends::{InputDevice, Output};
    use crate::sensors::dummy::{orientation_signal, DummyBus};

    fn laptop() -> DummySurface {
        DummySurface::new(
            vec![Output {
                name: "eDP-1".into(),
            }],
            vec![InputDevice {
                identifier: "1".into(),
                kind: "touch".into(),
            }],
        )
    }

    #[tokio::test]
    async fn subscribes_before_claiming_and_releases_on_shutdown() -> Result<()> {
        let (bus, _feed) = DummyBus::new();
        let surface = laptop();

        react(&bus, &surface, false, async {}).await?;

        assert_eq!(
            bus.events().await,
            ["resolve", "has_accelerometer", "subscribe", "claim", "release"]
        );
        assert!(surface.commands().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn fatal_error_stops_the_watcher_before_releasing() {
        let (bus, feed) = DummyBus::new();
        let surface = laptop();
        for orientation in ["normal", "sideways", "left-up", "right-up", "bottom-up", "normal"] {
            feed.unbounded_send(orientation_signal(orientation))
                .expect("signal stream is open");
        }

        let result = react(&bus, &surface, false, std::future::pending()).await;

        assert!(matches!(result, Err(Error::UnrecognizedOrientation(_))));
        assert_eq!(
            surface.commands().await,
            [
                "output eDP-1 transform 0",
                "input 1 calibration_matrix 1 0 0 0 1 0"
            ]
        );
        assert_eq!(
            bus.events().await,
            ["resolve", "has_accelerometer", "subscribe", "claim", "release"]
        );
    }

    #[tokio::test]
    async fn command_failure_releases_the_lease() {
        let (bus, feed) = DummyBus::new();
        let surface = laptop().failing_on("eDP-1");
        feed.unbounded_send(orientation_signal("right-up"))
            .expect("signal stream is open");

        let result = react(&bus, &surface, false, std::future::pending()).await;

        assert!(matches!(result, Err(Error::Command { .. })));
        assert_eq!(bus.events().await.last().map(String::as_str), Some("release"));
    }

    #[tokio::test]
    async fn missing_service_touches_nothing() {
        let (bus, _feed) = DummyBus::new();
        let bus = bus.not_running();

        let result = react(&bus, laptop(), false, async {}).await;

        assert!(matches!(result, Err(Error::ServiceNotFound(_))));
        assert_eq!(bus.events().await, ["resolve"]);
    }

    #[tokio::test]
    async fn no_accelerometer_means_no_claim() {
        let (bus, _feed) = DummyBus::new();
        let bus = bus.without_accelerometer();

        let result = react(&bus, laptop(), false, async {}).await;

        assert!(matches!(result, Err(Error::NoAccelerometer)));
        assert_eq!(bus.events().await, ["resolve", "has_accelerometer"]);
    }

    #[tokio::test]
    async fn refused_claim_is_not_released() {
        let (bus, _feed) = DummyBus::new();
        let bus = bus.refusing_claim();

        let result = react(&bus, laptop(), false, async {}).await;

        assert!(matches!(result, Err(Error::Claim(_))));
        assert_eq!(
            bus.events().await,
            ["resolve", "has_accelerometer", "subscribe", "claim"]
        );
    }

    #[tokio::test]
    async fn initial_orientation_is_applied_under_the_lease() -> Result<()> {
        let (bus, _feed) = DummyBus::new();
        let bus = bus.with_current("left-up");
        let surface = laptop();

        react(&bus, &surface, true, async {}).await?;

        assert_eq!(
            surface.commands().await,
            [
                "output eDP-1 transform 270",
                "input 1 calibration_matrix 0 -1 1 1 0 0"
            ]
        );
        assert_eq!(
            bus.events().await,
            [
                "resolve",
                "has_accelerometer",
                "subscribe",
                "claim",
                "current_orientation",
                "release"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn undefined_initial_orientation_is_skipped() -> Result<()> {
        let (bus, _feed) = DummyBus::new();
        let surface = laptop();

        react(&bus, &surface, true, async {}).await?;

        assert!(surface.commands().await.is_empty());
        Ok(())
    }
}
