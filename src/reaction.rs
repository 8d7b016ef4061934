//! The consume side: one orientation at a time, mapped and applied.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::info;

use crate::backends::{apply_transform, ControlSurface};
use crate::error::{Error, Result};
use crate::orientation;

pub struct ReactionLoop<C> {
    surface: C,
    orientations: mpsc::Receiver<String>,
}

impl<C: ControlSurface> ReactionLoop<C> {
    pub fn new(surface: C, orientations: mpsc::Receiver<String>) -> Self {
        ReactionLoop {
            surface,
            orientations,
        }
    }

    /// Map one orientation and push it to the compositor.
    pub async fn react(&self, orientation: &str) -> Result<()> {
        let transform = orientation::map(orientation)?;
        info!("Rotating: {}", orientation);
        apply_transform(&self.surface, &transform).await
    }

    /// Consume orientations until `shutdown` resolves or an error occurs.
    ///
    /// Shutdown is only observed between events; a transform in flight
    /// always finishes first.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let next = tokio::select! {
                biased;
                orientation = self.orientations.recv() => orientation,
                _ = &mut shutdown => {
                    info!("shutting down");
                    return Ok(());
                }
            };
            match next {
                Some(orientation) => self.react(&orientation).await?,
                None => return Err(Error::WatcherStopped),
            }
        }
    }

    pub fn surface(&self) -> &C {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::dummy::DummySurface;
    use crate::backends::{InputDevice, Output};

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
    async fn applies_each_orientation_in_order() {
        let (tx, rx) = mpsc::channel(4);
        let mut reaction = ReactionLoop::new(laptop(), rx);
        for orientation in ["normal", "right-up"] {
            tx.send(orientation.to_owned()).await.unwrap();
        }
        drop(tx);

        let result = reaction.run_until(std::future::pending()).await;
        assert!(matches!(result, Err(Error::WatcherStopped)));
        assert_eq!(
            reaction.surface().commands().await,
            [
                "output eDP-1 transform 0",
                "input 1 calibration_matrix 1 0 0 0 1 0",
                "output eDP-1 transform 90",
                "input 1 calibration_matrix 0 1 0 -1 0 1",
            ]
        );
    }

    #[tokio::test]
    async fn unrecognized_orientation_is_fatal() {
        let (tx, rx) = mpsc::channel(4);
        let mut reaction = ReactionLoop::new(laptop(), rx);
        tx.send("sideways".to_owned()).await.unwrap();
        tx.send("normal".to_owned()).await.unwrap();

        match reaction.run_until(std::future::pending()).await {
            Err(Error::UnrecognizedOrientation(name)) => assert_eq!(name, "sideways"),
            other => panic!("expected UnrecognizedOrientation, got {:?}", other),
        }
        assert!(reaction.surface().commands().await.is_empty());
        assert!(!reaction.surface().inputs_queried().await);
    }

    #[tokio::test]
    async fn command_failure_is_fatal() {
        let (tx, rx) = mpsc::channel(4);
        let mut reaction = ReactionLoop::new(laptop().failing_on("eDP-1"), rx);
        tx.send("left-up".to_owned()).await.unwrap();
        tx.send("normal".to_owned()).await.unwrap();

        let result = reaction.run_until(std::future::pending()).await;
        assert!(matches!(result, Err(Error::Command { .. })));
        assert_eq!(
            reaction.surface().commands().await,
            ["output eDP-1 transform 270"]
        );
    }

    #[tokio::test]
    async fn shutdown_between_events() {
        let (_tx, rx) = mpsc::channel(1);
        let mut reaction = ReactionLoop::new(laptop(), rx);
        assert!(reaction.run_until(async {}).await.is_ok());
        assert!(reaction.surface().commands().await.is_empty());
    }
}
