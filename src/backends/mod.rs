//! Compositor backends.
//!
//! A backend is anything that can list outputs and input devices and
//! accept sway-style configuration commands. The rotation itself is
//! backend independent and lives in [`apply_transform`].

use std::fmt;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::orientation::Transform;

pub mod dummy;
pub mod sway;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Output {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InputDevice {
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl InputDevice {
    /// Only absolute pointing devices follow the screen.
    pub fn takes_calibration(&self) -> bool {
        matches!(self.kind.as_str(), "touch" | "tablet_tool")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCommand {
    OutputTransform { output: String, degrees: isize },
    InputCalibration { input: String, matrix: [f64; 6] },
}

impl SurfaceCommand {
    /// Command words as the compositor expects them.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::OutputTransform { output, degrees } => vec![
                "output".to_owned(),
                output.clone(),
                "transform".to_owned(),
                degrees.to_string(),
            ],
            Self::InputCalibration { input, matrix } => {
                let mut args = vec![
                    "input".to_owned(),
                    input.clone(),
                    "calibration_matrix".to_owned(),
                ];
                args.extend(matrix.iter().map(|m| m.to_string()));
                args
            }
        }
    }

    /// The output name or input identifier this command targets.
    pub fn target(&self) -> &str {
        match self {
            Self::OutputTransform { output, .. } => output,
            Self::InputCalibration { input, .. } => input,
        }
    }
}

impl fmt::Display for SurfaceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}

#[async_trait::async_trait]
pub trait ControlSurface: Send + Sync {
    /// Enumerate the outputs currently known to the compositor.
    async fn outputs(&self) -> Result<Vec<Output>>;

    /// Enumerate every input device, whatever its type.
    async fn inputs(&self) -> Result<Vec<InputDevice>>;

    async fn execute(&self, command: &SurfaceCommand) -> Result<()>;
}

#[async_trait::async_trait]
impl<S: ControlSurface + ?Sized> ControlSurface for &S {
    async fn outputs(&self) -> Result<Vec<Output>> {
        (**self).outputs().await
    }

    async fn inputs(&self) -> Result<Vec<InputDevice>> {
        (**self).inputs().await
    }

    async fn execute(&self, command: &SurfaceCommand) -> Result<()> {
        (**self).execute(command).await
    }
}

/// Rotate every output, then recalibrate every touch and tablet tool.
///
/// Stops at the first failure. Nothing already applied is rolled back,
/// and inputs are not touched unless every output succeeded.
pub async fn apply_transform<S>(surface: &S, transform: &Transform) -> Result<()>
where
    S: ControlSurface + ?Sized,
{
    let outputs = surface.outputs().await?;
    for output in outputs {
        let command = SurfaceCommand::OutputTransform {
            output: output.name,
            degrees: transform.degrees(),
        };
        debug!("{}", command);
        surface.execute(&command).await?;
    }

    let inputs = surface.inputs().await?;
    for input in inputs.into_iter().filter(InputDevice::takes_calibration) {
        let command = SurfaceCommand::InputCalibration {
            input: input.identifier,
            matrix: transform.matrix,
        };
        debug!("{}", command);
        surface.execute(&command).await?;
    }

    Ok(())
}
