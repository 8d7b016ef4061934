//! Dummy backend.
//!
//! This is purely for testing or debugging.
//! It records every command instead of touching a compositor.

use tokio::sync::Mutex;

use super::{ControlSurface, InputDevice, Output, SurfaceCommand};
use crate::error::{Error, Result};

pub struct DummySurface {
    outputs: Option<Vec<Output>>,
    inputs: Option<Vec<InputDevice>>,
    failing_target: Option<String>,
    inputs_queried: Mutex<bool>,
    issued: Mutex<Vec<SurfaceCommand>>,
}

impl DummySurface {
    pub fn new(outputs: Vec<Output>, inputs: Vec<InputDevice>) -> Self {
        DummySurface {
            outputs: Some(outputs),
            inputs: Some(inputs),
            failing_target: None,
            inputs_queried: Mutex::new(false),
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Make output enumeration fail.
    pub fn without_outputs(mut self) -> Self {
        self.outputs = None;
        self
    }

    /// Make input enumeration fail.
    pub fn without_inputs(mut self) -> Self {
        self.inputs = None;
        self
    }

    /// Make the command aimed at `target` fail. It is still recorded.
    pub fn failing_on(mut self, target: &str) -> Self {
        self.failing_target = Some(target.to_owned());
        self
    }

    /// Rendered commands, in the order they were issued.
    pub async fn commands(&self) -> Vec<String> {
        self.issued
            .lock()
            .await
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    pub async fn inputs_queried(&self) -> bool {
        *self.inputs_queried.lock().await
    }
}

#[async_trait::async_trait]
impl ControlSurface for DummySurface {
    async fn outputs(&self) -> Result<Vec<Output>> {
        self.outputs.clone().ok_or_else(|| Error::Command {
            command: "get_outputs".into(),
            reason: "dummy transport error".into(),
        })
    }

    async fn inputs(&self) -> Result<Vec<InputDevice>> {
        *self.inputs_queried.lock().await = true;
        self.inputs.clone().ok_or_else(|| Error::Command {
            command: "get_inputs".into(),
            reason: "dummy transport error".into(),
        })
    }

    async fn execute(&self, command: &SurfaceCommand) -> Result<()> {
        self.issued.lock().await.push(command.clone());
        if self.failing_target.as_deref() == Some(command.target()) {
            return Err(Error::Command {
                command: command.to_string(),
                reason: "dummy failure".into(),
            });
        }
        Ok(())
    }
}
