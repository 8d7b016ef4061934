use tokio::process::Command;
use tracing::info;

use super::{ControlSurface, InputDevice, Output, SurfaceCommand};
use crate::error::{Error, Result};

/// Drives sway through `swaymsg`.
pub struct SwayMsg {
    program: String,
    dry_run: bool,
}

impl SwayMsg {
    pub fn new(program: &str, dry_run: bool) -> Self {
        SwayMsg {
            program: program.into(),
            dry_run,
        }
    }

    /// Run swaymsg and return its stdout. A non-zero exit is an error.
    async fn invoke(&self, args: &[String]) -> Result<String> {
        let command = format!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::Command {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                stdout.trim()
            } else {
                stderr.trim()
            };
            return Err(Error::Command {
                command,
                reason: format!("{} {}", output.status, detail).trim_end().to_owned(),
            });
        }
        Ok(stdout)
    }

    async fn query<T>(&self, kind: &str) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let args = ["-t".to_owned(), kind.to_owned(), "--raw".to_owned()];
        let raw = self.invoke(&args).await?;
        serde_json::from_str(&raw).map_err(|e| Error::Command {
            command: format!("{} -t {}", self.program, kind),
            reason: format!("unable to deserialize swaymsg JSON output: {}", e),
        })
    }
}

#[async_trait::async_trait]
impl ControlSurface for SwayMsg {
    async fn outputs(&self) -> Result<Vec<Output>> {
        self.query("get_outputs").await
    }

    async fn inputs(&self) -> Result<Vec<InputDevice>> {
        self.query("get_inputs").await
    }

    async fn execute(&self, command: &SurfaceCommand) -> Result<()> {
        if self.dry_run {
            info!("dry run: {} {}", self.program, command);
            return Ok(());
        }
        // `--` keeps negative matrix entries from being read as options.
        let mut args = vec!["--".to_owned()];
        args.extend(command.args());
        self.invoke(&args).await.map(|_| ())
    }
}
