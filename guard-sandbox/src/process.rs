use crate::SandboxExecutor;
use crate::error::SandboxError;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Default cap on captured stdout and stderr, per stream
const DEFAULT_MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Runs every tool call in a fresh child process.
///
/// The child is started as `<program> <args...> <tool_name>` and receives the parameters as
/// JSON on stdin. Its environment starts empty: only the variables named in the inherit
/// allowlist are copied from the server, plus any explicitly added ones. Whatever the child
/// prints on stdout becomes the tool result, parsed as JSON when possible.
#[derive(Clone, Debug)]
pub struct ProcessSandbox {
    program: PathBuf,
    args: Vec<String>,
    inherited_env: Vec<String>,
    env_vars: HashMap<String, String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
    max_output: u64,
}

impl ProcessSandbox {
    pub fn builder(program: impl Into<PathBuf>) -> ProcessSandboxBuilder {
        ProcessSandboxBuilder::new(program)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_output(&self) -> u64 {
        self.max_output
    }

    fn command(&self, tool_name: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(tool_name)
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for name in &self.inherited_env {
            if let Ok(value) = std::env::var(name) {
                command.env(name, value);
            }
        }
        command.envs(&self.env_vars);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl SandboxExecutor for ProcessSandbox {
    async fn execute(&self, tool_name: &str, params: &Value) -> Result<Value, SandboxError> {
        let payload = serde_json::to_vec(params)?;
        let mut child = self.command(tool_name).spawn().map_err(SandboxError::Spawn)?;
        debug!(
            "Spawned sandbox process {:?} for tool '{}'",
            child.id(),
            tool_name
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.max_output;

        // stdin is written while both output pipes drain
        let run = async move {
            let write = async move {
                if let Some(mut stdin) = stdin {
                    // A child that never reads its input is allowed to exit early
                    match stdin.write_all(&payload).await {
                        Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                        other => other?,
                    }
                }
                Ok::<(), SandboxError>(())
            };

            let (_, stdout, stderr) = tokio::try_join!(
                write,
                read_capped(stdout, limit),
                read_capped(stderr, limit)
            )?;
            let status = child.wait().await?;
            Ok::<_, SandboxError>((status, stdout, stderr))
        };

        let (status, stdout, stderr) = match tokio::time::timeout(self.timeout, run).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(
                    "Sandbox process for tool '{}' exceeded {:?}, killed",
                    tool_name, self.timeout
                );
                return Err(SandboxError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
            warn!(
                "Sandbox process for tool '{}' failed with status {:?}",
                tool_name,
                status.code()
            );
            return Err(SandboxError::Failed {
                code: status.code(),
                stderr,
            });
        }

        let stdout = String::from_utf8(stdout)
            .map_err(|_| SandboxError::InvalidOutput("not valid UTF-8".to_string()))?;
        let stdout = stdout.trim();
        Ok(serde_json::from_str(stdout).unwrap_or_else(|_| Value::String(stdout.to_string())))
    }

    fn kind(&self) -> &'static str {
        "process"
    }
}

/// Reads a child pipe to the end, failing once more than `limit` bytes arrive
async fn read_capped<R>(reader: Option<R>, limit: u64) -> Result<Vec<u8>, SandboxError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(reader) = reader {
        reader.take(limit.saturating_add(1)).read_to_end(&mut buf).await?;
    }
    if buf.len() as u64 > limit {
        return Err(SandboxError::InvalidOutput(format!(
            "output exceeds {limit} bytes"
        )));
    }
    Ok(buf)
}

/// A builder for configuring a [`ProcessSandbox`].
pub struct ProcessSandboxBuilder {
    program: PathBuf,
    args: Vec<String>,
    inherited_env: Vec<String>,
    env_vars: HashMap<String, String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
    max_output: u64,
}

impl ProcessSandboxBuilder {
    /// Creates a builder for `program`, inheriting only `PATH`, timing out after 10 seconds
    /// and capturing at most 1 MiB per output stream.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            inherited_env: vec!["PATH".to_string()],
            env_vars: HashMap::new(),
            working_dir: None,
            timeout: Duration::from_secs(10),
            max_output: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Adds a single argument placed before the tool name.
    pub fn add_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Overrides the arguments placed before the tool name.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Copies the named variable from the server environment into the child, if set.
    pub fn inherit_env(mut self, name: impl Into<String>) -> Self {
        self.inherited_env.push(name.into());
        self
    }

    /// Starts the child with nothing inherited from the server environment, not even `PATH`.
    pub fn without_inherited_env(mut self) -> Self {
        self.inherited_env.clear();
        self
    }

    /// Sets a fixed environment variable for the child.
    pub fn add_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Sets the wall-clock limit for one tool call. The child is killed when it expires.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caps how many bytes of stdout, and separately of stderr, a call may produce.
    /// A child that writes more is killed and the call fails with `InvalidOutput`.
    pub fn with_max_output(mut self, bytes: u64) -> Self {
        self.max_output = bytes;
        self
    }

    pub fn build(self) -> ProcessSandbox {
        ProcessSandbox {
            program: self.program,
            args: self.args,
            inherited_env: self.inherited_env,
            env_vars: self.env_vars,
            working_dir: self.working_dir,
            timeout: self.timeout,
            max_output: self.max_output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let sandbox = ProcessSandbox::builder("/bin/true").build();
        assert_eq!(sandbox.program, PathBuf::from("/bin/true"));
        assert!(sandbox.args.is_empty());
        assert_eq!(sandbox.inherited_env, vec!["PATH".to_string()]);
        assert_eq!(sandbox.timeout(), Duration::from_secs(10));
        assert_eq!(sandbox.max_output(), 1024 * 1024);
    }

    #[test]
    fn test_builder_overrides() {
        let sandbox = ProcessSandbox::builder("/bin/sh")
            .add_arg("-c")
            .add_arg("cat")
            .without_inherited_env()
            .inherit_env("LANG")
            .add_env("SANDBOX", "1")
            .with_timeout(Duration::from_millis(500))
            .with_max_output(4096)
            .build();

        assert_eq!(sandbox.args, vec!["-c".to_string(), "cat".to_string()]);
        assert_eq!(sandbox.inherited_env, vec!["LANG".to_string()]);
        assert_eq!(sandbox.env_vars.get("SANDBOX").map(String::as_str), Some("1"));
        assert_eq!(sandbox.timeout(), Duration::from_millis(500));
        assert_eq!(sandbox.max_output(), 4096);
    }
}
