//! Lifecycle management for a locally spawned driver binary.
//!
//! Locates the executable, probes for a free local port, launches the
//! process with that port injected into its arguments, polls until it
//! accepts TCP connections, and tears it down on every exit path. Teardown
//! is idempotent: stopping twice, or stopping a process that already exited
//! on its own, is success.

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::Instant;

use crate::error::{Result, RudderError};

/// Explicit supervisor configuration. There is deliberately no process-wide
/// default port or binary name to mutate; everything the supervisor reads
/// comes through this struct, defaulted at the call site.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Explicit path to the driver executable. When unset, `binary_name`
    /// is searched on PATH.
    pub executable: Option<PathBuf>,
    /// Name searched on PATH when no explicit path is given.
    pub binary_name: String,
    /// Host the driver binds; also the host readiness polling connects to.
    pub host: String,
    /// First port tried; conflicts probe upward from here.
    pub preferred_port: u16,
    /// How many candidate ports to try before giving up.
    pub port_attempts: u16,
    /// Extra arguments appended after the generated `--port` pair.
    pub args: Vec<String>,
    /// How long to wait for the spawned process to accept connections.
    pub startup_timeout: Duration,
    /// Pause between readiness probes.
    pub poll_interval: Duration,
    /// How long a graceful stop may take before the process is killed.
    pub kill_grace: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            executable: None,
            binary_name: "geckodriver".to_string(),
            host: "127.0.0.1".to_string(),
            preferred_port: 4444,
            port_attempts: 16,
            args: Vec::new(),
            startup_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(100),
            kill_grace: Duration::from_secs(2),
        }
    }
}

/// Launches and supervises one driver process.
#[derive(Debug, Clone)]
pub struct DriverSupervisor {
    config: SupervisorConfig,
}

/// A spawned driver process bound to a port. Dropping it kills the child
/// (kill-on-drop), so abnormal termination of the supervising program does
/// not orphan the driver; prefer [`RunningDriver::stop`] for a graceful exit.
#[derive(Debug)]
pub struct RunningDriver {
    child: Child,
    host: String,
    port: u16,
    kill_grace: Duration,
}

impl DriverSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    /// Resolve the driver executable: explicit path first, then PATH.
    fn locate(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.executable {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(RudderError::BinaryNotFound(path.display().to_string()));
        }
        which::which(&self.config.binary_name)
            .map_err(|_| RudderError::BinaryNotFound(self.config.binary_name.clone()))
    }

    /// Launch the driver and wait until it accepts connections.
    ///
    /// On readiness timeout the child is torn down before the error is
    /// returned, so a failed launch never leaks a process.
    pub async fn launch(&self) -> Result<RunningDriver> {
        let executable = self.locate()?;
        let (port, guard) = probe_port(
            &self.config.host,
            self.config.preferred_port,
            self.config.port_attempts,
        )?;

        tracing::info!(
            executable = %executable.display(),
            port,
            "launching driver binary"
        );

        let mut command = Command::new(&executable);
        command
            .arg("--port")
            .arg(port.to_string())
            .args(&self.config.args)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);

        // The probe listener is held until this point so a concurrently
        // launching supervisor cannot pick the same port.
        drop(guard);
        let child = command.spawn()?;

        let mut running = RunningDriver {
            child,
            host: self.config.host.clone(),
            port,
            kill_grace: self.config.kill_grace,
        };

        match await_ready(
            &self.config.host,
            port,
            self.config.startup_timeout,
            self.config.poll_interval,
        )
        .await
        {
            Ok(()) => {
                tracing::info!(port, "driver ready");
                Ok(running)
            }
            Err(e) => {
                running.stop().await;
                Err(e)
            }
        }
    }
}

impl RunningDriver {
    /// Host and port the driver is listening on, as a base URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the driver: graceful signal, grace period, then a hard kill.
    ///
    /// Idempotent and infallible by design — a process that already exited
    /// (on its own or via an earlier call) is treated as success, never an
    /// error. This runs on every exit path, including failed establishment.
    pub async fn stop(&mut self) {
        // Already reaped, or exited on its own.
        if let Ok(Some(status)) = self.child.try_wait() {
            tracing::debug!(%status, "driver already exited");
            return;
        }

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            // SIGTERM first so the driver can shut its browser down.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
        }

        match tokio::time::timeout(self.kill_grace, self.child.wait()).await {
            Ok(_) => tracing::debug!("driver exited gracefully"),
            Err(_) => {
                tracing::warn!(port = self.port, "driver ignored stop signal, killing");
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
            }
        }
    }
}

/// Bind the first free port at or above `preferred`, keeping the listener
/// alive as a reservation until the caller is ready to hand the port to the
/// child process.
fn probe_port(host: &str, preferred: u16, attempts: u16) -> Result<(u16, TcpListener)> {
    for offset in 0..attempts {
        let Some(port) = preferred.checked_add(offset) else {
            break;
        };
        match TcpListener::bind((host, port)) {
            Ok(listener) => {
                if offset > 0 {
                    tracing::debug!(preferred, chosen = port, "preferred port was taken");
                }
                return Ok((port, listener));
            }
            Err(_) => continue,
        }
    }
    Err(RudderError::PortExhaustion {
        start: preferred,
        end: preferred.saturating_add(attempts),
    })
}

/// Poll until the port accepts a TCP connection or the deadline passes.
/// The deadline is monotonic, so wall-clock adjustments cannot stretch or
/// shrink the wait.
async fn await_ready(
    host: &str,
    port: u16,
    startup_timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + startup_timeout;
    loop {
        if TcpStream::connect((host, port)).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(RudderError::StartupTimeout {
                port,
                timeout_ms: startup_timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}
