//! Process supervisor for the local engine.
//!
//! Lifecycle: `Stopped -> Starting -> Polling -> {Healthy | TimedOut}`.
//! A timed-out start kills the process and lands back in `Stopped`, as
//! does [`Supervisor::stop`] from `Healthy`.

use std::process::Stdio;
use std::sync::Arc;

use serde::Serialize;
use tokio::process::{Child, Command};
use tokio::sync::{watch, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::control::{ControlProtocol, HttpControlClient};
use crate::error::LocalEngineError;
use crate::paths::engine_command;
use crate::EngineConfig;

/// Internal lifecycle state of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    Starting,
    Polling,
    Healthy,
    TimedOut,
}

/// Coarse status reported to the UI/CLI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum SupervisorStatus {
    /// Never started, or stopped cleanly.
    Stopped,
    Starting,
    Ready,
    Error(String),
}

/// Owns the local engine process.
pub struct Supervisor {
    config: EngineConfig,
    probe: Arc<dyn ControlProtocol>,
    child: Mutex<Option<Child>>,
    state: watch::Sender<SupervisorState>,
    status: watch::Sender<SupervisorStatus>,
}

impl Supervisor {
    /// Create a supervisor probing the engine over HTTP.
    pub fn new(config: EngineConfig) -> Self {
        let probe = Arc::new(HttpControlClient::new(config.clone()));
        Self::with_probe(config, probe)
    }

    /// Create a supervisor with a custom readiness probe.
    pub fn with_probe(config: EngineConfig, probe: Arc<dyn ControlProtocol>) -> Self {
        let (state, _) = watch::channel(SupervisorState::Stopped);
        let (status, _) = watch::channel(SupervisorStatus::Stopped);
        Self {
            config,
            probe,
            child: Mutex::new(None),
            state,
            status,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Current coarse status.
    pub fn status(&self) -> SupervisorStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorStatus> {
        self.status.subscribe()
    }

    /// Launch the engine and wait until it answers its health probe.
    ///
    /// Returns immediately if the engine is already healthy and running.
    pub async fn start(&self) -> Result<(), LocalEngineError> {
        {
            let mut child = self.child.lock().await;

            if let Some(existing) = child.as_mut() {
                let running = matches!(existing.try_wait(), Ok(None));
                if running && self.state() == SupervisorState::Healthy {
                    debug!("Local engine already healthy");
                    return Ok(());
                }
            }
            if let Some(stale) = child.take() {
                kill_child(stale).await?;
            }

            self.transition(SupervisorState::Starting);
            self.status.send_replace(SupervisorStatus::Starting);

            match self.spawn() {
                Ok(spawned) => {
                    info!(
                        "Local engine started with PID {:?}, waiting for it to become healthy",
                        spawned.id()
                    );
                    *child = Some(spawned);
                }
                Err(e) => {
                    error!("{}", e);
                    self.transition(SupervisorState::Stopped);
                    self.status.send_replace(SupervisorStatus::Error(e.to_string()));
                    return Err(e);
                }
            }
        }

        self.transition(SupervisorState::Polling);

        match self.wait_healthy().await {
            Ok(()) => {
                info!("Local engine is healthy and serving");
                self.transition(SupervisorState::Healthy);
                self.status.send_replace(SupervisorStatus::Ready);
                Ok(())
            }
            Err(e) => {
                if matches!(e, LocalEngineError::StartupTimeout(_)) {
                    error!("{}", e);
                    self.transition(SupervisorState::TimedOut);
                } else {
                    error!("Local engine failed to start: {}", e);
                }
                if let Err(stop_err) = self.stop().await {
                    warn!("Cleanup after failed start also failed: {}", stop_err);
                }
                self.status.send_replace(SupervisorStatus::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Kill the engine. Succeeds when nothing is running.
    pub async fn stop(&self) -> Result<(), LocalEngineError> {
        let mut guard = self.child.lock().await;

        let Some(child) = guard.take() else {
            debug!("Local engine not running, nothing to stop");
            self.transition(SupervisorState::Stopped);
            return Ok(());
        };

        if let Err((child, e)) = try_kill(child).await {
            *guard = Some(child);
            return Err(e);
        }

        self.transition(SupervisorState::Stopped);
        if matches!(*self.status.borrow(), SupervisorStatus::Ready | SupervisorStatus::Starting) {
            self.status.send_replace(SupervisorStatus::Stopped);
        }
        Ok(())
    }

    fn spawn(&self) -> Result<Child, LocalEngineError> {
        let command = engine_command(&self.config)?;
        info!("Starting local engine: {}", command);

        Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LocalEngineError::SpawnFailed {
                command: command.to_string(),
                message: e.to_string(),
            })
    }

    async fn wait_healthy(&self) -> Result<(), LocalEngineError> {
        let deadline = self.config.startup_deadline;
        let probe_timeout = self.config.probe_timeout;

        let polling = async {
            let mut ticker = time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if let Some(reason) = self.exit_reason().await {
                    return Err(LocalEngineError::ProcessExited(reason));
                }

                // One slow probe must not eat the rest of the deadline.
                match time::timeout(probe_timeout, self.probe.health()).await {
                    Ok(Ok(())) => return Ok(()),
                    Ok(Err(e)) => debug!("Local engine not ready yet: {}", e),
                    Err(_) => debug!("Readiness probe timed out after {:?}", probe_timeout),
                }
            }
        };

        match time::timeout(deadline, polling).await {
            Ok(result) => result,
            Err(_) => Err(LocalEngineError::StartupTimeout(deadline)),
        }
    }

    /// `Some(reason)` once the child is gone.
    async fn exit_reason(&self) -> Option<String> {
        let mut guard = self.child.lock().await;
        match guard.as_mut() {
            None => Some("process was stopped".to_string()),
            Some(child) => match child.try_wait() {
                Ok(Some(status)) => Some(status.to_string()),
                Ok(None) => None,
                Err(e) => Some(e.to_string()),
            },
        }
    }

    fn transition(&self, next: SupervisorState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Supervisor state {:?} -> {:?}", previous, next);
        }
    }
}

/// Force-kill `child`, handing it back if it is still alive afterwards.
async fn try_kill(mut child: Child) -> Result<(), (Child, LocalEngineError)> {
    let pid = child.id();

    if let Ok(Some(status)) = child.try_wait() {
        warn!("Local engine had already exited ({})", status);
        return Ok(());
    }

    info!("Stopping local engine (PID: {:?})", pid);
    if let Err(e) = child.start_kill() {
        // It may have exited between try_wait and the kill.
        if let Ok(Some(_)) = child.try_wait() {
            return Ok(());
        }
        error!("Failed to kill local engine: {}", e);
        return Err((child, LocalEngineError::StopFailed(e.to_string())));
    }

    if let Err(e) = child.wait().await {
        warn!("Error reaping local engine: {}", e);
    }
    info!("Local engine stopped");
    Ok(())
}

async fn kill_child(child: Child) -> Result<(), LocalEngineError> {
    try_kill(child).await.map_err(|(_, e)| e)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{unused_port, StubResponse, StubServer};
    use std::time::Duration;

    fn quick_config(port: u16, command: &[&str]) -> EngineConfig {
        EngineConfig::builder()
            .port(port)
            .command(command.iter().copied())
            .poll_interval(Duration::from_millis(50))
            .probe_timeout(Duration::from_millis(100))
            .startup_deadline(Duration::from_secs(1))
            .build()
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let supervisor = Supervisor::new(quick_config(unused_port(), &["sleep", "30"]));
        supervisor.stop().await.unwrap();
        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert_eq!(supervisor.status(), SupervisorStatus::Stopped);
    }

    #[tokio::test]
    async fn test_startup_timeout_kills_process() {
        let supervisor = Supervisor::new(quick_config(unused_port(), &["sleep", "30"]));
        let mut status = supervisor.subscribe();

        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, LocalEngineError::StartupTimeout(_)), "{err:?}");
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert!(supervisor.child.lock().await.is_none());
        assert!(matches!(
            *status.borrow_and_update(),
            SupervisorStatus::Error(_)
        ));

        // Second stop after a timed-out start is a no-op.
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_healthy_then_stop() {
        let server = StubServer::start(|_| StubResponse::ok(r#"{"status":"ok"}"#)).await;
        let supervisor = Supervisor::new(quick_config(server.port(), &["sleep", "30"]));

        supervisor.start().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Healthy);
        assert_eq!(supervisor.status(), SupervisorStatus::Ready);
        assert!(server.requests().iter().all(|p| p == "/health"));

        // Already healthy: no second process.
        supervisor.start().await.unwrap();

        supervisor.stop().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert_eq!(supervisor.status(), SupervisorStatus::Stopped);
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_probe_does_not_stall_polling() {
        let server = StubServer::start(|_| {
            StubResponse::ok(r#"{"status":"ok"}"#).delayed(Duration::from_secs(5))
        })
        .await;
        let supervisor = Supervisor::new(quick_config(server.port(), &["sleep", "30"]));

        let started = std::time::Instant::now();
        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, LocalEngineError::StartupTimeout(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(server.requests().len() > 1);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let supervisor =
            Supervisor::new(quick_config(unused_port(), &["/nonexistent/lmninja-engine"]));
        let err = supervisor.start().await.unwrap_err();
        assert!(matches!(err, LocalEngineError::SpawnFailed { .. }), "{err:?}");
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn test_process_exit_during_startup() {
        let supervisor = Supervisor::new(quick_config(unused_port(), &["true"]));
        let err = supervisor.start().await.unwrap_err();
        assert!(
            matches!(err, LocalEngineError::ProcessExited(_)),
            "{err:?}"
        );
        supervisor.stop().await.unwrap();
    }
}
