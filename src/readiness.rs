//! Readiness gate: poll cluster health with a fixed delay until the engine is
//! usable or the deadline passes.

use crate::config::ReadinessConfig;
use crate::engine::{HealthStatus, SearchEngineClient};
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ReadinessGate {
    deadline: Duration,
    poll_interval: Duration,
    probe_timeout: Duration,
    min_status: HealthStatus,
}

impl ReadinessGate {
    pub fn new(
        deadline: Duration,
        poll_interval: Duration,
        probe_timeout: Duration,
        min_status: HealthStatus,
    ) -> Result<Self> {
        if probe_timeout.is_zero() {
            return Err(Error::Config("probe timeout must be positive".to_string()));
        }
        if probe_timeout >= poll_interval {
            return Err(Error::Config(format!(
                "probe timeout ({:?}) must be shorter than the poll interval ({:?})",
                probe_timeout, poll_interval
            )));
        }

        Ok(Self {
            deadline,
            poll_interval,
            probe_timeout,
            min_status,
        })
    }

    pub fn from_config(config: &ReadinessConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.poll_interval_secs),
            Duration::from_secs(config.probe_timeout_secs),
            config.wait_for_status,
        )
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Wait until the engine reports at least the minimum status.
    ///
    /// Every probe failure is retried; only the deadline ends the wait. The
    /// timeout fires no later than one poll interval past the deadline.
    pub async fn await_ready(&self, client: &dyn SearchEngineClient) -> Result<HealthStatus> {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match tokio::time::timeout(self.probe_timeout, client.health(self.probe_timeout)).await {
                Ok(Ok(status)) if status >= self.min_status => {
                    info!("Search engine is ready (status {})", status);
                    return Ok(status);
                }
                Ok(Ok(status)) => {
                    debug!(attempt, %status, "Cluster not healthy enough yet");
                }
                Ok(Err(e)) if e.is_transient() => {
                    debug!(attempt, error = %e, "Health probe failed");
                }
                Ok(Err(e)) => {
                    warn!(attempt, error = %e, "Health probe returned an error");
                }
                Err(_) => {
                    debug!(attempt, "Health probe timed out after {:?}", self.probe_timeout);
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= self.deadline {
                return Err(Error::ReadinessTimeout { elapsed });
            }

            info!("Waiting for search engine...");
            tokio::time::sleep(self.poll_interval.min(self.deadline - elapsed)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{Call, FakeEngine, Probe};

    fn gate(min_status: HealthStatus) -> ReadinessGate {
        ReadinessGate::new(
            Duration::from_secs(30),
            Duration::from_secs(5),
            Duration::from_secs(4),
            min_status,
        )
        .unwrap()
    }

    fn health_calls(engine: &FakeEngine) -> usize {
        engine.calls().iter().filter(|c| **c == Call::Health).count()
    }

    #[test]
    fn test_probe_timeout_must_be_shorter_than_interval() {
        let result = ReadinessGate::new(
            Duration::from_secs(30),
            Duration::from_secs(5),
            Duration::from_secs(5),
            HealthStatus::Yellow,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_probe_timeout_is_rejected() {
        let result = ReadinessGate::new(
            Duration::from_secs(30),
            Duration::from_secs(1),
            Duration::ZERO,
            HealthStatus::Yellow,
        );
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("positive")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_probe() {
        let engine = FakeEngine::new().with_probes(vec![], Probe::Status(HealthStatus::Green));
        let status = gate(HealthStatus::Yellow).await_ready(&engine).await.unwrap();
        assert_eq!(status, HealthStatus::Green);
        assert_eq!(health_calls(&engine), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failures_are_retried_with_fixed_delay() {
        let engine = FakeEngine::new().with_probes(
            vec![Probe::Unreachable, Probe::Unreachable],
            Probe::Status(HealthStatus::Yellow),
        );

        let start = Instant::now();
        let status = gate(HealthStatus::Yellow).await_ready(&engine).await.unwrap();

        assert_eq!(status, HealthStatus::Yellow);
        assert_eq!(health_calls(&engine), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_status_is_enough() {
        let engine = FakeEngine::new().with_probes(
            vec![Probe::Status(HealthStatus::Red)],
            Probe::Status(HealthStatus::Yellow),
        );
        let status = gate(HealthStatus::Yellow).await_ready(&engine).await.unwrap();
        assert_eq!(status, HealthStatus::Yellow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stricter_minimum_keeps_polling() {
        let engine = FakeEngine::new().with_probes(
            vec![
                Probe::Status(HealthStatus::Yellow),
                Probe::Status(HealthStatus::Yellow),
            ],
            Probe::Status(HealthStatus::Green),
        );
        let status = gate(HealthStatus::Green).await_ready(&engine).await.unwrap();
        assert_eq!(status, HealthStatus::Green);
        assert_eq!(health_calls(&engine), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_bounded_by_deadline_plus_interval() {
        let engine = FakeEngine::new().with_probes(vec![], Probe::Unreachable);
        let gate = gate(HealthStatus::Yellow);

        let start = Instant::now();
        let err = gate.await_ready(&engine).await.unwrap_err();
        let waited = start.elapsed();

        match err {
            Error::ReadinessTimeout { elapsed } => assert!(elapsed >= gate.deadline()),
            other => panic!("expected readiness timeout, got {other:?}"),
        }
        assert!(waited >= Duration::from_secs(30));
        assert!(waited <= Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_is_cut_by_probe_timeout() {
        let engine = FakeEngine::new().with_probes(vec![], Probe::Hang);
        let gate = gate(HealthStatus::Yellow);

        let start = Instant::now();
        let err = gate.await_ready(&engine).await.unwrap_err();

        assert!(matches!(err, Error::ReadinessTimeout { .. }));
        assert!(start.elapsed() <= Duration::from_secs(35));
    }
}
