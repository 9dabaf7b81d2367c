use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::application::ports::{
    EngineError, EngineInvocation, EngineOutput, EngineRunner, ProgressFn,
};
use crate::application::services::ProgressEstimator;
use crate::infrastructure::monitor::ResourceSampler;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Ceiling on total engine runtime; the only timer that kills.
    pub hard_timeout: Duration,
    /// Silence threshold for the warn-only stall timer.
    pub activity_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub resource_sample_interval: Duration,
    /// Window between the graceful signal and the forceful kill.
    pub kill_grace: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            hard_timeout: Duration::from_secs(24 * 60 * 60),
            activity_timeout: Duration::from_secs(300),
            heartbeat_interval: Duration::from_secs(60),
            resource_sample_interval: Duration::from_secs(120),
            kill_grace: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputStream {
    Stdout,
    Stderr,
}

/// Launches the engine as a child process and multiplexes its two output
/// streams against the watchdog timers. The engine may be silent for long
/// stretches while still alive, so nothing here blocks on a read: lines
/// arrive over a channel and every timer stays responsive.
pub struct ProcessSupervisor {
    config: SupervisorConfig,
    sampler: ResourceSampler,
}

impl ProcessSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            sampler: ResourceSampler::new(),
        }
    }

    async fn terminate(&self, child: &mut Child) {
        if let Some(pid) = child.id() {
            tracing::warn!(pid, "Sending SIGTERM to engine process");
            // SAFETY: signalling a pid we own; failure is handled by the
            // forceful kill below.
            unsafe {
                libc::kill(pid as i32, libc::SIGTERM);
            }
        }

        match tokio::time::timeout(self.config.kill_grace, child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                tracing::warn!("Engine ignored SIGTERM, killing");
                let _ = child.kill().await;
                let _ = child.wait().await;
            }
        }
    }
}

#[async_trait]
impl EngineRunner for ProcessSupervisor {
    async fn run(
        &self,
        invocation: EngineInvocation,
        progress: ProgressFn,
    ) -> Result<EngineOutput, EngineError> {
        let started = Instant::now();
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        tracing::info!(
            pid = child.id(),
            command = %invocation.rendered(),
            "Engine process started"
        );

        let (line_tx, mut line_rx) = mpsc::channel::<(OutputStream, String)>(256);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, OutputStream::Stdout, line_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, OutputStream::Stderr, line_tx.clone());
        }
        // The channel closes once both readers hit EOF.
        drop(line_tx);

        let deadline = tokio::time::Instant::now() + self.config.hard_timeout;
        let mut stall = tick_after(self.config.activity_timeout);
        let mut heartbeat = tick_after(self.config.heartbeat_interval);
        let mut sampling = tick_after(self.config.resource_sample_interval);

        let mut estimator = ProgressEstimator::new();
        let mut stdout_lines: Vec<String> = Vec::new();
        let mut stderr_lines: Vec<String> = Vec::new();
        let mut last_output = Instant::now();

        loop {
            tokio::select! {
                received = line_rx.recv() => match received {
                    Some((stream, line)) => {
                        last_output = Instant::now();
                        observe_line(&mut estimator, stream, &line, &progress);
                        match stream {
                            OutputStream::Stdout => stdout_lines.push(line),
                            OutputStream::Stderr => stderr_lines.push(line),
                        }
                    }
                    // Both pipes closed: the process is exiting.
                    None => break,
                },
                _ = stall.tick() => {
                    let silent = last_output.elapsed();
                    if silent >= self.config.activity_timeout {
                        // Long silent computation is expected; warn only.
                        tracing::warn!(
                            silent_secs = silent.as_secs(),
                            "No engine output recently; process still running"
                        );
                    }
                },
                _ = heartbeat.tick() => {
                    tracing::info!(
                        elapsed_secs = started.elapsed().as_secs(),
                        lines = stdout_lines.len() + stderr_lines.len(),
                        progress = estimator.current(),
                        phase = estimator.phase().as_str(),
                        "Engine heartbeat"
                    );
                },
                _ = sampling.tick() => {
                    self.sampler.sample();
                },
                _ = tokio::time::sleep_until(deadline) => {
                    self.terminate(&mut child).await;
                    return Err(EngineError::Timeout {
                        elapsed_secs: started.elapsed().as_secs(),
                    });
                },
            }
        }

        // Pipes are drained; the exit itself still races the hard deadline.
        let status = tokio::select! {
            status = child.wait() => status?,
            _ = tokio::time::sleep_until(deadline) => {
                self.terminate(&mut child).await;
                return Err(EngineError::Timeout {
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
        };

        let elapsed = started.elapsed();
        let stdout = stdout_lines.join("\n");
        let stderr = stderr_lines.join("\n");

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            tracing::error!(code, elapsed_secs = elapsed.as_secs(), "Engine exited with failure");
            return Err(EngineError::NonZeroExit { code, stderr });
        }

        tracing::info!(
            elapsed_secs = elapsed.as_secs(),
            stdout_lines = stdout_lines.len(),
            stderr_lines = stderr_lines.len(),
            "Engine finished"
        );

        Ok(EngineOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

fn observe_line(
    estimator: &mut ProgressEstimator,
    stream: OutputStream,
    line: &str,
    progress: &ProgressFn,
) {
    let before = estimator.current();
    let estimate = estimator.observe(line);
    if estimate > before {
        progress(estimate);
    }

    let lower = line.to_lowercase();
    if stream == OutputStream::Stderr
        && (lower.contains("error") || lower.contains("failed") || lower.contains("exception"))
    {
        tracing::warn!(line, "Engine diagnostic");
    } else if estimate > before {
        tracing::debug!(estimate, line, "Engine progress");
    }
}

fn spawn_line_reader(
    reader: impl AsyncRead + Unpin + Send + 'static,
    stream: OutputStream,
    tx: mpsc::Sender<(OutputStream, String)>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send((stream, line)).await.is_err() {
                break;
            }
        }
    });
}

/// Interval whose first tick fires after one full period, not immediately.
fn tick_after(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval
}
