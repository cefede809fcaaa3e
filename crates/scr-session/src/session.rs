//! The session state machine.

use scr_codec::Sentinel;
use scr_driver::{CarryState, ControlPolicy, PolicyFactory, TeardownReason};
use scr_telemetry::{ControlCommand, DatasetRecord, SensorSnapshot, identification_message};
use tracing::{debug, error, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{SessionResult, TransportError};
use crate::phase::Phase;
use crate::recorder::Recorder;
use crate::transport::Transport;

/// Counters collected while a session runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Episodes opened, including the current one.
    pub episodes: u32,
    /// Racing cycles that produced a command.
    pub cycles: u64,
    /// Frames dropped without a decision.
    pub skipped_frames: u64,
    pub timeouts: u64,
    pub commands_sent: u64,
    /// Every phase entered, in order, starting with `Disconnected`.
    pub phases: Vec<Phase>,
}

/// One client connection: identification, racing, restarts, termination.
///
/// Each [`advance`](Session::advance) performs at most one blocking
/// receive, so the caller sees every phase transition.
pub struct Session<T: Transport> {
    config: SessionConfig,
    transport: T,
    factory: PolicyFactory,
    policy: ControlPolicy,
    carry: CarryState,
    recorder: Option<Box<dyn Recorder>>,
    recording: bool,
    identification: String,
    phase: Phase,
    episode: u32,
    step: u64,
    snapshot: SensorSnapshot,
    command: ControlCommand,
    report: SessionReport,
}

impl<T: Transport> Session<T> {
    pub fn new(config: SessionConfig, transport: T, factory: PolicyFactory) -> Self {
        let policy = factory.build();
        let identification = identification_message(&config.bot_id);
        Self {
            config,
            transport,
            factory,
            policy,
            carry: CarryState::new(),
            recorder: None,
            recording: false,
            identification,
            phase: Phase::Disconnected,
            episode: 0,
            step: 0,
            snapshot: SensorSnapshot::unavailable(),
            command: ControlCommand::default(),
            report: SessionReport {
                phases: vec![Phase::Disconnected],
                ..SessionReport::default()
            },
        }
    }

    /// Capture every processed cycle into `recorder`.
    pub fn with_recorder(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current episode number, starting at 1 once the session has begun.
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Cycles processed in the current episode.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn policy(&self) -> &ControlPolicy {
        &self.policy
    }

    pub fn carry(&self) -> &CarryState {
        &self.carry
    }

    pub fn last_snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn last_command(&self) -> &ControlCommand {
        &self.command
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run until the session terminates.
    ///
    /// # Errors
    ///
    /// Returns the first non-timeout transport failure. The policy is torn
    /// down and the recorder finished before the error is returned.
    pub fn run(&mut self) -> SessionResult<SessionReport> {
        while !self.phase.is_terminal() {
            self.advance()?;
        }
        info!(
            episodes = self.report.episodes,
            cycles = self.report.cycles,
            skipped = self.report.skipped_frames,
            "session finished"
        );
        Ok(self.report.clone())
    }

    /// Perform one unit of work for the current phase.
    ///
    /// # Errors
    ///
    /// A non-timeout transport failure terminates the session and is
    /// returned.
    pub fn advance(&mut self) -> SessionResult<Phase> {
        let result = match self.phase {
            Phase::Disconnected => {
                info!(
                    bot_id = %self.config.bot_id,
                    stage = %self.config.stage,
                    track = self.config.track.as_deref().unwrap_or("unknown"),
                    policy = %self.policy.kind(),
                    "session starting"
                );
                self.open_episode();
                self.enter(Phase::Identifying);
                Ok(())
            }
            Phase::Identifying => self.identify(),
            Phase::Racing => self.race_cycle(),
            Phase::Restarting => {
                self.restart();
                Ok(())
            }
            Phase::Terminated => Ok(()),
        };

        match result {
            Ok(()) => Ok(self.phase),
            Err(e) => {
                error!(error = %e, episode = self.episode, step = self.step, "terminating session");
                self.policy.teardown(TeardownReason::Shutdown);
                self.finish_recording();
                self.enter(Phase::Terminated);
                Err(e.into())
            }
        }
    }

    fn identify(&mut self) -> Result<(), TransportError> {
        debug!(bot_id = %self.config.bot_id, episode = self.episode, "sending identification");
        match self.transport.send(self.identification.as_bytes()) {
            Ok(()) => {}
            Err(TransportError::Timeout) => {
                self.report.timeouts += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        match self.transport.receive(self.config.receive_buffer_bytes) {
            Ok(bytes) => {
                let reply = String::from_utf8_lossy(&bytes);
                if Sentinel::detect(&reply) == Some(Sentinel::Identified) {
                    info!(episode = self.episode, "identified by server");
                    self.enter(Phase::Racing);
                } else {
                    debug!(reply = %reply, "unexpected reply during identification");
                }
                Ok(())
            }
            Err(TransportError::Timeout) => {
                self.report.timeouts += 1;
                debug!("no reply to identification, resending");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn race_cycle(&mut self) -> Result<(), TransportError> {
        let bytes = match self.transport.receive(self.config.receive_buffer_bytes) {
            Ok(bytes) => bytes,
            Err(TransportError::Timeout) => {
                self.report.timeouts += 1;
                trace!(episode = self.episode, step = self.step, "receive timed out");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let Ok(text) = std::str::from_utf8(&bytes) else {
            self.skip_frame("payload is not UTF-8");
            return Ok(());
        };

        match Sentinel::detect(text) {
            Some(Sentinel::Shutdown) => {
                info!(episode = self.episode, step = self.step, "server shutdown");
                self.policy.teardown(TeardownReason::Shutdown);
                self.finish_recording();
                self.enter(Phase::Terminated);
                return Ok(());
            }
            Some(Sentinel::Restart) => {
                info!(episode = self.episode, step = self.step, "server restart");
                self.policy.teardown(TeardownReason::Restart);
                self.enter(Phase::Restarting);
                return Ok(());
            }
            Some(Sentinel::Identified) => {
                self.skip_frame("repeated identification acknowledgement");
                return Ok(());
            }
            None => {}
        }

        let decoded = match scr_codec::decode(text) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.skip_frame(&e.to_string());
                return Ok(());
            }
        };
        if decoded.is_empty() {
            self.skip_frame("no sensor groups");
            return Ok(());
        }

        let snapshot = SensorSnapshot::from_decoded(&decoded);
        let decision = self
            .policy
            .decide(&snapshot, std::mem::take(&mut self.carry));
        self.carry = decision.carry;
        self.command = decision.command;
        self.record(&snapshot);
        self.snapshot = snapshot;

        let payload = self.command.encode();
        match self.transport.send(payload.as_bytes()) {
            Ok(()) => self.report.commands_sent += 1,
            Err(TransportError::Timeout) => {
                self.report.timeouts += 1;
                warn!(episode = self.episode, step = self.step, "command send timed out");
            }
            Err(e) => return Err(e),
        }

        self.step += 1;
        self.report.cycles += 1;
        debug!(episode = self.episode, step = self.step, command = %payload, "cycle");

        if self.config.max_steps > 0 && self.step >= self.config.max_steps {
            info!(
                episode = self.episode,
                max_steps = self.config.max_steps,
                "step limit reached"
            );
            self.policy.teardown(TeardownReason::Restart);
            self.enter(Phase::Restarting);
        }
        Ok(())
    }

    fn restart(&mut self) {
        self.finish_recording();

        if self.config.max_episodes > 0 && self.episode >= self.config.max_episodes {
            info!(
                episodes = self.episode,
                max_episodes = self.config.max_episodes,
                "episode limit reached"
            );
            self.policy.teardown(TeardownReason::Shutdown);
            self.enter(Phase::Terminated);
            return;
        }

        self.snapshot = SensorSnapshot::unavailable();
        self.command = ControlCommand::default();
        self.carry = CarryState::new();
        self.policy = self.factory.build();
        self.open_episode();
        self.enter(Phase::Identifying);
    }

    fn open_episode(&mut self) {
        self.episode = self.episode.saturating_add(1);
        self.step = 0;
        self.report.episodes = self.episode;
        info!(episode = self.episode, "episode started");

        self.recording = match self.recorder.as_mut() {
            Some(recorder) => match recorder.start_episode(self.episode) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, episode = self.episode, "recording disabled for episode");
                    false
                }
            },
            None => false,
        };
    }

    fn record(&mut self, snapshot: &SensorSnapshot) {
        if !self.recording {
            return;
        }
        if let Some(recorder) = self.recorder.as_mut() {
            let record = DatasetRecord::from_cycle(snapshot, &self.command);
            if let Err(e) = recorder.write(&record) {
                warn!(error = %e, episode = self.episode, step = self.step, "failed to record cycle");
            }
        }
    }

    fn finish_recording(&mut self) {
        if !std::mem::replace(&mut self.recording, false) {
            return;
        }
        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.finish_episode() {
                warn!(error = %e, episode = self.episode, "failed to finish recording");
            }
        }
    }

    fn skip_frame(&mut self, reason: &str) {
        self.report.skipped_frames += 1;
        warn!(episode = self.episode, step = self.step, reason, "skipping frame");
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        info!(from = %self.phase, to = %phase, episode = self.episode, "phase change");
        self.phase = phase;
        self.report.phases.push(phase);
    }
}
