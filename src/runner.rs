//! Single-slot background execution of interactive trials.
//!
//! The runner owns the session. Submitting a trial moves the session onto a
//! worker thread; it comes back when the trial finishes. At most one trial is
//! outstanding, and a running trial cannot be cancelled.

use std::mem;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::error;

use crate::error::{Error, Result};
use crate::experiment::{TestConfiguration, TrialResult, run_trial};
use crate::session::InstrumentSession;
use crate::trial_log::TrialLog;
use crate::validation::validate_inputs;
use crate::waveform::Waveform;

enum Slot<S> {
    Idle(S),
    Running(JoinHandle<(S, Result<TrialResult>)>),
    // The session was lost to a panicked or unspawnable worker.
    Poisoned,
}

pub struct TrialRunner<S> {
    slot: Slot<S>,
    log: TrialLog,
    settle_time: Duration,
}

impl<S> TrialRunner<S>
where
    S: InstrumentSession + Send + 'static,
{
    pub fn new(session: S, log: TrialLog, settle_time: Duration) -> Self {
        TrialRunner {
            slot: Slot::Idle(session),
            log,
            settle_time,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.slot, Slot::Running(_))
    }

    pub fn log(&self) -> &TrialLog {
        &self.log
    }

    /// The session, while no trial is running.
    pub fn session_mut(&mut self) -> Option<&mut S> {
        match &mut self.slot {
            Slot::Idle(session) => Some(session),
            _ => None,
        }
    }

    /// Start `config` on a worker thread. Fails with [`Error::Busy`] while a
    /// trial is outstanding.
    pub fn submit(&mut self, config: TestConfiguration) -> Result<()> {
        let mut session = match mem::replace(&mut self.slot, Slot::Poisoned) {
            Slot::Idle(session) => session,
            Slot::Running(handle) => {
                self.slot = Slot::Running(handle);
                return Err(Error::Busy);
            }
            Slot::Poisoned => return Err(Error::WorkerPanicked),
        };

        let log = self.log.clone();
        let settle_time = self.settle_time;
        let handle = thread::Builder::new()
            .name("trial".to_string())
            .spawn(move || {
                let result = run_trial(&mut session, &config, settle_time, &log);
                (session, result)
            })?;
        self.slot = Slot::Running(handle);
        Ok(())
    }

    /// Validate raw form input and start a trial with it.
    ///
    /// Rejected input returns [`Error::InvalidInput`] and nothing is sent to
    /// the instrument.
    pub fn submit_inputs(
        &mut self,
        waveform: Waveform,
        frequency: &str,
        amplitude: &str,
    ) -> Result<()> {
        let config = validate_inputs(waveform, frequency, amplitude)?;
        self.submit(config)
    }

    /// Collect the outcome of a finished trial without blocking.
    ///
    /// Returns `None` while the trial is still running or when nothing was
    /// submitted.
    pub fn poll(&mut self) -> Option<Result<TrialResult>> {
        let finished = matches!(&self.slot, Slot::Running(handle) if handle.is_finished());
        if finished { self.join() } else { None }
    }

    /// Block until the outstanding trial finishes.
    pub fn wait(&mut self) -> Option<Result<TrialResult>> {
        self.join()
    }

    fn join(&mut self) -> Option<Result<TrialResult>> {
        match mem::replace(&mut self.slot, Slot::Poisoned) {
            Slot::Running(handle) => match handle.join() {
                Ok((session, result)) => {
                    self.slot = Slot::Idle(session);
                    Some(result)
                }
                Err(_) => {
                    error!("Trial worker panicked, instrument session lost");
                    Some(Err(Error::WorkerPanicked))
                }
            },
            other => {
                self.slot = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Measurement;
    use crate::session::{MockReply, MockSession};

    fn config() -> TestConfiguration {
        TestConfiguration {
            waveform: Waveform::Sine,
            frequency_hz: 1000.0,
            amplitude_vpp: 1.0,
        }
    }

    #[test]
    fn second_submit_is_rejected_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrialLog::new(dir.path().join("log.csv"));
        let mut runner = TrialRunner::new(MockSession::new(), log, Duration::from_millis(200));

        runner.submit(config()).unwrap();
        assert!(runner.is_busy());
        assert!(matches!(runner.submit(config()), Err(Error::Busy)));
        assert!(runner.session_mut().is_none());

        let result = runner.wait().unwrap().unwrap();
        assert_eq!(result.measurement, Measurement::Volts(0.0));
        assert!(!runner.is_busy());

        // only the accepted trial reached the instrument
        let session = runner.session_mut().unwrap();
        assert_eq!(session.writes(), ["FUNC SIN", "FREQ 1000", "VOLT 1"]);
    }

    #[test]
    fn poll_returns_result_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrialLog::new(dir.path().join("log.csv"));
        let session = MockSession::new().with_measurement(MockReply::Value(0.75));
        let mut runner = TrialRunner::new(session, log, Duration::ZERO);

        assert!(runner.poll().is_none());
        runner.submit(config()).unwrap();

        let outcome = loop {
            if let Some(outcome) = runner.poll() {
                break outcome;
            }
            thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(outcome.unwrap().measurement, Measurement::Volts(0.75));
        assert!(runner.poll().is_none());
        assert!(runner.wait().is_none());
    }

    #[test]
    fn rejected_inputs_are_not_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrialLog::new(dir.path().join("log.csv"));
        log.init().unwrap();
        let mut runner = TrialRunner::new(MockSession::new(), log, Duration::ZERO);

        let err = runner.submit_inputs(Waveform::Sine, "5", "1.0").unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        let err = runner.submit_inputs(Waveform::Sine, "1000", "abc").unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(!runner.is_busy());
        assert!(runner.wait().is_none());
        assert!(runner.session_mut().unwrap().commands().is_empty());

        runner.submit_inputs(Waveform::Square, "2000", "2.5").unwrap();
        let result = runner.wait().unwrap().unwrap();
        assert_eq!(result.config.frequency_hz, 2000.0);
        assert_eq!(
            runner.session_mut().unwrap().writes(),
            ["FUNC SQU", "FREQ 2000", "VOLT 2.5"]
        );
    }

    #[test]
    fn runner_is_reusable_after_a_trial() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrialLog::new(dir.path().join("log.csv"));
        let mut runner = TrialRunner::new(MockSession::new(), log, Duration::ZERO);

        for _ in 0..3 {
            runner.submit(config()).unwrap();
            runner.wait().unwrap().unwrap();
        }
        let contents = std::fs::read_to_string(runner.log().path()).unwrap();
        assert_eq!(contents.lines().count(), 4);
    }
}
