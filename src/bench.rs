//! Startup shared by both binaries: connect, identify, prepare the log.

use log::info;

use crate::config::SweepConfig;
use crate::error::Result;
use crate::session::{BoxedSession, identify, open_session};
use crate::trial_log::TrialLog;

/// An identified instrument and the log its trials go to.
pub struct Bench {
    pub session: BoxedSession,
    pub identity: String,
    pub log: TrialLog,
}

impl Bench {
    /// Open the instrument, query `*IDN?`, then create the log header.
    ///
    /// The log file is touched only once an instrument has answered, so a
    /// missing instrument leaves no file behind.
    pub fn open(config: &SweepConfig) -> Result<Bench> {
        info!("Connecting to instrument...");
        let mut session = open_session(&config.instrument)?;
        let identity = identify(&mut session)?;
        info!("Connected to: {}", identity);

        let log = TrialLog::new(&config.log_file);
        log.init()?;

        Ok(Bench {
            session,
            identity,
            log,
        })
    }
}
