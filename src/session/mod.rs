//! Command/query channel to a single waveform generator.
//!
//! Every backend speaks newline-terminated SCPI text. Writes are fire and
//! forget; only queries read a reply. Backends:
//!
//! - [`TcpSession`]: raw SCPI socket (port 5025 on Keysight 33500 series)
//! - [`VisaSession`]: VISA resource via `visa-rs` (feature `visa`)
//! - [`MockSession`]: in-process stand-in for dry runs and tests

mod mock;
mod tcp;
#[cfg(feature = "visa")]
mod visa;

use std::time::Duration;

use log::info;

use crate::config::{InstrumentConfig, SessionBackend};
use crate::error::{Error, Result};

pub use mock::{MockReply, MockSession};
pub use tcp::TcpSession;
#[cfg(feature = "visa")]
pub use visa::VisaSession;

/// A live channel to exactly one instrument.
pub trait InstrumentSession {
    /// Send a command without waiting for acknowledgement.
    fn write(&mut self, command: &str) -> Result<()>;

    /// Send a query and return the raw reply line.
    fn query(&mut self, command: &str) -> Result<String>;
}

impl<S: InstrumentSession + ?Sized> InstrumentSession for Box<S> {
    fn write(&mut self, command: &str) -> Result<()> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String> {
        (**self).query(command)
    }
}

impl<S: InstrumentSession + ?Sized> InstrumentSession for &mut S {
    fn write(&mut self, command: &str) -> Result<()> {
        (**self).write(command)
    }

    fn query(&mut self, command: &str) -> Result<String> {
        (**self).query(command)
    }
}

/// Owned session handle the binaries pass around.
pub type BoxedSession = Box<dyn InstrumentSession + Send>;

/// Query `*IDN?` and return the trimmed identification string.
pub fn identify<S: InstrumentSession + ?Sized>(session: &mut S) -> Result<String> {
    Ok(session.query("*IDN?")?.trim().to_string())
}

/// Open the session described by `config`.
///
/// Fails with [`Error::NoInstrument`] when discovery finds nothing, before
/// any command is sent.
pub fn open_session(config: &InstrumentConfig) -> Result<BoxedSession> {
    let timeout = Duration::from_millis(config.timeout_ms);
    match config.backend {
        SessionBackend::Mock => {
            info!("Using simulated instrument");
            Ok(Box::new(MockSession::new()))
        }
        SessionBackend::Tcp => {
            let address = config
                .address
                .as_deref()
                .ok_or_else(|| Error::Config("tcp backend requires an address".to_string()))?;
            info!("Connecting to {}", address);
            Ok(Box::new(TcpSession::connect(address, timeout)?))
        }
        #[cfg(feature = "visa")]
        SessionBackend::Visa => Ok(Box::new(VisaSession::discover(&config.resource, timeout)?)),
        #[cfg(not(feature = "visa"))]
        SessionBackend::Visa => Err(Error::FeatureNotEnabled("visa".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_trims_reply() {
        let mut session =
            MockSession::new().with_identity("Agilent Technologies,33522B,MY1,2.0\r\n");
        assert_eq!(
            identify(&mut session).unwrap(),
            "Agilent Technologies,33522B,MY1,2.0"
        );
        assert_eq!(session.commands(), ["*IDN?"]);
    }

    #[test]
    fn boxed_session_forwards_calls() {
        let mut session: BoxedSession = Box::new(MockSession::new());
        session.write("FUNC SIN").unwrap();
        assert!(identify(&mut session).is_ok());
    }

    #[test]
    fn tcp_backend_needs_address() {
        let config = InstrumentConfig {
            backend: SessionBackend::Tcp,
            address: None,
            ..InstrumentConfig::default()
        };
        assert!(matches!(open_session(&config), Err(Error::Config(_))));
    }

    #[cfg(not(feature = "visa"))]
    #[test]
    fn visa_backend_requires_feature() {
        let config = InstrumentConfig::default();
        assert!(matches!(
            open_session(&config),
            Err(Error::FeatureNotEnabled(_))
        ));
    }
}
