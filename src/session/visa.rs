use std::ffi::CString;
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use log::{debug, info};
use visa_rs::prelude::*;

use super::InstrumentSession;
use crate::error::{Error, Result};

impl From<visa_rs::Error> for Error {
    fn from(err: visa_rs::Error) -> Self {
        Error::Session(err.to_string())
    }
}

fn io_to_session_err(err: std::io::Error) -> Error {
    Error::from(visa_rs::io_to_vs_err(err))
}

/// Session to the first VISA resource matching a filter.
pub struct VisaSession {
    instr: Instrument,
    // Closing the default resource manager closes every session it opened,
    // so it must outlive `instr`.
    _rm: DefaultRM,
}

impl VisaSession {
    /// Open the first resource matching `filter` (e.g. `?*INSTR`).
    pub fn discover(filter: &str, timeout: Duration) -> Result<Self> {
        let rm = DefaultRM::new()?;
        let expr = CString::new(filter)
            .map_err(|e| Error::Config(format!("invalid VISA resource filter: {}", e)))?;

        let mut list = match rm.find_res_list(&expr.into()) {
            Ok(list) => list,
            // VI_ERROR_RSRC_NFOUND is reported as an error, not an empty list
            Err(err) => {
                debug!("VISA discovery failed: {}", err);
                return Err(Error::NoInstrument);
            }
        };
        let resource = list.find_next()?.ok_or(Error::NoInstrument)?;
        info!("Opening VISA resource {:?}", resource);
        let instr = rm.open(&resource, AccessMode::NO_LOCK, timeout)?;

        Ok(VisaSession { instr, _rm: rm })
    }
}

impl InstrumentSession for VisaSession {
    fn write(&mut self, command: &str) -> Result<()> {
        debug!("visa <- {}", command);
        self.instr
            .write_all(format!("{}\n", command).as_bytes())
            .map_err(io_to_session_err)
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.write(command)?;

        let mut response = String::new();
        {
            // Scoped so the reader's borrow ends before the next write
            let mut reader = BufReader::new(&self.instr);
            reader.read_line(&mut response).map_err(io_to_session_err)?;
        }
        debug!("visa -> {}", response.trim_end());
        Ok(response)
    }
}
