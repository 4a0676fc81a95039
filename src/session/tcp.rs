use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use super::InstrumentSession;
use crate::error::{Error, Result};

/// Raw SCPI socket session.
///
/// A query that times out may still be answered later. The late reply is
/// discarded before the next query is sent, so it is never read as the
/// answer to a different query.
pub struct TcpSession {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
    // Set when a query timed out and its reply may still arrive
    stale_reply: bool,
}

impl TcpSession {
    /// Connect to a socket-server instrument, e.g. `192.168.1.20:5025`.
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self> {
        let stream = addr
            .to_socket_addrs()?
            .find_map(|a| TcpStream::connect_timeout(&a, timeout).ok())
            .ok_or(Error::NoInstrument)?;

        // Set read timeout to prevent hanging on unsupported queries
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        let reader = BufReader::new(stream.try_clone()?);
        Ok(TcpSession {
            writer: stream,
            reader,
            stale_reply: false,
        })
    }

    /// Drop every reply that does not belong to the next query.
    fn discard_pending(&mut self) -> Result<()> {
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);

        if self.stale_reply {
            // Wait up to one read timeout for each late line
            loop {
                let mut line = String::new();
                match self.reader.read_line(&mut line) {
                    Ok(0) => return Err(closed()),
                    Ok(_) => debug!("tcp discarding stale reply: {}", line.trim_end()),
                    Err(err) if is_timeout(&err) => break,
                    Err(err) => return Err(err.into()),
                }
            }
            self.stale_reply = false;
        }

        self.writer.set_nonblocking(true)?;
        let drained = self.drain_nonblocking();
        self.writer.set_nonblocking(false)?;
        drained
    }

    fn drain_nonblocking(&mut self) -> Result<()> {
        let mut scratch = [0u8; 256];
        loop {
            match self.reader.get_mut().read(&mut scratch) {
                Ok(0) => return Err(closed()),
                Ok(n) => debug!("tcp discarding {} unread bytes", n),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn closed() -> Error {
    Error::Session("connection closed by instrument".to_string())
}

impl InstrumentSession for TcpSession {
    fn write(&mut self, command: &str) -> Result<()> {
        debug!("tcp <- {}", command);
        self.writer.write_all(format!("{}\n", command).as_bytes())?;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.discard_pending()?;
        self.write(command)?;

        let mut response = String::new();
        match self.reader.read_line(&mut response) {
            Ok(0) => Err(closed()),
            Ok(_) => {
                debug!("tcp -> {}", response.trim_end());
                Ok(response)
            }
            Err(err) => {
                if is_timeout(&err) {
                    self.stale_reply = true;
                }
                Err(err.into())
            }
        }
    }
}
