use std::collections::VecDeque;

use log::debug;

use super::InstrumentSession;
use crate::error::{Error, Result};

/// Scripted answer to `MEAS:VOLT:DC?`.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Value(f64),
    /// Reply text returned verbatim, e.g. a malformed number.
    Text(String),
    /// The query fails as if it timed out.
    Fail,
}

/// Hardware-free session that records every command it receives.
///
/// Measurement queries are answered from a queue of scripted replies, then
/// from the default reply once the queue is empty.
#[derive(Debug, Clone)]
pub struct MockSession {
    identity: String,
    commands: Vec<String>,
    replies: VecDeque<MockReply>,
    default_reply: MockReply,
    fail_writes_starting_with: Option<String>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    pub fn new() -> Self {
        MockSession {
            identity: "Simulated,33522B,MOCK0001,1.0".to_string(),
            commands: Vec::new(),
            replies: VecDeque::new(),
            default_reply: MockReply::Value(0.0),
            fail_writes_starting_with: None,
        }
    }

    pub fn with_identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_string();
        self
    }

    /// Reply used whenever the scripted queue is empty.
    pub fn with_measurement(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Replies consumed in order by successive measurement queries.
    pub fn with_replies<I: IntoIterator<Item = MockReply>>(mut self, replies: I) -> Self {
        self.replies.extend(replies);
        self
    }

    /// Make every write whose text starts with `prefix` fail.
    pub fn with_failing_write(mut self, prefix: &str) -> Self {
        self.fail_writes_starting_with = Some(prefix.to_string());
        self
    }

    /// Every command and query received so far, in order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Commands received so far, queries excluded.
    pub fn writes(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|c| !c.ends_with('?'))
            .map(String::as_str)
            .collect()
    }
}

impl InstrumentSession for MockSession {
    fn write(&mut self, command: &str) -> Result<()> {
        debug!("mock <- {}", command);
        self.commands.push(command.to_string());
        match &self.fail_writes_starting_with {
            Some(prefix) if command.starts_with(prefix.as_str()) => Err(Error::Session(format!(
                "simulated write failure for '{}'",
                command
            ))),
            _ => Ok(()),
        }
    }

    fn query(&mut self, command: &str) -> Result<String> {
        debug!("mock <- {}", command);
        self.commands.push(command.to_string());
        match command {
            "*IDN?" => Ok(format!("{}\n", self.identity)),
            "MEAS:VOLT:DC?" => {
                let reply = self
                    .replies
                    .pop_front()
                    .unwrap_or_else(|| self.default_reply.clone());
                match reply {
                    MockReply::Value(v) => Ok(format!("{:+.6E}\n", v)),
                    MockReply::Text(text) => Ok(text),
                    MockReply::Fail => Err(Error::Session("query timed out".to_string())),
                }
            }
            other => Err(Error::Session(format!("undefined header: {}", other))),
        }
    }
}
