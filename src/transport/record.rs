use std::io;

use crate::Result;

/// Keeps everything written to it. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    writes: Vec<String>,
    queries: Vec<String>,
    identity: Option<String>,
    fail_after: Option<usize>,
}

impl RecordingTransport {
    pub fn new() -> RecordingTransport {
        Default::default()
    }

    /// Answer `*IDN?` with `identity` instead of failing the query.
    pub fn with_identity(mut self, identity: &str) -> RecordingTransport {
        self.identity = Some(identity.to_owned());
        self
    }

    /// Reject every write after the first `count`, as a dropped connection would.
    pub fn fail_after(mut self, count: usize) -> RecordingTransport {
        self.fail_after = Some(count);
        self
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    pub fn into_writes(self) -> Vec<String> {
        self.writes
    }
}

impl super::Transport for RecordingTransport {
    fn write(&mut self, command: &str) -> Result<()> {
        if self.fail_after.is_some_and(|count| self.writes.len() >= count) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection closed").into())
        }
        self.writes.push(command.to_owned());
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.queries.push(command.to_owned());
        match &self.identity {
            Some(identity) => Ok(identity.clone()),
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no response").into()),
        }
    }
}
