//! A replayable server conversation.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use scr_session::{Transport, TransportError};

/// One scripted reply to `receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Frame(Vec<u8>),
    Timeout,
    Fatal(io::ErrorKind),
}

/// Transport that answers `receive` from a script and logs every `send`.
///
/// An exhausted script fails with `UnexpectedEof`, so a session that outlives
/// its script terminates instead of spinning. The sent log is shared, so a
/// clone taken before the transport moves into a session still sees it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: VecDeque<ScriptStep>,
    sent: Arc<Mutex<Vec<String>>>,
    fail_sends: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(mut self, text: impl Into<String>) -> Self {
        self.script
            .push_back(ScriptStep::Frame(text.into().into_bytes()));
        self
    }

    pub fn frames<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for text in texts {
            self = self.frame(text);
        }
        self
    }

    pub fn bytes(mut self, payload: Vec<u8>) -> Self {
        self.script.push_back(ScriptStep::Frame(payload));
        self
    }

    pub fn timeout(mut self) -> Self {
        self.script.push_back(ScriptStep::Timeout);
        self
    }

    pub fn fatal(mut self, kind: io::ErrorKind) -> Self {
        self.script.push_back(ScriptStep::Fatal(kind));
        self
    }

    /// Make every `send` fail with a connection error.
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Everything sent so far, decoded lossily.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Sent payloads that are not identification messages.
    pub fn sent_commands(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|s| !s.contains("(init "))
            .cloned()
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "scripted send failure",
            )));
        }
        self.sent
            .lock()
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }

    fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, TransportError> {
        match self.script.pop_front() {
            Some(ScriptStep::Frame(mut payload)) => {
                payload.truncate(max_bytes);
                Ok(payload)
            }
            Some(ScriptStep::Timeout) => Err(TransportError::Timeout),
            Some(ScriptStep::Fatal(kind)) => Err(TransportError::Io(io::Error::new(
                kind,
                "scripted receive failure",
            ))),
            None => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "script exhausted",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order() {
        let mut t = ScriptedTransport::new().frame("a").timeout().frame("b");
        assert_eq!(t.receive(100).ok(), Some(b"a".to_vec()));
        assert!(matches!(t.receive(100), Err(TransportError::Timeout)));
        assert_eq!(t.receive(100).ok(), Some(b"b".to_vec()));
        assert!(matches!(t.receive(100), Err(TransportError::Io(_))));
    }

    #[test]
    fn test_truncates_to_buffer() {
        let mut t = ScriptedTransport::new().frame("abcdef");
        assert_eq!(t.receive(3).ok(), Some(b"abc".to_vec()));
    }

    #[test]
    fn test_sent_log_is_shared_with_clones() {
        let observer = ScriptedTransport::new();
        let mut t = observer.clone();
        assert!(t.send(b"SCR(init 0.0)").is_ok());
        assert!(t.send(b"(accel 1.0)").is_ok());
        assert_eq!(observer.sent().len(), 2);
        assert_eq!(observer.sent_commands(), vec!["(accel 1.0)".to_string()]);
    }
}
