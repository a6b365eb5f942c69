//! Outbound event channel to the host.
//!
//! One newline-framed JSON message per gamepad event over a plain TCP
//! stream. Sends while the link is anything but open are dropped, never
//! queued: stale input is worse than lost input for a live controller.

use log::{info, warn};
use std::io::{self, Write};
use std::net::TcpStream;
use thiserror::Error;

use crate::events::GamepadEvent;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("connect to {addr} failed: {source}")]
    Connect { addr: String, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug)]
pub struct Link {
    addr: String,
    state: LinkState,
    stream: Option<TcpStream>,
}

impl Link {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            state: LinkState::Closed,
            stream: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    fn set_state(&mut self, state: LinkState) {
        if self.state != state {
            self.state = state;
            info!("link {}: {:?}", self.addr, state);
        }
    }

    pub fn connect(&mut self) -> Result<(), LinkError> {
        self.close();
        self.set_state(LinkState::Connecting);
        match TcpStream::connect(&self.addr) {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                self.stream = Some(stream);
                self.set_state(LinkState::Open);
                Ok(())
            }
            Err(source) => {
                self.set_state(LinkState::Closed);
                Err(LinkError::Connect {
                    addr: self.addr.clone(),
                    source,
                })
            }
        }
    }

    /// Serialize and transmit one event. Drops silently unless open; a write
    /// failure closes the link and drops the event.
    pub fn send(&mut self, event: &GamepadEvent) {
        if self.state != LinkState::Open {
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let line = match serde_json::to_string(event) {
            Ok(line) => line + "\n",
            Err(e) => {
                warn!("failed to encode event: {e}");
                return;
            }
        };
        if let Err(e) = stream.write_all(line.as_bytes()) {
            warn!("link {}: send failed ({e}); closing", self.addr);
            self.close();
        }
    }

    pub fn close(&mut self) {
        self.stream = None;
        self.set_state(LinkState::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    #[test]
    fn starts_closed_and_drops_sends() {
        let mut link = Link::new("127.0.0.1:1");
        assert_eq!(link.state(), LinkState::Closed);
        // Nothing to observe beyond "does not panic, stays closed".
        link.send(&GamepadEvent::Joystick { x: 0.0, y: 0.0 });
        assert_eq!(link.state(), LinkState::Closed);
    }

    #[test]
    fn connect_failure_reports_and_stays_closed() {
        // Port 1 on localhost is essentially never listening.
        let mut link = Link::new("127.0.0.1:1");
        assert!(link.connect().is_err());
        assert_eq!(link.state(), LinkState::Closed);
    }

    #[test]
    fn sends_line_framed_json_once_open() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = Link::new(addr.to_string());
        link.connect().unwrap();
        assert_eq!(link.state(), LinkState::Open);

        let (peer, _) = listener.accept().unwrap();
        link.send(&GamepadEvent::Joystick { x: 1.0, y: 0.0 });
        link.send(&GamepadEvent::Button {
            button: "Space",
            pressed: true,
        });

        let mut reader = BufReader::new(peer);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(
            line.trim_end(),
            r#"{"type":"joystick","data":{"x":1.0,"y":0.0}}"#
        );
        line.clear();
        reader.read_line(&mut line).unwrap();
        assert_eq!(
            line.trim_end(),
            r#"{"type":"button","data":{"button":"Space","pressed":true}}"#
        );
    }

    #[test]
    fn close_drops_further_sends() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = Link::new(addr.to_string());
        link.connect().unwrap();
        link.close();
        assert_eq!(link.state(), LinkState::Closed);
        link.send(&GamepadEvent::Joystick { x: 0.5, y: 0.5 });
        assert_eq!(link.state(), LinkState::Closed);
    }
}
