//! Sending compiled command sequences to an instrument.

use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

mod socket;
mod record;

pub use socket::SocketTransport;
pub use record::RecordingTransport;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// A session with one instrument. Implementations add and strip message termination.
pub trait Transport {
    fn write(&mut self, command: &str) -> Result<()>;

    fn query(&mut self, command: &str) -> Result<String>;
}

/// Write `commands` in order. The instrument is asked to identify itself first; if it does not
/// answer, that is only logged. The first failed write ends the sequence.
pub fn apply<T: Transport + ?Sized>(transport: &mut T, commands: &[String]) -> Result<()> {
    match transport.query("*IDN?") {
        Ok(idn) => log::info!("applying {} command(s) to {}", commands.len(), idn.trim()),
        Err(error) => log::warn!("instrument did not identify itself: {}", error),
    }
    for command in commands {
        log::debug!("write {:?}", command);
        transport.write(command)?;
    }
    Ok(())
}

/// Open a session to `resource`, run `f` with it, and close it again on every path.
pub fn with_session<F, R>(resource: &str, timeout: Duration, f: F) -> Result<R>
        where F: FnOnce(&mut SocketTransport) -> Result<R> {
    let resource = resource.parse::<Resource>()?;
    let mut transport = SocketTransport::open(&resource, timeout)?;
    f(&mut transport)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Raw SCPI over a TCP socket.
    Socket,
    /// VXI-11 or HiSLIP instrument.
    Instr,
    Other,
}

/// A VISA resource string, such as `TCPIP0::192.168.1.20::5025::SOCKET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    text: String,
    interface: String,
    host: Option<String>,
    port: Option<u16>,
    kind: ResourceKind,
}

impl Resource {
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Network host for `TCPIP` resources.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn invalid(text: &str, reason: &'static str) -> Error {
        Error::Resource { resource: text.to_owned(), reason }
    }
}

impl std::str::FromStr for Resource {
    type Err = Error;

    fn from_str(text: &str) -> Result<Resource> {
        let text = text.trim();
        let parts = text.split("::").collect::<Vec<_>>();
        let interface = parts[0].to_owned();
        if interface.is_empty() {
            return Err(Resource::invalid(text, "empty resource string"))
        }
        let last = parts[parts.len() - 1].to_uppercase();
        let kind = match last.as_str() {
            "SOCKET" => ResourceKind::Socket,
            "INSTR" => ResourceKind::Instr,
            _ => ResourceKind::Other,
        };

        let mut host = None;
        let mut port = None;
        if interface.to_uppercase().starts_with("TCPIP") {
            host = match parts.get(1) {
                Some(host) if !host.is_empty() => Some((*host).to_owned()),
                _ => return Err(Resource::invalid(text, "missing host")),
            };
            if kind == ResourceKind::Socket {
                if parts.len() != 4 {
                    return Err(Resource::invalid(text, "expected TCPIP::<host>::<port>::SOCKET"))
                }
                port = match parts[2].parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(_) => return Err(Resource::invalid(text, "port is not a number")),
                };
            }
        } else if kind == ResourceKind::Socket {
            return Err(Resource::invalid(text, "socket resources must use the TCPIP interface"))
        }

        Ok(Resource { text: text.to_owned(), interface, host, port, kind })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resource_socket() {
        let resource = "TCPIP0::192.168.1.20::5025::SOCKET".parse::<Resource>().unwrap();
        assert_eq!(resource.interface(), "TCPIP0");
        assert_eq!(resource.host(), Some("192.168.1.20"));
        assert_eq!(resource.port(), Some(5025));
        assert_eq!(resource.kind(), ResourceKind::Socket);
        assert_eq!(resource.to_string(), "TCPIP0::192.168.1.20::5025::SOCKET");
    }

    #[test]
    fn test_resource_instr() {
        let resource = "TCPIP0::scope-lab.local::inst0::INSTR".parse::<Resource>().unwrap();
        assert_eq!(resource.host(), Some("scope-lab.local"));
        assert_eq!(resource.port(), None);
        assert_eq!(resource.kind(), ResourceKind::Instr);
        let resource = "TCPIP0::10.0.0.5::hislip0::INSTR".parse::<Resource>().unwrap();
        assert_eq!(resource.host(), Some("10.0.0.5"));
        assert_eq!(resource.kind(), ResourceKind::Instr);
    }

    #[test]
    fn test_resource_usb() {
        let resource = "USB0::0x2A8D::0x1797::MY123::INSTR".parse::<Resource>().unwrap();
        assert_eq!(resource.interface(), "USB0");
        assert_eq!(resource.host(), None);
        assert_eq!(resource.kind(), ResourceKind::Instr);
    }

    #[test]
    fn test_resource_invalid() {
        for text in ["", "TCPIP0", "TCPIP0::host::SOCKET", "TCPIP0::host::http::SOCKET",
                     "ASRL1::9600::SOCKET"] {
            assert!(matches!(text.parse::<Resource>(), Err(Error::Resource { .. })), "{:?}", text);
        }
    }

    #[test]
    fn test_apply_order() {
        let mut transport = RecordingTransport::new();
        let commands = vec!["DISP:LAB ON".to_owned(), ":TRIG:MODE EDGE".to_owned()];
        apply(&mut transport, &commands).unwrap();
        assert_eq!(transport.queries(), ["*IDN?"]);
        assert_eq!(transport.writes(), commands);
    }

    #[test]
    fn test_apply_stops_at_first_failure() {
        let mut transport = RecordingTransport::new().fail_after(1);
        let commands = vec!["A".to_owned(), "B".to_owned(), "C".to_owned()];
        assert!(apply(&mut transport, &commands).is_err());
        assert_eq!(transport.writes(), ["A"]);
    }
}
