use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::{Error, Result};
use super::{Resource, ResourceKind};

const WRITE_TERMINATION: &str = "\n";

/// Raw SCPI session over TCP (`TCPIP::<host>::<port>::SOCKET` resources).
#[derive(Debug)]
pub struct SocketTransport {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    resource: String,
}

impl SocketTransport {
    pub fn open(resource: &Resource, timeout: Duration) -> Result<SocketTransport> {
        let (host, port) = match (resource.kind(), resource.host(), resource.port()) {
            (ResourceKind::Socket, Some(host), Some(port)) => (host, port),
            _ => return Err(Error::Resource {
                resource: resource.to_string(),
                reason: "only TCPIP::<host>::<port>::SOCKET resources are supported",
            }),
        };
        let mut last_error = None;
        for address in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&address, timeout) {
                Ok(stream) => {
                    log::debug!("connected to {} at {}", resource, address);
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    let reader = BufReader::new(stream.try_clone()?);
                    return Ok(SocketTransport { stream, reader, resource: resource.to_string() })
                }
                Err(error) => {
                    log::debug!("could not connect to {} at {}: {}", resource, address, error);
                    last_error = Some(error);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host has no addresses"))
            .into())
    }
}

impl super::Transport for SocketTransport {
    fn write(&mut self, command: &str) -> Result<()> {
        log::trace!("{}: write {:?}", self.resource, command);
        let mut message = String::with_capacity(command.len() + WRITE_TERMINATION.len());
        message.push_str(command);
        message.push_str(WRITE_TERMINATION);
        self.stream.write_all(message.as_bytes())?;
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.write(command)?;
        let mut response = String::new();
        if self.reader.read_line(&mut response)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed").into())
        }
        let response = response.trim_end_matches(['\r', '\n']).to_owned();
        log::trace!("{}: read {:?}", self.resource, response);
        Ok(response)
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        // the peer may already be gone; nothing left to report to
        let _ = self.stream.shutdown(Shutdown::Both);
        log::debug!("closed {}", self.resource);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    use crate::transport::{apply, Transport};

    /// Accept one connection, answer `*IDN?`, and return every line received.
    fn fake_instrument() -> (u16, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut lines = Vec::new();
            for line in BufReader::new(stream).lines() {
                let line = line.unwrap();
                if line == "*IDN?" {
                    writer.write_all(b"KEYSIGHT,DSOX3024T,MY0001,7.50\n").unwrap();
                }
                lines.push(line);
            }
            lines
        });
        (port, handle)
    }

    #[test]
    fn test_socket_apply() {
        let (port, handle) = fake_instrument();
        let resource = format!("TCPIP0::127.0.0.1::{}::SOCKET", port);
        let commands = vec!["DISP:LAB ON".to_owned(), "SINGLE".to_owned()];
        crate::with_session(&resource, Duration::from_secs(5), |transport| {
            assert_eq!(transport.query("*IDN?")?, "KEYSIGHT,DSOX3024T,MY0001,7.50");
            apply(transport, &commands)
        }).unwrap();
        assert_eq!(handle.join().unwrap(), ["*IDN?", "*IDN?", "DISP:LAB ON", "SINGLE"]);
    }

    #[test]
    fn test_socket_rejects_instr() {
        let resource = "TCPIP0::127.0.0.1::inst0::INSTR".parse::<Resource>().unwrap();
        assert!(matches!(SocketTransport::open(&resource, Duration::from_secs(1)),
            Err(Error::Resource { .. })));
    }
}
