//! TCP connection to the script engine.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use super::transport::{Connection, Incoming};

const READ_CHUNK: usize = 64 * 1024;

/// [`Connection`] over a TCP stream.
///
/// Writes block; reads drain whatever the socket has buffered without
/// waiting for more.
#[derive(Debug)]
pub struct TcpConnection {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl TcpConnection {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stream: None,
        }
    }

    pub fn from_config(config: &crate::config::ServerConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not connected"))
    }
}

impl Connection for TcpConnection {
    fn open(&mut self) -> io::Result<()> {
        tracing::debug!(target: "transport", address = %self.address(), "connecting");
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()
    }

    fn receive(&mut self) -> io::Result<Incoming> {
        let stream = self.stream()?;
        stream.set_nonblocking(true)?;

        let mut data = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        let outcome = loop {
            match stream.read(&mut chunk) {
                Ok(0) if data.is_empty() => break Ok(Incoming::Closed),
                Ok(0) => break Ok(Incoming::Data(data)),
                Ok(n) => data.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    break Ok(if data.is_empty() {
                        Incoming::Idle
                    } else {
                        Incoming::Data(data)
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => break Err(err),
            }
        };

        stream.set_nonblocking(false)?;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::transport::{ConnectionState, Transport};
    use std::cell::RefCell;
    use std::net::TcpListener;
    use std::rc::Rc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_loopback_request_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut len = [0u8; 4];
            socket.read_exact(&mut len).unwrap();
            let mut body = vec![0u8; u32::from_le_bytes(len) as usize];
            socket.read_exact(&mut body).unwrap();
            assert_eq!(body, b"ping");
            socket.write_all(b"{\"pong\":true}").unwrap();
            // Hold the socket open until the client has read the reply
            thread::sleep(Duration::from_millis(200));
        });

        let mut transport = Transport::new(TcpConnection::new("127.0.0.1", port));
        let reply = Rc::new(RefCell::new(None));
        let reply_clone = reply.clone();

        transport.start();
        assert_eq!(transport.state(), ConnectionState::Ready);
        transport
            .process_request(
                b"ping".to_vec(),
                Some(Box::new(move |value| *reply_clone.borrow_mut() = Some(value))),
            )
            .unwrap();

        for _ in 0..100 {
            transport.poll();
            if reply.borrow().is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(*reply.borrow(), Some(serde_json::json!({"pong": true})));
        server.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

        let mut transport = Transport::new(TcpConnection::new("127.0.0.1", port));
        transport.start();
        assert_eq!(transport.state(), ConnectionState::Error);
    }

    #[test]
    fn test_receive_before_open() {
        let mut conn = TcpConnection::new("127.0.0.1", 1);
        assert_eq!(conn.receive().unwrap_err().kind(), io::ErrorKind::NotConnected);
    }
}
