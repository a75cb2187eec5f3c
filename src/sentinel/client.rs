//! Sentinel discovery client.
//!
//! Blocking, one-shot query client for the `SENTINEL` command family. Each
//! query opens a fresh TCP connection to one reachable sentinel, writes the
//! command followed by `QUIT`, and drains the reply until the peer closes
//! the stream. Holds per-session connection state, so one instance serves
//! one consumer at a time.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::hosts::Endpoint;
use crate::sentinel::response::{self, EntityRecord};

/// Per-endpoint connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for the receive phase. The sentinel closes the connection right
/// after answering `QUIT`; a stalled or partitioned peer must surface as a
/// timeout instead of blocking the caller indefinitely.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SentinelClient {
    hosts: Vec<Endpoint>,
    stream: Option<TcpStream>,
}

impl SentinelClient {
    /// Client over the configured sentinel endpoints. The list is reused as
    /// the candidate pool of every query; it is never mutated.
    pub fn new(hosts: Vec<Endpoint>) -> Self {
        Self {
            hosts,
            stream: None,
        }
    }

    /// All masters currently monitored by the sentinel.
    pub fn masters(&mut self) -> Result<Vec<EntityRecord>> {
        let raw = self.execute_raw("SENTINEL masters")?;
        response::decode(&String::from_utf8_lossy(&raw))
    }

    /// All replicas of the named master.
    pub fn replicas(&mut self, master_name: &str) -> Result<Vec<EntityRecord>> {
        let raw = self.execute_raw(&format!("SENTINEL slaves {}", master_name))?;
        response::decode(&String::from_utf8_lossy(&raw))
    }

    /// Run one command against a reachable sentinel and return the raw,
    /// undecoded reply bytes.
    pub fn execute_raw(&mut self, command: &str) -> Result<Bytes> {
        self.connect()?;
        let result = self
            .send(command)
            .and_then(|_| self.send("QUIT"))
            .and_then(|_| self.receive());
        // One-shot session: tear down whether the exchange succeeded or not.
        self.close();
        result
    }

    /// Establish a session with one of the configured endpoints: each is
    /// tried at most once, in random order, until one accepts.
    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let mut pool = self.hosts.clone();
        fastrand::shuffle(&mut pool);

        for endpoint in pool {
            match try_connect(&endpoint) {
                Ok(stream) => {
                    log::debug!("connected to sentinel {}", endpoint);
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!("sentinel {} unreachable: {}", endpoint, e);
                }
            }
        }

        Err(Error::NoReachableHosts)
    }

    fn send(&mut self, message: &str) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        stream.write_all(message.trim().as_bytes())?;
        stream.write_all(b"\r\n")?;
        Ok(())
    }

    /// Drain the reply until the peer closes the stream.
    fn receive(&mut self) -> Result<Bytes> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut data = BytesMut::with_capacity(4096);
        let mut buf = [0u8; 1024];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => data.put_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    return Err(std::io::Error::new(
                        ErrorKind::TimedOut,
                        "sentinel did not close the connection within the read deadline",
                    )
                    .into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(data.freeze())
    }

    fn close(&mut self) {
        // Dropping the stream closes the socket.
        self.stream = None;
    }
}

/// Connect to a single endpoint with the fixed timeout. Name resolution
/// failures count as attempt failures, like refused connections.
fn try_connect(endpoint: &Endpoint) -> std::io::Result<TcpStream> {
    let addrs = (endpoint.host.as_str(), endpoint.port).to_socket_addrs()?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                stream.set_read_timeout(Some(READ_TIMEOUT))?;
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(ErrorKind::NotFound, "host resolved to no addresses")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// Bind-and-drop to find ports that refuse connections.
    fn closed_endpoint() -> Endpoint {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Endpoint::new("127.0.0.1", port)
    }

    /// Stub sentinel: accepts one client per queued reply, reads until the
    /// QUIT line arrives, answers, then closes the connection.
    fn spawn_stub(replies: Vec<&'static str>) -> (Endpoint, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            for reply in replies {
                let (mut socket, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 256];
                while !request.ends_with(b"QUIT\r\n") {
                    let n = socket.read(&mut buf).unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                socket.write_all(reply.as_bytes()).unwrap();
            }
        });

        (Endpoint::new("127.0.0.1", port), handle)
    }

    #[test]
    fn test_all_endpoints_unreachable() {
        let mut client = SentinelClient::new(vec![closed_endpoint(), closed_endpoint()]);
        match client.masters() {
            Err(Error::NoReachableHosts) => {}
            other => panic!("expected NoReachableHosts, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_host_list_fails_immediately() {
        let mut client = SentinelClient::new(vec![]);
        match client.masters() {
            Err(Error::NoReachableHosts) => {}
            other => panic!("expected NoReachableHosts, got {:?}", other),
        }
    }

    #[test]
    fn test_single_reachable_endpoint_among_failures() {
        let reply = "*1\r\n$4\r\nname\r\n$8\r\nmymaster\r\n+OK\r\n";
        let (live, handle) = spawn_stub(vec![reply]);

        // Whatever order the shuffle picks, the one live endpoint wins.
        let mut client =
            SentinelClient::new(vec![closed_endpoint(), live, closed_endpoint()]);
        let masters = client.masters().unwrap();

        assert_eq!(masters.len(), 1);
        assert_eq!(masters[0].get("name"), Some("mymaster"));
        handle.join().unwrap();
    }

    #[test]
    fn test_execute_raw_returns_undecoded_bytes() {
        let reply = "*1\r\n$4\r\nname\r\n$8\r\nmymaster\r\n+OK\r\n";
        let (live, handle) = spawn_stub(vec![reply]);

        let mut client = SentinelClient::new(vec![live]);
        let raw = client.execute_raw("SENTINEL masters").unwrap();

        assert_eq!(raw, Bytes::from_static(reply.as_bytes()));
        handle.join().unwrap();
    }

    #[test]
    fn test_replicas_query() {
        let reply = "*1\r\n$2\r\nip\r\n$8\r\n10.0.0.2\r\n$4\r\nport\r\n$4\r\n6379\r\n";
        let (live, handle) = spawn_stub(vec![reply]);

        let mut client = SentinelClient::new(vec![live]);
        let replicas = client.replicas("mymaster").unwrap();

        assert_eq!(replicas.len(), 1);
        assert_eq!(replicas[0].get("ip"), Some("10.0.0.2"));
        assert_eq!(replicas[0].get("port"), Some("6379"));
        handle.join().unwrap();
    }

    #[test]
    fn test_session_tears_down_after_each_query() {
        let reply = "*1\r\n$4\r\nname\r\n$8\r\nmymaster\r\n";
        let (live, handle) = spawn_stub(vec![reply, reply]);

        let mut client = SentinelClient::new(vec![live]);
        client.masters().unwrap();
        assert!(client.stream.is_none());

        // A second query opens a fresh session against the same endpoint.
        let masters = client.masters().unwrap();
        assert_eq!(masters[0].get("name"), Some("mymaster"));
        handle.join().unwrap();
    }
}
