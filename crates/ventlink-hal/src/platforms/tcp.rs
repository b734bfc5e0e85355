// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host socket provider on top of `std::net`
//!
//! Emulates the numbered-socket model of a hardwired TCP/IP chip with
//! non-blocking std sockets. Several socket numbers may listen on the same port:
//! they share one [`TcpListener`] and whichever socket is polled first while a
//! connection is pending accepts it.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use crate::hal::{SocketId, SocketProvider, SocketStatus, Transfer};

/// Size of the scratch buffer used to probe a stream without consuming it
const PEEK_BUFFER_SIZE: usize = 2048;

/// Errors raised by [`TcpSocketProvider`]
#[derive(Debug, thiserror::Error)]
pub enum TcpSocketError {
    /// The socket number was never opened
    #[error("socket {0} is not open")]
    NotOpen(SocketId),

    /// Binding the shared listener failed
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Any other socket error
    #[error("socket I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug)]
struct Slot {
    port: u16,
    status: SocketStatus,
    stream: Option<TcpStream>,
}

/// Numbered sockets backed by non-blocking `std::net` streams
#[derive(Debug)]
pub struct TcpSocketProvider {
    bind_host: String,
    listeners: HashMap<u16, TcpListener>,
    slots: HashMap<SocketId, Slot>,
    scratch: Vec<u8>,
}

impl TcpSocketProvider {
    /// Create a provider binding listeners on `bind_host` (e.g. `0.0.0.0`)
    pub fn new(bind_host: impl Into<String>) -> Self {
        Self {
            bind_host: bind_host.into(),
            listeners: HashMap::new(),
            slots: HashMap::new(),
            scratch: vec![0; PEEK_BUFFER_SIZE],
        }
    }

    /// Actual address of the listener opened for `port`
    ///
    /// Useful when `port` is 0 and the OS picked an ephemeral port.
    pub fn local_addr(&self, port: u16) -> Option<SocketAddr> {
        self.listeners.get(&port)?.local_addr().ok()
    }

    fn ensure_listener(&mut self, port: u16) -> Result<(), TcpSocketError> {
        if self.listeners.contains_key(&port) {
            return Ok(());
        }

        let addr = format!("{}:{}", self.bind_host, port);
        let listener = TcpListener::bind(&addr).map_err(|source| TcpSocketError::Bind {
            addr: addr.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        self.listeners.insert(port, listener);
        Ok(())
    }
}

impl SocketProvider for TcpSocketProvider {
    type Error = TcpSocketError;

    fn open_listener(&mut self, socket: SocketId, port: u16) -> Result<(), TcpSocketError> {
        self.ensure_listener(port)?;
        self.slots.insert(
            socket,
            Slot {
                port,
                status: SocketStatus::Init,
                stream: None,
            },
        );
        Ok(())
    }

    fn listen(&mut self, socket: SocketId) -> Result<(), TcpSocketError> {
        match self.slots.get_mut(&socket) {
            Some(slot) if slot.status == SocketStatus::Init => {
                slot.status = SocketStatus::Listen;
                Ok(())
            }
            _ => Err(TcpSocketError::NotOpen(socket)),
        }
    }

    fn status(&mut self, socket: SocketId) -> SocketStatus {
        let Some(slot) = self.slots.get_mut(&socket) else {
            return SocketStatus::Closed;
        };

        match slot.status {
            SocketStatus::Listen => {
                let Some(listener) = self.listeners.get(&slot.port) else {
                    slot.status = SocketStatus::Error;
                    return slot.status;
                };
                match listener.accept() {
                    Ok((stream, _peer)) => match stream.set_nonblocking(true) {
                        Ok(()) => {
                            slot.stream = Some(stream);
                            slot.status = SocketStatus::Established;
                        }
                        Err(_) => slot.status = SocketStatus::Error,
                    },
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(_) => slot.status = SocketStatus::Error,
                }
            }
            SocketStatus::Established => {
                if let Some(stream) = slot.stream.as_ref() {
                    match stream.peek(&mut self.scratch) {
                        Ok(0) => slot.status = SocketStatus::CloseWait,
                        Ok(_) => {}
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                        Err(_) => slot.status = SocketStatus::Error,
                    }
                } else {
                    slot.status = SocketStatus::Error;
                }
            }
            _ => {}
        }

        slot.status
    }

    fn readable_bytes(&mut self, socket: SocketId) -> usize {
        self.slots
            .get(&socket)
            .and_then(|slot| slot.stream.as_ref())
            .and_then(|stream| stream.peek(&mut self.scratch).ok())
            .unwrap_or(0)
    }

    fn receive(&mut self, socket: SocketId, buffer: &mut [u8]) -> Transfer<TcpSocketError> {
        let Some(slot) = self.slots.get_mut(&socket) else {
            return Transfer::Failed(TcpSocketError::NotOpen(socket));
        };
        let Some(stream) = slot.stream.as_mut() else {
            return Transfer::Failed(TcpSocketError::NotOpen(socket));
        };

        match stream.read(buffer) {
            Ok(0) if !buffer.is_empty() => {
                slot.status = SocketStatus::CloseWait;
                Transfer::WouldBlock
            }
            Ok(n) => Transfer::Complete(n),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Transfer::WouldBlock
            }
            Err(e) => Transfer::Failed(e.into()),
        }
    }

    fn send(&mut self, socket: SocketId, data: &[u8]) -> Transfer<TcpSocketError> {
        let Some(stream) = self
            .slots
            .get_mut(&socket)
            .and_then(|slot| slot.stream.as_mut())
        else {
            return Transfer::Failed(TcpSocketError::NotOpen(socket));
        };

        match stream.write(data) {
            Ok(n) => Transfer::Complete(n),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Transfer::WouldBlock
            }
            Err(e) => Transfer::Failed(e.into()),
        }
    }

    fn shutdown(&mut self, socket: SocketId) -> Result<(), TcpSocketError> {
        let slot = self
            .slots
            .get_mut(&socket)
            .ok_or(TcpSocketError::NotOpen(socket))?;

        if let Some(stream) = slot.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => {
                    slot.stream = Some(stream);
                    return Err(e.into());
                }
            }
        }
        slot.status = SocketStatus::Closed;
        Ok(())
    }

    fn close(&mut self, socket: SocketId) {
        if let Some(slot) = self.slots.get_mut(&socket) {
            slot.stream = None;
            slot.status = SocketStatus::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn wait_for_status(
        provider: &mut TcpSocketProvider,
        socket: SocketId,
        expected: SocketStatus,
    ) -> bool {
        for _ in 0..200 {
            if provider.status(socket) == expected {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_open_and_listen() {
        let mut provider = TcpSocketProvider::new("127.0.0.1");
        provider.open_listener(1, 0).unwrap();
        assert_eq!(provider.status(1), SocketStatus::Init);

        provider.listen(1).unwrap();
        assert_eq!(provider.status(1), SocketStatus::Listen);
        assert!(provider.local_addr(0).is_some());
    }

    #[test]
    fn test_listen_requires_open_socket() {
        let mut provider = TcpSocketProvider::new("127.0.0.1");
        assert!(matches!(provider.listen(3), Err(TcpSocketError::NotOpen(3))));
        assert_eq!(provider.status(3), SocketStatus::Closed);
    }

    #[test]
    fn test_shared_listener_accepts_on_one_slot() {
        let mut provider = TcpSocketProvider::new("127.0.0.1");
        provider.open_listener(1, 0).unwrap();
        provider.open_listener(2, 0).unwrap();
        provider.listen(1).unwrap();
        provider.listen(2).unwrap();

        let addr = provider.local_addr(0).unwrap();
        let mut client = TcpStream::connect(addr).unwrap();

        assert!(wait_for_status(&mut provider, 1, SocketStatus::Established));
        assert_eq!(provider.status(2), SocketStatus::Listen);

        client.write_all(b"GET#").unwrap();
        for _ in 0..200 {
            if provider.readable_bytes(1) == 4 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        let mut buffer = [0u8; 16];
        assert_eq!(provider.receive(1, &mut buffer).completed(), Some(4));
        assert_eq!(&buffer[..4], b"GET#");

        assert_eq!(provider.send(1, b"S1#").completed(), Some(3));
        let mut reply = [0u8; 3];
        client.read_exact(&mut reply).unwrap();
        assert_eq!(&reply, b"S1#");
    }

    #[test]
    fn test_peer_close_reports_close_wait() {
        let mut provider = TcpSocketProvider::new("127.0.0.1");
        provider.open_listener(1, 0).unwrap();
        provider.listen(1).unwrap();

        let client = TcpStream::connect(provider.local_addr(0).unwrap()).unwrap();
        assert!(wait_for_status(&mut provider, 1, SocketStatus::Established));

        drop(client);
        assert!(wait_for_status(&mut provider, 1, SocketStatus::CloseWait));

        provider.shutdown(1).unwrap();
        assert_eq!(provider.status(1), SocketStatus::Closed);
    }
}
