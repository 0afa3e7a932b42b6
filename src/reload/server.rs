//! WebSocket server for live clients.
//!
//! Runs on its own port next to the HTTP server. Accepted connections are
//! upgraded on the acceptor thread and registered in [`LiveClients`]; a
//! reader thread polls them to notice disconnects.

use std::net::{IpAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::clients::{ClientError, ClientStatus, LiveClient, LiveClients};
use crate::core::is_shutdown;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// A client that cannot take a frame within this long is dropped.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// A browser connected over WebSocket.
pub struct WsClient {
    ws: WebSocket<TcpStream>,
}

impl WsClient {
    /// Perform the server handshake on a blocking stream.
    ///
    /// The stream stays blocking so large frames are written whole; only
    /// [`poll`](LiveClient::poll) switches it to non-blocking.
    pub fn accept(stream: TcpStream) -> Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        let ws = tungstenite::accept(stream).map_err(|e| anyhow::anyhow!("handshake failed: {e}"))?;
        Ok(Self { ws })
    }

    fn drain(&mut self) -> ClientStatus {
        loop {
            match self.ws.read() {
                Ok(Message::Close(_)) => return ClientStatus::Closed,
                Ok(Message::Text(text)) => {
                    crate::debug!("ws"; "ignoring client message: {}", text.as_str());
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    return ClientStatus::Open;
                }
                Err(_) => return ClientStatus::Closed,
            }
        }
    }
}

impl LiveClient for WsClient {
    fn send_text(&mut self, text: &str) -> Result<(), ClientError> {
        self.ws.send(Message::Text(text.to_owned().into()))?;
        Ok(())
    }

    fn poll(&mut self) -> ClientStatus {
        if self.ws.get_ref().set_nonblocking(true).is_err() {
            return ClientStatus::Closed;
        }
        let status = self.drain();
        if self.ws.get_ref().set_nonblocking(false).is_err() {
            return ClientStatus::Closed;
        }
        status
    }

    fn close(&mut self) {
        let _ = self.ws.close(None);
        let _ = self.ws.flush();
    }
}

/// Start the WebSocket server. Returns the port actually bound.
pub fn start_ws_server(interface: IpAddr, base_port: u16, clients: Arc<LiveClients>) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    let acceptor_clients = Arc::clone(&clients);
    std::thread::spawn(move || {
        while !is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => match WsClient::accept(stream) {
                    Ok(client) => {
                        crate::debug!("ws"; "client connected: {}", addr);
                        acceptor_clients.register(Box::new(client));
                    }
                    Err(e) => crate::log!("ws"; "{}", e),
                },
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    crate::log!("ws"; "accept error: {}", e);
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
        acceptor_clients.close_all();
    });

    std::thread::spawn(move || {
        while !is_shutdown() {
            std::thread::sleep(POLL_INTERVAL);
            let removed = clients.poll_disconnects();
            if removed > 0 {
                crate::debug!("ws"; "{} client(s) disconnected", removed);
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_try_bind_port_skips_busy_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (first, port) = try_bind_port(localhost, 0, 1).unwrap();
        let (_second, next) = try_bind_port(localhost, port, 5).unwrap();
        assert_ne!(port, next);
        drop(first);
    }

    #[test]
    fn test_ws_client_receives_broadcast() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let browser = std::thread::spawn(move || {
            let (mut socket, _) =
                tungstenite::connect(format!("ws://127.0.0.1:{port}/")).unwrap();
            match socket.read().unwrap() {
                Message::Text(text) => text.as_str().to_string(),
                other => panic!("unexpected message: {other:?}"),
            }
        });

        let (stream, _) = listener.accept().unwrap();
        let clients = LiveClients::new();
        clients.register(Box::new(WsClient::accept(stream).unwrap()));
        assert_eq!(clients.broadcast_text(r#"{"event_type":"update_views","data":{}}"#), 1);

        assert_eq!(
            browser.join().unwrap(),
            r#"{"event_type":"update_views","data":{}}"#
        );
    }

    #[test]
    fn test_large_broadcast_is_delivered_whole() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let payload = format!(
            r#"{{"event_type":"update_views","data":{{"big":"{}"}}}}"#,
            "x".repeat(8 * 1024 * 1024)
        );

        let browser = std::thread::spawn(move || {
            let (mut socket, _) =
                tungstenite::connect(format!("ws://127.0.0.1:{port}/")).unwrap();
            match socket.read().unwrap() {
                Message::Text(text) => text.as_str().len(),
                other => panic!("unexpected message: {other:?}"),
            }
        });

        let (stream, _) = listener.accept().unwrap();
        let clients = LiveClients::new();
        clients.register(Box::new(WsClient::accept(stream).unwrap()));
        // a poll in between must not leave the socket non-blocking
        assert_eq!(clients.poll_disconnects(), 0);

        assert_eq!(clients.broadcast_text(&payload), 1);
        assert_eq!(clients.len(), 1);
        assert_eq!(browser.join().unwrap(), payload.len());
    }
}
