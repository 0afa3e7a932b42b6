//! Change notification channel between the file watcher and the worker.
//!
//! The supervisor process connects to the worker's unix socket, writes one
//! [`ChangeMessage`] and closes its end. The worker reads at most
//! [`MAX_MESSAGE_BYTES`] per connection and hands the paths to the reload
//! actor, waiting for that cycle to finish before accepting the next
//! connection, so notifications are processed in arrival order.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::message::ChangeMessage;

/// Connection attempts before the sender gives up.
pub const MAX_CONNECT_RETRIES: u32 = 5;
/// Delay between connection attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
/// Write timeout on an established connection.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound on a single notification.
pub const MAX_MESSAGE_BYTES: u64 = 64 * 1024;
/// How long the listener waits for a connected producer to finish writing.
pub const READ_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no reload listener on `{path}` after {attempts} attempts")]
    Unavailable {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("failed to send change notification")]
    Io(#[from] io::Error),

    #[error("socket notifications need a unix platform")]
    Unsupported,
}

/// Producer side of the channel.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    socket_path: PathBuf,
    retries: u32,
    delay: Duration,
}

impl NotificationSender {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            retries: MAX_CONNECT_RETRIES,
            delay: RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.delay = delay;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send the changed template paths. Blocks while retrying.
    #[cfg(unix)]
    pub fn send(&self, message: &ChangeMessage) -> Result<(), ChannelError> {
        use std::io::Write;
        use std::net::Shutdown;

        let mut stream = self.connect()?;
        stream.set_write_timeout(Some(SEND_TIMEOUT))?;
        stream.write_all(message.to_json().as_bytes())?;
        stream.shutdown(Shutdown::Write)?;
        crate::debug!("reload"; "sent change notification to {}", self.socket_path.display());
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn send(&self, _message: &ChangeMessage) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported)
    }

    #[cfg(unix)]
    fn connect(&self) -> Result<std::os::unix::net::UnixStream, ChannelError> {
        use std::os::unix::net::UnixStream;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match UnixStream::connect(&self.socket_path) {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt <= self.retries && is_retryable(&e) => {
                    crate::debug!("reload"; "listener not ready (attempt {}): {}", attempt, e);
                    std::thread::sleep(self.delay);
                }
                Err(source) => {
                    return Err(ChannelError::Unavailable {
                        path: self.socket_path.clone(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(unix)]
fn is_retryable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused | io::ErrorKind::WouldBlock
    )
}

#[cfg(unix)]
pub use listener::NotificationListener;

#[cfg(unix)]
mod listener {
    use std::io;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio::net::{UnixListener, UnixStream};
    use tokio::sync::{mpsc, oneshot};

    use super::{MAX_MESSAGE_BYTES, READ_TIMEOUT};
    use crate::actor::messages::ReloadMsg;
    use crate::reload::message::ChangeMessage;

    /// Consumer side of the channel.
    pub struct NotificationListener {
        listener: UnixListener,
        path: PathBuf,
        read_timeout: Duration,
    }

    impl NotificationListener {
        /// Bind `path`, replacing a stale socket file. Must run inside a
        /// tokio runtime.
        pub fn bind(path: &Path) -> io::Result<Self> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            match std::fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
            let listener = UnixListener::bind(path)?;
            crate::debug!("reload"; "listening on {}", path.display());
            Ok(Self {
                listener,
                path: path.to_path_buf(),
                read_timeout: READ_TIMEOUT,
            })
        }

        pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
            self.read_timeout = timeout;
            self
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        /// Accept notifications until the reload actor goes away.
        pub async fn run(self, reload_tx: mpsc::Sender<ReloadMsg>) {
            loop {
                let stream = match self.listener.accept().await {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        crate::log!("reload"; "socket accept failed: {}", e);
                        continue;
                    }
                };
                let Some(message) = read_message(stream, self.read_timeout).await else {
                    continue;
                };
                let ChangeMessage::UpdateViews(paths) = message;

                let (done_tx, done_rx) = oneshot::channel();
                let msg = ReloadMsg::UpdateViews {
                    paths: paths.into_iter().map(PathBuf::from).collect(),
                    done: Some(done_tx),
                };
                if reload_tx.send(msg).await.is_err() {
                    break;
                }
                // one cycle at a time, in arrival order
                let _ = done_rx.await;
            }
        }
    }

    impl Drop for NotificationListener {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    /// A producer that stays silent past `timeout` is dropped so later
    /// notifications still get through.
    async fn read_message(stream: UnixStream, timeout: Duration) -> Option<ChangeMessage> {
        let mut buf = Vec::new();
        let mut limited = stream.take(MAX_MESSAGE_BYTES);
        let read = limited.read_to_end(&mut buf);
        match tokio::time::timeout(timeout, read).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                crate::log!("reload"; "failed to read notification: {}", e);
                return None;
            }
            Err(_) => {
                crate::log!("reload"; "notification not completed within {:?}, dropping connection", timeout);
                return None;
            }
        }
        match ChangeMessage::parse(&buf) {
            Ok(Some(message)) => Some(message),
            Ok(None) => {
                crate::debug!("reload"; "ignoring notification with unknown event type");
                None
            }
            Err(e) => {
                crate::log!("reload"; "malformed change notification: {}", e);
                None
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::actor::messages::ReloadMsg;
    use tokio::sync::mpsc;

    #[test]
    fn test_send_without_listener_fails_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let sender = NotificationSender::new(dir.path().join("reload.sock"))
            .with_retry(2, Duration::from_millis(10));

        let err = sender
            .send(&ChangeMessage::update_views(["templates/a.toml"]))
            .unwrap_err();
        match err {
            ChannelError::Unavailable { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_notifications_arrive_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("run/reload.sock");
        let listener = NotificationListener::bind(&socket).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(listener.run(tx));

        let sender = NotificationSender::new(&socket).with_retry(3, Duration::from_millis(20));
        let send = tokio::task::spawn_blocking(move || {
            sender.send(&ChangeMessage::update_views(["templates/a.toml"]))?;
            sender.send(&ChangeMessage::update_views(["templates/b.toml"]))
        });

        for expected in ["templates/a.toml", "templates/b.toml"] {
            match rx.recv().await.unwrap() {
                ReloadMsg::UpdateViews { paths, done } => {
                    assert_eq!(paths, vec![PathBuf::from(expected)]);
                    done.unwrap().send(crate::actor::messages::ReloadOutcome::NoViews).unwrap();
                }
                ReloadMsg::Shutdown => panic!("unexpected shutdown"),
            }
        }
        send.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("reload.sock");
        let listener = NotificationListener::bind(&socket).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(listener.run(tx));

        let path = socket.clone();
        tokio::task::spawn_blocking(move || {
            let mut stream = std::os::unix::net::UnixStream::connect(&path).unwrap();
            stream.write_all(b"not json").unwrap();
        })
        .await
        .unwrap();

        let sender = NotificationSender::new(&socket);
        tokio::task::spawn_blocking(move || {
            sender
                .send(&ChangeMessage::update_views(["templates/ok.toml"]))
                .unwrap()
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            ReloadMsg::UpdateViews { paths, .. } => {
                assert_eq!(paths, vec![PathBuf::from("templates/ok.toml")]);
            }
            ReloadMsg::Shutdown => panic!("unexpected shutdown"),
        }
    }

    #[tokio::test]
    async fn test_silent_producer_does_not_block_listener() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("reload.sock");
        let listener = NotificationListener::bind(&socket)
            .unwrap()
            .with_read_timeout(Duration::from_millis(200));
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(listener.run(tx));

        // connects, never writes, never closes
        let silent = std::os::unix::net::UnixStream::connect(&socket).unwrap();

        let sender = NotificationSender::new(&socket).with_retry(3, Duration::from_millis(20));
        tokio::task::spawn_blocking(move || {
            sender
                .send(&ChangeMessage::update_views(["templates/late.toml"]))
                .unwrap()
        })
        .await
        .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("listener stalled behind a silent connection");
        match received.unwrap() {
            ReloadMsg::UpdateViews { paths, .. } => {
                assert_eq!(paths, vec![PathBuf::from("templates/late.toml")]);
            }
            ReloadMsg::Shutdown => panic!("unexpected shutdown"),
        }
        drop(silent);
    }
}
