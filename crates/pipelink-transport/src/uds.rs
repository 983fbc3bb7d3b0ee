use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{PipeConnector, PipeMode, PipeStream};

/// Unix domain socket backend.
///
/// Endpoints are filesystem-path stream sockets. Connects are issued
/// non-blocking, so a full accept backlog (`EAGAIN`) is reported as busy
/// instead of parking in the kernel. Waiting for availability probes the
/// endpoint until a connect goes through; that connection is kept and
/// handed out by the next [`try_connect`](PipeConnector::try_connect) for
/// the same address.
#[derive(Debug)]
pub struct UnixSocketConnector {
    poll_interval: Duration,
    ready: Mutex<Option<(String, UnixStream)>>,
}

impl UnixSocketConnector {
    /// Default interval between availability probes.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    pub fn new() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            ready: Mutex::new(None),
        }
    }

    /// Use a different probe interval for [`PipeConnector::wait_available`].
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn take_ready(&self, address: &str) -> Option<UnixStream> {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        match ready.take() {
            Some((ready_address, stream)) if ready_address == address => Some(stream),
            _ => None,
        }
    }

    fn store_ready(&self, address: &str, stream: UnixStream) {
        let mut ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);
        *ready = Some((address.to_string(), stream));
    }
}

impl Default for UnixSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

fn cvt(rc: libc::c_int) -> std::io::Result<libc::c_int> {
    if rc == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(rc)
    }
}

fn set_nonblocking(fd: RawFd, nonblocking: bool) -> std::io::Result<()> {
    // SAFETY: `fd` is an open descriptor owned by the caller; F_GETFL/F_SETFL
    // only touch its status flags.
    let flags = cvt(unsafe { libc::fcntl(fd, libc::F_GETFL) })?;
    let flags = if nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };
    // SAFETY: as above.
    cvt(unsafe { libc::fcntl(fd, libc::F_SETFL, flags) })?;
    Ok(())
}

fn socket_addr(address: &str) -> std::io::Result<(libc::sockaddr_un, libc::socklen_t)> {
    // SAFETY: `sockaddr_un` is plain old data and all-zero is a valid value.
    let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;

    let bytes = address.as_bytes();
    if bytes.contains(&0) || bytes.len() >= addr.sun_path.len() {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            "socket path must fit sun_path and contain no NUL bytes",
        ));
    }
    for (dst, src) in addr.sun_path.iter_mut().zip(bytes) {
        *dst = *src as libc::c_char;
    }

    // `sun_path` is the trailing field on every supported platform.
    let path_offset = std::mem::size_of_val(&addr) - std::mem::size_of_val(&addr.sun_path);
    let len = path_offset + bytes.len() + 1;
    Ok((addr, len as libc::socklen_t))
}

/// Connect without blocking on a full backlog. The returned stream is in
/// blocking mode.
fn connect_nonblocking(address: &str) -> std::io::Result<UnixStream> {
    let (addr, len) = socket_addr(address)?;

    // SAFETY: plain socket(2) call; the result is checked before use.
    let raw = cvt(unsafe { libc::socket(libc::AF_UNIX, libc::SOCK_STREAM, 0) })?;
    // SAFETY: `raw` was just returned by socket(2) and nothing else owns it.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    // SAFETY: `fd` is open; FD_CLOEXEC only affects exec inheritance.
    cvt(unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) })?;
    set_nonblocking(fd.as_raw_fd(), true)?;

    // SAFETY: `addr` is a fully initialized sockaddr_un and `len` does not
    // exceed its size.
    cvt(unsafe {
        libc::connect(
            fd.as_raw_fd(),
            (&addr as *const libc::sockaddr_un).cast::<libc::sockaddr>(),
            len,
        )
    })?;

    set_nonblocking(fd.as_raw_fd(), false)?;
    Ok(UnixStream::from(fd))
}

fn is_busy(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EINPROGRESS)
}

impl PipeConnector for UnixSocketConnector {
    type Stream = UnixPipeStream;

    fn try_connect(&self, address: &str) -> Result<UnixPipeStream> {
        let len = address.len();
        if len >= Self::MAX_PATH_LEN {
            return Err(TransportError::AddressTooLong {
                address: address.to_string(),
                len,
                max: Self::MAX_PATH_LEN,
            });
        }

        if let Some(stream) = self.take_ready(address) {
            debug!(address, "using connection opened while waiting");
            return Ok(UnixPipeStream { inner: stream });
        }

        match connect_nonblocking(address) {
            Ok(stream) => {
                debug!(address, "connected to unix domain socket");
                Ok(UnixPipeStream { inner: stream })
            }
            Err(err) if is_busy(&err) => Err(TransportError::Busy {
                address: address.to_string(),
            }),
            Err(source) => Err(TransportError::Connect {
                address: address.to_string(),
                source,
            }),
        }
    }

    fn wait_available(&self, address: &str, timeout: Duration) -> std::io::Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            match std::fs::symlink_metadata(Path::new(address)) {
                Ok(metadata) if metadata.file_type().is_socket() => {
                    match connect_nonblocking(address) {
                        Ok(stream) => {
                            self.store_ready(address, stream);
                            return Ok(true);
                        }
                        Err(err)
                            if is_busy(&err)
                                || matches!(
                                    err.kind(),
                                    ErrorKind::ConnectionRefused | ErrorKind::NotFound
                                ) => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(_) => {
                    return Err(std::io::Error::new(
                        ErrorKind::InvalidInput,
                        "existing path is not a unix socket",
                    ))
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    fn transport_name(&self) -> &'static str {
        "unix-domain-socket"
    }
}

/// A connected Unix domain socket.
pub struct UnixPipeStream {
    inner: UnixStream,
}

impl UnixPipeStream {
    /// Wrap an already-connected stream.
    pub fn from_stream(inner: UnixStream) -> Self {
        Self { inner }
    }

    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.inner.set_read_timeout(timeout)
    }
}

impl Read for UnixPipeStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for UnixPipeStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl PipeStream for UnixPipeStream {
    fn set_read_mode(&mut self, mode: PipeMode) -> std::io::Result<()> {
        match mode {
            PipeMode::Byte => Ok(()),
            PipeMode::Message => Err(std::io::Error::new(
                ErrorKind::Unsupported,
                "message read mode is not supported by unix domain stream sockets",
            )),
        }
    }
}

impl std::fmt::Debug for UnixPipeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPipeStream")
            .field("type", &"unix")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;

    use super::*;

    fn unique_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pipelink-uds-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_connect_and_exchange() {
        let dir = unique_dir("connect");
        let sock_path = dir.join("test.sock");
        let listener = UnixListener::bind(&sock_path).unwrap();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
            stream.write_all(b"world").unwrap();
        });

        let connector = UnixSocketConnector::new();
        let mut stream = connector
            .try_connect(sock_path.to_str().unwrap())
            .unwrap();
        stream.set_read_mode(PipeMode::Byte).unwrap();
        stream.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"world");

        server.join().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_endpoint_is_not_busy() {
        let dir = unique_dir("missing");
        let sock_path = dir.join("absent.sock");

        let err = UnixSocketConnector::new()
            .try_connect(sock_path.to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(!err.is_busy());
        assert!(err.raw_os_error().is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_address_too_long() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        let result = UnixSocketConnector::new().try_connect(&long_path);
        assert!(matches!(result, Err(TransportError::AddressTooLong { .. })));
    }

    #[test]
    fn test_wait_available_sees_late_socket() {
        let dir = unique_dir("late");
        let sock_path = dir.join("late.sock");

        let path_clone = sock_path.clone();
        let binder = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            UnixListener::bind(&path_clone).unwrap()
        });

        let available = UnixSocketConnector::new()
            .wait_available(sock_path.to_str().unwrap(), Duration::from_secs(2))
            .unwrap();
        assert!(available);

        drop(binder.join().unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_wait_available_times_out() {
        let dir = unique_dir("timeout");
        let sock_path = dir.join("never.sock");

        let start = Instant::now();
        let available = UnixSocketConnector::new()
            .with_poll_interval(Duration::from_millis(5))
            .wait_available(sock_path.to_str().unwrap(), Duration::from_millis(40))
            .unwrap();
        assert!(!available);
        assert!(start.elapsed() >= Duration::from_millis(40));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_wait_available_rejects_regular_file() {
        let dir = unique_dir("file");
        let path = dir.join("not-a-socket");
        std::fs::write(&path, b"regular-file").unwrap();

        let err = UnixSocketConnector::new()
            .wait_available(path.to_str().unwrap(), Duration::from_millis(20))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Listener with a zero backlog and one connection left unaccepted,
    /// so the next connect finds the queue full.
    #[cfg(target_os = "linux")]
    fn busy_listener(path: &Path) -> (UnixListener, UnixStream) {
        let listener = UnixListener::bind(path).unwrap();
        // SAFETY: the fd belongs to `listener`, which outlives the call.
        let rc = unsafe { libc::listen(listener.as_raw_fd(), 0) };
        assert_eq!(rc, 0);
        let pending = UnixStream::connect(path).unwrap();
        (listener, pending)
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_full_backlog_reports_busy() {
        let dir = unique_dir("busy");
        let sock_path = dir.join("busy.sock");
        let (_listener, _pending) = busy_listener(&sock_path);

        let address = sock_path.to_str().unwrap().to_string();
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let result = UnixSocketConnector::new().try_connect(&address);
            let _ = tx.send(result.map(|_| ()));
        });

        let result = rx
            .recv_timeout(Duration::from_secs(3))
            .expect("try_connect must not block on a full backlog");
        let err = result.unwrap_err();
        assert!(err.is_busy(), "unexpected error: {err}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_wait_available_times_out_while_busy() {
        let dir = unique_dir("busy-wait");
        let sock_path = dir.join("busy.sock");
        let (_listener, _pending) = busy_listener(&sock_path);

        let start = Instant::now();
        let available = UnixSocketConnector::new()
            .with_poll_interval(Duration::from_millis(5))
            .wait_available(sock_path.to_str().unwrap(), Duration::from_millis(60))
            .unwrap();
        assert!(!available);
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert!(start.elapsed() < Duration::from_secs(2));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_wait_keeps_connection_for_next_connect() {
        let dir = unique_dir("busy-free");
        let sock_path = dir.join("busy.sock");
        let (listener, _pending) = busy_listener(&sock_path);
        let address = sock_path.to_str().unwrap().to_string();

        let server = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            let first = listener.accept().unwrap();
            (listener, first)
        });

        let connector = UnixSocketConnector::new().with_poll_interval(Duration::from_millis(5));
        assert!(connector
            .wait_available(&address, Duration::from_secs(2))
            .unwrap());
        let (listener, _first) = server.join().unwrap();

        let mut stream = connector.try_connect(&address).unwrap();
        let (mut accepted, _) = listener.accept().unwrap();
        stream.write_all(b"hi").unwrap();
        let mut buf = [0u8; 2];
        accepted.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hi");

        listener.set_nonblocking(true).unwrap();
        let extra = listener.accept().unwrap_err();
        assert_eq!(extra.kind(), ErrorKind::WouldBlock);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_message_mode_unsupported() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut stream = UnixPipeStream::from_stream(left);
        assert!(stream.set_read_mode(PipeMode::Byte).is_ok());
        let err = stream.set_read_mode(PipeMode::Message).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
