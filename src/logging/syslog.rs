//! # Best-effort system log delivery.
//!
//! On unix, [`SyslogSink`] writes one RFC 3164 datagram per record to the local
//! syslog socket (`/dev/log`, or `/var/run/syslog` on macOS), facility `daemon`,
//! tagged with the configured service name. A socket that cannot be reached is
//! reported with one line on stderr and otherwise ignored. On other platforms
//! the sink does nothing.

use std::sync::Arc;

/// Syslog severities used by the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Error,
}

impl Severity {
    /// RFC 5424 numeric severity.
    fn code(&self) -> u8 {
        match self {
            Severity::Critical => 2,
            Severity::Error => 3,
        }
    }
}

/// `LOG_DAEMON`
const FACILITY_DAEMON: u8 = 3;

#[cfg(unix)]
const SOCKET_PATHS: &[&str] = &["/dev/log", "/var/run/syslog", "/var/run/log"];

/// Mirror of fatal/error records to the OS system log.
#[derive(Clone, Debug)]
pub struct SyslogSink {
    tag: Arc<str>,
    enabled: bool,
}

impl SyslogSink {
    /// Creates a sink tagging records with `tag`.
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self {
            tag: tag.into(),
            enabled: true,
        }
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self {
            tag: Arc::from(""),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Sends one record. Never fails.
    pub fn send(&self, severity: Severity, message: &str) {
        if !self.enabled {
            return;
        }
        let frame = self.frame(severity, message);
        if let Err(e) = deliver(frame.as_bytes()) {
            eprintln!("unitvisor: failed to connect to syslog: {e}");
        }
    }

    /// `<PRI>TAG[PID]: MESSAGE`
    fn frame(&self, severity: Severity, message: &str) -> String {
        let pri = u16::from(FACILITY_DAEMON) * 8 + u16::from(severity.code());
        format!("<{pri}>{}[{}]: {message}", self.tag, std::process::id())
    }
}

#[cfg(unix)]
fn deliver(frame: &[u8]) -> std::io::Result<()> {
    use std::os::unix::net::UnixDatagram;

    let socket = UnixDatagram::unbound()?;
    let mut last = std::io::Error::new(std::io::ErrorKind::NotFound, "no syslog socket");
    for path in SOCKET_PATHS {
        match socket.connect(path) {
            Ok(()) => return socket.send(frame).map(|_| ()),
            Err(e) => last = e,
        }
    }
    Err(last)
}

#[cfg(not(unix))]
fn deliver(_frame: &[u8]) -> std::io::Result<()> {
    Ok(())
}
