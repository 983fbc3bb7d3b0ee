use std::time::Duration;

use pipelink_frame::DEFAULT_DELIMITER;
use pipelink_transport::PipeMode;

/// Delay before each open attempt. Default: 250 ms.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// How long a single attempt waits on a busy endpoint. Default: 15 s.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Open attempts before giving up. Default: 10.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Per-connection settings, fixed at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Join the endpoint name onto the address prefix. Default: `true`.
    pub include_address_prefix: bool,
    /// Message boundary byte. Default: `0x0C`.
    pub delimiter: u8,
    /// Sleep before every open attempt.
    pub retry_interval: Duration,
    /// Wait bound for a busy endpoint within one attempt.
    pub connect_timeout: Duration,
    /// Failed attempts tolerated before the open sequence gives up.
    /// At least one attempt is always made.
    pub max_attempts: u32,
    /// Read mode applied to the handle before every send/receive.
    pub mode: PipeMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            include_address_prefix: true,
            delimiter: DEFAULT_DELIMITER,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            mode: PipeMode::Byte,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ConnectionConfig::default();
        assert!(cfg.include_address_prefix);
        assert_eq!(cfg.delimiter, 0x0C);
        assert_eq!(cfg.retry_interval, Duration::from_millis(250));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(15));
        assert_eq!(cfg.max_attempts, 10);
        assert_eq!(cfg.mode, PipeMode::Byte);
    }
}
