use std::path::PathBuf;
use std::time::Duration;

use serbridge_transport::DEFAULT_CHANNEL_DEPTH;

/// Serial baud rate used when none is given.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Directory receiving the daily line logs when none is given.
pub const DEFAULT_LOG_DIR: &str = "sup-log";

/// Pause between outbound reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// What the duplicator does with a subscriber whose queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowConsumerPolicy {
    /// Wait for the subscriber. A stalled subscriber stalls the bridge.
    #[default]
    Block,
    /// Drop the subscriber and close its connection.
    Disconnect,
}

/// What the TCP mirror does with serial output while it has no connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorOfflinePolicy {
    /// Stop reading serial output until connected again. Backpressure
    /// reaches the router, so an unreachable mirror stalls the bridge.
    #[default]
    Block,
    /// Keep framing and logging lines to the daily log, but send them
    /// nowhere.
    Drop,
}

/// Per-subscriber queueing behavior for broadcast consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Chunks a subscriber may have queued before it counts as slow.
    pub queue_depth: usize,
    pub policy: SlowConsumerPolicy,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_CHANNEL_DEPTH,
            policy: SlowConsumerPolicy::Block,
        }
    }
}

/// UDP packet bridge endpoints. Both are required to enable the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpConfig {
    /// Address to receive datagrams on.
    pub local: String,
    /// Address outbound datagrams are sent to.
    pub remote: String,
}

/// Everything the bridge needs, fixed at startup and handed to each
/// component as it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Serial device path or name.
    pub device: String,
    pub baud: u32,
    /// `host:port` to accept subscriber connections on.
    pub tcp_server: Option<String>,
    /// `host:port` of the outbound mirror.
    pub tcp_client: Option<String>,
    pub udp: Option<UdpConfig>,
    pub log_dir: PathBuf,
    pub reconnect_delay: Duration,
    pub mirror_offline: MirrorOfflinePolicy,
    /// Depth of the internal byte channels.
    pub channel_depth: usize,
    pub subscriber: SubscriberConfig,
}

impl BridgeConfig {
    /// Configuration bridging only the serial device and the console.
    pub fn new(device: impl Into<String>, baud: u32) -> Self {
        Self {
            device: device.into(),
            baud,
            tcp_server: None,
            tcp_client: None,
            udp: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            mirror_offline: MirrorOfflinePolicy::Block,
            channel_depth: DEFAULT_CHANNEL_DEPTH,
            subscriber: SubscriberConfig::default(),
        }
    }

    /// Accept subscriber connections on `addr`.
    pub fn with_tcp_server(mut self, addr: impl Into<String>) -> Self {
        self.tcp_server = Some(addr.into());
        self
    }

    /// Mirror serial lines to `addr`.
    pub fn with_tcp_client(mut self, addr: impl Into<String>) -> Self {
        self.tcp_client = Some(addr.into());
        self
    }

    /// Bridge datagrams received on `local` and send outbound ones to `remote`.
    pub fn with_udp(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.udp = Some(UdpConfig {
            local: local.into(),
            remote: remote.into(),
        });
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_mirror_offline(mut self, policy: MirrorOfflinePolicy) -> Self {
        self.mirror_offline = policy;
        self
    }

    pub fn with_channel_depth(mut self, depth: usize) -> Self {
        self.channel_depth = depth.max(1);
        self
    }

    pub fn with_subscriber(mut self, subscriber: SubscriberConfig) -> Self {
        self.subscriber = subscriber;
        self
    }
}
