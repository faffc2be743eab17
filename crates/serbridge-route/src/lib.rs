//! Routing core of the serial bridge.
//!
//! The [`Router`] reads the serial device and the console and hands every
//! chunk to the active forwarders:
//! - [`TcpServerForwarder`] fans serial output out to any number of accepted
//!   connections through a [`Duplicator`]
//! - [`TcpClientForwarder`] keeps an outbound mirror alive and logs each line
//!   to a [`DailyLog`]
//! - [`UdpBridge`] carries datagrams across the line stream as hex frames
//!
//! [`Bridge`] wires all of it from a [`BridgeConfig`].

pub mod bridge;
pub mod config;
pub mod daily_log;
pub mod duplicator;
pub mod error;
pub mod router;
pub mod tcp_client;
pub mod tcp_server;
pub mod udp;

pub use bridge::Bridge;
pub use config::{
    BridgeConfig, MirrorOfflinePolicy, SlowConsumerPolicy, SubscriberConfig, UdpConfig,
    DEFAULT_BAUD, DEFAULT_LOG_DIR, DEFAULT_RECONNECT_DELAY,
};
pub use daily_log::DailyLog;
pub use duplicator::{Duplicator, DuplicatorHandle, SubscriberId};
pub use error::{Result, RouteError};
pub use router::Router;
pub use tcp_client::TcpClientForwarder;
pub use tcp_server::TcpServerForwarder;
pub use udp::UdpBridge;
