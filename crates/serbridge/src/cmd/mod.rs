use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use serbridge_route::{MirrorOfflinePolicy, SlowConsumerPolicy, DEFAULT_BAUD, DEFAULT_LOG_DIR};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod ports;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bridge a serial device to the console and the configured forwarders.
    Run(RunArgs),
    /// List serial ports available on this host.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum SlowConsumer {
    /// Wait for slow subscribers.
    Block,
    /// Disconnect a subscriber whose queue is full.
    Disconnect,
}

impl From<SlowConsumer> for SlowConsumerPolicy {
    fn from(value: SlowConsumer) -> Self {
        match value {
            SlowConsumer::Block => SlowConsumerPolicy::Block,
            SlowConsumer::Disconnect => SlowConsumerPolicy::Disconnect,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum MirrorOffline {
    /// Hold serial output until the mirror reconnects.
    Block,
    /// Log serial lines locally and drop them.
    Drop,
}

impl From<MirrorOffline> for MirrorOfflinePolicy {
    fn from(value: MirrorOffline) -> Self {
        match value {
            MirrorOffline::Block => MirrorOfflinePolicy::Block,
            MirrorOffline::Drop => MirrorOfflinePolicy::Drop,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Serial device path or name (e.g. /dev/ttyUSB0, COM3).
    pub device: String,
    /// Serial baud rate.
    #[arg(long, short = 'b', default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
    /// Accept TCP subscribers on this address (host:port).
    #[arg(long, value_name = "ADDR")]
    pub tcps: Option<String>,
    /// Mirror timestamped serial lines to this TCP address (host:port).
    #[arg(long, value_name = "ADDR")]
    pub tcpc: Option<String>,
    /// Receive UDP datagrams on this address (host:port).
    #[arg(long, value_name = "ADDR", requires = "prem")]
    pub ploc: Option<String>,
    /// Send outbound UDP datagrams to this address (host:port).
    #[arg(long, value_name = "ADDR", requires = "ploc")]
    pub prem: Option<String>,
    /// Directory for the daily line logs written by the TCP mirror.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_LOG_DIR)]
    pub logdir: PathBuf,
    /// Pause between TCP mirror reconnect attempts (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub reconnect_delay: String,
    /// What the TCP mirror does with serial output while disconnected.
    #[arg(long, value_name = "POLICY", default_value = "block")]
    pub mirror_offline: MirrorOffline,
    /// Chunks each TCP subscriber may have queued.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub queue_depth: usize,
    /// Depth of the internal byte channels.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub channel_depth: usize,
    /// What to do with a TCP subscriber that cannot keep up.
    #[arg(long, value_name = "POLICY", default_value = "block")]
    pub slow_consumer: SlowConsumer,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
