use serbridge_transport::{byte_channel, open_serial, read_into, write_from, ByteReceiver};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::daily_log::DailyLog;
use crate::error::{Result, RouteError};
use crate::router::Router;
use crate::tcp_client::TcpClientForwarder;
use crate::tcp_server::TcpServerForwarder;
use crate::udp::UdpBridge;

/// A configured bridge, ready to be started.
#[derive(Debug, Clone)]
pub struct Bridge {
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Open the serial device and bridge it with stdin/stdout and the
    /// configured forwarders.
    ///
    /// Runs until the serial device closes, which is reported as
    /// [`RouteError::SerialClosed`], or until a listening forwarder fails.
    pub async fn run(&self) -> Result<()> {
        let serial = open_serial(&self.config.device, self.config.baud)?;
        self.run_with(serial, tokio::io::stdin(), tokio::io::stdout())
            .await
    }

    /// Bridge an already opened serial stream with the given console.
    ///
    /// Every listening socket is bound before any task starts, so a bind
    /// failure leaves nothing running.
    pub async fn run_with<S, I, O>(&self, serial: S, console_in: I, console_out: O) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        I: AsyncRead + Unpin + Send + 'static,
        O: AsyncWrite + Unpin + Send + 'static,
    {
        let config = &self.config;
        let depth = config.channel_depth;

        let (serial_in_tx, serial_in_rx) = byte_channel(depth);
        let (to_serial_tx, to_serial_rx) = byte_channel(depth);
        let (console_in_tx, console_in_rx) = byte_channel(depth);
        let (console_out_tx, console_out_rx) = byte_channel(depth);

        let mut router =
            Router::new(serial_in_rx, to_serial_tx.clone()).with_console(console_in_rx);
        router.add_output("console", console_out_tx);

        let server = match &config.tcp_server {
            Some(addr) => {
                let (tx, rx) = byte_channel(depth);
                router.add_output("tcp-server", tx);
                let server =
                    TcpServerForwarder::bind(addr, rx, to_serial_tx.clone(), config.subscriber)
                        .await?;
                Some(server)
            }
            None => None,
        };

        let client = config.tcp_client.as_ref().map(|addr| {
            let (tx, rx) = byte_channel(depth);
            router.add_output("tcp-client", tx);
            TcpClientForwarder::new(
                addr.clone(),
                rx,
                to_serial_tx.clone(),
                DailyLog::new(&config.log_dir),
                config.reconnect_delay,
            )
            .with_offline_policy(config.mirror_offline)
        });

        let udp = match &config.udp {
            Some(udp) => {
                let (tx, rx) = byte_channel(depth);
                router.add_output("udp", tx);
                let bridge = UdpBridge::bind(&udp.local, &udp.remote, rx, to_serial_tx.clone())
                    .await?;
                info!(local = %udp.local, remote = %udp.remote, "udp bridge enabled");
                Some(bridge)
            }
            None => None,
        };

        info!(
            device = %config.device,
            baud = config.baud,
            outputs = router.output_count(),
            "bridge started"
        );

        let mut pumps = JoinSet::new();
        let (serial_r, serial_w) = tokio::io::split(serial);
        pumps.spawn(async move {
            match read_into(serial_r, &serial_in_tx).await {
                Ok(()) => info!("serial device reached end of stream"),
                Err(err) => warn!(error = %err, "serial read failed"),
            }
        });
        pumps.spawn(pump_out("serial", serial_w, to_serial_rx));
        pumps.spawn(async move {
            match read_into(console_in, &console_in_tx).await {
                Ok(()) => debug!("console input reached end of stream"),
                Err(err) => warn!(error = %err, "console read failed"),
            }
        });
        pumps.spawn(pump_out("console", console_out, console_out_rx));
        if let Some(client) = client {
            pumps.spawn(client.run());
        }
        drop(to_serial_tx);

        let mut fatal: JoinSet<Result<()>> = JoinSet::new();
        if let Some(server) = server {
            fatal.spawn(server.run());
        }
        if let Some(udp) = udp {
            fatal.spawn(udp.run());
        }

        tokio::select! {
            () = router.run() => Err(RouteError::SerialClosed),
            Some(joined) = fatal.join_next() => match joined {
                Ok(result) => result,
                Err(err) => Err(RouteError::Task(err.to_string())),
            },
        }
    }
}

async fn pump_out<W>(name: &'static str, writer: W, mut rx: ByteReceiver)
where
    W: AsyncWrite + Unpin,
{
    if let Err(err) = write_from(writer, &mut rx).await {
        warn!(endpoint = name, error = %err, "write failed");
    }
}
