use std::time::Duration;

use serbridge_route::{Bridge, BridgeConfig, SubscriberConfig};
use tracing::{info, warn};

use crate::cmd::RunArgs;
use crate::exit::{io_error, route_error, CliError, CliResult, INTERRUPTED, SUCCESS, USAGE};

pub fn run(args: RunArgs) -> CliResult<i32> {
    let config = build_config(args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;

    runtime.block_on(serve(config))
}

async fn serve(config: BridgeConfig) -> CliResult<i32> {
    let bridge = Bridge::new(config);

    tokio::select! {
        result = bridge.run() => match result {
            Ok(()) => Ok(SUCCESS),
            Err(err) => Err(route_error("bridge stopped", err)),
        },
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("interrupted, shutting down"),
                Err(err) => warn!(error = %err, "signal handler failed, shutting down"),
            }
            Ok(INTERRUPTED)
        }
    }
}

fn build_config(args: RunArgs) -> CliResult<BridgeConfig> {
    let mut config = BridgeConfig::new(args.device, args.baud)
        .with_log_dir(args.logdir)
        .with_reconnect_delay(parse_duration(&args.reconnect_delay)?)
        .with_mirror_offline(args.mirror_offline.into())
        .with_channel_depth(args.channel_depth)
        .with_subscriber(SubscriberConfig {
            queue_depth: args.queue_depth.max(1),
            policy: args.slow_consumer.into(),
        });

    if let Some(addr) = args.tcps {
        config = config.with_tcp_server(addr);
    }
    if let Some(addr) = args.tcpc {
        config = config.with_tcp_client(addr);
    }
    match (args.ploc, args.prem) {
        (Some(local), Some(remote)) => config = config.with_udp(local, remote),
        (None, None) => {}
        _ => {
            return Err(CliError::new(
                USAGE,
                "--ploc and --prem must be given together",
            ))
        }
    }

    Ok(config)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
