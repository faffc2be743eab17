use bytes::Bytes;
use serbridge_transport::{ByteReceiver, ByteSender};
use tracing::{debug, info, warn};

/// The main dispatch loop.
///
/// Every chunk read from the serial device is handed to each output in
/// turn, and the loop only moves on once all outputs have accepted it.
/// Console input goes to the serial device.
pub struct Router {
    serial_in: ByteReceiver,
    serial_out: ByteSender,
    console_in: Option<ByteReceiver>,
    outputs: Vec<Output>,
}

struct Output {
    name: &'static str,
    tx: ByteSender,
}

impl Router {
    pub fn new(serial_in: ByteReceiver, serial_out: ByteSender) -> Self {
        Self {
            serial_in,
            serial_out,
            console_in: None,
            outputs: Vec::new(),
        }
    }

    /// Forward console input to the serial device.
    pub fn with_console(mut self, console_in: ByteReceiver) -> Self {
        self.console_in = Some(console_in);
        self
    }

    /// Add a consumer of serial output. Outputs are fed in the order added.
    pub fn add_output(&mut self, name: &'static str, tx: ByteSender) {
        self.outputs.push(Output { name, tx });
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Run until the serial input ends.
    pub async fn run(self) {
        let Router {
            mut serial_in,
            serial_out,
            mut console_in,
            mut outputs,
        } = self;

        loop {
            tokio::select! {
                chunk = serial_in.recv() => match chunk {
                    Some(chunk) => dispatch(&mut outputs, chunk).await,
                    None => {
                        info!("serial input closed, router stopping");
                        return;
                    }
                },
                chunk = recv_optional(&mut console_in) => match chunk {
                    Some(chunk) => {
                        if serial_out.send(chunk).await.is_err() {
                            warn!("serial output closed, dropping console input");
                        }
                    }
                    None => {
                        debug!("console input closed");
                        console_in = None;
                    }
                },
            }
        }
    }
}

async fn dispatch(outputs: &mut Vec<Output>, chunk: Bytes) {
    let mut index = 0;
    while index < outputs.len() {
        if outputs[index].tx.send(chunk.clone()).await.is_ok() {
            index += 1;
            continue;
        }
        let gone = outputs.remove(index);
        warn!(output = gone.name, "output closed, no longer forwarding to it");
    }
}

async fn recv_optional(rx: &mut Option<ByteReceiver>) -> Option<Bytes> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
