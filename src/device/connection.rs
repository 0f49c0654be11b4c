//! Live connection to one URTSI: an open transport plus the worker thread
//! that owns it.
//!
//! All writes to a port go through its worker, in the order they were
//! enqueued. Callers never touch the transport directly.

use crate::port::{PortError, SerialPortAdapter};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

struct WriteRequest {
    payload: Vec<u8>,
    done: oneshot::Sender<Result<(), PortError>>,
}

/// Completion handle for an enqueued write.
///
/// Dropping the ticket is fine: the write still happens and any failure is
/// still logged by the worker.
#[derive(Debug)]
pub struct WriteTicket {
    port: String,
    done: oneshot::Receiver<Result<(), PortError>>,
}

impl WriteTicket {
    /// Port the write was queued on.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Wait for the write from async code.
    pub async fn outcome(self) -> Result<(), PortError> {
        match self.done.await {
            Ok(result) => result,
            Err(_) => Err(PortError::WorkerGone(self.port)),
        }
    }

    /// Block the current thread until the write has been performed.
    ///
    /// Must not be called from inside an async runtime; use [`outcome`](Self::outcome) there.
    pub fn wait(self) -> Result<(), PortError> {
        match self.done.blocking_recv() {
            Ok(result) => result,
            Err(_) => Err(PortError::WorkerGone(self.port)),
        }
    }
}

/// An open port with its dedicated write worker.
#[derive(Debug)]
pub struct DeviceConnection {
    port: String,
    sender: Option<mpsc::UnboundedSender<WriteRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DeviceConnection {
    /// Start a worker that owns `transport`.
    pub fn start(transport: Box<dyn SerialPortAdapter>) -> Result<Self, PortError> {
        let port = transport.name().to_string();
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = std::thread::Builder::new()
            .name(format!("urtsi-{}", port))
            .spawn(move || run_worker(transport, receiver))?;

        debug!("Started write worker for {}", port);

        Ok(Self {
            port,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Whether the connection still accepts writes.
    pub fn is_open(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue `payload` for writing.
    pub fn enqueue(&self, payload: Vec<u8>) -> Result<WriteTicket, PortError> {
        let sender = self.sender.as_ref().ok_or(PortError::NotOpen)?;
        let (done, ticket) = oneshot::channel();
        sender
            .send(WriteRequest { payload, done })
            .map_err(|_| PortError::WorkerGone(self.port.clone()))?;

        Ok(WriteTicket {
            port: self.port.clone(),
            done: ticket,
        })
    }

    /// Stop accepting writes, let the worker drain its queue, then close the port.
    ///
    /// Closing an already closed connection does nothing.
    pub fn close(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        drop(sender);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Write worker for {} panicked", self.port);
            }
        }
    }
}

impl Drop for DeviceConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(
    mut transport: Box<dyn SerialPortAdapter>,
    mut receiver: mpsc::UnboundedReceiver<WriteRequest>,
) {
    while let Some(request) = receiver.blocking_recv() {
        let result = write_payload(transport.as_mut(), &request.payload);
        // The caller may have dropped its ticket; nobody to tell then.
        let _ = request.done.send(result);
    }

    transport.close();
    info!("Write worker for {} stopped", transport.name());
}

fn write_payload(transport: &mut dyn SerialPortAdapter, payload: &[u8]) -> Result<(), PortError> {
    let text = String::from_utf8_lossy(payload);
    debug!("Writing '{}' to serial port {}", text, transport.name());

    let result = transport
        .write_bytes(payload)
        .and_then(|()| transport.flush());

    if let Err(ref e) = result {
        error!(
            "Error writing '{}' to serial port {}: {}",
            text,
            transport.name(),
            e
        );
    }
    result
}
