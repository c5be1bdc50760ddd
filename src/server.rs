//! Consignment TCP Server
//!
//! Serves the consignment RPC protocol over TCP, one tokio task per client
//! connection, with a connection limit and graceful shutdown.

use crate::{
    error::{ConsignmentError, Result},
    protocol::{parse_command, Reply},
    repository::Repository,
    service::ConsignmentService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::{broadcast, Semaphore},
};
use tracing::{debug, info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_connections: usize,
    /// Longest accepted request line in bytes, terminator excluded
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:50051".to_string(),
            max_connections: 1000,
            max_frame_len: 1024 * 1024,
        }
    }
}

/// Consignment TCP server
pub struct ConsignmentServer<R> {
    listener: TcpListener,
    service: Arc<ConsignmentService<R>>,
    connection_limit: Arc<Semaphore>,
    max_frame_len: usize,
    shutdown_tx: broadcast::Sender<()>,
}

impl<R: Repository + 'static> ConsignmentServer<R> {
    /// Bind the listening socket for a new server instance
    pub async fn bind(config: ServerConfig, service: ConsignmentService<R>) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            listener,
            service: Arc::new(service),
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_frame_len: config.max_frame_len,
            shutdown_tx,
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Service handling the calls
    pub fn service(&self) -> &Arc<ConsignmentService<R>> {
        &self.service
    }

    /// Accept connections until shutdown is requested
    pub async fn run(&self) -> Result<()> {
        info!(addr = %self.local_addr()?, "consignment server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            // Hold a connection slot before accepting
            let permit = tokio::select! {
                permit = Arc::clone(&self.connection_limit).acquire_owned() => {
                    permit.map_err(|_| {
                        ConsignmentError::Server("Connection limiter closed".to_string())
                    })?
                }
                _ = shutdown_rx.recv() => break,
            };

            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!(peer = %addr, "client connected");
                            let service = Arc::clone(&self.service);
                            let shutdown_rx = self.shutdown_tx.subscribe();
                            let max_frame_len = self.max_frame_len;

                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_client(stream, service, max_frame_len, shutdown_rx).await {
                                    warn!(peer = %addr, error = %e, "error handling client");
                                }
                                debug!(peer = %addr, "client disconnected");
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to accept connection");
                        }
                    }
                }

                _ = shutdown_rx.recv() => break,
            }
        }

        info!("consignment server stopped");
        Ok(())
    }

    /// Handle a single client connection
    async fn handle_client(
        mut stream: TcpStream,
        service: Arc<ConsignmentService<R>>,
        max_frame_len: usize,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let (reader, mut writer) = stream.split();
        let mut buf_reader = BufReader::new(reader);
        let mut frame = Vec::new();

        loop {
            frame.clear();
            // One byte past the limit tells an oversized frame from a full one
            let mut limited = (&mut buf_reader).take(max_frame_len as u64 + 1);

            // A pending shutdown wins over a request that arrived alongside it
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    debug!("shutdown signal received, closing client connection");
                    break;
                }

                result = limited.read_until(b'\n', &mut frame) => {
                    match result {
                        Ok(0) => break,
                        Ok(_) => {
                            let reply = if frame.len() > max_frame_len && !frame.ends_with(b"\n") {
                                warn!(limit = max_frame_len, "rejected oversized request");
                                discard_line(&mut buf_reader).await?;
                                Reply::Error(ConsignmentError::FrameTooLong { limit: max_frame_len }.to_string())
                            } else {
                                Self::process_line(&frame, &service).await
                            };
                            writer.write_all(&reply.to_bytes()).await?;
                            writer.flush().await?;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse one request line and run it against the service
    async fn process_line(line: &[u8], service: &ConsignmentService<R>) -> Reply {
        let command_bytes = line.trim_ascii();
        if command_bytes.is_empty() {
            return Reply::Error("Empty command".to_string());
        }

        // Normalise the terminator for the frame parser
        let mut frame = command_bytes.to_vec();
        frame.extend_from_slice(b"\r\n");

        match parse_command(&frame) {
            Ok(command) => service.dispatch(command).await,
            Err(e) => {
                warn!(error = %e, "rejected malformed request");
                Reply::Error(e.to_string())
            }
        }
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) -> Result<()> {
        self.shutdown_tx.send(()).map_err(|_| {
            ConsignmentError::Server("Failed to send shutdown signal".to_string())
        })?;
        Ok(())
    }
}

/// Skip the rest of the current line without buffering it
async fn discard_line<B: AsyncBufRead + Unpin>(reader: &mut B) -> Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }

        match buf.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}
