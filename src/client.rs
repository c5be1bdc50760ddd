//! Client library for connecting to the consignment server
//!
//! Provides a simple interface for issuing `CreateConsignment` calls

use crate::consignment::{Consignment, Response};
use crate::error::{ConsignmentError, Result};
use crate::protocol::{parse_reply, Command, Reply};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;

/// Client for connecting to a consignment server
pub struct Client {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: BufWriter<tokio::net::tcp::OwnedWriteHalf>,
}

impl Client {
    /// Connect to a consignment server
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        let reader = BufReader::new(read_half);
        let writer = BufWriter::new(write_half);

        Ok(Self { reader, writer })
    }

    /// Send a command and receive the reply
    async fn call(&mut self, command: &Command) -> Result<Reply> {
        self.writer.write_all(&command.to_bytes()?).await?;
        self.writer.flush().await?;

        let mut reply_line = String::new();
        let read = self.reader.read_line(&mut reply_line).await?;
        if read == 0 {
            return Err(ConsignmentError::Client(
                "Connection closed by server".to_string(),
            ));
        }

        parse_reply(&reply_line)
    }

    /// Store a consignment on the server
    pub async fn create_consignment(&mut self, consignment: &Consignment) -> Result<Response> {
        let command = Command::CreateConsignment(consignment.clone());

        match self.call(&command).await? {
            Reply::Ok(response) => Ok(response),
            Reply::Error(e) => Err(ConsignmentError::Server(e)),
        }
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
