//! Consignment service - in-memory shipment intake over a TCP RPC interface
//!
//! This library provides:
//! - Consignment, Container and Response message types
//! - An append-only, thread-safe in-memory repository behind a `Repository` trait
//! - A `CreateConsignment` service generic over the repository
//! - A line-oriented RPC protocol parsed with nom
//! - A tokio TCP server and client

pub mod client;
pub mod consignment;
pub mod error;
pub mod protocol;
pub mod repository;
pub mod server;
pub mod service;

pub use error::{ConsignmentError, Result};
pub use consignment::{Consignment, Container, Response};
pub use repository::{Repository, MemoryRepository};
pub use service::ConsignmentService;
pub use protocol::{Command, Reply};
pub use client::Client;
pub use server::{ConsignmentServer, ServerConfig};
