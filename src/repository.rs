//! In-memory consignment repository with thread-safe access
//!
//! Provides an append-only store using Arc and RwLock for concurrent access

use crate::consignment::Consignment;
use crate::error::{ConsignmentError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait defining the storage capability behind `CreateConsignment`
pub trait Repository: Send + Sync {
    /// Append a consignment and return the stored record
    fn create(&self, consignment: Consignment) -> impl Future<Output = Result<Consignment>> + Send;

    /// Get the number of stored consignments
    fn len(&self) -> impl Future<Output = Result<usize>> + Send;
}

/// Thread-safe, append-only in-memory repository
pub struct MemoryRepository {
    consignments: Arc<RwLock<Vec<Consignment>>>,
    capacity_limit: Option<usize>,
}

impl MemoryRepository {
    /// Create an unbounded repository
    pub fn new() -> Self {
        Self {
            consignments: Arc::new(RwLock::new(Vec::new())),
            capacity_limit: None,
        }
    }

    /// Create a repository that rejects appends once `limit` records are stored
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            consignments: Arc::new(RwLock::new(Vec::new())),
            capacity_limit: Some(limit),
        }
    }

    /// The configured capacity limit, if any
    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity_limit
    }

    /// Snapshot of the stored consignments in append order
    pub async fn consignments(&self) -> Vec<Consignment> {
        self.consignments.read().await.clone()
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryRepository {
    fn clone(&self) -> Self {
        Self {
            consignments: Arc::clone(&self.consignments),
            capacity_limit: self.capacity_limit,
        }
    }
}

impl Repository for MemoryRepository {
    async fn create(&self, consignment: Consignment) -> Result<Consignment> {
        // Capacity check and push happen under one write guard
        let mut consignments = self.consignments.write().await;
        if let Some(limit) = self.capacity_limit {
            if consignments.len() >= limit {
                return Err(ConsignmentError::CapacityExceeded { limit });
            }
        }
        consignments.push(consignment.clone());
        Ok(consignment)
    }

    async fn len(&self) -> Result<usize> {
        let consignments = self.consignments.read().await;
        Ok(consignments.len())
    }
}
