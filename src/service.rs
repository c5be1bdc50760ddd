//! Consignment RPC service
//!
//! Exposes `Repository::create` as the `CreateConsignment` call.

use crate::consignment::{Consignment, Response};
use crate::error::Result;
use crate::protocol::{Command, Reply};
use crate::repository::Repository;

/// Service owning the repository its calls write to
pub struct ConsignmentService<R> {
    repo: R,
}

impl<R: Repository> ConsignmentService<R> {
    /// Create a service over the given repository
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Store a consignment and echo it back.
    ///
    /// Repository errors are returned as-is.
    pub async fn create_consignment(&self, request: Consignment) -> Result<Response> {
        let consignment = self.repo.create(request).await?;

        Ok(Response {
            created: true,
            consignment,
        })
    }

    /// Execute a parsed command and build the reply frame
    pub async fn dispatch(&self, command: Command) -> Reply {
        match command {
            Command::CreateConsignment(consignment) => {
                match self.create_consignment(consignment).await {
                    Ok(response) => Reply::Ok(response),
                    Err(e) => Reply::Error(e.to_string()),
                }
            }
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}
