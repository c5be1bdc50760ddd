//! Command-line client for the consignment server
//!
//! Submits one consignment, either from a JSON file or from flags, and prints
//! the server's response.

use clap::Parser;
use consignment_service::{Client, Consignment, ConsignmentError};
use std::path::PathBuf;

/// Consignment CLI
#[derive(Parser, Debug)]
#[command(name = "consignment-cli")]
#[command(about = "Submit a consignment to the consignment server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    server: String,

    /// JSON file holding the consignment to submit
    #[arg(short, long, conflicts_with_all = ["description", "weight", "vessel_id"])]
    file: Option<PathBuf>,

    /// Consignment description
    #[arg(short, long)]
    description: Option<String>,

    /// Consignment weight
    #[arg(short, long)]
    weight: Option<i32>,

    /// Vessel carrying the consignment
    #[arg(long)]
    vessel_id: Option<String>,
}

impl Args {
    fn consignment(&self) -> Result<Consignment, ConsignmentError> {
        if let Some(path) = &self.file {
            return Consignment::from_json_file(path);
        }

        if self.description.is_none() && self.weight.is_none() {
            return Err(ConsignmentError::Client(
                "Provide --file or --description/--weight".to_string(),
            ));
        }

        let mut consignment = Consignment::new(
            self.description.clone().unwrap_or_default(),
            self.weight.unwrap_or_default(),
        );
        consignment.vessel_id = self.vessel_id.clone().unwrap_or_default();
        Ok(consignment)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let consignment = args.consignment()?;

    let mut client = Client::connect(&args.server).await?;
    let response = client.create_consignment(&consignment).await?;
    client.close().await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
