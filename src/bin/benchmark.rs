//! Load generator for the consignment server
//!
//! Measures CreateConsignment latency and throughput for one client and for
//! several concurrent clients.

use clap::Parser;
use consignment_service::{Client, Consignment, Container};
use std::time::{Duration, Instant};

/// Consignment server benchmark
#[derive(Parser, Debug)]
#[command(name = "benchmark")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    server: String,

    /// Calls issued by the single-client run and by each concurrent client
    #[arg(short, long, default_value = "1000")]
    operations: usize,
}

#[derive(Debug)]
struct BenchmarkResults {
    operation: String,
    total_operations: usize,
    duration: Duration,
    ops_per_second: f64,
    avg_latency_ms: f64,
    p95_latency_ms: f64,
    p99_latency_ms: f64,
}

impl BenchmarkResults {
    fn new(operation: String, total_operations: usize, duration: Duration, latencies: &mut [Duration]) -> Self {
        latencies.sort();

        let ops_per_second = total_operations as f64 / duration.as_secs_f64();
        let avg_latency_ms = latencies.iter().map(|d| d.as_secs_f64() * 1000.0).sum::<f64>()
            / latencies.len().max(1) as f64;

        let p95_index = (latencies.len() as f64 * 0.95) as usize;
        let p99_index = (latencies.len() as f64 * 0.99) as usize;

        let p95_latency_ms = latencies.get(p95_index).unwrap_or(&Duration::ZERO).as_secs_f64() * 1000.0;
        let p99_latency_ms = latencies.get(p99_index).unwrap_or(&Duration::ZERO).as_secs_f64() * 1000.0;

        Self {
            operation,
            total_operations,
            duration,
            ops_per_second,
            avg_latency_ms,
            p95_latency_ms,
            p99_latency_ms,
        }
    }

    fn print(&self) {
        println!("=== {} Benchmark Results ===", self.operation);
        println!("Total operations: {}", self.total_operations);
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
        println!("Average latency: {:.2}ms", self.avg_latency_ms);
        println!("P95 latency: {:.2}ms", self.p95_latency_ms);
        println!("P99 latency: {:.2}ms", self.p99_latency_ms);
        println!();
    }
}

fn sample_consignment(client_id: usize, i: usize) -> Consignment {
    let mut consignment = Consignment::new(format!("bench consignment {}-{}", client_id, i), (i % 1000) as i32);
    consignment.vessel_id = format!("vessel{:03}", client_id);
    consignment.containers.push(Container {
        customer_id: format!("cust{:03}", client_id),
        origin: "Manchester, United Kingdom".to_string(),
        ..Default::default()
    });
    consignment
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Consignment Server Benchmarks");
    println!("=============================");
    println!("Server: {}", args.server);
    println!();

    println!("Waiting for server to be ready...");
    loop {
        if let Ok(client) = Client::connect(&args.server).await {
            let _ = client.close().await;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    println!("Server is ready!");
    println!();

    benchmark_single_client(&args.server, args.operations).await?.print();

    for num_clients in [10, 50, 100] {
        benchmark_concurrent_clients(&args.server, num_clients, args.operations)
            .await?
            .print();
    }

    Ok(())
}

async fn benchmark_single_client(server_addr: &str, num_operations: usize) -> Result<BenchmarkResults, Box<dyn std::error::Error>> {
    let mut client = Client::connect(server_addr).await?;
    let mut latencies = Vec::with_capacity(num_operations);

    let start = Instant::now();

    for i in 0..num_operations {
        let consignment = sample_consignment(0, i);

        let op_start = Instant::now();
        client.create_consignment(&consignment).await?;
        latencies.push(op_start.elapsed());
    }

    let total_duration = start.elapsed();
    client.close().await?;

    Ok(BenchmarkResults::new(
        "CreateConsignment".to_string(),
        num_operations,
        total_duration,
        &mut latencies,
    ))
}

async fn benchmark_concurrent_clients(
    server_addr: &str,
    num_clients: usize,
    ops_per_client: usize,
) -> Result<BenchmarkResults, Box<dyn std::error::Error>> {
    let mut handles = Vec::new();
    let mut all_latencies = Vec::new();

    let start = Instant::now();

    for client_id in 0..num_clients {
        let server_addr = server_addr.to_string();

        let handle = tokio::spawn(async move {
            let mut client = Client::connect(&server_addr).await.map_err(|e| format!("Connect error: {}", e))?;
            let mut latencies = Vec::with_capacity(ops_per_client);

            for i in 0..ops_per_client {
                let consignment = sample_consignment(client_id, i);

                let op_start = Instant::now();
                client
                    .create_consignment(&consignment)
                    .await
                    .map_err(|e| format!("CreateConsignment error: {}", e))?;
                latencies.push(op_start.elapsed());
            }

            client.close().await.map_err(|e| format!("Close error: {}", e))?;
            Ok::<Vec<Duration>, String>(latencies)
        });

        handles.push(handle);
    }

    for handle in handles {
        let latencies = handle.await.map_err(|e| format!("Join error: {}", e))??;
        all_latencies.extend(latencies);
    }

    let total_duration = start.elapsed();

    Ok(BenchmarkResults::new(
        format!("Concurrent ({} clients)", num_clients),
        num_clients * ops_per_client,
        total_duration,
        &mut all_latencies,
    ))
}
