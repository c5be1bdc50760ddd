//! Integration tests for the consignment service
//!
//! Runs the server and client over real TCP connections

use consignment_service::{
    Client, Consignment, ConsignmentError, ConsignmentServer, ConsignmentService, Container,
    MemoryRepository, Repository, ServerConfig,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Start a server on an ephemeral port, returning its address and repository
async fn start_test_server(repo: MemoryRepository) -> (String, MemoryRepository) {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        max_connections: 200,
        max_frame_len: 4096,
    };

    let server = ConsignmentServer::bind(config, ConsignmentService::new(repo.clone()))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, repo)
}

#[tokio::test]
async fn test_create_consignment_echoes_record() {
    let (addr, repo) = start_test_server(MemoryRepository::new()).await;
    let mut client = Client::connect(&addr).await.unwrap();

    let consignment = Consignment::new("electronics", 200);
    let response = client.create_consignment(&consignment).await.unwrap();

    assert!(response.created);
    assert_eq!(response.consignment, consignment);
    assert_eq!(repo.len().await.unwrap(), 1);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_full_record_round_trips() {
    let (addr, repo) = start_test_server(MemoryRepository::new()).await;
    let mut client = Client::connect(&addr).await.unwrap();

    let consignment = Consignment {
        id: "c-001".to_string(),
        description: "This is a test consignment".to_string(),
        weight: 550,
        containers: vec![
            Container {
                id: "box-1".to_string(),
                customer_id: "cust001".to_string(),
                origin: "Manchester, United Kingdom".to_string(),
                user_id: "user001".to_string(),
            },
            Container {
                id: "box-2".to_string(),
                customer_id: "cust002".to_string(),
                origin: "Rotterdam, Nederland \"Haven\"".to_string(),
                user_id: "user002".to_string(),
            },
        ],
        vessel_id: "vessel001".to_string(),
    };

    let response = client.create_consignment(&consignment).await.unwrap();
    assert_eq!(response.consignment, consignment);
    assert_eq!(repo.consignments().await, vec![consignment]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sequential_calls_on_one_connection() {
    let (addr, repo) = start_test_server(MemoryRepository::new()).await;
    let mut client = Client::connect(&addr).await.unwrap();

    let first = Consignment::new("electronics", 200);
    let second = Consignment::new("furniture", 1200);

    let first_response = client.create_consignment(&first).await.unwrap();
    let second_response = client.create_consignment(&second).await.unwrap();

    assert_eq!(first_response.consignment, first);
    assert_eq!(second_response.consignment, second);
    assert_eq!(repo.consignments().await, vec![first, second]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_clients() {
    let (addr, repo) = start_test_server(MemoryRepository::new()).await;

    let num_clients = 100;
    let mut handles = Vec::new();

    for client_id in 0..num_clients {
        let addr = addr.clone();
        handles.push(tokio::spawn(async move {
            let mut client = Client::connect(&addr).await.unwrap();
            let consignment = Consignment::new(format!("client_{}", client_id), client_id);

            let response = client.create_consignment(&consignment).await.unwrap();
            assert!(response.created);
            assert_eq!(response.consignment, consignment);

            client.close().await.unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(repo.len().await.unwrap(), num_clients as usize);
}

#[tokio::test]
async fn test_capacity_limit_reported_to_client() {
    let (addr, repo) = start_test_server(MemoryRepository::with_capacity_limit(1)).await;
    let mut client = Client::connect(&addr).await.unwrap();

    client
        .create_consignment(&Consignment::new("first", 1))
        .await
        .unwrap();

    let err = client
        .create_consignment(&Consignment::new("second", 2))
        .await
        .unwrap_err();
    match err {
        ConsignmentError::Server(message) => {
            assert_eq!(message, "Repository full: capacity of 1 consignments reached")
        }
        other => panic!("expected server error, got {:?}", other),
    }

    // The connection stays usable after a failed call
    let err = client
        .create_consignment(&Consignment::new("third", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, ConsignmentError::Server(_)));
    assert_eq!(repo.len().await.unwrap(), 1);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_raw_protocol_errors() {
    let (addr, repo) = start_test_server(MemoryRepository::new()).await;
    let stream = TcpStream::connect(&addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    writer.write_all(b"GetConsignments {}\r\n").await.unwrap();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "ERROR Unknown method: GetConsignments\r\n");

    line.clear();
    writer.write_all(b"CreateConsignment not-json\r\n").await.unwrap();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.starts_with("ERROR Serialization error"));

    line.clear();
    writer
        .write_all(b"CreateConsignment {\"description\":\"raw\",\"weight\":3}\n")
        .await
        .unwrap();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.starts_with("OK {\"created\":true"));

    assert_eq!(repo.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_capacity_error_matches_repository_error() {
    let (addr, repo) = start_test_server(MemoryRepository::with_capacity_limit(0)).await;
    let mut client = Client::connect(&addr).await.unwrap();

    let local_err = MemoryRepository::with_capacity_limit(0)
        .create(Consignment::new("local", 1))
        .await
        .unwrap_err();
    let remote_err = client
        .create_consignment(&Consignment::new("remote", 1))
        .await
        .unwrap_err();

    match remote_err {
        ConsignmentError::Server(message) => assert_eq!(message, local_err.to_string()),
        other => panic!("expected server error, got {:?}", other),
    }
    assert_eq!(repo.len().await.unwrap(), 0);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_utf8_gets_error_reply() {
    let (addr, repo) = start_test_server(MemoryRepository::new()).await;
    let stream = TcpStream::connect(&addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    writer
        .write_all(b"CreateConsignment {\"description\":\"\xff\"}\r\n")
        .await
        .unwrap();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.starts_with("ERROR "), "unexpected reply: {:?}", line);

    // The connection stays open for the next call
    line.clear();
    writer
        .write_all(b"CreateConsignment {\"description\":\"valid\"}\r\n")
        .await
        .unwrap();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.starts_with("OK {\"created\":true"));

    assert_eq!(repo.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_oversized_frame_rejected() {
    let (addr, repo) = start_test_server(MemoryRepository::new()).await;
    let stream = TcpStream::connect(&addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    let description = "x".repeat(10_000);
    let oversized = format!(
        "CreateConsignment {{\"description\":\"{}\"}}\r\n",
        description
    );
    writer.write_all(oversized.as_bytes()).await.unwrap();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "ERROR Frame exceeds 4096 bytes\r\n");

    // The rest of the oversized line is skipped, not parsed as a new frame
    line.clear();
    writer
        .write_all(b"CreateConsignment {\"weight\":9}\r\n")
        .await
        .unwrap();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.starts_with("OK {\"created\":true"));

    assert_eq!(repo.consignments().await, vec![Consignment::new("", 9)]);
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        max_connections: 10,
        ..Default::default()
    };
    let server = Arc::new(
        ConsignmentServer::bind(config, ConsignmentService::new(MemoryRepository::new()))
            .await
            .unwrap(),
    );
    let addr = server.local_addr().unwrap().to_string();

    let runner = Arc::clone(&server);
    let handle = tokio::spawn(async move { runner.run().await });

    let mut client = Client::connect(&addr).await.unwrap();
    client
        .create_consignment(&Consignment::new("before shutdown", 1))
        .await
        .unwrap();

    server.shutdown().unwrap();
    handle.await.unwrap().unwrap();

    // The connection task exits, so the next call sees a closed stream
    let result = client
        .create_consignment(&Consignment::new("after shutdown", 2))
        .await;
    assert!(result.is_err());
    assert_eq!(server.service().repository().len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_connect_to_missing_server() {
    let result = Client::connect("127.0.0.1:1").await;
    assert!(result.is_err());
}
