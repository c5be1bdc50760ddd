//! Wire protocol for consignment RPC calls
//!
//! Each call is one CRLF-terminated line: the method name, a space, and a JSON
//! payload. Frames are split with nom; payloads are decoded with serde_json.
//!
//! ```text
//! CreateConsignment {"description":"electronics","weight":200}\r\n
//! OK {"created":true,"consignment":{...}}\r\n
//! ERROR Repository full: capacity of 10 consignments reached\r\n
//! ```

use crate::consignment::{Consignment, Response};
use crate::error::{ConsignmentError, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::space1,
    combinator::map,
    sequence::{terminated, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::str;

/// Method name of the create call
pub const CREATE_CONSIGNMENT: &str = "CreateConsignment";

/// Calls supported by the consignment protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    CreateConsignment(Consignment),
}

/// Reply frames sent back by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    Ok(Response),
    Error(String),
}

impl Command {
    /// Serialize command to bytes for network transmission
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Command::CreateConsignment(consignment) => {
                let payload = serde_json::to_string(consignment)?;
                Ok(format!("{} {}\r\n", CREATE_CONSIGNMENT, payload).into_bytes())
            }
        }
    }
}

impl Reply {
    /// Serialize reply to bytes for network transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Reply::Ok(response) => match serde_json::to_string(response) {
                Ok(payload) => format!("OK {}\r\n", payload).into_bytes(),
                Err(e) => format!("ERROR {}\r\n", single_line(&e.to_string())).into_bytes(),
            },
            Reply::Error(message) => format!("ERROR {}\r\n", single_line(message)).into_bytes(),
        }
    }
}

/// Error messages must not break the line framing
fn single_line(message: &str) -> String {
    message.replace(['\r', '\n'], " ")
}

/// Parse a complete command frame from input bytes
pub fn parse_command(input: &[u8]) -> Result<Command> {
    let (_, (method, payload)) = frame_parser(input)?;
    let method = str::from_utf8(method)
        .map_err(|e| ConsignmentError::Protocol(format!("Method name is not UTF-8: {}", e)))?;

    match method {
        CREATE_CONSIGNMENT => {
            let consignment = serde_json::from_slice(payload)?;
            Ok(Command::CreateConsignment(consignment))
        }
        other => Err(ConsignmentError::UnknownMethod(other.to_string())),
    }
}

/// Parse a reply line as sent by the server (line terminator optional)
pub fn parse_reply(line: &str) -> Result<Reply> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(payload) = line.strip_prefix("OK ") {
        let response = serde_json::from_str(payload)?;
        Ok(Reply::Ok(response))
    } else if let Some(message) = line.strip_prefix("ERROR ") {
        Ok(Reply::Error(message.to_string()))
    } else {
        Err(ConsignmentError::Protocol(format!(
            "Unknown reply format: {}",
            line
        )))
    }
}

/// Frame parser: <method> SP <payload> CRLF
fn frame_parser(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
    alt((
        terminated(method_and_payload(b"\r\n"), tag(b"\r\n")),
        terminated(method_and_payload(b"\n"), tag(b"\n")),
    ))(input)
}

fn method_and_payload<'a>(
    terminator: &'static [u8],
) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], (&'a [u8], &'a [u8])> {
    map(
        tuple((
            take_while1(|c: u8| c.is_ascii_alphanumeric() || c == b'_'),
            space1,
            take_until(terminator),
        )),
        |(method, _, payload)| (method, payload),
    )
}
