//! Decode command implementation.

use syncwire_protocol::{StatePacket, STATE_PACKET_SIZE};
use thiserror::Error;

/// Errors raised while parsing the command input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HexError {
    /// The input has an odd number of hex digits.
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),

    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex digit {0:?}")]
    InvalidDigit(char),

    /// The input does not hold exactly one control packet.
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Control packet size.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
}

/// Parses hex digits, ignoring whitespace.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, HexError> {
    let digits: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength(digits.len()));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let high = pair[0].to_digit(16).ok_or(HexError::InvalidDigit(pair[0]))?;
            let low = pair[1].to_digit(16).ok_or(HexError::InvalidDigit(pair[1]))?;
            Ok((high * 16 + low) as u8)
        })
        .collect()
}

/// Runs the decode command.
pub fn run(hex: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = parse_hex(hex)?;
    if bytes.len() != STATE_PACKET_SIZE {
        return Err(HexError::WrongLength {
            expected: STATE_PACKET_SIZE,
            actual: bytes.len(),
        }
        .into());
    }
    let packet = StatePacket::from_bytes(&bytes)?;

    match packet.message() {
        Some(message) => println!("message:     {message}"),
        None => println!("message:     unknown({})", packet.message_code),
    }
    let status = packet.status();
    println!("status:      {status} (raw {:#018x})", packet.message_value);
    println!(
        "ack flag:    {}",
        status
            .ack_flag()
            .map_or_else(|| "unknown".to_string(), |f| format!("{f:?}"))
    );
    println!(
        "stream flag: {}",
        status
            .stream_flag()
            .map_or_else(|| "unknown".to_string(), |f| format!("{f:?}"))
    );
    println!("error code:  {}", packet.error_code);
    if let Ok(flow) = packet.flow() {
        println!("as flow:     {flow}");
    }
    println!("has ack:     {}", packet.has_ack());
    println!("active:      {}", packet.has_active_data_stream());
    println!("completed:   {}", packet.has_completed_data_stream());

    Ok(())
}
