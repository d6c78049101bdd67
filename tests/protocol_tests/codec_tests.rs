//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use seqlog::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, Response, Status, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
use seqlog::SeqLogError;

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_get_layout() {
    let encoded = encode_command(&Command::Get { key: 258 }).unwrap();

    assert_eq!(encoded[0], 0x01);
    assert_eq!(&encoded[1..5], &8u32.to_be_bytes());
    assert_eq!(&encoded[5..], &[0u8, 0, 0, 0, 0, 0, 1, 2]);
}

#[test]
fn test_encode_decode_get() {
    let cmd = Command::Get { key: u64::MAX };
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_insert() {
    let cmd = Command::Insert {
        value: b"hello world!".to_vec(),
    };
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_empty_insert() {
    let cmd = Command::Insert { value: Vec::new() };
    let encoded = encode_command(&cmd).unwrap();

    assert_eq!(encoded.len(), HEADER_SIZE);
    assert_eq!(decode_command(&encoded).unwrap(), cmd);
}

#[test]
fn test_encode_decode_ping() {
    let encoded = encode_command(&Command::Ping).unwrap();

    assert_eq!(encoded, vec![0x03u8, 0, 0, 0, 0]);
    assert_eq!(decode_command(&encoded).unwrap(), Command::Ping);
}

#[test]
fn test_decode_get_wrong_key_length() {
    let mut bytes = vec![0x01];
    bytes.extend_from_slice(&4u32.to_be_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 1]);

    assert!(matches!(decode_command(&bytes), Err(SeqLogError::Protocol(_))));
}

#[test]
fn test_decode_ping_with_payload() {
    let bytes = vec![0x03, 0, 0, 0, 1, 0xff];

    assert!(matches!(decode_command(&bytes), Err(SeqLogError::Protocol(_))));
}

#[test]
fn test_decode_unknown_command() {
    let bytes = vec![0x7f, 0, 0, 0, 0];

    match decode_command(&bytes) {
        Err(SeqLogError::Protocol(msg)) => assert!(msg.contains("0x7f")),
        other => panic!("Expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_decode_incomplete_header() {
    assert!(matches!(decode_command(&[0x01, 0, 0]), Err(SeqLogError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_payload() {
    let mut bytes = encode_command(&Command::Get { key: 1 }).unwrap();
    bytes.truncate(bytes.len() - 1);

    assert!(matches!(decode_command(&bytes), Err(SeqLogError::Protocol(_))));
}

#[test]
fn test_decode_oversized_payload() {
    let mut bytes = vec![0x02];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());

    assert!(matches!(decode_command(&bytes), Err(SeqLogError::Protocol(_))));
}

#[test]
fn test_encode_insert_at_payload_limit() {
    let cmd = Command::Insert {
        value: vec![b'x'; MAX_PAYLOAD_SIZE as usize],
    };
    let encoded = encode_command(&cmd).unwrap();

    assert_eq!(encoded.len(), HEADER_SIZE + MAX_PAYLOAD_SIZE as usize);
}

#[test]
fn test_encode_oversized_insert_rejected() {
    let cmd = Command::Insert {
        value: vec![b'x'; MAX_PAYLOAD_SIZE as usize + 1],
    };

    match encode_command(&cmd) {
        Err(SeqLogError::Protocol(msg)) => assert!(msg.contains("too large")),
        other => panic!("Expected protocol error, got {:?}", other.map(|b| b.len())),
    }
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_ok_with_value() {
    let response = Response::ok(Some(b"value".to_vec()));
    let decoded = decode_response(&encode_response(&response).unwrap()).unwrap();

    assert_eq!(decoded, response);
}

#[test]
fn test_inserted_response_carries_key() {
    let decoded = decode_response(&encode_response(&Response::inserted(42)).unwrap()).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.key(), Some(42));
}

#[test]
fn test_empty_ok_payload_decodes_as_none() {
    let encoded = encode_response(&Response::ok(Some(Vec::new()))).unwrap();
    let decoded = decode_response(&encoded).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, None);
}

#[test]
fn test_encode_decode_not_found() {
    let decoded = decode_response(&encode_response(&Response::not_found()).unwrap()).unwrap();

    assert_eq!(decoded.status, Status::NotFound);
    assert_eq!(decoded.payload, None);
}

#[test]
fn test_encode_decode_error() {
    let decoded = decode_response(&encode_response(&Response::error("boom")).unwrap()).unwrap();

    assert_eq!(decoded.status, Status::Error);
    assert_eq!(decoded.message(), Some("boom".to_string()));
}

#[test]
fn test_encode_oversized_response_rejected() {
    let response = Response::ok(Some(vec![0u8; MAX_PAYLOAD_SIZE as usize + 1]));

    assert!(matches!(encode_response(&response), Err(SeqLogError::Protocol(_))));
}

#[test]
fn test_decode_unknown_status() {
    assert!(matches!(
        decode_response(&[0x09, 0, 0, 0, 0]),
        Err(SeqLogError::Protocol(_))
    ));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Insert {
            value: b"first".to_vec(),
        },
        Command::Get { key: 0 },
        Command::Ping,
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for cmd in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), cmd);
    }

    match read_command(&mut cursor) {
        Err(SeqLogError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected EOF, got {:?}", other),
    }
}

#[test]
fn test_stream_response() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::inserted(7)).unwrap();
    write_response(&mut buffer, &Response::not_found()).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_response(&mut cursor).unwrap().key(), Some(7));
    assert_eq!(read_response(&mut cursor).unwrap().status, Status::NotFound);
}

#[test]
fn test_write_oversized_command_writes_nothing() {
    let mut buffer = Vec::new();
    let cmd = Command::Insert {
        value: vec![b'x'; MAX_PAYLOAD_SIZE as usize + 1],
    };

    assert!(matches!(
        write_command(&mut buffer, &cmd),
        Err(SeqLogError::Protocol(_))
    ));
    assert!(buffer.is_empty());
}

#[test]
fn test_stream_rejects_oversized_header_without_reading_payload() {
    let mut bytes = vec![0x02];
    bytes.extend_from_slice(&u32::MAX.to_be_bytes());

    let mut cursor = Cursor::new(bytes);
    assert!(matches!(read_command(&mut cursor), Err(SeqLogError::Protocol(_))));
}
