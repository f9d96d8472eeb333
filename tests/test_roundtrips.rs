//! End-to-end tests against a scripted in-process server.
//!
//! The mock accepts one connection, answers the initialization exchange and
//! the SCRAM-SHA256 handshake, and then replies to each request according
//! to its message type. This exercises the complete engine: framing,
//! authentication, statement execution, fetch loops, and teardown.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use scnp::{ConnectParams, DbResult, Session, TransactionState, Value};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};

// message types the mock dispatches on
const MT_EXECUTE_DIRECT: u8 = 2;
const MT_PREPARE: u8 = 3;
const MT_EXECUTE: u8 = 13;
const MT_AUTHENTICATE: u8 = 65;
const MT_CONNECT: u8 = 66;
const MT_COMMIT: u8 = 67;
const MT_ROLLBACK: u8 = 68;
const MT_DROP_STATEMENT_ID: u8 = 70;
const MT_FETCH_NEXT: u8 = 71;
const MT_DISCONNECT: u8 = 77;

const SESSION_ID: i64 = 555;

struct RawPart {
    kind: i8,
    attributes: u8,
    arg_count: i16,
    payload: Vec<u8>,
}

impl RawPart {
    fn new(kind: i8, attributes: u8, arg_count: i16, payload: Vec<u8>) -> Self {
        Self {
            kind,
            attributes,
            arg_count,
            payload,
        }
    }
}

fn reply_packet(session_id: i64, function_code: i16, parts: &[RawPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.write_i8(part.kind).unwrap();
        body.write_u8(part.attributes).unwrap();
        body.write_i16::<LittleEndian>(part.arg_count).unwrap();
        body.write_i32::<LittleEndian>(0).unwrap();
        body.write_i32::<LittleEndian>(part.payload.len() as i32)
            .unwrap();
        body.write_i32::<LittleEndian>(1 << 16).unwrap();
        body.extend_from_slice(&part.payload);
        let pad = (8 - part.payload.len() % 8) % 8;
        body.extend(std::iter::repeat(0u8).take(pad));
    }

    let mut varpart = Vec::new();
    varpart
        .write_i32::<LittleEndian>(24 + body.len() as i32)
        .unwrap();
    varpart.write_i32::<LittleEndian>(0).unwrap();
    varpart
        .write_i16::<LittleEndian>(parts.len() as i16)
        .unwrap();
    varpart.write_i16::<LittleEndian>(1).unwrap();
    varpart.write_i8(2).unwrap(); // segment kind: reply
    varpart.write_i8(0).unwrap();
    varpart.write_i16::<LittleEndian>(function_code).unwrap();
    varpart.extend_from_slice(&[0u8; 8]);
    varpart.extend_from_slice(&body);

    let mut packet = Vec::new();
    packet.write_i64::<LittleEndian>(session_id).unwrap();
    packet.write_i32::<LittleEndian>(0).unwrap();
    packet
        .write_u32::<LittleEndian>(varpart.len() as u32)
        .unwrap();
    packet
        .write_u32::<LittleEndian>(varpart.len() as u32)
        .unwrap();
    packet.write_i16::<LittleEndian>(1).unwrap();
    packet.extend_from_slice(&[0u8; 10]);
    packet.extend_from_slice(&varpart);
    packet
}

// an AuthFields list: u16 count, then (length, bytes) per field
fn auth_fields(fields: &[&[u8]]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u16::<LittleEndian>(fields.len() as u16).unwrap();
    for field in fields {
        buf.write_u8(field.len() as u8).unwrap();
        buf.extend_from_slice(field);
    }
    buf
}

fn authentication_reply_part() -> RawPart {
    let method_data = auth_fields(&[&[0x11u8; 16], &[0x22u8; 48]]); // salt, server nonce
    let payload = auth_fields(&[b"SCRAMSHA256", &method_data]);
    RawPart::new(33, 0, 1, payload)
}

// one nullable NVARCHAR(18) column named GREETING
fn resultset_metadata_part() -> RawPart {
    let mut payload = Vec::new();
    payload.write_u8(0b10).unwrap();
    payload.write_u8(11).unwrap();
    payload.write_i16::<LittleEndian>(0).unwrap();
    payload.write_i16::<LittleEndian>(18).unwrap();
    payload.write_i16::<LittleEndian>(0).unwrap();
    payload.write_u32::<LittleEndian>(u32::MAX).unwrap(); // tablename
    payload.write_u32::<LittleEndian>(u32::MAX).unwrap(); // schemaname
    payload.write_u32::<LittleEndian>(0).unwrap(); // columnname
    payload.write_u32::<LittleEndian>(0).unwrap(); // displayname
    payload.write_u8(8).unwrap();
    payload.extend_from_slice(b"GREETING");
    RawPart::new(48, 0, 1, payload)
}

fn resultset_id_part() -> RawPart {
    RawPart::new(13, 0, 1, 7777u64.to_le_bytes().to_vec())
}

fn string_row(text: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.write_u8(text.len() as u8).unwrap();
    row.extend_from_slice(text.as_bytes());
    row
}

fn committed_transaction_flags_part() -> RawPart {
    // flag id 1 (committed), type 28 (bool), value true
    RawPart::new(64, 0, 1, vec![1, 28, 1])
}

// Serves exactly one client connection: initialization exchange, then one
// scripted reply per request, chosen by message type. Records the packet
// sequence numbers of all requests.
fn spawn_mock_server(
    script: impl Fn(u8, usize) -> Option<Vec<u8>> + Send + 'static,
) -> (u16, Arc<Mutex<Vec<i32>>>, std::thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let seq_numbers = Arc::new(Mutex::new(Vec::<i32>::new()));
    let seq_recorder = Arc::clone(&seq_numbers);

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        serve(&mut stream, &script, &seq_recorder);
    });
    (port, seq_numbers, handle)
}

fn serve(
    stream: &mut TcpStream,
    script: &impl Fn(u8, usize) -> Option<Vec<u8>>,
    seq_recorder: &Mutex<Vec<i32>>,
) {
    // initialization exchange
    let mut intro = [0u8; 14];
    stream.read_exact(&mut intro).unwrap();
    stream.write_all(&[4, 20, 0, 4, 1, 0, 0, 0]).unwrap();

    let mut request_index = 0;
    loop {
        let mut header = [0u8; 32];
        if stream.read_exact(&mut header).is_err() {
            return; // client hung up
        }
        let seq_number = LittleEndian::read_i32(&header[8..12]);
        seq_recorder.lock().unwrap().push(seq_number);
        let varpart_length = LittleEndian::read_u32(&header[12..16]) as usize;
        let mut varpart = vec![0u8; varpart_length];
        stream.read_exact(&mut varpart).unwrap();

        let message_type = varpart[13];
        match script(message_type, request_index) {
            Some(reply) => stream.write_all(&reply).unwrap(),
            None => return, // e.g. DISCONNECT
        }
        request_index += 1;
    }
}

fn connect(port: u16) -> Session {
    let params = ConnectParams::builder("127.0.0.1", port)
        .dbuser("SYSTEM")
        .password("manager")
        .build()
        .unwrap();
    Session::connect(params).unwrap()
}

fn handshake_reply(message_type: u8) -> Option<Vec<u8>> {
    match message_type {
        MT_AUTHENTICATE => Some(reply_packet(-1, 14, &[authentication_reply_part()])),
        MT_CONNECT => Some(reply_packet(SESSION_ID, 14, &[])),
        MT_DISCONNECT => None,
        _ => panic!("unexpected message type {message_type}"),
    }
}

#[test]
fn connect_select_and_disconnect() {
    let (port, seq_numbers, handle) = spawn_mock_server(|message_type, _| match message_type {
        MT_EXECUTE_DIRECT => Some(reply_packet(
            SESSION_ID,
            5, // select
            &[
                resultset_metadata_part(),
                resultset_id_part(),
                // one row, last packet + result set closed
                RawPart::new(5, 0b10001, 1, string_row("Hello Python World")),
            ],
        )),
        mt => handshake_reply(mt),
    });

    let mut session = connect(port);
    let result = session
        .execute("select GREETING from TEST_TABLE", None)
        .unwrap();
    let mut rs = result.into_resultset().unwrap();
    assert_eq!(rs.metadata().len(), 1);
    assert_eq!(rs.metadata().fields()[0].columnname(), "GREETING");

    let row = rs.fetch_one().unwrap().expect("one row");
    match &row[0] {
        Value::String(s) => assert_eq!(s, "Hello Python World"),
        v => panic!("unexpected value {v:?}"),
    }
    assert!(rs.fetch_one().unwrap().is_none());

    session.close().unwrap();
    drop(session);
    handle.join().unwrap();

    // strictly increasing sequence numbers, starting over when the server
    // assigned the session id with the CONNECT reply
    let seqs = seq_numbers.lock().unwrap().clone();
    assert_eq!(seqs, vec![0, 1, 0, 1]);
}

#[test]
fn fetch_loop_drains_the_resultset_in_batches() {
    let (port, _, handle) = spawn_mock_server(|message_type, _| match message_type {
        MT_EXECUTE_DIRECT => Some(reply_packet(
            SESSION_ID,
            5,
            &[
                resultset_metadata_part(),
                resultset_id_part(),
                RawPart::new(5, 0, 1, string_row("row-1")), // more to come
            ],
        )),
        MT_FETCH_NEXT => {
            let mut rows = string_row("row-2");
            rows.extend_from_slice(&string_row("row-3"));
            Some(reply_packet(
                SESSION_ID,
                10, // fetch
                &[RawPart::new(5, 0b1, 2, rows)],
            ))
        }
        mt => handshake_reply(mt),
    });

    let mut session = connect(port);
    let mut rs = session
        .execute("select GREETING from TEST_TABLE", None)
        .unwrap()
        .into_resultset()
        .unwrap();
    let rows = rs.fetch_all().unwrap();
    assert_eq!(rows.len(), 3);
    let texts: Vec<String> = rows
        .into_iter()
        .map(|row| match row.into_values().remove(0) {
            Value::String(s) => s,
            v => panic!("unexpected value {v:?}"),
        })
        .collect();
    assert_eq!(texts, vec!["row-1", "row-2", "row-3"]);

    session.close().unwrap();
    drop(session);
    handle.join().unwrap();
}

#[test]
fn prepared_insert_reports_rowcount_and_commit_state() {
    let (port, _, handle) = spawn_mock_server(|message_type, _| match message_type {
        MT_PREPARE => {
            // statement id + one IN VARCHAR parameter without name
            let mut descriptor = Vec::new();
            descriptor.write_u8(0b10).unwrap();
            descriptor.write_u8(9).unwrap(); // VARCHAR
            descriptor.write_u8(1).unwrap(); // IN
            descriptor.write_u8(0).unwrap();
            descriptor.write_u32::<LittleEndian>(u32::MAX).unwrap();
            descriptor.write_i16::<LittleEndian>(255).unwrap();
            descriptor.write_i16::<LittleEndian>(0).unwrap();
            descriptor.write_u32::<LittleEndian>(0).unwrap();
            Some(reply_packet(
                SESSION_ID,
                3, // update-ish; only the parts matter here
                &[
                    RawPart::new(10, 0, 1, 4242u64.to_le_bytes().to_vec()),
                    RawPart::new(47, 0, 1, descriptor),
                ],
            ))
        }
        MT_EXECUTE => Some(reply_packet(
            SESSION_ID,
            2, // insert
            &[
                RawPart::new(12, 0, 1, 1i32.to_le_bytes().to_vec()),
                committed_transaction_flags_part(),
            ],
        )),
        MT_DROP_STATEMENT_ID => Some(reply_packet(SESSION_ID, 21, &[])),
        MT_COMMIT => Some(reply_packet(
            SESSION_ID,
            11,
            &[committed_transaction_flags_part()],
        )),
        mt => handshake_reply(mt),
    });

    let mut session = connect(port);
    {
        let stmt = session.prepare("insert into TEST_TABLE values (?)").unwrap();
        assert_eq!(stmt.parameter_descriptors().len(), 1);
        let result = session
            .execute_prepared(&stmt, &[vec![Value::from("Hello Python World")]])
            .unwrap();
        match result {
            DbResult::RowsAffected(counts) => assert_eq!(counts, vec![1]),
            r => panic!("unexpected result {r:?}"),
        }
        assert_eq!(
            session.transaction_state().unwrap(),
            TransactionState::Committed
        );
    } // dropping the statement sends DROP_STATEMENT_ID

    session.commit().unwrap();
    session.close().unwrap();
    drop(session);
    handle.join().unwrap();
}

#[test]
fn lob_reads_pull_exactly_the_missing_ranges() {
    const MT_READ_LOB: u8 = 16;
    const LOCATOR: u64 = 0xABC;

    // 2000-byte NCLOB: 1024 bytes arrive inline, the rest per READ_LOB
    let read_roundtrips = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let roundtrip_counter = Arc::clone(&read_roundtrips);

    let (port, _, handle) = spawn_mock_server(move |message_type, _| match message_type {
        MT_EXECUTE_DIRECT => {
            let mut metadata = Vec::new();
            metadata.write_u8(0b10).unwrap();
            metadata.write_u8(26).unwrap(); // NCLOB
            metadata.write_i16::<LittleEndian>(0).unwrap();
            metadata.write_i16::<LittleEndian>(0).unwrap();
            metadata.write_i16::<LittleEndian>(0).unwrap();
            metadata.write_u32::<LittleEndian>(u32::MAX).unwrap();
            metadata.write_u32::<LittleEndian>(u32::MAX).unwrap();
            metadata.write_u32::<LittleEndian>(0).unwrap();
            metadata.write_u32::<LittleEndian>(0).unwrap();
            metadata.write_u8(4).unwrap();
            metadata.extend_from_slice(b"TEXT");

            let mut row = Vec::new();
            row.write_u8(3).unwrap(); // nclob
            row.write_u8(0b010).unwrap(); // data included, more to come
            row.write_u16::<LittleEndian>(0).unwrap();
            row.write_u64::<LittleEndian>(2000).unwrap(); // char length
            row.write_u64::<LittleEndian>(2000).unwrap(); // byte length
            row.write_u64::<LittleEndian>(LOCATOR).unwrap();
            row.write_i32::<LittleEndian>(1024).unwrap();
            row.extend(std::iter::repeat(b'a').take(1024));

            Some(reply_packet(
                SESSION_ID,
                5,
                &[
                    RawPart::new(48, 0, 1, metadata),
                    resultset_id_part(),
                    RawPart::new(5, 0b10001, 1, row),
                ],
            ))
        }
        MT_READ_LOB => {
            let n = roundtrip_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let (payload, options) = match n {
                0 => (vec![b'b'; 476], 0b010u8),
                1 => (vec![b'c'; 500], 0b110u8),
                n => panic!("unexpected READ_LOB roundtrip {n}"),
            };
            let mut reply = Vec::new();
            reply.write_u64::<LittleEndian>(LOCATOR).unwrap();
            reply.write_u8(options).unwrap();
            reply.write_i32::<LittleEndian>(payload.len() as i32).unwrap();
            reply.extend_from_slice(&[0, 0, 0]);
            reply.extend_from_slice(&payload);
            Some(reply_packet(SESSION_ID, 16, &[RawPart::new(18, 0, 1, reply)]))
        }
        mt => handshake_reply(mt),
    });

    let mut session = connect(port);
    let mut rs = session
        .execute("select TEXT from TEST_TABLE", None)
        .unwrap()
        .into_resultset()
        .unwrap();
    let row = rs.fetch_one().unwrap().expect("one row");
    let scnp::Value::Lob(mut lob) = row.into_values().remove(0) else {
        panic!("expected a LOB value");
    };
    assert_eq!(lob.byte_length(), 2000);
    assert_eq!(lob.buffered_length(), 1024);

    let chunk = lob.read(1500).unwrap();
    assert_eq!(chunk.len(), 1500);
    assert!(chunk.starts_with(&[b'a']));
    assert!(chunk.ends_with(&[b'b']));
    assert_eq!(lob.tell(), 1500);
    assert_eq!(lob.buffered_length(), 1500);

    let rest = lob.read_all().unwrap();
    assert_eq!(rest.len(), 500);
    assert!(rest.iter().all(|b| *b == b'c'));
    assert_eq!(lob.tell(), 2000);

    // seeks are local: re-reading the consumed range needs no roundtrip
    lob.seek(scnp::SeekFrom::Start(0)).unwrap();
    let all = lob.read_all().unwrap();
    assert_eq!(all.len(), 2000);
    assert_eq!(read_roundtrips.load(std::sync::atomic::Ordering::SeqCst), 2);

    session.close().unwrap();
    drop(session);
    handle.join().unwrap();
}

#[test]
fn server_errors_keep_the_session_usable() {
    let (port, _, handle) = spawn_mock_server(|message_type, request_index| {
        match (message_type, request_index) {
            (MT_EXECUTE_DIRECT, 2) => {
                // error record: code, position, text length, severity error,
                // sqlstate, text, padded to 8
                let text = b"invalid table name: FOO";
                let mut payload = Vec::new();
                payload.write_i32::<LittleEndian>(259).unwrap();
                payload.write_i32::<LittleEndian>(20).unwrap();
                payload.write_i32::<LittleEndian>(text.len() as i32).unwrap();
                payload.write_i8(1).unwrap();
                payload.extend_from_slice(b"HY000");
                payload.extend_from_slice(text);
                let pad = (8 - (18 + text.len()) % 8) % 8;
                payload.extend(std::iter::repeat(0u8).take(pad));
                Some(reply_packet(SESSION_ID, 1, &[RawPart::new(6, 0, 1, payload)]))
            }
            (MT_ROLLBACK, _) => Some(reply_packet(SESSION_ID, 12, &[])),
            (mt, _) => handshake_reply(mt),
        }
    });

    let mut session = connect(port);
    let err = session
        .execute("select * from FOO", None)
        .expect_err("server reported an error");
    let records = err.server_errors().expect("database error");
    assert_eq!(records[0].code(), 259);
    assert_eq!(records[0].sqlstate(), b"HY000");
    assert!(records[0].text().contains("invalid table name"));

    // the session survives a plain SQL error
    assert!(!session.is_closed());
    session.rollback().unwrap();
    session.close().unwrap();
    drop(session);
    handle.join().unwrap();
}
