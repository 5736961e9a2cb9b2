//! End-to-end tests for `HttpTableClient` against a one-shot local HTTP
//! responder.  No external services are required.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use ts_domain::config::TablestoreConfig;
use ts_domain::error::Error;
use ts_tablestore::http::sign;
use ts_tablestore::{Column, ColumnValue, HttpTableClient, KeyValueTable, PrimaryKey, RowExistence};

const SECRET: &str = "test-secret";
const INSTANCE: &str = "sessions";

struct Captured {
    /// Request line and headers.
    head: String,
    body: Vec<u8>,
}

impl Captured {
    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_owned())
        })
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Accept one connection, capture the request, reply with `status` and `body`.
async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = sock.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                if k.trim().eq_ignore_ascii_case("content-length") {
                    v.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = sock.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let req_body = buf[header_end..header_end + content_length].to_vec();
        let _ = tx.send(Captured {
            head,
            body: req_body,
        });

        let resp = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(resp.as_bytes()).await.unwrap();
        let _ = sock.shutdown().await;
    });

    (format!("http://{addr}"), rx)
}

fn client(endpoint: &str) -> HttpTableClient {
    HttpTableClient::new(&TablestoreConfig {
        endpoint: endpoint.into(),
        access_key_id: "test-id".into(),
        access_key_secret: SECRET.into(),
        instance_name: INSTANCE.into(),
        table_name: "php_session".into(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn get_row_sends_signed_request_and_parses_columns() {
    let (endpoint, rx) = serve_once(
        "200 OK",
        r#"{"attribute_columns":[
            {"name":"value","type":"STRING","value":"user=42","timestamp":1000},
            {"name":"expire","type":"INTEGER","value":1,"timestamp":1000}
        ]}"#,
    )
    .await;

    let pk = PrimaryKey::single("key", "sess:abc123");
    let cols = client(&endpoint)
        .get_row("php_session", &pk, 1)
        .await
        .unwrap();

    assert_eq!(cols.len(), 2);
    assert_eq!(cols[0].name, "value");
    assert_eq!(cols[0].value, ColumnValue::String("user=42".into()));
    assert_eq!(cols[0].timestamp, Some(1000));
    assert_eq!(cols[1].value, ColumnValue::Integer(1));

    let req = rx.await.unwrap();
    assert!(req.head.starts_with("POST /GetRow HTTP/1.1"));
    assert_eq!(req.header("x-ots-instancename").as_deref(), Some(INSTANCE));
    assert_eq!(req.header("x-ots-accesskeyid").as_deref(), Some("test-id"));
    assert!(req.header("x-ots-requestid").is_some());

    let body = req.json();
    assert_eq!(body["table_name"], "php_session");
    assert_eq!(body["primary_key"], serde_json::json!([["key", "sess:abc123"]]));
    assert_eq!(body["max_versions"], 1);

    let date = req.header("x-ots-date").unwrap();
    let expected = sign(SECRET, "/GetRow", &date, INSTANCE, &req.body);
    assert_eq!(req.header("x-ots-signature"), Some(expected));
}

#[tokio::test]
async fn get_row_on_missing_row_is_empty() {
    let (endpoint, _rx) = serve_once("200 OK", "{}").await;
    let cols = client(&endpoint)
        .get_row("php_session", &PrimaryKey::single("key", "gone"), 1)
        .await
        .unwrap();
    assert!(cols.is_empty());
}

#[tokio::test]
async fn put_row_encodes_columns_and_condition() {
    let (endpoint, rx) = serve_once("200 OK", "{}").await;

    client(&endpoint)
        .put_row(
            "php_session",
            &PrimaryKey::single("key", "sess:abc123"),
            vec![
                Column::new("value", ColumnValue::Binary(vec![0xde, 0xad])).with_timestamp(7),
                Column::new("expire", ColumnValue::Integer(3600)).with_timestamp(7),
            ],
            RowExistence::Ignore,
        )
        .await
        .unwrap();

    let body = rx.await.unwrap().json();
    assert_eq!(body["condition"], "IGNORE");
    let cols = body["attribute_columns"].as_array().unwrap();
    assert_eq!(cols[0]["type"], "BINARY");
    assert_eq!(cols[0]["value"], "dead");
    assert_eq!(cols[0]["timestamp"], 7);
    assert_eq!(cols[1]["type"], "INTEGER");
    assert_eq!(cols[1]["value"], 3600);
}

#[tokio::test]
async fn store_rejection_surfaces_as_table_error() {
    let (endpoint, _rx) = serve_once(
        "400 Bad Request",
        r#"{"code":"OTSObjectNotExist","message":"Requested table does not exist."}"#,
    )
    .await;

    let err = client(&endpoint)
        .delete_row(
            "missing_table",
            &PrimaryKey::single("key", "a"),
            RowExistence::Ignore,
        )
        .await
        .unwrap_err();
    match err {
        Error::Table { code, .. } => assert_eq!(code, "OTSObjectNotExist"),
        other => panic!("expected table error, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let (endpoint, _rx) = serve_once("403 Forbidden", "signature mismatch").await;
    let err = client(&endpoint)
        .get_row("php_session", &PrimaryKey::single("key", "a"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .get_row("php_session", &PrimaryKey::single("key", "a"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Http(_) | Error::Timeout(_)));
}
