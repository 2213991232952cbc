use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bellbook::config::ClientConfig;
use bellbook::error::BellbookError;
use bellbook::events::{event_payload, parse_event, HttpPushTransport, PushTransport, StreamEvent};

fn transport(server: &MockServer) -> HttpPushTransport {
    HttpPushTransport::new(&ClientConfig::new().with_base_url(format!("{}/api", server.uri())))
        .unwrap()
}

const EVENT_BODY: &str = concat!(
    "data: {\"type\":\"connected\",\"user_id\":\"u1\"}\r\n\r\n",
    ": ka\n\n",
    "event: message\n",
    "data: {\"type\":\"message.new\",\"conversation_id\":\"c1\"}\n\n",
);

#[tokio::test]
async fn open_stream_yields_lines_until_server_closes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/stream"))
        .and(query_param("token", "a.b+c/d"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EVENT_BODY, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let lines: Vec<String> = transport(&server)
        .connect("a.b+c/d")
        .await
        .unwrap()
        .map(|line| line.unwrap())
        .collect()
        .await;

    assert_eq!(
        lines,
        vec![
            r#"data: {"type":"connected","user_id":"u1"}"#,
            ": ka",
            "event: message",
            r#"data: {"type":"message.new","conversation_id":"c1"}"#,
        ]
    );

    let events: Vec<StreamEvent> = lines
        .iter()
        .filter_map(|line| event_payload(line))
        .filter_map(parse_event)
        .collect();
    assert_eq!(
        events,
        vec![
            StreamEvent::Connected {
                user_id: Some("u1".into())
            },
            StreamEvent::MessageNew {
                conversation_id: Some("c1".into())
            },
        ]
    );
}

#[tokio::test]
async fn rejected_stream_is_a_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/stream"))
        .and(query_param("token", "bad"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = match transport(&server).connect("bad").await {
        Ok(_) => panic!("401 must not open the stream"),
        Err(err) => err,
    };
    assert!(matches!(err, BellbookError::Api { status: 401, .. }));
    assert_eq!(err.to_string(), "Invalid token");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let transport =
        HttpPushTransport::new(&ClientConfig::new().with_base_url("http://127.0.0.1:1/api")).unwrap();
    let err = match transport.connect("a").await {
        Ok(_) => panic!("nothing listens on port 1"),
        Err(err) => err,
    };
    assert!(matches!(err, BellbookError::Network(_)));
}
