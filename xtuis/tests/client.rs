use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use xtuis::Client;
use xtuis::ClientConfig;
use xtuis::Error;
use xtuis::Payload;
use xtuis::xtuis_limit::FixedWindow;
use xtuis::xtuis_limit::LimiterSet;

/// A request as seen by the fake push server.
#[derive(Debug, Clone)]
struct Received {
    head: String,
    body: String,
}

/// Serves every connection with `status` and records what it was sent.
async fn fake_server(status: &'static str) -> (String, Arc<Mutex<Vec<Received>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let received = Arc::new(Mutex::new(Vec::new()));

    let log = received.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let log = log.clone();
            tokio::spawn(async move {
                let (request, mut stream) = read_request(stream).await;
                log.lock().unwrap().push(request);

                let response =
                    format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            });
        }
    });

    (url, received)
}

async fn read_request(mut stream: TcpStream) -> (Received, TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[head_end..head_end + length]).to_string();
    (Received { head, body }, stream)
}

fn minute_limit(capacity: usize) -> LimiterSet {
    LimiterSet::new().with_limiter(
        "minute",
        Arc::new(FixedWindow::new(capacity, Duration::from_secs(60))),
    )
}

#[tokio::test]
async fn test_send_posts_form() {
    let (url, received) = fake_server("200 OK").await;
    let client = Client::builder("secret-token")
        .server_url(format!("{url}/"))
        .build()
        .unwrap();

    client
        .send(&Payload::new("build finished").with_desp("all green"))
        .await
        .unwrap();

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert!(received[0].head.starts_with("POST /secret-token.send HTTP/1.1"));
    assert!(
        received[0]
            .head
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded; charset=utf-8")
    );
    assert_eq!(received[0].body, "text=build+finished&desp=all+green");
}

#[tokio::test]
async fn test_server_rejection_is_status_error() {
    let (url, _) = fake_server("500 Internal Server Error").await;
    let client = Client::builder("token").server_url(url).build().unwrap();

    let err = client.send(&Payload::new("hello")).await.unwrap_err();

    assert!(matches!(err, Error::Status(status) if status.as_u16() == 500));
    assert!(!err.is_rate_limited());
}

#[tokio::test]
async fn test_rate_limited_send_makes_no_request() {
    let (url, received) = fake_server("200 OK").await;
    let limits = LimiterSet::new()
        .with_limiter("day", Arc::new(FixedWindow::new(5, Duration::from_secs(86400))))
        .with_limiter("minute", Arc::new(FixedWindow::new(2, Duration::from_secs(60))));
    let client = Client::builder("token")
        .server_url(url)
        .limits(Arc::new(limits))
        .build()
        .unwrap();

    client.send(&Payload::new("one")).await.unwrap();
    client.send(&Payload::new("two")).await.unwrap();
    let err = client.send(&Payload::new("three")).await.unwrap_err();

    assert!(matches!(err, Error::RateLimited { ref window } if window == "minute"));
    assert_eq!(
        err.to_string(),
        "you have reached the limit of sending messages this minute"
    );
    assert_eq!(received.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_exhausted_quota_never_touches_network() {
    // Nothing listens on port 1; a transport error would mean a request was attempted.
    let limits = LimiterSet::new()
        .with_limiter("day", Arc::new(FixedWindow::new(0, Duration::from_secs(60))));
    let client = Client::builder("token")
        .server_url("http://127.0.0.1:1")
        .limits(Arc::new(limits))
        .build()
        .unwrap();

    let err = client.send(&Payload::new("hello")).await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_invalid_payload_consumes_no_quota() {
    let (url, received) = fake_server("200 OK").await;
    let limits = Arc::new(minute_limit(1));
    let client = Client::builder("token")
        .server_url(url)
        .limits(limits.clone())
        .build()
        .unwrap();

    let err = client.send(&Payload::new("   ")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidPayload(_)));

    client.send(&Payload::new("valid")).await.unwrap();
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_clients_sharing_limits() {
    let (url, received) = fake_server("200 OK").await;
    let limits = Arc::new(minute_limit(1));

    let first = Client::builder("token")
        .server_url(url.clone())
        .limits(limits.clone())
        .build()
        .unwrap();
    let second = Client::builder("token")
        .server_url(url)
        .limits(limits)
        .build()
        .unwrap();

    first.send(&Payload::new("one")).await.unwrap();
    let err = second.send(&Payload::new("two")).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_from_config() {
    let (url, received) = fake_server("200 OK").await;
    let config = ClientConfig::from_yaml(&format!(
        "server_url: {url}\nlimits:\n  - {{ name: burst, capacity: 1, window_secs: 3600 }}\n"
    ))
    .unwrap();
    let client = Client::from_config("token", &config).unwrap();

    assert_eq!(client.endpoint(), format!("{url}/token.send"));
    assert_eq!(client.limits().names().collect::<Vec<_>>(), vec!["burst"]);

    client.send(&Payload::new("one")).await.unwrap();
    let err = client.send(&Payload::new("two")).await.unwrap_err();
    assert!(matches!(err, Error::RateLimited { ref window } if window == "burst"));
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[test]
fn test_default_client() {
    let client = Client::new("token").unwrap();

    assert_eq!(client.endpoint(), "https://wx.xtuis.cn/token.send");
    assert_eq!(
        client.limits().names().collect::<Vec<_>>(),
        vec!["day", "minute"]
    );
}
