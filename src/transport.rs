use crate::config::Config;
use crate::constants::*;
use crate::types::ServoAngle;
use futures::future::BoxFuture;
use isahc::config::Configurable;
use isahc::http::StatusCode;
use isahc::{AsyncBody, AsyncReadResponseExt, HttpClient, Request, Response};
use log::{debug, error};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection refused, unreachable host, timeout and the like.
    #[error("{0}")]
    Connection(String),
    #[error("Failed to connect. Response code: {0}")]
    Status(u16),
    #[error("Invalid response format")]
    InvalidResponse,
}

/// The remote end that moves the servo.
pub trait Actuator: Send + Sync {
    fn send(&self, angle: ServoAngle) -> BoxFuture<'_, Result<(), TransportError>>;

    fn read(&self) -> BoxFuture<'_, Result<ServoAngle, TransportError>>;
}

/// Actuator board reachable over plain HTTP.
pub struct HttpActuator {
    client: HttpClient,
    base_url: String,
    send_timeout: Duration,
    read_timeout: Duration,
}

impl HttpActuator {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let client = HttpClient::builder()
            .default_headers(&[("User-Agent", "TiltServo/0.1")])
            .proxy(None::<isahc::http::Uri>)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(HttpActuator {
            client,
            base_url: config.base_url(),
            send_timeout: config.send_timeout,
            read_timeout: config.read_timeout,
        })
    }

    async fn get(&self, path: &str, timeout: Duration) -> Result<Response<AsyncBody>, TransportError> {
        let uri = format!("{}{}", self.base_url, path);
        let request = Request::get(uri.as_str())
            .timeout(timeout)
            .body(())
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let response = self.client.send_async(request).await.map_err(|e| {
            error!("Error: {}", e);
            TransportError::Connection(e.to_string())
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Failed to connect. Response code: {}", status.as_u16());
            return Err(TransportError::Status(status.as_u16()));
        }

        debug!("Request success. Response code: {}", status.as_u16());
        Ok(response)
    }

    pub async fn send_angle(&self, angle: ServoAngle) -> Result<(), TransportError> {
        let path = format!("{}?angle={}", SET_SERVO_PATH, angle.degrees());
        self.get(&path, self.send_timeout).await?;
        Ok(())
    }

    pub async fn read_angle(&self) -> Result<ServoAngle, TransportError> {
        let mut response = self.get(GET_SERVO_PATH, self.read_timeout).await?;
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        parse_angle_response(&body)
    }
}

impl Actuator for HttpActuator {
    fn send(&self, angle: ServoAngle) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(self.send_angle(angle))
    }

    fn read(&self) -> BoxFuture<'_, Result<ServoAngle, TransportError>> {
        Box::pin(self.read_angle())
    }
}

/// Extracts the angle from a `Current Servo Angle: <n>` status page.
pub fn parse_angle_response(body: &str) -> Result<ServoAngle, TransportError> {
    body.match_indices(ANGLE_RESPONSE_PREFIX)
        .map(|(start, prefix)| body[start + prefix.len()..].trim_start())
        .map(|rest| &rest[..rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len())])
        .find(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse::<i64>().ok())
        .and_then(|degrees| ServoAngle::new(degrees).ok())
        .ok_or(TransportError::InvalidResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    /// Accepts one connection, answers with `response` and yields the request head.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 2048];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (addr, task)
    }

    fn actuator_for(host: String, timeout_ms: u64) -> HttpActuator {
        let config = Config {
            host,
            send_timeout: Duration::from_millis(timeout_ms),
            read_timeout: Duration::from_millis(timeout_ms),
            ..Config::default()
        };
        HttpActuator::new(&config).unwrap()
    }

    #[rstest]
    #[case("Current Servo Angle: 73", 73)]
    #[case("<p>Current Servo Angle:180</p>", 180)]
    #[case("Current Servo Angle:\n  0 deg", 0)]
    #[case("Current Servo Angle: n/a<br>Current Servo Angle: 42", 42)]
    fn test_parse_angle_response(#[case] body: &str, #[case] expected: u8) {
        assert_eq!(parse_angle_response(body).unwrap().degrees(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("Servo Angle: 73")]
    #[case("Current Servo Angle: n/a")]
    #[case("Current Servo Angle: 200")]
    fn test_parse_angle_response_rejects(#[case] body: &str) {
        assert_eq!(parse_angle_response(body), Err(TransportError::InvalidResponse));
    }

    #[tokio::test]
    async fn test_send_angle_success() {
        let (host, server) = serve_once(http_response("200 OK", "OK")).await;
        let actuator = actuator_for(host, 2000);

        actuator.send(ServoAngle::new(42).unwrap()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /setServo?angle=42 "), "{}", request);
    }

    #[tokio::test]
    async fn test_send_angle_reports_status_code() {
        let (host, server) = serve_once(http_response("500 Internal Server Error", "")).await;
        let actuator = actuator_for(host, 2000);

        let err = actuator.send(ServoAngle::new(90).unwrap()).await.unwrap_err();
        assert_eq!(err, TransportError::Status(500));
        assert!(err.to_string().contains("500"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_angle_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        let actuator = actuator_for(host, 100);

        let err = actuator.send(ServoAngle::new(10).unwrap()).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)), "{:?}", err);
        server.abort();
    }

    #[tokio::test]
    async fn test_send_angle_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        drop(listener);
        let actuator = actuator_for(host, 500);

        let err = actuator.send(ServoAngle::new(10).unwrap()).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_read_angle() {
        let (host, server) = serve_once(http_response("200 OK", "Current Servo Angle: 135")).await;
        let actuator = actuator_for(host, 2000);

        assert_eq!(actuator.read().await.unwrap().degrees(), 135);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /getServo "), "{}", request);
    }

    #[tokio::test]
    async fn test_read_angle_invalid_body() {
        let (host, server) = serve_once(http_response("200 OK", "hello")).await;
        let actuator = actuator_for(host, 2000);

        assert_eq!(actuator.read().await, Err(TransportError::InvalidResponse));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_angle_non_ok_status() {
        let (host, server) = serve_once(http_response("404 Not Found", "")).await;
        let actuator = actuator_for(host, 2000);

        assert_eq!(actuator.read().await, Err(TransportError::Status(404)));
        server.await.unwrap();
    }
}
