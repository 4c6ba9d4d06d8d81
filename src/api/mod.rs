use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::reimbursement::Reimbursement;
use crate::status::StatusMessage;

/// Path of the signed-in user's reimbursement list
const REIMBURSEMENTS_PATH: &str = "/reimbursement/user/";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("API error: {0}")]
    Status(StatusCode),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /reimbursement/user/` with the bearer token.
    ///
    /// A JSON body that is not an array decodes to an empty list.
    pub async fn list_reimbursements(&self, token: &str) -> Result<Vec<Reimbursement>, FetchError> {
        let url = format!("{}{}", self.base_url, REIMBURSEMENTS_PATH);
        tracing::debug!(url = %url, "Fetching reimbursements");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        match serde_json::from_str::<Value>(&body)? {
            Value::Array(items) => Ok(decode_records(items)),
            _ => Ok(Vec::new()),
        }
    }
}

/// Decode each element on its own; one that is not a record is skipped
fn decode_records(items: Vec<Value>) -> Vec<Reimbursement> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping reimbursement #{}: {}", i, e);
                None
            }
        })
        .collect()
}

/// Reduce a fetch result to the list to show and the message line
pub fn summarize(result: Result<Vec<Reimbursement>, FetchError>) -> (Vec<Reimbursement>, StatusMessage) {
    match result {
        Ok(records) if !records.is_empty() => {
            tracing::info!("Retrieved {} reimbursements", records.len());
            let message = StatusMessage::success(format!("{} reimbursements retrieved", records.len()));
            (records, message)
        }
        Ok(_) => {
            tracing::info!("No reimbursements returned");
            (Vec::new(), StatusMessage::warning("No reimbursements found"))
        }
        Err(e) => {
            tracing::error!("Error fetching reimbursements: {}", e);
            (Vec::new(), StatusMessage::error("Error fetching reimbursements"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MessageKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and hand back the raw request text
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_sends_bearer_token_to_user_endpoint() {
        let body = r#"[{"expense":{"category":"Fuel","amount":1500,"date":"2024-05-01","user":{"phone_number":"0788"}},"is_paid":true,"created_at":"2024-05-02T10:00:00Z"}]"#;
        let (base, server) = one_shot_server("200 OK", body).await;

        let records = client(&base).list_reimbursements("tok-123").await.unwrap();
        let request = server.await.unwrap().to_lowercase();

        assert!(request.starts_with("get /reimbursement/user/ http/1.1"));
        assert!(request.contains("authorization: bearer tok-123"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category(), Some("Fuel"));
    }

    #[tokio::test]
    async fn test_odd_record_does_not_hide_the_rest() {
        let body = r#"[{"is_paid":null,"expense":{"category":"Tolls","user":5}},{"expense":{"category":"Fuel"},"is_paid":true},7]"#;
        let (base, server) = one_shot_server("200 OK", body).await;

        let (records, message) = summarize(client(&base).list_reimbursements("t").await);
        server.await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category(), Some("Tolls"));
        assert!(records[0].phone_number().is_none());
        assert_eq!(records[0].status_label(), "Unpaid");
        assert_eq!(records[1].status_label(), "Paid");
        assert_eq!(message.text, "2 reimbursements retrieved");
    }

    #[tokio::test]
    async fn test_empty_array_is_a_warning() {
        let (base, server) = one_shot_server("200 OK", "[]").await;

        let (records, message) = summarize(client(&base).list_reimbursements("t").await);
        server.await.unwrap();

        assert!(records.is_empty());
        assert_eq!(message.text, "No reimbursements found");
        assert_eq!(message.kind, MessageKind::Warning);
    }

    #[tokio::test]
    async fn test_non_array_body_is_empty() {
        let (base, server) = one_shot_server("200 OK", r#"{"detail":"nothing"}"#).await;

        let records = client(&base).list_reimbursements("t").await.unwrap();
        server.await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_is_an_error() {
        let (base, server) = one_shot_server("401 Unauthorized", r#"{"detail":"bad token"}"#).await;

        let result = client(&base).list_reimbursements("t").await;
        server.await.unwrap();
        assert!(matches!(result, Err(FetchError::Status(StatusCode::UNAUTHORIZED))));

        let (_, message) = summarize(result);
        assert_eq!(message.text, "Error fetching reimbursements");
        assert!(message.is_error());
    }

    #[tokio::test]
    async fn test_connection_refused_is_an_error() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let result = client(&format!("http://{}", addr)).list_reimbursements("t").await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }

    #[test]
    fn test_summarize_counts_records() {
        let records = vec![Reimbursement::default(), Reimbursement::default()];
        let (kept, message) = summarize(Ok(records));

        assert_eq!(kept.len(), 2);
        assert_eq!(message.text, "2 reimbursements retrieved");
        assert_eq!(message.kind, MessageKind::Success);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        assert_eq!(client("http://localhost:8000/").base_url(), "http://localhost:8000");
    }
}
