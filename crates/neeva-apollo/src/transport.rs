//! GraphQL transport

use async_trait::async_trait;
use neeva_session::NeevaConstants;
use reqwest::header::{CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::ApolloError;
use crate::operation::GraphQlRequest;
use crate::Result;

/// Sends an encoded operation and returns the raw JSON body.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    async fn execute(&self, request: &GraphQlRequest, cookies: &[(String, String)])
        -> Result<Value>;
}

/// POSTs operations to the backend's GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
    client_cookies: Vec<(String, String)>,
    client_version: String,
}

impl HttpTransport {
    pub fn new(constants: &NeevaConstants, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, constants.apollo_url.clone(), constants))
    }

    pub fn with_client(http: Client, endpoint: Url, constants: &NeevaConstants) -> Self {
        Self {
            http,
            endpoint,
            client_cookies: constants.browser_cookies(),
            client_version: constants.browser_version.clone(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn cookie_header(&self, session: &[(String, String)]) -> String {
        self.client_cookies
            .iter()
            .chain(session)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[async_trait]
impl GraphQlTransport for HttpTransport {
    async fn execute(
        &self,
        request: &GraphQlRequest,
        cookies: &[(String, String)],
    ) -> Result<Value> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, NeevaConstants::BROWSER_IDENTIFIER)
            .header("X-Neeva-Client-ID", NeevaConstants::BROWSER_IDENTIFIER)
            .header("X-Neeva-Client-Version", self.client_version.as_str())
            .header(COOKIE, self.cookie_header(cookies))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                operation = %request.operation_name,
                status = status.as_u16(),
                "GraphQL request failed"
            );
            return Err(ApolloError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    async fn serve_once(response: String) -> (Url, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = tx.send(read_request(&mut socket).await);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (Url::parse(&format!("http://{addr}/graphql")).unwrap(), rx)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn request() -> GraphQlRequest {
        GraphQlRequest {
            operation_name: "UserInfo".to_string(),
            query: "query UserInfo { user { id } }".to_string(),
            variables: Value::Object(Default::default()),
        }
    }

    #[tokio::test]
    async fn test_sends_cookies_and_decodes_body() {
        let (endpoint, seen) =
            serve_once(http_response("200 OK", r#"{"data":{"user":{"id":"1"}}}"#)).await;
        let constants = NeevaConstants::new("neeva.com", "1.0.0").unwrap();
        let transport = HttpTransport::with_client(Client::new(), endpoint, &constants);

        let body = transport
            .execute(
                &request(),
                &[("httpd~login".to_string(), "secret".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(body["data"]["user"]["id"], "1");

        let raw_request = seen.await.unwrap();
        let cookie_line = raw_request
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with("cookie:"))
            .unwrap()
            .to_string();
        assert!(cookie_line.contains("BrowserType=neeva-android"));
        assert!(cookie_line.contains("httpd~login=secret"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let (endpoint, _seen) = serve_once(http_response("503 Service Unavailable", "down")).await;
        let transport =
            HttpTransport::with_client(Client::new(), endpoint, &NeevaConstants::default());

        let err = transport.execute(&request(), &[]).await.unwrap_err();
        assert_eq!(
            err,
            ApolloError::Http {
                status: 503,
                body: "down".to_string()
            }
        );
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Url::parse(&format!("http://{addr}/graphql")).unwrap();
        let transport =
            HttpTransport::with_client(Client::new(), endpoint, &NeevaConstants::default());

        let err = transport.execute(&request(), &[]).await.unwrap_err();
        assert!(matches!(err, ApolloError::Network(_)));
    }
}
