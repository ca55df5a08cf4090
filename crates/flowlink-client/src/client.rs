use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use flowlink_common::protocol::error::Result;
use flowlink_common::transport::endpoint::http_url;
use flowlink_common::transport::JsonCodec;

use crate::http::{ensure_ok, read_body, HttpTransport};
use crate::observer::RequestObserver;

/// Request/response client over plain HTTP.
///
/// Each request is POSTed as JSON to `<base>/post` and answered by one JSON
/// response in the body. Requests are sent one at a time, in input order,
/// without retries.
///
/// # Example
///
/// ```no_run
/// use flowlink_client::{HttpClient, NoopObserver};
/// use flowlink_common::DataRequest;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new("http://localhost:12345")?;
/// let response: DataRequest = client.send(&DataRequest::new(json!([1, 2]))).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    post_url: String,
    transport: HttpTransport,
}

impl HttpClient {
    pub fn new(host: &str) -> Result<Self> {
        Self::with_transport(host, HttpTransport::new()?)
    }

    pub fn with_transport(host: &str, transport: HttpTransport) -> Result<Self> {
        Ok(Self {
            post_url: format!("{}/post", http_url(host)?),
            transport,
        })
    }

    pub fn post_url(&self) -> &str {
        &self.post_url
    }

    /// Sends one request and decodes the response.
    pub async fn send<T>(&self, request: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let body = JsonCodec::encode(request)?;
        let response = self.transport.post_json(&self.post_url, body).await?;
        ensure_ok(&response)?;
        let body = read_body(response).await?;
        JsonCodec::decode(&body)
    }

    /// Sends every request from `requests`, dispatching `observer` hooks.
    ///
    /// A decoded response gets `on_done` then `on_always`. Any failure
    /// (encode, transport, non-200 status, undecodable body) gets `on_error`
    /// then `on_always` with the original request. Failures never abort the
    /// remaining requests.
    pub async fn post<T, S, O>(&self, requests: S, observer: &O) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
        S: Stream<Item = T>,
        O: RequestObserver<T> + ?Sized,
    {
        futures::pin_mut!(requests);

        while let Some(request) = requests.next().await {
            match self.send(&request).await {
                Ok(response) => {
                    observer.on_done(&response);
                    observer.on_always(Some(&response));
                }
                Err(e) => {
                    warn!(url = %self.post_url, error = %e, "request failed");
                    observer.on_error(&request);
                    observer.on_always(Some(&request));
                }
            }
        }

        Ok(())
    }
}
