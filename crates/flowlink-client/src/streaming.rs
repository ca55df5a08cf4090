//! Duplex streaming client
//!
//! One persistent WebSocket connection per client. A call to
//! [`StreamingClient::post`] runs two procedures over that connection at the
//! same time:
//!
//! - the **send procedure** pulls requests from the caller's stream, writes
//!   each as one text frame and records it as outstanding
//! - the **receive procedure** reads inbound frames, dispatches the
//!   observer hooks and marks one outstanding request answered per frame
//!
//! Responses are matched to requests by arrival order only. Once the input
//! stream ends, `post` waits until every written request has been answered.
//! There is no timeout and no reconnection: if the connection stops
//! delivering messages while requests are outstanding, `post` never returns.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use flowlink_common::protocol::error::{FlowlinkError, Result};
use flowlink_common::transport::endpoint::websocket_url;
use flowlink_common::transport::JsonCodec;

use crate::observer::RequestObserver;
use crate::pending::PendingRequests;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// WebSocket client for the compute service.
///
/// The connection is opened by [`connect`](Self::connect) and lives as long
/// as the client. Concurrent calls to [`post`](Self::post) on one client run
/// one after another.
///
/// The socket is only read while a `post` is running, since the observer is
/// borrowed for that call. Frames that arrive between calls (pings, a close,
/// stray responses) wait in the socket and are handled by the next `post`;
/// a connection the server closed in the meantime is only noticed then.
///
/// # Example
///
/// ```no_run
/// use flowlink_client::{Callbacks, StreamingClient};
/// use flowlink_common::DataRequest;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StreamingClient::connect("localhost:12345").await?;
///
/// let requests = futures::stream::iter(vec![
///     DataRequest::new(json!([{"text": "hello"}])),
///     DataRequest::new(json!([{"text": "world"}])),
/// ]);
/// let callbacks = Callbacks::new()
///     .done(|response: &DataRequest| println!("{:?}", response.data))
///     .error(|request: &DataRequest| eprintln!("failed: {:?}", request.data));
///
/// client.post(requests, &callbacks).await?;
/// # Ok(())
/// # }
/// ```
pub struct StreamingClient {
    url: String,
    writer: Mutex<WsWriter>,
    reader: Mutex<WsReader>,
    pending: PendingRequests,
}

impl StreamingClient {
    /// Connects to `host`, which may be a bare `host:port` or carry a `ws`,
    /// `wss`, `http` or `https` scheme.
    ///
    /// # Errors
    ///
    /// - [`FlowlinkError::InvalidEndpoint`] if `host` names no host
    /// - [`FlowlinkError::Handshake`] if the connection or upgrade fails
    pub async fn connect(host: &str) -> Result<Self> {
        let url = websocket_url(host)?;
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| FlowlinkError::Handshake(format!("{}: {}", url, e)))?;
        debug!(url = %url, status = %response.status(), "websocket connected");

        let (writer, reader) = stream.split();
        Ok(Self {
            url,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            pending: PendingRequests::new(),
        })
    }

    /// The normalized WebSocket URL this client is connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of written requests still waiting for an inbound message.
    pub fn pending(&self) -> usize {
        self.pending.count()
    }

    /// Sends every request from `requests` and dispatches `observer` hooks
    /// until all written requests have been answered.
    ///
    /// Per-request failures never abort the session:
    ///
    /// - a request that fails to encode gets `on_error` then `on_always`,
    ///   and is neither written nor counted as outstanding
    /// - a request whose write fails gets `on_error` then `on_always`, and is
    ///   not counted as outstanding
    /// - every inbound message counts as an answer; it gets `on_done` then
    ///   `on_always` when it decodes, and only `on_always(None)` when it does
    ///   not
    ///
    /// Returns `Ok(())` once the input is exhausted and nothing is
    /// outstanding. The connection stays open.
    pub async fn post<T, S, O>(&self, requests: S, observer: &O) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
        S: Stream<Item = T>,
        O: RequestObserver<T> + ?Sized,
    {
        let mut writer = self.writer.lock().await;
        let mut reader = self.reader.lock().await;
        let pending = &self.pending;

        let receive = receive_loop(&mut reader, pending, observer);
        let send = async {
            send_loop(&mut writer, requests, pending, observer).await;
            pending.wait_drained().await;
        };
        tokio::pin!(receive, send);

        tokio::select! {
            _ = &mut send => {}
            _ = &mut receive => {
                // Nothing more will be read; only an empty backlog lets this finish.
                send.await;
            }
        }

        Ok(())
    }

    /// Sends a close frame and shuts down the write half.
    pub async fn close(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .close()
            .await
            .map_err(|e| FlowlinkError::Write(e.to_string()))
    }
}

async fn send_loop<T, S, O>(writer: &mut WsWriter, requests: S, pending: &PendingRequests, observer: &O)
where
    T: Serialize,
    S: Stream<Item = T>,
    O: RequestObserver<T> + ?Sized,
{
    futures::pin_mut!(requests);

    while let Some(request) = requests.next().await {
        let frame = match JsonCodec::encode(&request) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to encode request");
                observer.on_error(&request);
                observer.on_always(Some(&request));
                continue;
            }
        };

        // Counted before the write so an early response cannot arrive first.
        pending.add();
        if let Err(e) = writer.send(Message::text(frame)).await {
            warn!(error = %e, "failed to write request");
            pending.withdraw();
            observer.on_error(&request);
            observer.on_always(Some(&request));
        }
    }
}

async fn receive_loop<T, O>(reader: &mut WsReader, pending: &PendingRequests, observer: &O)
where
    T: DeserializeOwned,
    O: RequestObserver<T> + ?Sized,
{
    while let Some(message) = reader.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "read failed, receive loop stopped");
                return;
            }
        };

        let data = match message {
            Message::Text(_) | Message::Binary(_) => message.into_data(),
            Message::Close(frame) => {
                warn!(?frame, "connection closed by server, receive loop stopped");
                return;
            }
            _ => continue,
        };

        match JsonCodec::decode::<T>(&data) {
            Ok(response) => {
                observer.on_done(&response);
                observer.on_always(Some(&response));
            }
            Err(e) => {
                warn!(error = %e, "failed to decode response");
                observer.on_always(None);
            }
        }
        pending.complete();
    }

    warn!("connection ended, receive loop stopped");
}
