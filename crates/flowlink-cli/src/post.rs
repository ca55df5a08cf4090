// Copyright 2025 Flowlink Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Post Plumbing
//!
//! Input and output for the `post` command.
//!
//! Requests are read as newline-delimited JSON by a background task and fed
//! to the client through an unbounded channel, so the client starts sending
//! before the whole input has been read. Each decoded response is written as
//! one JSON line by a [`PrintObserver`], which also tallies failures for the
//! exit status.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use flowlink_client::RequestObserver;
use flowlink_common::{DataRequest, JsonCodec};

/// Spawns a task that parses `reader` line by line into requests.
///
/// Blank lines are skipped. A line that is not a JSON request is logged and
/// skipped; the task resolves to the number of such lines once the input is
/// exhausted, at which point the returned stream ends.
pub fn spawn_reader<R>(reader: R) -> (UnboundedReceiver<DataRequest>, JoinHandle<std::io::Result<usize>>)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = unbounded();

    let handle = tokio::spawn(async move {
        let mut lines = reader.lines();
        let mut line_no = 0usize;
        let mut malformed = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match JsonCodec::decode::<DataRequest>(line.as_bytes()) {
                Ok(request) => {
                    if tx.unbounded_send(request).is_err() {
                        // client went away; nothing left to feed
                        break;
                    }
                }
                Err(e) => {
                    error!(line = line_no, error = %e, "skipping malformed request");
                    malformed += 1;
                }
            }
        }

        Ok(malformed)
    });

    (rx, handle)
}

/// Outcome of one `post` session as seen by a [`PrintObserver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostSummary {
    pub responses: usize,
    pub errors: usize,
    pub undecodable: usize,
}

impl PostSummary {
    pub fn failures(&self) -> usize {
        self.errors + self.undecodable
    }
}

/// Observer that prints every decoded response as one JSON line.
pub struct PrintObserver<W> {
    out: Mutex<W>,
    responses: AtomicUsize,
    errors: AtomicUsize,
    undecodable: AtomicUsize,
}

impl<W: Write + Send> PrintObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            responses: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            undecodable: AtomicUsize::new(0),
        }
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            responses: self.responses.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
            undecodable: self.undecodable.load(Ordering::SeqCst),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn print(&self, response: &DataRequest) {
        let line = match JsonCodec::encode(response) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to encode response for output");
                return;
            }
        };

        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write response");
        }
    }
}

impl<W: Write + Send> RequestObserver<DataRequest> for PrintObserver<W> {
    fn on_done(&self, response: &DataRequest) {
        self.responses.fetch_add(1, Ordering::SeqCst);
        self.print(response);
    }

    fn on_error(&self, request: &DataRequest) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        error!(request_id = ?request.request_id(), "request failed");
    }

    fn on_always(&self, message: Option<&DataRequest>) {
        if message.is_none() {
            self.undecodable.fetch_add(1, Ordering::SeqCst);
        }
    }
}
