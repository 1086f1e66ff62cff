// Copyright 2026 BadCompany
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

//! Stream reader tasks.
//!
//! Each direction gets a background task reading complete lines through
//! `LineCodec` into an mpsc channel, so the proxy event loop stays the single
//! thread of control that touches policy state.

use crate::mcp::codec::LineCodec;
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tracing::error;

/// Lines arriving from the downstream client (the agent).
#[derive(Debug)]
pub enum InboundEvent {
    Line(String),
    /// Client closed its stream (EOF).
    Eof,
}

/// Events arriving from the upstream server process.
#[derive(Debug)]
pub enum UpstreamEvent {
    Line(String),
    /// Server stdout closed.
    Closed,
    /// Process terminated with an exit code, or `None` when killed by a
    /// signal.
    Terminated(Option<i32>),
}

/// Spawns a background task reading client stdin.
pub fn spawn_inbound_reader<R>(stream: R, tx: mpsc::Sender<InboundEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedRead::new(stream, LineCodec::new());

        while let Some(result) = framed.next().await {
            match result {
                Ok(line) => {
                    if tx.send(InboundEvent::Line(line)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    error!("inbound framing error: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(InboundEvent::Eof).await;
    });
}

/// Spawns a background task reading the server's stdout.
pub fn spawn_upstream_reader<R>(stream: R, tx: mpsc::Sender<UpstreamEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedRead::new(stream, LineCodec::new());

        while let Some(result) = framed.next().await {
            match result {
                Ok(line) => {
                    if tx.send(UpstreamEvent::Line(line)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    error!("upstream framing error: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(UpstreamEvent::Closed).await;
    });
}
