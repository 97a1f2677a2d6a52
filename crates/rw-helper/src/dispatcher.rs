//! Request dispatcher.
//!
//! Reads request lines, spawns one task per accepted request, and funnels the
//! decision lines through a single writer. Decisions are written in completion
//! order, not input order; the proxy matches them up by request ID.
//!
//! Each task holds a clone of the output sender. Once input is exhausted the
//! reader drops its own sender, so the writer sees the channel close exactly
//! when the last in-flight task has delivered its decision.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rw_core::{RewriteError, RewriteResult, RuleSet};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::protocol::{Decision, Request};

const OUTPUT_BUFFER: usize = 1024;

/// Counters for one dispatcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Lines turned into requests; each received one decision line.
    pub accepted: usize,
    /// Lines ignored for having too few fields.
    pub dropped: usize,
}

/// Serve requests from `reader` until end of input, writing decisions to
/// `writer`. Returns once every accepted request has been answered.
pub async fn run<R, W>(ruleset: Arc<RuleSet>, reader: R, writer: W) -> io::Result<DispatchStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, rx) = mpsc::channel::<String>(OUTPUT_BUFFER);

    let (read_result, write_result) = tokio::join!(
        read_requests(ruleset, reader, tx),
        write_decisions(rx, writer)
    );

    let stats = read_result?;
    write_result?;
    Ok(stats)
}

async fn read_requests<R>(
    ruleset: Arc<RuleSet>,
    mut reader: R,
    tx: mpsc::Sender<String>,
) -> io::Result<DispatchStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = DispatchStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        match Request::parse(&line) {
            Some(request) => {
                stats.accepted += 1;
                spawn_request(Arc::clone(&ruleset), request, tx.clone());
            }
            None => {
                stats.dropped += 1;
                log::debug!("ignoring malformed request line {:?}", line.trim_end());
            }
        }
    }

    Ok(stats)
}

async fn write_decisions<W>(mut rx: mpsc::Receiver<String>, mut writer: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    writer.flush().await
}

fn spawn_request(ruleset: Arc<RuleSet>, request: Request, tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        log::debug!(
            "request {} from {} ({}, ident {}): {} {}",
            request.id,
            request.client_addr,
            request.client_fqdn.as_deref().unwrap_or("-"),
            request.ident,
            request.method,
            request.url
        );

        let decision = decide(&request.id, || ruleset.apply(&request.url, None));
        if tx.send(decision.to_line()).await.is_err() {
            log::warn!("output closed before decision for request {} was written", request.id);
        }
    });
}

/// Run `evaluate` and map its outcome, including a panic, to a decision.
pub(crate) fn decide<F>(id: &str, evaluate: F) -> Decision
where
    F: FnOnce() -> Result<RewriteResult, RewriteError>,
{
    match panic::catch_unwind(AssertUnwindSafe(evaluate)) {
        Ok(Ok(result)) if result.is_applied() => {
            log::debug!(
                "request {}: {} rule {} -> {}",
                id,
                result.bundle.as_deref().unwrap_or("?"),
                result.rule_index.unwrap_or_default(),
                result.url
            );
            Decision::Redirect {
                id: id.to_string(),
                url: result.url,
            }
        }
        Ok(Ok(_)) => Decision::Pass { id: id.to_string() },
        Ok(Err(e)) => Decision::Failure {
            id: id.to_string(),
            message: e.to_string(),
        },
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("request {} panicked: {}", id, message);
            Decision::Failure {
                id: id.to_string(),
                message,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during rule evaluation".to_string()
    }
}
