/// Non-blocking tap on the consensus engine's stdout.
///
/// A background task reads lines as they arrive and queues them; the
/// supervisor loop drains the queue once per tick without ever blocking
/// on the pipe itself.
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Lines buffered between supervisor ticks. A chatty engine can burst
/// past one tick's worth of output; the pump blocks on a full queue
/// rather than dropping lines.
const QUEUE_DEPTH: usize = 256;

#[derive(Debug)]
pub struct StdoutTap {
    rx: mpsc::Receiver<String>,
    pump: JoinHandle<()>,
}

impl StdoutTap {
    /// Take ownership of the child's stdout and start pumping lines.
    pub fn new(stdout: ChildStdout) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let pump = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "consensus stdout read failed, stopping mirror");
                        break;
                    }
                }
            }
        });
        Self { rx, pump }
    }

    /// Return every line queued so far, in arrival order. Never waits:
    /// an idle pipe yields an empty vec.
    pub fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Stop the pump task. Queued lines are discarded.
    pub fn abort(&self) {
        self.pump.abort();
    }
}
