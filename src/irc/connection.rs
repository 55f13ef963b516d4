//! Socket tasks for one session.
//!
//! The reader task owns the read half and the [`Framer`]; it runs the whole
//! parse and dispatch chain for each line before reading again. The writer
//! task owns the write half and drains an unbounded queue, so `send` never
//! waits on the socket. Both tasks hold only a weak handle to the client and
//! tag their callbacks with the session generation, so a task that outlives
//! its session cannot touch the next one.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ClientError;
use crate::irc::framer::Framer;
use crate::irc::manager::WeakClient;

const READ_CHUNK: usize = 4096;

/// Handles to the tasks of a live session.
pub(crate) struct Link {
    pub writer: mpsc::UnboundedSender<String>,
    pub reader: JoinHandle<()>,
}

pub(crate) fn spawn_link<S>(client: WeakClient, generation: u64, stream: S) -> Link
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let (writer, queue) = mpsc::unbounded_channel();

    tokio::spawn(write_loop(client.clone(), generation, write_half, queue));
    let reader = tokio::spawn(read_loop(client, generation, read_half));

    Link { writer, reader }
}

async fn read_loop<R>(client: WeakClient, generation: u64, mut reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut framer = Framer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    let error = loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break None,
            Ok(n) => {
                for line in framer.push(&chunk[..n]) {
                    let Some(client) = client.upgrade() else {
                        return;
                    };
                    if !client.handle_line(generation, &line) {
                        return;
                    }
                }
            }
            Err(e) => break Some(ClientError::Io(e)),
        }
    };

    debug!(pending = framer.pending(), "Connection ended");
    if let Some(client) = client.upgrade() {
        client.session_closed(generation, error.as_ref());
    }
}

async fn write_loop<W>(
    client: WeakClient,
    generation: u64,
    mut writer: W,
    mut queue: mpsc::UnboundedReceiver<String>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = queue.recv().await {
        let mut bytes = line.into_bytes();
        bytes.extend_from_slice(b"\r\n");
        let written = match writer.write_all(&bytes).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Some(client) = client.upgrade() {
                client.session_closed(generation, Some(&ClientError::Io(e)));
            }
            return;
        }
    }
    // Queue closed: the session ended and everything queued is flushed.
    let _ = writer.shutdown().await;
}
