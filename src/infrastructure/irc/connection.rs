//! TCP connection to an IRC server

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodec};

use super::line::IrcLine;
use crate::application::errors::BotError;
use crate::domain::traits::Transport;

const MAX_LINE_LENGTH: usize = 8192;
const EVENT_BUFFER: usize = 256;

/// A line queued for the writer task
struct Outbound {
    line: String,
    /// Signalled once the line has been written to the socket
    written: Option<oneshot::Sender<()>>,
}

/// Write half of a connection. Cheap to clone; every clone feeds the same
/// writer task.
#[derive(Clone)]
pub struct IrcClient {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl IrcClient {
    fn new(outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { outbound }
    }

    fn push(&self, line: String, written: Option<oneshot::Sender<()>>) -> Result<(), BotError> {
        self.outbound
            .send(Outbound { line, written })
            .map_err(|_| BotError::Network("Connection closed".to_string()))
    }
}

#[async_trait]
impl Transport for IrcClient {
    /// Resolves once the message is on the socket, so reply pacing counts
    /// from the actual write
    async fn privmsg(&self, target: &str, text: &str) -> Result<(), BotError> {
        let text = text.replace(['\r', '\n'], " ");
        let (written_tx, written_rx) = oneshot::channel();
        self.push(format!("PRIVMSG {} :{}", target, text), Some(written_tx))?;
        written_rx
            .await
            .map_err(|_| BotError::Network("Write failed".to_string()))
    }

    /// Queues the line without waiting for the write
    async fn send_raw(&self, line: &str) -> Result<(), BotError> {
        self.push(line.trim_end_matches(['\r', '\n']).to_string(), None)
    }
}

/// Server events delivered to the bot, one parsed line at a time
pub type IrcEvents = mpsc::Receiver<IrcLine>;

pub struct IrcConnection;

impl IrcConnection {
    /// Connect, register `nick` and start the reader and writer tasks.
    ///
    /// `PING` is answered by the reader task; every other line is forwarded.
    /// The event channel closes when the server hangs up.
    pub async fn connect(address: &str, nick: &str) -> Result<(IrcClient, IrcEvents), BotError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| BotError::Network(format!("Failed to connect to {}: {}", address, e)))?;
        tracing::info!("Connected to {}", address);

        let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let (mut sink, mut lines) = framed.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(async move {
            while let Some(Outbound { line, written }) = out_rx.recv().await {
                tracing::trace!(">> {}", line);
                // LinesCodec only appends '\n'
                if let Err(e) = sink.send(format!("{}\r", line)).await {
                    tracing::error!("Write failed: {}", e);
                    break;
                }
                if let Some(written) = written {
                    let _ = written.send(());
                }
            }
        });

        let client = IrcClient::new(out_tx);
        let pong = client.clone();
        tokio::spawn(async move {
            while let Some(result) = lines.next().await {
                let raw = match result {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!("Read failed: {}", e);
                        break;
                    }
                };
                tracing::trace!("<< {}", raw);

                let line = match raw.parse::<IrcLine>() {
                    Ok(line) => line,
                    Err(_) => continue,
                };
                if line.is("PING") {
                    let token = line.trailing().unwrap_or_default();
                    if pong.send_raw(&format!("PONG :{}", token)).await.is_err() {
                        break;
                    }
                    continue;
                }
                if event_tx.send(line).await.is_err() {
                    break;
                }
            }
            tracing::info!("Server connection closed");
        });

        client.send_raw(&format!("NICK {}", nick)).await?;
        client.send_raw(&format!("USER {} 0 * :{}", nick, nick)).await?;

        Ok((client, event_rx))
    }
}
