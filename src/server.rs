use crate::command::dispatch;
use crate::engine::{Engine, Session};
use crate::protocol::{self, Reply, Request};
use anyhow::Result;
use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpListener,
};
use tracing::{error, info};

/// Starts the TCP server and handles client connections.
///
/// The protocol is one exchange per line:
///
/// ## Protocol Features
/// - **One request per line**: a JSON object `{"command": ..., "args": [...]}`
/// - **One reply per line**: a JSON object `{"status": ..., "msg": ...}`
/// - **Concurrent clients**: each connection runs in a separate async task
/// - **Per-connection session**: every connection owns its own
///   (current database, current table) cursor, so selections never leak
///   between clients
/// - **Error handling**: malformed JSON and unknown commands produce error
///   replies, never disconnects
///
/// ## Connection Lifecycle
/// 1. Accept TCP connection and spawn an async task per client
/// 2. Read one request line, decode it into a typed command
/// 3. Dispatch against the shared engine under its single coarse lock
/// 4. Write the reply line
/// 5. Repeat until the client disconnects
///
/// ## Protocol Example
/// ```text
/// Client: {"command":"wd","args":["TestDB"]}
/// Server: {"status":"ok","msg":"Database 'TestDB' created."}
///
/// Client: {"command":"select","args":[["*"],{"groups":[]}]}
/// Server: {"status":"ok","msg":[{"id":1,"name":"Alice"}]}
/// ```
///
/// ## Arguments
/// * `engine` - Shared storage engine instance (Arc for multi-client use)
/// * `addr` - TCP bind address (e.g., "127.0.0.1:65432")
///
/// ## Returns
/// * `Ok(())` - Server shut down cleanly (never in normal operation)
/// * `Err(_)` - Network binding error or other server failure
pub async fn serve(engine: Arc<Engine>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    loop {
        // Accept new client connection
        let (socket, peer) = listener.accept().await?;
        let engine = engine.clone();

        // Spawn separate task for each client (concurrent handling)
        tokio::spawn(async move {
            info!(?peer, "client connected");
            let (r, w) = socket.into_split();
            handle_client(&engine, r, w).await;
            info!(?peer, "client disconnected");
        });
    }
}

/// Serves one connection: reads request lines until EOF and writes one
/// newline-terminated reply per request.
///
/// Each connection gets its own [Session] cursor. The reply and its
/// terminating newline go out as a single write, so a short write cannot
/// leave the client's line framing without its newline; any write failure
/// drops the connection.
async fn handle_client<R, W>(engine: &Engine, reader: R, mut writer: W)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut session = Session::default();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Decode and execute; every failure mode is an error reply
        let reply = match serde_json::from_str::<Request>(line) {
            Ok(request) => match protocol::decode(request) {
                Ok(command) => dispatch(engine, &mut session, command),
                Err(e) => Reply::error(e.to_string()),
            },
            Err(e) => Reply::error(format!("Malformed request: {e}")),
        };

        let mut text = match serde_json::to_string(&reply) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "reply encode error");
                break;
            }
        };
        text.push('\n');
        if let Err(e) = writer.write_all(text.as_bytes()).await {
            error!(error = %e, "write error");
            break;
        }
    }
}
