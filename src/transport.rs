//! Wire framing: length-prefixed bincode frames over any async stream.
//!
//! Each message is one frame: a 4-byte big-endian length followed by that
//! many bytes of bincode. The helpers are generic over the stream halves so
//! the server's split sockets, the client, and the tests share one
//! implementation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::protocol::{ClientMessage, ServerMessage};

/// Upper bound on a frame body; anything larger drops the connection.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

fn map_closed(e: std::io::Error) -> anyhow::Error {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof => {
            anyhow::anyhow!("connection closed by peer")
        }
        _ => anyhow::anyhow!("stream error: {}", e),
    }
}

/// Write `msg` as one frame.
pub async fn write_frame<W, M>(writer: &mut W, msg: &M) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    let data = bincode::serialize(msg).map_err(|e| anyhow::anyhow!("encode error: {}", e))?;
    if data.len() as u64 > MAX_FRAME_SIZE as u64 {
        return Err(anyhow::anyhow!(
            "frame too large: {} bytes (max {})",
            data.len(),
            MAX_FRAME_SIZE
        ));
    }
    writer
        .write_all(&(data.len() as u32).to_be_bytes())
        .await
        .map_err(map_closed)?;
    writer.write_all(&data).await.map_err(map_closed)?;
    Ok(())
}

/// Read one frame and decode it. A zero-length or oversized prefix, or a
/// body that fails to decode, is an error; callers drop the connection, so
/// a malformed frame can never reach dispatch.
pub async fn read_frame<R, M>(reader: &mut R) -> anyhow::Result<M>
where
    R: AsyncRead + Unpin,
    M: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_closed)?;
    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(anyhow::anyhow!("invalid frame length: 0"));
    }
    if len > MAX_FRAME_SIZE {
        return Err(anyhow::anyhow!(
            "frame too large: {} bytes (max {})",
            len,
            MAX_FRAME_SIZE
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(map_closed)?;
    bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("decode error: {}", e))
}

/// A client-side connection to the authority, used by the `play` binary
/// and the integration tests.
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        write_frame(&mut self.stream, msg).await
    }

    pub async fn recv(&mut self) -> anyhow::Result<ServerMessage> {
        read_frame(&mut self.stream).await
    }

    /// Split into halves so a reader task can own the receive side.
    pub fn into_split(self) -> (OwnedReadHalf, OwnedWriteHalf) {
        self.stream.into_split()
    }
}
