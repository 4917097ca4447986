//! Length-prefixed message framing (§4.3 "Framing").
//!
//! `[len: u32 big-endian][payload: len bytes]`. Zero-length frames are
//! legal; a frame whose declared length exceeds `max_frame_size`
//! terminates the connection with `FrameTooLarge` rather than attempting
//! to read it.

use cbmpc_types::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub(crate) async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| Error::FrameTooLarge(format!("payload of {} bytes exceeds u32", payload.len())))?;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| Error::PeerDisconnected(format!("writing frame length: {e}")))?;
    writer
        .write_all(payload)
        .await
        .map_err(|e| Error::PeerDisconnected(format!("writing frame payload: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| Error::PeerDisconnected(format!("flushing frame: {e}")))?;
    Ok(())
}

pub(crate) async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_frame_size: usize,
) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| Error::PeerDisconnected(format!("reading frame length: {e}")))?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_frame_size {
        return Err(Error::FrameTooLarge(format!(
            "frame length {len} exceeds maximum {max_frame_size}"
        )));
    }
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| Error::PeerDisconnected(format!("reading frame payload: {e}")))?;
    Ok(payload)
}
