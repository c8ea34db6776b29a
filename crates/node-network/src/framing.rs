use crate::message::Message;
use crate::NetworkError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Messages larger than this are rejected outright rather than allocating
/// an attacker-controlled buffer (spec.md §4.4's framing MUST be
/// self-delimiting, which implies a sane upper bound).
pub const MAX_MESSAGE_BYTES: u32 = 16 * 1024 * 1024;

/// Writes one length-prefixed, bincode-encoded message: a 4-byte
/// big-endian length followed by the body (spec.md §4.4's framing
/// requirement — deterministic and self-delimiting).
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg: &Message,
) -> Result<(), NetworkError> {
    let body = bincode::serialize(msg).map_err(|e| NetworkError::Serialization(e.to_string()))?;
    let len = u32::try_from(body.len()).map_err(|_| {
        NetworkError::Serialization("message exceeds u32 length prefix".to_string())
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed message, rejecting lengths over
/// [`MAX_MESSAGE_BYTES`] before allocating the body buffer.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message, NetworkError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_BYTES {
        return Err(NetworkError::Deserialization(format!(
            "message length {len} exceeds max {MAX_MESSAGE_BYTES}"
        )));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    bincode::deserialize(&body).map_err(|e| NetworkError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_message_over_a_duplex_stream() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let msg = Message::Ping { timestamp: 42 };
        write_message(&mut a, &msg).await.unwrap();
        let received = read_message(&mut b).await.unwrap();
        match received {
            Message::Ping { timestamp } => assert_eq!(timestamp, 42),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected_before_allocating() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let bad_len = (MAX_MESSAGE_BYTES + 1).to_be_bytes();
        a.write_all(&bad_len).await.unwrap();
        let result = read_message(&mut b).await;
        assert!(result.is_err());
    }
}
