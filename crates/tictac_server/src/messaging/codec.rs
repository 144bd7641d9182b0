//! Line framing over any async byte stream.
//!
//! Reads are bounded: a line longer than the configured limit is rejected
//! before it is buffered in full.

use super::types::{ServerMessage, ERROR_PREFIX, EXIT_TOKEN};
use crate::error::ConnectionError;
use crate::game::board::Board;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads one newline-terminated line of at most `max_len` bytes, not counting
/// the terminator.
///
/// The returned line has its `\n` (and any `\r` before it) removed. A final
/// line without a terminator is returned as-is.
///
/// # Returns
///
/// `Ok(None)` at end of stream, or [`ConnectionError::MalformedMessage`] for
/// an over-long or non UTF-8 line.
pub async fn read_line<R>(reader: &mut R, max_len: usize) -> Result<Option<String>, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    // Room for the text plus a `\r\n` terminator.
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(2);
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    if buf.len() > max_len {
        return Err(ConnectionError::MalformedMessage(format!(
            "line exceeds {max_len} bytes"
        )));
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| ConnectionError::MalformedMessage("line is not valid UTF-8".to_string()))
}

/// Writes one server message in its wire form.
pub async fn write_message<W>(
    writer: &mut W,
    message: &ServerMessage,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(message.encode().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one server message, as a client sees the stream.
///
/// A line containing a comma starts a board; the two lines after it are read
/// as its remaining rows.
pub async fn read_server_message<R>(
    reader: &mut R,
    max_len: usize,
) -> Result<Option<ServerMessage>, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    let Some(line) = read_line(reader, max_len).await? else {
        return Ok(None);
    };

    if line.contains(',') {
        let mut text = line;
        for _ in 1..crate::game::BOARD_SIZE {
            let row = read_line(reader, max_len).await?.ok_or_else(|| {
                ConnectionError::MalformedMessage("stream ended inside a board".to_string())
            })?;
            text.push('\n');
            text.push_str(&row);
        }
        let board: Board = text
            .parse()
            .map_err(|e| ConnectionError::MalformedMessage(format!("bad board: {e}")))?;
        return Ok(Some(ServerMessage::Board(board)));
    }

    let trimmed = line.trim();
    let message = if trimmed == EXIT_TOKEN {
        ServerMessage::Exit
    } else if let Some(reason) = trimmed.strip_prefix(ERROR_PREFIX) {
        ServerMessage::Rejected(reason.trim().parse()?)
    } else if let Ok(room_id) = trimmed.parse() {
        ServerMessage::RoomAssigned(room_id)
    } else if let Ok(symbol) = trimmed.parse() {
        ServerMessage::Seated(symbol)
    } else {
        return Err(ConnectionError::MalformedMessage(format!(
            "unrecognised server line '{trimmed}'"
        )));
    };
    Ok(Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RejectReason;
    use crate::game::board::Symbol;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn reads_lines_until_eof() {
        let mut reader = BufReader::new(&b"X,1,1\r\nexit\ntail"[..]);
        assert_eq!(read_line(&mut reader, 64).await.ok().flatten().as_deref(), Some("X,1,1"));
        assert_eq!(read_line(&mut reader, 64).await.ok().flatten().as_deref(), Some("exit"));
        assert_eq!(read_line(&mut reader, 64).await.ok().flatten().as_deref(), Some("tail"));
        assert!(matches!(read_line(&mut reader, 64).await, Ok(None)));
    }

    #[tokio::test]
    async fn over_long_lines_are_malformed() {
        let mut reader = BufReader::new(&b"0123456789\n"[..]);
        assert!(matches!(
            read_line(&mut reader, 4).await,
            Err(ConnectionError::MalformedMessage(_))
        ));

        // Exactly at the limit is fine.
        let mut reader = BufReader::new(&b"0123\n"[..]);
        assert_eq!(read_line(&mut reader, 4).await.ok().flatten().as_deref(), Some("0123"));

        // One byte over is not, with or without a terminator.
        let mut reader = BufReader::new(&b"01234\n"[..]);
        assert!(read_line(&mut reader, 4).await.is_err());
        let mut reader = BufReader::new(&b"01234"[..]);
        assert!(read_line(&mut reader, 4).await.is_err());
    }

    #[tokio::test]
    async fn crlf_terminator_does_not_count_towards_the_limit() {
        let mut reader = BufReader::new(&b"X,1,1\r\nX,1,1\n"[..]);
        assert_eq!(read_line(&mut reader, 5).await.ok().flatten().as_deref(), Some("X,1,1"));
        assert_eq!(read_line(&mut reader, 5).await.ok().flatten().as_deref(), Some("X,1,1"));

        let mut reader = BufReader::new(&b"X,1,10\r\n"[..]);
        assert!(matches!(
            read_line(&mut reader, 5).await,
            Err(ConnectionError::MalformedMessage(_))
        ));
    }

    #[tokio::test]
    async fn decodes_every_server_message() {
        let mut stream = Vec::new();
        let board: Board = "X, , \n ,O, \n , , \n".parse().expect("board");
        let messages = [
            ServerMessage::RoomAssigned(7),
            ServerMessage::Seated(Symbol::X),
            ServerMessage::Board(board),
            ServerMessage::Rejected(RejectReason::CellOccupied),
            ServerMessage::Exit,
        ];
        for message in &messages {
            write_message(&mut stream, message).await.expect("write");
        }

        let mut reader = BufReader::new(stream.as_slice());
        for expected in messages {
            let decoded = read_server_message(&mut reader, 64).await.expect("read");
            assert_eq!(decoded, Some(expected));
        }
        assert!(matches!(read_server_message(&mut reader, 64).await, Ok(None)));
    }

    #[tokio::test]
    async fn empty_board_rows_survive_framing() {
        let mut reader = BufReader::new(&b" , , \n , , \n , , \n"[..]);
        let decoded = read_server_message(&mut reader, 64).await.expect("read");
        assert_eq!(decoded, Some(ServerMessage::Board(Board::new())));
    }
}
