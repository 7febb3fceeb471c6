//! Splits a chunked byte stream into `data:` frames.
//!
//! The transport may cut the body anywhere: inside a JSON document, inside a
//! multi-byte character, or between the two newlines of a delimiter. The
//! decoder keeps one residual buffer and only ever hands out frames whose
//! delimiter has fully arrived, so the frames produced do not depend on how
//! the body was chunked.

use futures::Stream;
use futures_util::StreamExt;

const DELIMITERS: [&[u8]; 2] = [b"\r\n\r\n", b"\n\n"];
/// Longest delimiter minus one: how far back a delimiter split across chunks can start.
const OVERLAP: usize = 3;

/// One complete unit of the event stream, delimiter stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(String);

impl Frame {
    pub fn new(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text after the `data:` prefix, trimmed. Several data lines are
    /// joined with `\n`. `None` for frames that carry no data line at all
    /// (comments, keep-alives, bare `event:` lines).
    pub fn data(&self) -> Option<String> {
        let lines: Vec<&str> = self
            .0
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .collect();
        if lines.is_empty() {
            return None;
        }
        Some(lines.join("\n").trim().to_string())
    }
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no delimiter.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns the frames it completed. Extraction is lazy;
    /// frames not pulled from the iterator stay buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(chunk);
        Frames { decoder: self }
    }

    /// Bytes received after the last complete frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Ends decoding. An undelimited tail is incomplete by definition and is dropped.
    pub fn finish(self) {
        let residue = String::from_utf8_lossy(&self.buffer);
        if !residue.trim().is_empty() {
            tracing::debug!(
                "discarding {} bytes of unterminated frame at end of stream",
                self.buffer.len()
            );
        }
    }

    fn next_frame(&mut self) -> Option<Frame> {
        let start = self.scanned.saturating_sub(OVERLAP);
        let Some((at, len)) = find_delimiter(&self.buffer[start..]) else {
            self.scanned = self.buffer.len();
            return None;
        };
        let at = start + at;
        self.scanned = 0;
        let rest = self.buffer.split_off(at + len);
        let mut frame = std::mem::replace(&mut self.buffer, rest);
        frame.truncate(at);
        Some(Frame(String::from_utf8_lossy(&frame).into_owned()))
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<(usize, usize)> {
    DELIMITERS
        .iter()
        .filter_map(|delimiter| {
            buffer
                .windows(delimiter.len())
                .position(|window| window == *delimiter)
                .map(|at| (at, delimiter.len()))
        })
        .min_by_key(|(at, _)| *at)
}

pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.decoder.next_frame()
    }
}

/// Adapts a stream of byte chunks into a stream of frames.
///
/// A transport error is passed through as the last item; nothing is read after it.
pub fn frames<S, B, E>(chunks: S) -> impl Stream<Item = Result<Frame, E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    futures::stream::unfold(
        Some((chunks, FrameDecoder::new())),
        |state| async move {
            let (mut chunks, mut decoder) = state?;
            loop {
                if let Some(frame) = decoder.next_frame() {
                    return Some((Ok(frame), Some((chunks, decoder))));
                }
                match chunks.next().await {
                    Some(Ok(chunk)) => decoder.buffer.extend_from_slice(chunk.as_ref()),
                    Some(Err(e)) => return Some((Err(e), None)),
                    None => {
                        decoder.finish();
                        return None;
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = concat!(
        "data: {\"type\":\"thinking\",\"message\":\"Looking\"}\n\n",
        "data: {\"type\":\"thinking\",\"message\":\"Matching colours \u{2728}\"}\n\n",
        "data: {\"type\":\"result\",\"payload\":{\"stylist_response\":\"Done\"}}\n\n",
        "data: [DONE]\n\n",
    );

    fn decode_in_chunks(bytes: &[u8], size: usize) -> Vec<Frame> {
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        for chunk in bytes.chunks(size) {
            out.extend(decoder.push(chunk));
        }
        decoder.finish();
        out
    }

    #[test]
    fn chunk_size_does_not_change_frames() {
        let whole = decode_in_chunks(STREAM.as_bytes(), STREAM.len());
        assert_eq!(whole.len(), 4);
        for size in 1..STREAM.len() {
            assert_eq!(decode_in_chunks(STREAM.as_bytes(), size), whole, "chunk size {size}");
        }
    }

    #[test]
    fn split_at_every_boundary_matches_single_chunk() {
        let bytes = STREAM.as_bytes();
        let whole = decode_in_chunks(bytes, bytes.len());
        for cut in 1..bytes.len() {
            let mut decoder = FrameDecoder::new();
            let mut out: Vec<Frame> = decoder.push(&bytes[..cut]).collect();
            out.extend(decoder.push(&bytes[cut..]));
            assert_eq!(out, whole, "cut at {cut}");
        }
    }

    #[test]
    fn holds_partial_frame_until_delimiter_arrives() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(
            decoder
                .push(br#"data: {"type":"thinking","message":"Look"#)
                .count(),
            0
        );
        assert_eq!(decoder.push(b"ing\"}\n").count(), 0);
        let frames: Vec<Frame> = decoder.push(b"\n").collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].data().as_deref(),
            Some(r#"{"type":"thinking","message":"Looking"}"#)
        );
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn large_frame_in_small_chunks_is_scanned_once() {
        let body = format!("data: {{\"type\":\"thinking\",\"message\":\"{}\"}}", "x".repeat(4096));
        let bytes = format!("{body}\r\n\r\n");
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        for chunk in bytes.as_bytes().chunks(7) {
            out.extend(decoder.push(chunk));
            if out.is_empty() {
                assert_eq!(decoder.scanned, decoder.buffered());
            }
        }
        assert_eq!(out, vec![Frame::new(&body)]);
        assert_eq!((decoder.buffered(), decoder.scanned), (0, 0));
    }

    #[test]
    fn accepts_crlf_delimiters() {
        let mut decoder = FrameDecoder::new();
        let frames: Vec<Frame> = decoder
            .push(b"data: one\r\n\r\ndata: two\r\n\r")
            .collect();
        assert_eq!(frames, vec![Frame::new("data: one")]);
        let frames: Vec<Frame> = decoder.push(b"\n").collect();
        assert_eq!(frames[0].data().as_deref(), Some("two"));
    }

    #[test]
    fn unterminated_tail_is_not_emitted() {
        let frames = decode_in_chunks(b"data: one\n\ndata: {\"type\":\"res", 4);
        assert_eq!(frames, vec![Frame::new("data: one")]);
    }

    #[test]
    fn unconsumed_frames_stay_buffered() {
        let mut decoder = FrameDecoder::new();
        let first = decoder.push(b"data: a\n\ndata: b\n\n").next();
        assert_eq!(first, Some(Frame::new("data: a")));
        let rest: Vec<Frame> = decoder.push(b"data: c\n\n").collect();
        assert_eq!(rest, vec![Frame::new("data: b"), Frame::new("data: c")]);
    }

    #[test]
    fn data_joins_lines_and_ignores_other_fields() {
        let frame = Frame::new("event: message\ndata: {\"a\":\ndata: 1}\nid: 7");
        assert_eq!(frame.data().as_deref(), Some("{\"a\":\n 1}"));
        assert_eq!(Frame::new(": keep-alive").data(), None);
    }

    #[tokio::test]
    async fn stream_adapter_propagates_transport_errors_last() {
        let chunks: Vec<Result<&[u8], &str>> = vec![
            Ok(&b"data: a\n"[..]),
            Ok(&b"\ndata: b"[..]),
            Err("connection reset"),
            Ok(&b"\n\n"[..]),
        ];
        let out: Vec<Result<Frame, &str>> = frames(futures::stream::iter(chunks)).collect().await;
        assert_eq!(out, vec![Ok(Frame::new("data: a")), Err("connection reset")]);
    }
}
