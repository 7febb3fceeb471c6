//! Turns frames into typed agent events.
//!
//! Unknown or malformed documents are dropped here and never reach the
//! conversation; a broken frame does not end the stream.

use std::future;

use futures::Stream;
use futures_util::StreamExt;
use serde_json::Value;

use crate::decoder::{self, Frame};
use crate::types::events::server::EVENT_TYPES;
use crate::types::events::DONE_SENTINEL;
use crate::types::AgentEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Event(AgentEvent),
    /// The `[DONE]` sentinel; nothing after it is read.
    Done,
    /// Dropped frame: no data line, invalid JSON, or an unrecognized `type`.
    Skip,
}

pub fn classify(frame: &Frame) -> Classified {
    let Some(data) = frame.data() else {
        tracing::trace!("skipping frame without data: {:?}", frame.as_str());
        return Classified::Skip;
    };
    if data == DONE_SENTINEL {
        return Classified::Done;
    }

    let json = match serde_json::from_str::<Value>(&data) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("dropping malformed frame: {}, data=> {:?}", e, data);
            return Classified::Skip;
        }
    };

    let event_type = json.get("type").and_then(Value::as_str);
    match event_type {
        Some(event_type) if EVENT_TYPES.contains(&event_type) => {}
        other => {
            tracing::debug!("ignoring event with unrecognized type {:?}", other);
            return Classified::Skip;
        }
    }

    match serde_json::from_value::<AgentEvent>(json) {
        Ok(event) => Classified::Event(event),
        Err(e) => {
            tracing::warn!("dropping event that does not match its schema: {}", e);
            Classified::Skip
        }
    }
}

/// Classifies a frame stream, stopping at the sentinel and discarding skipped frames.
pub fn events<S, E>(frames: S) -> impl Stream<Item = Result<AgentEvent, E>>
where
    S: Stream<Item = Result<Frame, E>>,
{
    frames
        .map(|frame| frame.map(|frame| classify(&frame)))
        .take_while(|classified| future::ready(!matches!(classified, Ok(Classified::Done))))
        .filter_map(|classified| {
            future::ready(match classified {
                Ok(Classified::Event(event)) => Some(Ok(event)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        })
}

/// Bytes in, agent events out.
pub fn decode_events<S, B, E>(chunks: S) -> impl Stream<Item = Result<AgentEvent, E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    events(decoder::frames(chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn decode(chunks: Vec<&str>) -> Vec<AgentEvent> {
        let chunks: Vec<Result<String, Infallible>> =
            chunks.into_iter().map(|c| Ok(c.to_string())).collect();
        let events: Vec<Result<AgentEvent, Infallible>> = futures::executor::block_on(
            decode_events(futures::stream::iter(chunks)).collect(),
        );
        events.into_iter().map(|e| e.unwrap()).collect()
    }

    #[test]
    fn split_event_is_emitted_once_complete() {
        let mut decoder = crate::decoder::FrameDecoder::new();
        let first: Vec<_> = decoder
            .push(br#"data: {"type":"thinking","message":"Look"#)
            .map(|f| classify(&f))
            .collect();
        assert!(first.is_empty());

        let second: Vec<_> = decoder
            .push(b"ing\"}\n\n")
            .map(|f| classify(&f))
            .collect();
        assert_eq!(second, vec![Classified::Event(AgentEvent::thinking("Looking"))]);
    }

    #[test]
    fn malformed_frame_between_valid_ones_is_dropped() {
        let events = decode(vec![
            "data: {\"type\":\"thinking\",\"message\":\"one\"}\n\n",
            "data: {\"type\":\"thinking\",\"mess\n\n",
            "data: {\"type\":\"thinking\",\"message\":\"two\"}\n\n",
        ]);
        assert_eq!(
            events,
            vec![AgentEvent::thinking("one"), AgentEvent::thinking("two")]
        );
    }

    #[test]
    fn unknown_types_are_ignored() {
        let events = decode(vec![
            "data: {\"type\":\"heartbeat\"}\n\n",
            "data: {\"message\":\"no type\"}\n\n",
            "data: [1, 2]\n\n",
            "data: {\"type\":\"error\",\"message\":\"boom\"}\n\n",
        ]);
        assert_eq!(events, vec![AgentEvent::error("boom")]);
    }

    #[test]
    fn sentinel_produces_no_event_and_ends_decoding() {
        assert_eq!(classify(&Frame::new("data: [DONE]")), Classified::Done);
        let events = decode(vec![
            "data: {\"type\":\"thinking\",\"message\":\"one\"}\n\n",
            "data: [DONE]\n\n",
            "data: {\"type\":\"thinking\",\"message\":\"after\"}\n\n",
        ]);
        assert_eq!(events, vec![AgentEvent::thinking("one")]);
    }

    #[test]
    fn event_sequence_is_independent_of_chunking() {
        let stream = concat!(
            ": keep-alive\n\n",
            "data: {\"type\":\"thinking\",\"message\":\"Searching \u{1F50E}\"}\n\n",
            "data: not json\n\n",
            "data: {\"type\":\"result\",\"payload\":{\"stylist_response\":\"Try linen\",",
            "\"products\":[{\"title\":\"Linen Shirt\",\"color\":\"white\"}]}}\n\n",
            "data: [DONE]\n\n",
        );
        let bytes = stream.as_bytes();

        let decode_bytes = |parts: Vec<&[u8]>| -> Vec<AgentEvent> {
            let chunks: Vec<Result<Vec<u8>, Infallible>> =
                parts.into_iter().map(|p| Ok(p.to_vec())).collect();
            futures::executor::block_on(
                decode_events(futures::stream::iter(chunks)).collect::<Vec<_>>(),
            )
            .into_iter()
            .map(|e| e.unwrap())
            .collect()
        };

        let whole = decode_bytes(vec![bytes]);
        assert_eq!(whole.len(), 2);
        assert_eq!(decode_bytes(bytes.chunks(1).collect()), whole);
        for cut in 1..bytes.len() {
            assert_eq!(decode_bytes(vec![&bytes[..cut], &bytes[cut..]]), whole, "cut at {cut}");
        }
    }
}
