//! Incremental SSE reassembly
//!
//! Network chunks do not respect event boundaries: a chunk may carry several
//! events, half an event, or even half a UTF-8 sequence. [`SseBuffer`]
//! accumulates raw bytes, drains only the complete `\n\n`-delimited blocks,
//! and keeps the trailing incomplete fragment for the next chunk.

/// Reassembles `data:`-framed SSE payloads from arbitrary chunk boundaries.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buf: Vec<u8>,
    done: bool,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been observed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Append one network chunk and drain every complete event payload.
    ///
    /// Payloads are returned in wire order. Empty payloads and the `[DONE]`
    /// sentinel are consumed here; the sentinel latches [`is_done`] and
    /// everything after it is discarded.
    ///
    /// [`is_done`]: SseBuffer::is_done
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }

        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = find_delimiter(&self.buf) {
            let block: Vec<u8> = self.buf.drain(..pos + 2).collect();
            self.collect_block(&block, &mut payloads);
            if self.done {
                self.buf.clear();
                break;
            }
        }
        payloads
    }

    /// Drain any final unterminated block once the transport reports EOF.
    ///
    /// Handles the case where the last event lacks a trailing `\n\n`, e.g.
    /// when the connection is closed right after it.
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if self.done {
            self.buf.clear();
            return payloads;
        }

        let block = std::mem::take(&mut self.buf);
        self.collect_block(&block, &mut payloads);
        payloads
    }

    fn collect_block(&mut self, block: &[u8], payloads: &mut Vec<String>) {
        let text = String::from_utf8_lossy(block);
        for line in text.lines() {
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let payload = data.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == "[DONE]" {
                self.done = true;
                return;
            }
            payloads.push(payload.to_string());
        }
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_events_drain_one_by_one() {
        let mut buffer = SseBuffer::new();
        assert_eq!(buffer.push(b"data: {\"a\":1}\n\n"), vec!["{\"a\":1}"]);
        assert_eq!(buffer.push(b"data: {\"b\":2}\n\n"), vec!["{\"b\":2}"]);
        assert!(!buffer.is_done());
    }

    #[test]
    fn two_events_in_one_chunk_drain_in_order() {
        let mut buffer = SseBuffer::new();
        let payloads = buffer.push(b"data: first\n\ndata: second\n\n");
        assert_eq!(payloads, vec!["first", "second"]);
    }

    #[test]
    fn event_split_across_chunks_is_reassembled() {
        let mut buffer = SseBuffer::new();
        assert!(buffer.push(b"data: {\"choi").is_empty());
        let payloads = buffer.push(b"ces\":[]}\n\n");
        assert_eq!(payloads, vec!["{\"choices\":[]}"]);
    }

    #[test]
    fn trailing_fragment_survives_many_pushes() {
        let mut buffer = SseBuffer::new();
        let event = b"data: payload\n\n";
        for &byte in &event[..event.len() - 1] {
            assert!(buffer.push(&[byte]).is_empty());
        }
        assert_eq!(buffer.push(b"\n"), vec!["payload"]);
    }

    #[test]
    fn multibyte_utf8_split_across_chunks_decodes_intact() {
        let mut buffer = SseBuffer::new();
        let event = "data: 树洞\n\n".as_bytes();
        // Split inside the second multi-byte character.
        let (head, tail) = event.split_at(10);
        assert!(buffer.push(head).is_empty());
        assert_eq!(buffer.push(tail), vec!["树洞"]);
    }

    #[test]
    fn done_sentinel_latches_and_discards_the_rest() {
        let mut buffer = SseBuffer::new();
        let payloads = buffer.push(b"data: last\n\ndata: [DONE]\n\ndata: late\n\n");
        assert_eq!(payloads, vec!["last"]);
        assert!(buffer.is_done());
        assert!(buffer.push(b"data: more\n\n").is_empty());
        assert!(buffer.finish().is_empty());
    }

    #[test]
    fn empty_payload_and_blank_blocks_are_skipped() {
        let mut buffer = SseBuffer::new();
        assert!(buffer.push(b"data:\n\n\n\n: comment\n\n").is_empty());
    }

    #[test]
    fn finish_drains_unterminated_block() {
        let mut buffer = SseBuffer::new();
        assert!(buffer.push(b"data: cut off").is_empty());
        assert_eq!(buffer.finish(), vec!["cut off"]);
    }

    #[test]
    fn every_split_point_yields_the_same_payloads() {
        let wire = "data: {\"a\":1}\n\ndata: 你好\n\ndata: {\"b\":2}\n\n".as_bytes();
        let expected = vec!["{\"a\":1}", "你好", "{\"b\":2}"];

        for split in 0..=wire.len() {
            let mut buffer = SseBuffer::new();
            let mut payloads = buffer.push(&wire[..split]);
            payloads.extend(buffer.push(&wire[split..]));
            payloads.extend(buffer.finish());
            assert_eq!(payloads, expected, "split at byte {split}");
        }
    }

    #[test]
    fn crlf_lines_inside_a_block_are_tolerated() {
        let mut buffer = SseBuffer::new();
        assert_eq!(buffer.push(b"data: one\r\ndata: two\n\n"), vec!["one", "two"]);
    }
}
