use std::mem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Splits a server-sent event body into `data:` payloads. Network chunks do
/// not align with lines or UTF-8 boundaries, so raw bytes are held until
/// their newline arrives and only whole lines are decoded.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    partial: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.partial.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            if let Some(ev) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(ev);
            }
        }
        events
    }

    /// Whatever is left once the body ends without a trailing newline.
    pub fn flush(&mut self) -> Option<SseEvent> {
        parse_line(&String::from_utf8_lossy(&mem::take(&mut self.partial)))
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.trim().strip_prefix("data:")?.trim();
    match data {
        "" => None,
        "[DONE]" => Some(SseEvent::Done),
        json => Some(SseEvent::Data(json.to_string())),
    }
}

#[cfg(test)]
mod sse_tests {
    use super::*;

    #[test]
    fn joins_lines_split_across_chunks() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.feed(b"data: {\"a\":").is_empty());
        assert_eq!(
            buf.feed(b"1}\n\ndata: {\"b\":2}\r\n"),
            vec![
                SseEvent::Data("{\"a\":1}".into()),
                SseEvent::Data("{\"b\":2}".into())
            ]
        );
    }

    #[test]
    fn skips_non_data_fields_and_detects_done() {
        let mut buf = SseLineBuffer::new();
        let events = buf.feed(b": keepalive\nevent: message\ndata: [DONE]\n");
        assert_eq!(events, vec![SseEvent::Done]);
    }

    #[test]
    fn multibyte_char_split_across_chunks_is_kept() {
        let line = "data: carbs \u{f7} ICR\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut buf = SseLineBuffer::new();
        assert!(buf.feed(&line[..split]).is_empty());
        assert_eq!(
            buf.feed(&line[split..]),
            vec![SseEvent::Data("carbs \u{f7} ICR".into())]
        );
    }

    #[test]
    fn flush_emits_trailing_line() {
        let mut buf = SseLineBuffer::new();
        assert!(buf.feed(b"data: {\"x\":0}").is_empty());
        assert_eq!(buf.flush(), Some(SseEvent::Data("{\"x\":0}".into())));
        assert_eq!(buf.flush(), None);
    }
}
