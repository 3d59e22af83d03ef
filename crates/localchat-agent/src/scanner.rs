//! Incremental tool-call marker detection in a live token stream.
//!
//! Prose is surfaced as soon as it cannot be the start of a tool-call block.
//! Once the opening marker appears, everything after it is held back for the
//! rest of the response. The complete response text is always retained.

/// Opening marker of a fenced tool-call block.
pub const TOOL_CALL_OPEN: &str = "```tool_call";

/// Per-response scanner. Create a fresh one for every generation.
#[derive(Debug, Default)]
pub struct StreamScanner {
    /// Text not yet surfaced and not yet known to be prose.
    pending: String,
    /// Set once the opening marker has been seen.
    in_tool_call: bool,
    /// Every fragment, unmodified.
    full_text: String,
}

impl StreamScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment; returns the text that is safe to display now.
    pub fn push(&mut self, fragment: &str) -> String {
        self.full_text.push_str(fragment);
        if self.in_tool_call {
            return String::new();
        }

        self.pending.push_str(fragment);

        if let Some(pos) = self.pending.find(TOOL_CALL_OPEN) {
            self.in_tool_call = true;
            let visible = self.pending[..pos].to_string();
            self.pending.drain(..pos);
            return visible;
        }

        let held = partial_marker_len(&self.pending);
        let split = self.pending.len() - held;
        let visible = self.pending[..split].to_string();
        self.pending.drain(..split);
        visible
    }

    /// End of stream: surface a held-back suffix that never became a marker.
    pub fn finish(&mut self) -> String {
        if self.in_tool_call {
            return String::new();
        }
        std::mem::take(&mut self.pending)
    }

    /// Whether a tool-call marker has been seen.
    pub fn in_tool_call(&self) -> bool {
        self.in_tool_call
    }

    /// The complete response so far.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn into_text(self) -> String {
        self.full_text
    }
}

/// Length of the longest suffix of `text` that is a strict prefix of the marker.
fn partial_marker_len(text: &str) -> usize {
    let max = (TOOL_CALL_OPEN.len() - 1).min(text.len());
    (1..=max)
        .rev()
        .find(|&n| {
            text.is_char_boundary(text.len() - n) && TOOL_CALL_OPEN.starts_with(&text[text.len() - n..])
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed all fragments and return (surfaced text, scanner).
    fn run(fragments: &[&str]) -> (String, StreamScanner) {
        let mut scanner = StreamScanner::new();
        let mut shown = String::new();
        for fragment in fragments {
            shown.push_str(&scanner.push(fragment));
        }
        shown.push_str(&scanner.finish());
        (shown, scanner)
    }

    #[test]
    fn test_plain_prose_passes_through() {
        let (shown, scanner) = run(&["Hello", ", world", "!"]);
        assert_eq!(shown, "Hello, world!");
        assert!(!scanner.in_tool_call());
    }

    #[test]
    fn test_prose_is_surfaced_immediately() {
        let mut scanner = StreamScanner::new();
        assert_eq!(scanner.push("The answer is 4."), "The answer is 4.");
    }

    #[test]
    fn test_marker_in_single_fragment() {
        let text = "Let me check.\n```tool_call\n{\"name\": \"read_file\", \"arguments\": {\"path\": \"a\"}}\n```";
        let (shown, scanner) = run(&[text]);
        assert_eq!(shown, "Let me check.\n");
        assert_eq!(scanner.full_text(), text);
    }

    #[test]
    fn test_marker_split_across_three_fragments() {
        let fragments = [
            "Checking.\n``",
            "`tool_",
            "call\n{\"name\": \"read_file\", \"arguments\": {\"path\": \"test.txt\"}}\n```",
        ];
        let mut scanner = StreamScanner::new();
        let mut shown = Vec::new();
        for fragment in fragments {
            shown.push(scanner.push(fragment));
        }
        shown.push(scanner.finish());

        assert_eq!(shown[0], "Checking.\n");
        assert_eq!(shown[1], "");
        assert_eq!(shown[2], "");
        assert_eq!(shown.concat(), "Checking.\n");
        assert!(!shown.concat().contains('`'));
        assert_eq!(scanner.into_text(), fragments.concat());
    }

    #[test]
    fn test_everything_after_marker_suppressed() {
        let (shown, _) = run(&["a```tool_call\n{}\n```", " trailing prose"]);
        assert_eq!(shown, "a");
    }

    #[test]
    fn test_false_alarm_is_released() {
        let mut scanner = StreamScanner::new();
        assert_eq!(scanner.push("use ``"), "use ");
        assert_eq!(scanner.push("`rust"), "```rust");
        assert!(!scanner.in_tool_call());
    }

    #[test]
    fn test_held_suffix_flushed_at_end() {
        let (shown, _) = run(&["code: ```tool"]);
        assert_eq!(shown, "code: ```tool");
    }

    #[test]
    fn test_finish_after_marker_is_empty() {
        let mut scanner = StreamScanner::new();
        scanner.push("```tool_call");
        assert_eq!(scanner.finish(), "");
    }

    #[test]
    fn test_multibyte_text_near_boundary() {
        let (shown, _) = run(&["naïve `", "`é"]);
        assert_eq!(shown, "naïve ``é");
    }

    #[test]
    fn test_partial_marker_len() {
        assert_eq!(partial_marker_len("abc"), 0);
        assert_eq!(partial_marker_len("abc`"), 1);
        assert_eq!(partial_marker_len("abc```tool_cal"), 11);
        assert_eq!(partial_marker_len(""), 0);
        assert_eq!(partial_marker_len("é"), 0);
    }
}
