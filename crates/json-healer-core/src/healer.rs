use std::sync::Arc;

use crate::frame::Frame;
use crate::resolver;
use crate::schema::SchemaNode;

/// Safety bound on how many characters of preamble are buffered while
/// searching for the first structural opener (`{` or `[`).
pub const MAX_PREAMBLE: usize = 500;

/// Incremental JSON-healing state machine.
///
/// Feed chunks through [`Healer::process`] as they arrive; call
/// [`Healer::finish`] exactly once when the stream ends. The concatenation of
/// every `process` return value followed by the `finish` return value is the
/// healed output.
///
/// A `Healer` is not `Sync` — it is owned by whichever task is reading one
/// stream and is never meant to be shared across concurrent streams — but it
/// is `Send` so ownership can move between async tasks.
#[derive(Debug)]
pub struct Healer {
    schema: Option<Arc<SchemaNode>>,
    preamble_buffer: String,
    started: bool,
    no_json_mode: bool,
    in_string: bool,
    escape_next: bool,
    pending_key_chars: String,
    stack: Vec<Frame>,
    finished: bool,
}

impl Healer {
    /// Construct a healer. `schema` governs which required properties get
    /// injected at `finish`; pass `None` for structural repair only.
    pub fn new(schema: Option<Arc<SchemaNode>>) -> Self {
        Self {
            schema,
            preamble_buffer: String::new(),
            started: false,
            no_json_mode: false,
            in_string: false,
            escape_next: false,
            pending_key_chars: String::new(),
            stack: Vec::new(),
            finished: false,
        }
    }

    /// Feed a chunk of text through the healer. Returns the portion safe to
    /// forward downstream now; never fails.
    pub fn process(&mut self, chunk: &str) -> String {
        debug_assert!(!self.finished, "Healer::process called after finish()");

        if self.no_json_mode {
            return chunk.to_string();
        }

        if !self.started {
            self.preamble_buffer.push_str(chunk);

            if let Some(i) = find_opener(&self.preamble_buffer) {
                self.started = true;
                let remainder = self.preamble_buffer.split_off(i);
                self.preamble_buffer.clear();
                self.scan(&remainder);
                return remainder;
            }

            if self.preamble_buffer.chars().count() > MAX_PREAMBLE {
                self.started = true;
                self.no_json_mode = true;
                return std::mem::take(&mut self.preamble_buffer);
            }

            return String::new();
        }

        self.scan(chunk);
        chunk.to_string()
    }

    /// Synthesize the closing tail. Call exactly once, after the last
    /// `process` call for this stream.
    pub fn finish(&mut self) -> String {
        debug_assert!(!self.finished, "Healer::finish called twice");
        self.finished = true;

        if !self.started {
            return std::mem::take(&mut self.preamble_buffer);
        }
        if self.no_json_mode {
            return String::new();
        }

        let mut tail = String::new();

        if self.in_string {
            tail.push('"');
            self.in_string = false;
            if let Some(frame) = self.stack.last_mut() {
                if frame.is_object && frame.current_key.is_none() {
                    let key = std::mem::take(&mut self.pending_key_chars);
                    frame.keys_seen.insert(key.clone());
                    frame.current_key = Some(key);
                }
            }
        }

        for depth in (0..self.stack.len()).rev() {
            if self.stack[depth].is_object {
                if let Some(injection) = self.injection_for(depth) {
                    if self.stack[depth].has_content {
                        tail.push(',');
                    }
                    tail.push_str(&injection);
                }
            }
            tail.push(self.stack[depth].closer);
        }

        tail
    }

    /// Compute the `"k1":v1,"k2":v2` injection string for the object frame at
    /// `depth`, or `None` if there's no schema, no governing sub-schema, or
    /// nothing missing.
    fn injection_for(&self, depth: usize) -> Option<String> {
        let schema = self.schema.as_ref()?;
        let governing = resolver::resolve_subschema(schema, &self.stack, depth)?;
        let required = resolver::required_names(governing);
        let frame = &self.stack[depth];
        let missing: Vec<&str> = required
            .iter()
            .map(String::as_str)
            .filter(|name| !frame.keys_seen.contains(*name))
            .collect();
        if missing.is_empty() {
            return None;
        }

        let mut injection = String::new();
        for (i, key) in missing.iter().enumerate() {
            if i > 0 {
                injection.push(',');
            }
            injection.push_str(&json_quote(key));
            injection.push(':');
            let value = resolver::default_for_key(schema, governing, key);
            injection.push_str(&value.to_string());
        }
        Some(injection)
    }

    fn scan(&mut self, text: &str) {
        for c in text.chars() {
            self.step(c);
        }
    }

    fn step(&mut self, c: char) {
        if self.in_string {
            self.step_in_string(c);
            return;
        }

        match c {
            '"' => {
                self.in_string = true;
                self.pending_key_chars.clear();
                if let Some(frame) = self.stack.last_mut() {
                    frame.has_content = true;
                }
            }
            '{' => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.has_content = true;
                }
                self.stack.push(Frame::object());
            }
            '[' => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.has_content = true;
                }
                self.stack.push(Frame::array());
            }
            '}' | ']' => {
                if self.stack.last().is_some_and(|frame| frame.closer == c) {
                    self.stack.pop();
                }
            }
            ',' => {
                if let Some(frame) = self.stack.last_mut() {
                    if frame.is_object {
                        frame.current_key = None;
                    }
                }
            }
            ':' => {}
            c if c.is_whitespace() => {}
            _ => {
                if let Some(frame) = self.stack.last_mut() {
                    frame.has_content = true;
                }
            }
        }
    }

    fn step_in_string(&mut self, c: char) {
        if self.escape_next {
            self.escape_next = false;
            return;
        }
        if c == '\\' {
            self.escape_next = true;
            return;
        }
        if c == '"' {
            self.in_string = false;
            if let Some(frame) = self.stack.last_mut() {
                if frame.is_object && frame.current_key.is_none() {
                    let key = std::mem::take(&mut self.pending_key_chars);
                    frame.keys_seen.insert(key.clone());
                    frame.current_key = Some(key);
                }
            }
            return;
        }
        if let Some(frame) = self.stack.last() {
            if frame.is_object && frame.current_key.is_none() {
                self.pending_key_chars.push(c);
            }
        }
    }
}

/// Byte index of the first `{` or `[` in `text`, if any. Both are single-byte
/// ASCII characters so the index is always a valid char boundary.
fn find_opener(text: &str) -> Option<usize> {
    text.find(['{', '['])
}

fn json_quote(key: &str) -> String {
    serde_json::to_string(key).unwrap_or_else(|_| "\"\"".to_string())
}
