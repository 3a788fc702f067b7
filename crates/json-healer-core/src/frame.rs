use std::collections::HashSet;

/// One level of the nesting stack: an object or array that is currently open.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub closer: char,
    pub is_object: bool,
    pub keys_seen: HashSet<String>,
    pub current_key: Option<String>,
    pub has_content: bool,
}

impl Frame {
    pub fn object() -> Self {
        Self {
            closer: '}',
            is_object: true,
            keys_seen: HashSet::new(),
            current_key: None,
            has_content: false,
        }
    }

    pub fn array() -> Self {
        Self {
            closer: ']',
            is_object: false,
            keys_seen: HashSet::new(),
            current_key: None,
            has_content: false,
        }
    }
}
