//! Field path tracking for nested values

/// Tracks the current location inside a nested value (e.g. `profile.tags[2]`)
#[derive(Debug, Clone, Default)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path rooted at a top-level field
    pub fn root(field: &str) -> Self {
        Self {
            segments: vec![field.to_string()],
        }
    }

    /// Push a field name
    pub fn push(&mut self, field: &str) {
        self.segments.push(field.to_string());
    }

    /// Push a sequence index
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(format!("[{}]", index));
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Render the path, e.g. `meta.tags[1]`
    pub fn current(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    /// Render the path extended by one field, without mutating it
    pub fn child(&self, field: &str) -> String {
        let mut path = self.clone();
        path.push(field);
        path.current()
    }
}
