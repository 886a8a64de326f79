use std::sync::Arc;

/// Resumable position inside a fixed template, counted in characters.
#[derive(Debug, Clone)]
pub struct TemplateCursor {
    chars: Arc<[char]>,
    index: usize,
}

impl TemplateCursor {
    pub fn new(template: &str) -> Self {
        Self {
            chars: template.chars().collect(),
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.chars.len()
    }

    /// The next character to insert, without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    pub fn advance(&mut self) {
        if !self.is_finished() {
            self.index += 1;
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Everything not yet consumed.
    pub fn remaining(&self) -> String {
        self.chars[self.index.min(self.chars.len())..].iter().collect()
    }
}

impl Iterator for TemplateCursor {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.advance();
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resumes_where_it_stopped() {
        let mut cursor = TemplateCursor::new("héllo");
        let head: String = cursor.by_ref().take(2).collect();
        assert_eq!(head, "hé");
        assert_eq!(cursor.index(), 2);

        let rest: String = cursor.by_ref().collect();
        assert_eq!(rest, "llo");
        assert!(cursor.is_finished());
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.index(), 5);
    }

    #[test]
    fn test_reset_restarts() {
        let mut cursor = TemplateCursor::new("abc");
        cursor.next();
        cursor.next();
        assert_eq!(cursor.remaining(), "c");

        cursor.reset();
        assert_eq!(cursor.collect::<String>(), "abc");
    }
}
