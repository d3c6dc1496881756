//! Per-metric replay cursor.

use crate::reading::Reading;

/// A fixed sequence of readings and a wrapping read position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorState {
    rows: Vec<Reading>,
    index: usize,
}

impl CursorState {
    /// Creates a cursor at the start of `rows`.
    pub fn new(rows: Vec<Reading>) -> Self {
        Self { rows, index: 0 }
    }

    /// Returns the reading at the current position without moving.
    pub fn current(&self) -> Option<&Reading> {
        self.rows.get(self.index)
    }

    /// Moves to the next position, wrapping at the end. No-op when empty.
    pub fn advance(&mut self) {
        if !self.rows.is_empty() {
            self.index = (self.index + 1) % self.rows.len();
        }
    }

    /// Returns the current reading and advances past it.
    pub fn read(&mut self) -> Option<Reading> {
        let reading = self.current().cloned()?;
        self.advance();
        Some(reading)
    }

    /// Swaps in a new sequence and rewinds.
    pub fn replace(&mut self, rows: Vec<Reading>) {
        self.rows = rows;
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rows(n: usize) -> Vec<Reading> {
        (0..n)
            .map(|i| Reading::new("pm25", format!("t{i}"), i as f64))
            .collect()
    }

    #[test]
    fn test_read_wraps() {
        let mut cursor = CursorState::new(rows(3));
        let seen: Vec<String> = (0..5).filter_map(|_| cursor.read()).map(|r| r.timestamp).collect();

        assert_eq!(seen, vec!["t0", "t1", "t2", "t0", "t1"]);
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn test_empty_cursor_never_advances() {
        let mut cursor = CursorState::default();
        assert!(cursor.read().is_none());
        cursor.advance();
        assert_eq!(cursor.index(), 0);
        assert!(cursor.current().is_none());
    }

    #[test]
    fn test_replace_rewinds() {
        let mut cursor = CursorState::new(rows(4));
        cursor.advance();
        cursor.advance();
        cursor.replace(rows(2));
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_full_lap_returns_to_start(len in 1usize..64, start in 0usize..64) {
            let mut cursor = CursorState::new(rows(len));
            for _ in 0..(start % len) {
                cursor.advance();
            }
            let origin = cursor.index();
            for _ in 0..len {
                cursor.advance();
            }
            prop_assert_eq!(cursor.index(), origin);
        }
    }
}
