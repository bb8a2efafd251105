//! Processing marks: which cards a reconciler has already handled.

use crate::page::CardId;
use std::collections::HashSet;
use std::sync::Mutex;

/// Side-table of processed cards, owned by one reconciler.
#[derive(Debug, Default)]
pub struct ProcessingMarks {
    marked: Mutex<HashSet<CardId>>,
}

impl ProcessingMarks {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `card` has been processed.
    #[must_use]
    pub fn is_marked(&self, card: CardId) -> bool {
        self.marked.lock().expect("acquire marks lock").contains(&card)
    }

    /// Mark `card`; returns `false` if it was already marked.
    pub fn mark(&self, card: CardId) -> bool {
        self.marked.lock().expect("acquire marks lock").insert(card)
    }

    /// Forget every card.
    pub fn clear(&self) {
        self.marked.lock().expect("acquire marks lock").clear();
    }

    /// Number of marked cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marked.lock().expect("acquire marks lock").len()
    }

    /// Whether no card is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop marks of cards for which `attached` is false. Returns how many were dropped.
    pub fn prune(&self, attached: impl Fn(CardId) -> bool) -> usize {
        let mut marked = self.marked.lock().expect("acquire marks lock");
        let before = marked.len();
        marked.retain(|card| attached(*card));
        before - marked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;

    #[test]
    fn test_mark_once() {
        let page = Page::new();
        let node = page.insert("<div></div>");
        let card = CardId { node, index: 0 };

        let marks = ProcessingMarks::new();
        assert!(!marks.is_marked(card));
        assert!(marks.mark(card));
        assert!(!marks.mark(card));
        assert!(marks.is_marked(card));
        assert_eq!(marks.len(), 1);

        marks.clear();
        assert!(marks.is_empty());
    }

    #[test]
    fn test_prune_detached() {
        let page = Page::new();
        let kept = page.insert("<div></div>");
        let gone = page.insert("<div></div>");

        let marks = ProcessingMarks::new();
        marks.mark(CardId { node: kept, index: 0 });
        marks.mark(CardId { node: gone, index: 0 });
        page.remove(gone);

        assert_eq!(marks.prune(|card| page.is_attached(card)), 1);
        assert_eq!(marks.len(), 1);
        assert!(marks.is_marked(CardId { node: kept, index: 0 }));
    }
}
