//! In-process model of a live listing document.
//!
//! A [`Page`] holds the HTML subtrees a site has inserted, in insertion
//! order. Every insertion is a fresh node identity: re-inserting the same
//! markup produces new cards. The page records the only visible effects a
//! treatment may have (background color and visibility), dispatches user
//! interactions to per-card listeners, and reports insertions and removals
//! to its watchers as mutation batches.

use crate::treatment::Highlight;
use futures::future::BoxFuture;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Identity of one inserted subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identity of one card: the subtree it lives in and its position there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId {
    /// Subtree containing the card
    pub node: NodeId,
    /// Document-order index among the subtree's matches of the card selector
    pub index: usize,
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.node, self.index)
    }
}

/// Handle of one interaction subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Visible state of a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardStyle {
    /// Background highlight, if any
    pub background: Option<Highlight>,
    /// Whether the card is hidden
    pub hidden: bool,
}

/// One observed change to the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    /// Subtrees inserted
    pub added: Vec<NodeId>,
    /// Subtrees removed
    pub removed: Vec<NodeId>,
}

/// Reacts to the user hovering or focusing a card.
pub trait InteractionListener: Send + Sync {
    /// Called synchronously on dispatch; returned work is awaited by the dispatcher.
    fn on_interaction(&self) -> Option<BoxFuture<'static, ()>>;
}

#[derive(Default)]
struct PageState {
    next_node: u64,
    next_subscription: u64,
    nodes: BTreeMap<NodeId, String>,
    styles: HashMap<CardId, CardStyle>,
    listeners: HashMap<CardId, Vec<(SubscriptionId, Arc<dyn InteractionListener>)>>,
    watchers: Vec<mpsc::UnboundedSender<MutationBatch>>,
}

impl PageState {
    fn attach(&mut self, html: &str) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(node, html.to_string());
        node
    }

    fn notify(&mut self, batch: &MutationBatch) {
        self.watchers.retain(|tx| tx.send(batch.clone()).is_ok());
    }

    fn drop_node(&mut self, node: NodeId) -> bool {
        if self.nodes.remove(&node).is_none() {
            return false;
        }
        self.styles.retain(|card, _| card.node != node);
        self.listeners.retain(|card, _| card.node != node);
        true
    }
}

/// Shared handle to a live document.
#[derive(Clone, Default)]
pub struct Page {
    state: Arc<Mutex<PageState>>,
}

impl Page {
    /// Create an empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a page whose initial content is `html`.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let page = Self::new();
        page.insert(html);
        page
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().expect("acquire page state lock")
    }

    /// Receive every future mutation batch.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<MutationBatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().watchers.push(tx);
        rx
    }

    /// Insert one subtree.
    pub fn insert(&self, html: &str) -> NodeId {
        let mut state = self.lock();
        let node = state.attach(html);
        state.notify(&MutationBatch {
            added: vec![node],
            removed: Vec::new(),
        });
        node
    }

    /// Insert several subtrees as one mutation batch.
    pub fn insert_all<'a>(&self, fragments: impl IntoIterator<Item = &'a str>) -> Vec<NodeId> {
        let mut state = self.lock();
        let added: Vec<NodeId> = fragments.into_iter().map(|html| state.attach(html)).collect();
        if !added.is_empty() {
            let batch = MutationBatch {
                added: added.clone(),
                removed: Vec::new(),
            };
            state.notify(&batch);
        }
        added
    }

    /// Remove a subtree; its cards, styles and listeners go with it.
    pub fn remove(&self, node: NodeId) -> bool {
        let mut state = self.lock();
        let removed = state.drop_node(node);
        if removed {
            let batch = MutationBatch {
                added: Vec::new(),
                removed: vec![node],
            };
            state.notify(&batch);
        }
        removed
    }

    /// Whether any of `nodes` is, or contains, an element matching `selector`.
    #[must_use]
    pub fn contains_match(&self, nodes: &[NodeId], selector: &Selector) -> bool {
        let fragments: Vec<String> = {
            let state = self.lock();
            nodes
                .iter()
                .filter_map(|node| state.nodes.get(node).cloned())
                .collect()
        };
        fragments
            .iter()
            .any(|html| Html::parse_fragment(html).select(selector).next().is_some())
    }

    /// Visit every card currently in the document.
    pub fn visit_cards<R>(
        &self,
        selector: &Selector,
        mut visit: impl FnMut(CardId, ElementRef<'_>) -> R,
    ) -> Vec<R> {
        let fragments: Vec<(NodeId, String)> = {
            let state = self.lock();
            state
                .nodes
                .iter()
                .map(|(node, html)| (*node, html.clone()))
                .collect()
        };

        let mut out = Vec::new();
        for (node, html) in fragments {
            let fragment = Html::parse_fragment(&html);
            for (index, element) in fragment.select(selector).enumerate() {
                out.push(visit(CardId { node, index }, element));
            }
        }
        out
    }

    /// Identities of every card currently in the document.
    #[must_use]
    pub fn cards(&self, selector: &Selector) -> Vec<CardId> {
        self.visit_cards(selector, |card, _| card)
    }

    /// Whether the card's subtree is still in the document.
    #[must_use]
    pub fn is_attached(&self, card: CardId) -> bool {
        self.lock().nodes.contains_key(&card.node)
    }

    /// Current visible state of a card.
    #[must_use]
    pub fn style(&self, card: CardId) -> CardStyle {
        self.lock().styles.get(&card).copied().unwrap_or_default()
    }

    /// Set or clear a card's background. Returns `false` if the card is detached.
    pub fn set_background(&self, card: CardId, background: Option<Highlight>) -> bool {
        let mut state = self.lock();
        if !state.nodes.contains_key(&card.node) {
            return false;
        }
        state.styles.entry(card).or_default().background = background;
        true
    }

    /// Show or hide a card. Returns `false` if the card is detached.
    pub fn set_hidden(&self, card: CardId, hidden: bool) -> bool {
        let mut state = self.lock();
        if !state.nodes.contains_key(&card.node) {
            return false;
        }
        state.styles.entry(card).or_default().hidden = hidden;
        true
    }

    /// Subscribe `listener` to interactions with `card`.
    ///
    /// Returns `None` if the card is detached.
    pub fn add_interaction_listener(
        &self,
        card: CardId,
        listener: Arc<dyn InteractionListener>,
    ) -> Option<SubscriptionId> {
        let mut state = self.lock();
        if !state.nodes.contains_key(&card.node) {
            return None;
        }
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;
        state.listeners.entry(card).or_default().push((id, listener));
        Some(id)
    }

    /// Remove one subscription. Returns whether it was present.
    pub fn remove_interaction_listener(&self, card: CardId, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let Some(listeners) = state.listeners.get_mut(&card) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            state.listeners.remove(&card);
        }
        removed
    }

    /// Number of interaction listeners on a card.
    #[must_use]
    pub fn listener_count(&self, card: CardId) -> usize {
        self.lock().listeners.get(&card).map_or(0, Vec::len)
    }

    /// Drop a card's style and listeners, restoring its default appearance.
    pub fn reset_card(&self, card: CardId) {
        let mut state = self.lock();
        state.styles.remove(&card);
        state.listeners.remove(&card);
    }

    /// Dispatch an interaction synchronously, returning the work listeners started.
    #[must_use]
    pub fn dispatch_interaction(&self, card: CardId) -> Vec<BoxFuture<'static, ()>> {
        let listeners: Vec<Arc<dyn InteractionListener>> = self
            .lock()
            .listeners
            .get(&card)
            .map(|subs| subs.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();

        listeners
            .iter()
            .filter_map(|listener| listener.on_interaction())
            .collect()
    }

    /// Simulate the user hovering `card` and wait for the listeners' work.
    pub async fn interact(&self, card: CardId) {
        let pending = self.dispatch_interaction(card);
        futures::future::join_all(pending).await;
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Page")
            .field("nodes", &state.nodes.len())
            .field("styled_cards", &state.styles.len())
            .field("watchers", &state.watchers.len())
            .finish()
    }
}
