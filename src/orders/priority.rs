//! Turn sequencing: gathering every player's orders, shuffling them and
//! ordering them by type priority.
//!
//! The shuffle happens first and the priority sort is stable, so orders of
//! the same type run in a random order that no player can game by queue
//! position, while every type still runs in its configured slot.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::{Order, OrderStatus, OrderTag};
use crate::rules::Rules;
use crate::world::{Game, PlayerId};

/// Rank of each order type; lower runs first. Types the table does not
/// list run after every listed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPriority {
    ranks: BTreeMap<OrderTag, usize>,
}

impl OrderPriority {
    /// Ranks tags in the given order; repeats keep their first rank.
    pub fn from_tags(tags: impl IntoIterator<Item = OrderTag>) -> Self {
        let mut ranks = BTreeMap::new();
        for (i, tag) in tags.into_iter().enumerate() {
            ranks.entry(tag).or_insert(i);
        }
        OrderPriority { ranks }
    }

    /// Builds the table from type names. Unknown names are skipped; rules
    /// validation reports them.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        OrderPriority::from_tags(names.iter().filter_map(|n| OrderTag::from_name(n.as_ref())))
    }

    /// The table configured in the rules.
    pub fn from_rules(rules: &Rules) -> Self {
        OrderPriority::from_names(rules.order_priority.as_slice())
    }

    /// Rank of a tag; unlisted tags rank last.
    pub fn rank(&self, tag: OrderTag) -> usize {
        self.ranks.get(&tag).copied().unwrap_or(usize::MAX)
    }
}

impl Default for OrderPriority {
    fn default() -> Self {
        OrderPriority::from_tags(OrderTag::DEFAULT_PRIORITY)
    }
}

/// An order waiting in the turn queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedOrder {
    pub player: PlayerId,
    pub order: Order,
}

/// How the turn's orders came out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnTally {
    pub executed: usize,
    pub rejected: usize,
}

/// Takes every player's pending orders into one queue, in player order.
pub fn collect_orders(game: &mut Game) -> Vec<QueuedOrder> {
    let mut queue = Vec::new();
    for (i, player) in game.players.iter_mut().enumerate() {
        let pid = PlayerId(i as u16);
        queue.extend(player.pending_orders.drain(..).map(|mut order| {
            order.issuer.get_or_insert(pid);
            QueuedOrder { player: pid, order }
        }));
    }
    queue
}

/// Shuffles the queue, then stable-sorts it by type priority.
pub fn sequence_orders<R: Rng + ?Sized>(queue: &mut [QueuedOrder], priority: &OrderPriority, rng: &mut R) {
    queue.shuffle(rng);
    queue.sort_by_key(|q| priority.rank(q.order.tag()));
}

/// Executes the queue front to back.
pub fn execute_orders<R: Rng + ?Sized>(
    game: &mut Game,
    queue: &mut [QueuedOrder],
    rules: &Rules,
    rng: &mut R,
) -> TurnTally {
    let mut tally = TurnTally::default();
    for q in queue.iter_mut() {
        match q.order.execute(game, rules, rng) {
            OrderStatus::Executed => tally.executed += 1,
            OrderStatus::Rejected => tally.rejected += 1,
            OrderStatus::Pending => {}
        }
    }
    debug!(executed = tally.executed, rejected = tally.rejected, "orders resolved");
    tally
}
