//! Orders and their execution lifecycle.
//!
//! Every order moves `Pending → Executed | Rejected` exactly once. Execution
//! runs a short-circuiting guard chain; the first failing guard becomes a
//! [`Rejection`] event for the issuing player and nothing else happens. On
//! success the category's `process` step mutates the world, the cost is
//! charged, the order is appended to the subject's executed list and the
//! category's view update pushes any new knowledge into fog-of-war views.

mod attack;
mod hire;
mod mission;
mod movement;
pub mod priority;
mod production;
mod train;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::combat::BattleReport;
use crate::rules::Rules;
use crate::world::{
    Army, Direction, EventCategory, Figure, FigureKind, Game, Hex, ItemId, Owner, PlayerId,
    PopCenter,
};

pub use priority::{collect_orders, execute_orders, sequence_orders, OrderPriority, QueuedOrder, TurnTally};

/// The type of an order, used for sequencing and one-action bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderTag {
    HireArmy,
    HireFigure,
    TrainFigure,
    ImprovePopCenter,
    MoveArmy,
    MoveFigure,
    CastShield,
    CastAura,
    ImproveEmbassy,
    Assassinate,
    AttackArmy,
    AttackPopCenter,
    DemandSurrender,
}

/// The broad family an order type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderCategory {
    Hire,
    Train,
    Production,
    Movement,
    Mission,
    Attack,
}

impl OrderTag {
    pub const ALL: [OrderTag; 13] = [
        OrderTag::HireArmy,
        OrderTag::HireFigure,
        OrderTag::TrainFigure,
        OrderTag::ImprovePopCenter,
        OrderTag::MoveArmy,
        OrderTag::MoveFigure,
        OrderTag::CastShield,
        OrderTag::CastAura,
        OrderTag::ImproveEmbassy,
        OrderTag::Assassinate,
        OrderTag::AttackArmy,
        OrderTag::AttackPopCenter,
        OrderTag::DemandSurrender,
    ];

    /// Hires, then training and production, then movement, missions and
    /// finally attacks.
    pub const DEFAULT_PRIORITY: [OrderTag; 13] = OrderTag::ALL;

    /// Name used in rules files and reports.
    pub const fn name(self) -> &'static str {
        match self {
            OrderTag::HireArmy => "HireArmy",
            OrderTag::HireFigure => "HireFigure",
            OrderTag::TrainFigure => "TrainFigure",
            OrderTag::ImprovePopCenter => "ImprovePopCenter",
            OrderTag::MoveArmy => "MoveArmy",
            OrderTag::MoveFigure => "MoveFigure",
            OrderTag::CastShield => "CastShield",
            OrderTag::CastAura => "CastAura",
            OrderTag::ImproveEmbassy => "ImproveEmbassy",
            OrderTag::Assassinate => "Assassinate",
            OrderTag::AttackArmy => "AttackArmy",
            OrderTag::AttackPopCenter => "AttackPopCenter",
            OrderTag::DemandSurrender => "DemandSurrender",
        }
    }

    /// Parses a tag name.
    pub fn from_name(name: &str) -> Option<OrderTag> {
        OrderTag::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Family that runs this order type.
    pub const fn category(self) -> OrderCategory {
        match self {
            OrderTag::HireArmy | OrderTag::HireFigure => OrderCategory::Hire,
            OrderTag::TrainFigure => OrderCategory::Train,
            OrderTag::ImprovePopCenter => OrderCategory::Production,
            OrderTag::MoveArmy | OrderTag::MoveFigure => OrderCategory::Movement,
            OrderTag::CastShield
            | OrderTag::CastAura
            | OrderTag::ImproveEmbassy
            | OrderTag::Assassinate => OrderCategory::Mission,
            OrderTag::AttackArmy | OrderTag::AttackPopCenter | OrderTag::DemandSurrender => {
                OrderCategory::Attack
            }
        }
    }

    /// Whether this is one of the attack orders.
    pub const fn is_attack(self) -> bool {
        matches!(self.category(), OrderCategory::Attack)
    }

    /// Orders a pop center may give; it gives at most one per turn.
    pub const fn is_pop_action(self) -> bool {
        matches!(
            self,
            OrderTag::HireArmy | OrderTag::HireFigure | OrderTag::ImprovePopCenter
        )
    }
}

impl std::fmt::Display for OrderTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What an order asks its subject to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderKind {
    /// Pop center raises a new army of `units` units of `troop`.
    HireArmy { troop: String, units: u32 },
    /// Pop center recruits a level-1 figure.
    HireFigure { kind: FigureKind, name: String },
    /// Figure trains one level.
    TrainFigure,
    /// Pop center grows one level.
    ImprovePopCenter,
    /// Army marches along a path of single-hex steps.
    MoveArmy { path: Vec<Direction> },
    /// Figure relocates to another base.
    MoveFigure { to: ItemId },
    /// Wizard shields a pop center.
    CastShield { target: ItemId },
    /// Wizard lends an army a diplomatic aura.
    CastAura { target: ItemId },
    /// Diplomat raises the embassy in its current region.
    ImproveEmbassy,
    /// Agent tries to kill a figure.
    Assassinate { target: ItemId },
    AttackArmy { target: ItemId },
    AttackPopCenter { target: ItemId },
    /// Army demands that a pop center surrender without a fight.
    DemandSurrender { target: ItemId },
}

impl OrderKind {
    /// Type tag of the order.
    pub fn tag(&self) -> OrderTag {
        match self {
            OrderKind::HireArmy { .. } => OrderTag::HireArmy,
            OrderKind::HireFigure { .. } => OrderTag::HireFigure,
            OrderKind::TrainFigure => OrderTag::TrainFigure,
            OrderKind::ImprovePopCenter => OrderTag::ImprovePopCenter,
            OrderKind::MoveArmy { .. } => OrderTag::MoveArmy,
            OrderKind::MoveFigure { .. } => OrderTag::MoveFigure,
            OrderKind::CastShield { .. } => OrderTag::CastShield,
            OrderKind::CastAura { .. } => OrderTag::CastAura,
            OrderKind::ImproveEmbassy => OrderTag::ImproveEmbassy,
            OrderKind::Assassinate { .. } => OrderTag::Assassinate,
            OrderKind::AttackArmy { .. } => OrderTag::AttackArmy,
            OrderKind::AttackPopCenter { .. } => OrderTag::AttackPopCenter,
            OrderKind::DemandSurrender { .. } => OrderTag::DemandSurrender,
        }
    }

    /// The item this order acts on, besides its subject.
    pub fn target(&self) -> Option<ItemId> {
        match self {
            OrderKind::MoveFigure { to } => Some(*to),
            OrderKind::CastShield { target }
            | OrderKind::CastAura { target }
            | OrderKind::Assassinate { target }
            | OrderKind::AttackArmy { target }
            | OrderKind::AttackPopCenter { target }
            | OrderKind::DemandSurrender { target } => Some(*target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Executed,
    Rejected,
}

/// A human-readable reason an order was not carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection(pub String);

impl Rejection {
    /// Wraps a reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Rejection(reason.into())
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened when an order was processed, for the view update.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    Nothing,
    /// Hexes passed on the way, destination excluded.
    Marched { passed: Vec<Hex> },
    Battle(BattleReport),
    Surrendered { pop: ItemId },
}

/// An order for one of a player's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub subject: ItemId,
    pub kind: OrderKind,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(skip)]
    pub(crate) issuer: Option<PlayerId>,
    #[serde(skip)]
    pub(crate) subject_missing: bool,
    #[serde(skip)]
    pub(crate) target_missing: bool,
    /// Gold charged when the order executed.
    #[serde(skip)]
    pub cost: u32,
}

impl Order {
    /// A pending order for `subject`.
    pub fn new(subject: ItemId, kind: OrderKind) -> Self {
        Order {
            subject,
            kind,
            status: OrderStatus::Pending,
            issuer: None,
            subject_missing: false,
            target_missing: false,
            cost: 0,
        }
    }

    /// Marks the order as issued by a player. The reference resolver does
    /// this for every pending order.
    pub fn issued_by(mut self, pid: PlayerId) -> Self {
        self.issuer = Some(pid);
        self
    }

    /// Type tag of the order.
    pub fn tag(&self) -> OrderTag {
        self.kind.tag()
    }

    /// The player who issued the order, once known.
    pub fn issuer(&self) -> Option<PlayerId> {
        self.issuer
    }

    /// Whether the resolver found the order's target gone.
    pub fn target_missing(&self) -> bool {
        self.target_missing
    }

    /// Whether the resolver found the order's subject gone.
    pub fn subject_missing(&self) -> bool {
        self.subject_missing
    }

    /// Runs the order once. Calling it again after it executed or was
    /// rejected changes nothing and returns the recorded status.
    pub fn execute<R: Rng + ?Sized>(&mut self, game: &mut Game, rules: &Rules, rng: &mut R) -> OrderStatus {
        if self.status != OrderStatus::Pending {
            return self.status;
        }
        let Some(issuer) = self.issuer.or_else(|| game.owner_of(self.subject).and_then(Owner::player)) else {
            warn!(subject = %self.subject, order = %self.tag(), "order has no issuer");
            self.status = OrderStatus::Rejected;
            return self.status;
        };

        let cost = match self.check(issuer, game, rules) {
            Ok(cost) => cost,
            Err(rejection) => {
                if self.subject_missing || self.target_missing {
                    warn!(subject = %self.subject, order = %self.tag(), %rejection, "order refers to a removed item");
                } else {
                    debug!(subject = %self.subject, order = %self.tag(), %rejection, "order rejected");
                }
                let message = format!("{} order for {} rejected: {}", self.tag(), game.item_name(self.subject), rejection);
                game.notify(issuer, EventCategory::Rejection, message);
                self.status = OrderStatus::Rejected;
                return self.status;
            }
        };

        let outcome = self.process(issuer, game, rules, rng);
        if let Some(p) = game.player_mut(issuer) {
            p.gold = p.gold.saturating_sub(cost);
        }
        let tag = self.tag();
        if let Some(core) = game.item_core_mut(self.subject) {
            core.executed.push(tag);
        }
        self.update_views(issuer, &outcome, game);

        debug!(subject = %self.subject, order = %tag, cost, "order executed");
        self.cost = cost;
        self.status = OrderStatus::Executed;
        self.status
    }

    /// The guard chain. Returns the cost to charge when every guard passes.
    fn check(&self, issuer: PlayerId, game: &Game, rules: &Rules) -> Result<u32, Rejection> {
        if self.subject_missing || !game.contains_item(self.subject) {
            return Err(Rejection::new(format!("{} no longer exists", self.subject)));
        }
        if game.owner_of(self.subject) != Some(Owner::Player(issuer)) {
            return Err(Rejection::new(format!(
                "{} is not under your command",
                game.item_name(self.subject)
            )));
        }
        if let Some(target) = self.kind.target() {
            if self.target_missing || !game.contains_item(target) {
                return Err(Rejection::new(format!("target {target} no longer exists")));
            }
        }

        let cost = match self.tag().category() {
            OrderCategory::Hire => hire::check(self, issuer, game, rules)?,
            OrderCategory::Train => train::check(self, game, rules)?,
            OrderCategory::Production => production::check(self, game, rules)?,
            OrderCategory::Movement => movement::check(self, issuer, game)?,
            OrderCategory::Mission => mission::check(self, issuer, game, rules)?,
            OrderCategory::Attack => attack::check(self, issuer, game, rules)?,
        };

        let gold = game.player(issuer).map_or(0, |p| p.gold);
        if cost > gold {
            return Err(Rejection::new(format!(
                "insufficient funds ({cost} gold needed, {gold} available)"
            )));
        }
        Ok(cost)
    }

    fn process<R: Rng + ?Sized>(&self, issuer: PlayerId, game: &mut Game, rules: &Rules, rng: &mut R) -> Outcome {
        match self.tag().category() {
            OrderCategory::Hire => hire::process(self, issuer, game, rules),
            OrderCategory::Train => train::process(self, game),
            OrderCategory::Production => production::process(self, game),
            OrderCategory::Movement => movement::process(self, game),
            OrderCategory::Mission => mission::process(self, issuer, game, rules, rng),
            OrderCategory::Attack => attack::process(self, game, rules, rng),
        }
    }

    fn update_views(&self, issuer: PlayerId, outcome: &Outcome, game: &mut Game) {
        match outcome {
            Outcome::Nothing => {}
            Outcome::Marched { passed } => movement::update_views(issuer, passed, game),
            Outcome::Battle(report) => attack::update_views(report, game),
            Outcome::Surrendered { pop } => attack::reveal_pop(issuer, *pop, game),
        }
    }
}

// Subject lookups shared by the category guards.

/// The order's subject as an army, or a rejection.
fn subject_army<'a>(order: &Order, game: &'a Game) -> Result<&'a Army, Rejection> {
    game.armies
        .get(&order.subject)
        .ok_or_else(|| Rejection::new(format!("{} is not an army", game.item_name(order.subject))))
}

/// The order's subject as a figure, or a rejection.
fn subject_figure<'a>(order: &Order, game: &'a Game) -> Result<&'a Figure, Rejection> {
    game.figures
        .get(&order.subject)
        .ok_or_else(|| Rejection::new(format!("{} is not a figure", game.item_name(order.subject))))
}

/// The order's subject as a pop center, or a rejection.
fn subject_pop<'a>(order: &Order, game: &'a Game) -> Result<&'a PopCenter, Rejection> {
    game.pop_centers
        .get(&order.subject)
        .ok_or_else(|| Rejection::new(format!("{} is not a pop center", game.item_name(order.subject))))
}

/// Rejects a figure that already acted this turn.
fn figure_idle(figure: &Figure) -> Result<(), Rejection> {
    if figure.core.executed.is_empty() {
        Ok(())
    } else {
        Err(Rejection::new(format!("{} has already acted this turn", figure.core.name)))
    }
}
