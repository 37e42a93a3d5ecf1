//! Missions carried out by figures: assassination, embassy building and
//! spell casting.

use rand::Rng;
use tracing::debug;

use super::{figure_idle, subject_figure, Order, OrderKind, Outcome, Rejection};
use crate::rules::Rules;
use crate::world::{Base, EffectKind, EventCategory, Figure, FigureKind, Game, Hex, ItemId, ItemRef, PlayerId};

pub(super) fn check(order: &Order, issuer: PlayerId, game: &Game, rules: &Rules) -> Result<u32, Rejection> {
    let figure = subject_figure(order, game)?;
    figure_idle(figure)?;

    match &order.kind {
        OrderKind::Assassinate { target } => {
            require_kind(figure, FigureKind::Agent)?;
            let Some(ItemRef::Figure(victim)) = game.get_item(*target) else {
                return Err(Rejection::new(format!("{} is not a figure", game.item_name(*target))));
            };
            if victim.core.owner().is(issuer) {
                return Err(Rejection::new(format!("{} serves your own kingdom", victim.core.name)));
            }
            let (here, there) = (game.figure_location(figure), game.figure_location(victim));
            if here.is_none() || here != there {
                return Err(Rejection::new(format!(
                    "{} is not at the same place as {}",
                    figure.core.name, victim.core.name
                )));
            }
            if let Some(Base::PopCenter(pop)) = victim.base() {
                let shielded = game
                    .pop_centers
                    .get(&pop)
                    .is_some_and(|p| p.core.has_effect(EffectKind::Shield, game.turn));
                if shielded {
                    return Err(Rejection::new(format!("{} is protected by a shield", victim.core.name)));
                }
            }
            Ok(0)
        }
        OrderKind::ImproveEmbassy => {
            require_kind(figure, FigureKind::Diplomat)?;
            let region = game
                .figure_location(figure)
                .and_then(|hex| game.map.region_of(hex))
                .ok_or_else(|| Rejection::new(format!("{} is in the wilds", figure.core.name)))?;
            let current = game.player(issuer).map_or(0, |p| p.embassy(region));
            if current >= rules.missions.max_embassy_level {
                return Err(Rejection::new("the embassy cannot be improved further"));
            }
            Ok(rules.missions.embassy_cost.saturating_mul(u32::from(current) + 1))
        }
        OrderKind::CastAura { target } => {
            require_kind(figure, FigureKind::Wizard)?;
            let Some(ItemRef::Army(army)) = game.get_item(*target) else {
                return Err(Rejection::new(format!("{} is not an army", game.item_name(*target))));
            };
            require_own_and_near(figure, army.core.owner().is(issuer), army.location, &army.core.name, game)?;
            Ok(rules.missions.spell_cost)
        }
        OrderKind::CastShield { target } => {
            require_kind(figure, FigureKind::Wizard)?;
            let Some(ItemRef::PopCenter(pop)) = game.get_item(*target) else {
                return Err(Rejection::new(format!("{} is not a pop center", game.item_name(*target))));
            };
            require_own_and_near(figure, pop.core.owner().is(issuer), pop.location, &pop.core.name, game)?;
            Ok(rules.missions.spell_cost)
        }
        _ => Err(Rejection::new("not a mission")),
    }
}

fn require_kind(figure: &Figure, kind: FigureKind) -> Result<(), Rejection> {
    if figure.kind == kind {
        Ok(())
    } else {
        Err(Rejection::new(format!(
            "{} is a {}, this mission needs a {}",
            figure.core.name,
            figure.kind.name(),
            kind.name()
        )))
    }
}

fn require_own_and_near(
    figure: &Figure,
    owned: bool,
    at: Hex,
    target_name: &str,
    game: &Game,
) -> Result<(), Rejection> {
    if !owned {
        return Err(Rejection::new(format!("{target_name} is not yours")));
    }
    if game.figure_location(figure) != Some(at) {
        return Err(Rejection::new(format!(
            "{} must be with {target_name} to cast",
            figure.core.name
        )));
    }
    Ok(())
}

pub(super) fn process<R: Rng + ?Sized>(
    order: &Order,
    issuer: PlayerId,
    game: &mut Game,
    rules: &Rules,
    rng: &mut R,
) -> Outcome {
    match &order.kind {
        OrderKind::Assassinate { target } => assassinate(order.subject, *target, issuer, game, rules, rng),
        OrderKind::ImproveEmbassy => {
            let Some(region) = game.location_of(order.subject).and_then(|hex| game.map.region_of(hex)) else {
                return Outcome::Nothing;
            };
            let Some(player) = game.player_mut(issuer) else {
                return Outcome::Nothing;
            };
            let level = player.embassies.entry(region).or_insert(0);
            *level += 1;
            let status = format!("Embassy in region {region} raised to level {}", *level);
            game.add_status(order.subject, status);
            promote(order.subject, game);
        }
        OrderKind::CastAura { target } => cast(order.subject, *target, EffectKind::DiplomaticAura, game, rules),
        OrderKind::CastShield { target } => cast(order.subject, *target, EffectKind::Shield, game, rules),
        _ => {}
    }
    Outcome::Nothing
}

/// Success chance of an assassination, clamped so neither outcome is ever
/// certain.
pub fn assassination_chance(assassin: &Figure, victim: &Figure, rules: &Rules) -> f64 {
    let edge = f64::from(assassin.level) - f64::from(victim.kind.assassination_difficulty());
    (rules.missions.assassination_base_chance + rules.missions.assassination_level_step * edge).clamp(0.05, 0.95)
}

fn assassinate<R: Rng + ?Sized>(
    assassin: ItemId,
    target: ItemId,
    issuer: PlayerId,
    game: &mut Game,
    rules: &Rules,
    rng: &mut R,
) {
    let (Some(a), Some(v)) = (game.figures.get(&assassin), game.figures.get(&target)) else {
        return;
    };
    let chance = assassination_chance(a, v, rules);
    let (assassin_name, victim_name) = (a.core.name.clone(), v.core.name.clone());
    let victim_owner = v.core.owner().player();
    let success = rng.gen_bool(chance);
    debug!(%assassin, %target, chance, success, "assassination attempt");

    if success {
        game.remove_figure(target);
        game.add_status(assassin, format!("Assassinated {victim_name}"));
        game.notify(issuer, EventCategory::Mission, format!("{assassin_name} assassinated {victim_name}"));
        if let Some(owner) = victim_owner {
            game.notify(owner, EventCategory::Mission, format!("{victim_name} was assassinated"));
        }
        promote(assassin, game);
    } else {
        game.add_status(assassin, format!("Failed to assassinate {victim_name}"));
        game.notify(issuer, EventCategory::Mission, format!("{assassin_name} failed to assassinate {victim_name}"));
        if let Some(owner) = victim_owner {
            game.notify(owner, EventCategory::Mission, format!("An attempt on {victim_name}'s life was foiled"));
        }
    }
}

fn cast(wizard: ItemId, target: ItemId, kind: EffectKind, game: &mut Game, rules: &Rules) {
    let until = game.turn + rules.missions.effect_duration.saturating_sub(1);
    let name = game.item_name(target);
    if let Some(core) = game.item_core_mut(target) {
        core.add_effect(kind, until);
        let spell = match kind {
            EffectKind::DiplomaticAura => "aura",
            EffectKind::Shield => "shield",
        };
        game.add_status(wizard, format!("Cast a {spell} on {name}"));
    }
}

fn promote(id: ItemId, game: &mut Game) {
    if let Some(f) = game.figures.get_mut(&id) {
        if f.kind.promotes_on_mission() && f.promote() {
            let status = format!("Promoted to level {}", f.level);
            f.core.status.push(status);
        }
    }
}
