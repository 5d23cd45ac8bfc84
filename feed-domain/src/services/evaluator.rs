// Filter evaluator
// Walks a filter tree against one killmail and reports the outcome plus
// the provenance needed to drive presentation.

use std::collections::{BTreeSet, HashSet};

use chrono::Timelike;
use futures_util::future::{BoxFuture, FutureExt};
use tracing::warn;

use crate::entities::{Attacker, FilterCondition, FilterNode, KillEvent, SolarSystem, Victim};
use crate::ports::ReferenceResolver;

const LY_PER_M: f64 = 1.0 / 9_460_730_472_580_800.0;

/// Result of evaluating one filter tree against one event.
///
/// `matched_attackers` holds attacker indices into the event's attacker
/// list. Provenance fields are only meaningful when `matched` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched: bool,
    pub victim_matched: bool,
    pub matched_attackers: BTreeSet<usize>,
    pub matched_pilot_threshold: Option<u32>,
}

impl MatchOutcome {
    pub fn miss() -> Self {
        MatchOutcome::default()
    }

    pub fn hit() -> Self {
        MatchOutcome {
            matched: true,
            ..Default::default()
        }
    }

    fn victim() -> Self {
        MatchOutcome {
            matched: true,
            victim_matched: true,
            ..Default::default()
        }
    }

    fn attackers(indices: BTreeSet<usize>) -> Self {
        MatchOutcome {
            matched: true,
            matched_attackers: indices,
            ..Default::default()
        }
    }

    /// Folds another matching child's provenance into this one. Victim
    /// polarity is OR-ed, attacker sets are unioned, the first recorded
    /// pilot threshold is kept.
    fn absorb(&mut self, other: MatchOutcome) {
        self.victim_matched |= other.victim_matched;
        self.matched_attackers.extend(other.matched_attackers);
        if self.matched_pilot_threshold.is_none() {
            self.matched_pilot_threshold = other.matched_pilot_threshold;
        }
    }
}

/// Evaluates a filter tree against one event.
///
/// Never fails out of the dispatch pass: a reference resolution error makes
/// the enclosing condition evaluate to non-match.
pub fn evaluate<'a>(
    node: &'a FilterNode,
    event: &'a KillEvent,
    resolver: &'a dyn ReferenceResolver,
) -> BoxFuture<'a, MatchOutcome> {
    async move {
        match node {
            FilterNode::Condition(condition) => {
                evaluate_condition(condition, event, resolver).await
            }
            FilterNode::And(nodes) => {
                // Empty And matches everything.
                let mut merged = MatchOutcome::hit();
                for child in nodes {
                    let result = evaluate(child, event, resolver).await;
                    if !result.matched {
                        return MatchOutcome::miss();
                    }
                    merged.absorb(result);
                }
                merged
            }
            FilterNode::Or(nodes) => {
                // First matching child in list order wins; empty Or matches
                // nothing.
                for child in nodes {
                    let result = evaluate(child, event, resolver).await;
                    if result.matched {
                        return result;
                    }
                }
                MatchOutcome::miss()
            }
            FilterNode::Not(child) => {
                // A negated condition does not identify which entity caused
                // the exclusion, so provenance is cleared.
                if evaluate(child, event, resolver).await.matched {
                    MatchOutcome::miss()
                } else {
                    MatchOutcome::hit()
                }
            }
        }
    }
    .boxed()
}

/// Raw security statuses at or above 0.45 report as their one-decimal tier,
/// matching how the space is colloquially classified.
pub fn effective_security(raw: f64) -> f64 {
    if raw >= 0.45 {
        (raw * 10.0).round() / 10.0
    } else {
        raw
    }
}

fn distance_ly(a: &SolarSystem, b: &SolarSystem) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt() * LY_PER_M
}

/// A victim or attacker viewed through the side-aware conditions.
struct Candidate {
    character_id: Option<u64>,
    corporation_id: Option<u64>,
    alliance_id: Option<u64>,
    ship_type_id: Option<u32>,
    weapon_type_id: Option<u32>,
}

impl Candidate {
    fn from_victim(victim: &Victim) -> Self {
        Candidate {
            character_id: victim.character_id,
            corporation_id: victim.corporation_id,
            alliance_id: victim.alliance_id,
            ship_type_id: Some(victim.ship_type_id),
            weapon_type_id: None,
        }
    }

    fn from_attacker(attacker: &Attacker) -> Self {
        Candidate {
            character_id: attacker.character_id,
            corporation_id: attacker.corporation_id,
            alliance_id: attacker.alliance_id,
            ship_type_id: attacker.ship_type_id,
            weapon_type_id: attacker.weapon_type_id,
        }
    }
}

async fn evaluate_condition(
    condition: &FilterCondition,
    event: &KillEvent,
    resolver: &dyn ReferenceResolver,
) -> MatchOutcome {
    let killmail = &event.killmail;

    match condition {
        FilterCondition::TotalValue { min, max } => {
            let total = event.appraisal.total_value;
            bool_outcome(
                min.is_none_or(|m| total >= m as f64) && max.is_none_or(|m| total <= m as f64),
            )
        }
        FilterCondition::DroppedValue { min, max } => {
            let dropped = event.appraisal.dropped_value;
            bool_outcome(
                min.is_none_or(|m| dropped >= m as f64) && max.is_none_or(|m| dropped <= m as f64),
            )
        }
        FilterCondition::Region(region_ids) => {
            match resolver.resolve_system(killmail.solar_system_id).await {
                Ok(system) => bool_outcome(region_ids.contains(&system.region_id)),
                Err(err) => resolution_miss(killmail.killmail_id, condition, err),
            }
        }
        FilterCondition::System(system_ids) => {
            bool_outcome(system_ids.contains(&killmail.solar_system_id))
        }
        FilterCondition::Security { min, max } => {
            match resolver.resolve_system(killmail.solar_system_id).await {
                Ok(system) => {
                    let security = effective_security(system.security_status);
                    bool_outcome(
                        min.is_none_or(|m| security >= m) && max.is_none_or(|m| security <= m),
                    )
                }
                Err(err) => resolution_miss(killmail.killmail_id, condition, err),
            }
        }
        FilterCondition::LyRangeFrom(ranges) => {
            let event_system = match resolver.resolve_system(killmail.solar_system_id).await {
                Ok(system) => system,
                Err(err) => return resolution_miss(killmail.killmail_id, condition, err),
            };
            for range in ranges {
                let base = match resolver.resolve_system(range.system_id).await {
                    Ok(system) => system,
                    Err(err) => return resolution_miss(killmail.killmail_id, condition, err),
                };
                if distance_ly(&event_system, &base) <= range.range_ly {
                    return MatchOutcome::hit();
                }
            }
            MatchOutcome::miss()
        }
        FilterCondition::IsNpc(flag) => bool_outcome(event.appraisal.npc == *flag),
        FilterCondition::IsSolo(flag) => bool_outcome(event.appraisal.solo == *flag),
        FilterCondition::Pilots { min, max } => {
            let pilots = event.pilot_count();
            if min.is_none_or(|m| pilots >= m) && max.is_none_or(|m| pilots <= m) {
                MatchOutcome {
                    matched: true,
                    matched_pilot_threshold: *min,
                    ..Default::default()
                }
            } else {
                MatchOutcome::miss()
            }
        }
        FilterCondition::TimeRange { start, end } => {
            let hour = killmail.killmail_time.hour();
            let in_range = if start <= end {
                hour >= *start && hour < *end
            } else {
                // Range spans midnight, e.g. 20:00 to 04:00.
                hour >= *start || hour < *end
            };
            bool_outcome(in_range)
        }
        FilterCondition::Alliance(_)
        | FilterCondition::Corporation(_)
        | FilterCondition::Character(_)
        | FilterCondition::ShipType(_) => evaluate_sided(condition, event, resolver, None).await,
        FilterCondition::ShipGroup(type_ids) => {
            // The configured entries are type IDs; both sides are compared
            // at the group level so one hull of a class covers the class.
            let mut groups = HashSet::new();
            for type_id in type_ids {
                match resolver.resolve_group(*type_id).await {
                    Ok(group_id) => {
                        groups.insert(group_id);
                    }
                    Err(err) => return resolution_miss(killmail.killmail_id, condition, err),
                }
            }
            evaluate_sided(condition, event, resolver, Some(&groups)).await
        }
        FilterCondition::NameFragment(fragment) => {
            evaluate_name_fragment(fragment, event, resolver).await
        }
    }
}

/// Victim-first scan shared by the side-aware conditions. A victim match
/// short-circuits; otherwise every attacker is scanned and each satisfying
/// index is collected.
async fn evaluate_sided(
    condition: &FilterCondition,
    event: &KillEvent,
    resolver: &dyn ReferenceResolver,
    groups: Option<&HashSet<u32>>,
) -> MatchOutcome {
    let killmail = &event.killmail;

    if candidate_matches(
        condition,
        &Candidate::from_victim(&killmail.victim),
        resolver,
        groups,
    )
    .await
    {
        return MatchOutcome::victim();
    }

    let mut matched = BTreeSet::new();
    for (index, attacker) in killmail.attackers.iter().enumerate() {
        if candidate_matches(
            condition,
            &Candidate::from_attacker(attacker),
            resolver,
            groups,
        )
        .await
        {
            matched.insert(index);
        }
    }

    if matched.is_empty() {
        MatchOutcome::miss()
    } else {
        MatchOutcome::attackers(matched)
    }
}

async fn candidate_matches(
    condition: &FilterCondition,
    candidate: &Candidate,
    resolver: &dyn ReferenceResolver,
    groups: Option<&HashSet<u32>>,
) -> bool {
    match condition {
        FilterCondition::Alliance(ids) => {
            candidate.alliance_id.is_some_and(|id| ids.contains(&id))
        }
        FilterCondition::Corporation(ids) => {
            candidate.corporation_id.is_some_and(|id| ids.contains(&id))
        }
        FilterCondition::Character(ids) => {
            candidate.character_id.is_some_and(|id| ids.contains(&id))
        }
        FilterCondition::ShipType(ids) => {
            candidate.ship_type_id.is_some_and(|id| ids.contains(&id))
                || candidate.weapon_type_id.is_some_and(|id| ids.contains(&id))
        }
        FilterCondition::ShipGroup(_) => {
            // The configured group set is resolved before the scan starts.
            let Some(groups) = groups else {
                return false;
            };
            candidate_group_matches(candidate.ship_type_id, resolver, groups).await
                || candidate_group_matches(candidate.weapon_type_id, resolver, groups).await
        }
        _ => false,
    }
}

/// An unresolvable candidate type fails closed without sinking the scan of
/// the remaining attackers.
async fn candidate_group_matches(
    type_id: Option<u32>,
    resolver: &dyn ReferenceResolver,
    groups: &HashSet<u32>,
) -> bool {
    let Some(type_id) = type_id else {
        return false;
    };
    match resolver.resolve_group(type_id).await {
        Ok(group_id) => groups.contains(&group_id),
        Err(err) => {
            warn!("failed to resolve group for type {}: {}", type_id, err);
            false
        }
    }
}

/// Case-sensitive fragment test against resolved ship and weapon names.
/// Side-free: a hit records no victim/attacker polarity. Unresolved
/// candidates fail closed.
async fn evaluate_name_fragment(
    fragment: &str,
    event: &KillEvent,
    resolver: &dyn ReferenceResolver,
) -> MatchOutcome {
    let killmail = &event.killmail;

    if name_contains(killmail.victim.ship_type_id as u64, fragment, resolver).await {
        return MatchOutcome::hit();
    }
    for attacker in &killmail.attackers {
        if let Some(ship_id) = attacker.ship_type_id {
            if name_contains(ship_id as u64, fragment, resolver).await {
                return MatchOutcome::hit();
            }
        }
        if let Some(weapon_id) = attacker.weapon_type_id {
            if name_contains(weapon_id as u64, fragment, resolver).await {
                return MatchOutcome::hit();
            }
        }
    }
    MatchOutcome::miss()
}

async fn name_contains(id: u64, fragment: &str, resolver: &dyn ReferenceResolver) -> bool {
    match resolver.resolve_name(id).await {
        Ok(name) => name.contains(fragment),
        Err(err) => {
            warn!("failed to resolve name for {}: {}", id, err);
            false
        }
    }
}

fn bool_outcome(matched: bool) -> MatchOutcome {
    if matched {
        MatchOutcome::hit()
    } else {
        MatchOutcome::miss()
    }
}

fn resolution_miss(kill_id: i64, condition: &FilterCondition, err: anyhow::Error) -> MatchOutcome {
    warn!(
        "[Kill: {}] resolution failed for {}: {}; condition fails closed",
        kill_id,
        condition.name(),
        err
    );
    MatchOutcome::miss()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        Appraisal, FilterCondition, FilterNode, Killmail, Position, SystemRange,
    };
    use crate::entities::filter::{security_above, security_below};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct MapResolver {
        systems: HashMap<u32, SolarSystem>,
        groups: HashMap<u32, u32>,
        names: HashMap<u64, String>,
    }

    #[async_trait]
    impl ReferenceResolver for MapResolver {
        async fn resolve_system(&self, system_id: u32) -> anyhow::Result<SolarSystem> {
            self.systems
                .get(&system_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown system {}", system_id))
        }

        async fn resolve_group(&self, type_id: u32) -> anyhow::Result<u32> {
            self.groups
                .get(&type_id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("unknown type {}", type_id))
        }

        async fn resolve_name(&self, id: u64) -> anyhow::Result<String> {
            self.names
                .get(&id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown name {}", id))
        }
    }

    fn system(system_id: u32, name: &str, region_id: u32, security: f64) -> SolarSystem {
        SolarSystem {
            system_id,
            name: name.to_string(),
            security_status: security,
            constellation_id: 20000001,
            region_id,
            region_name: format!("Region {}", region_id),
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    fn resolver() -> MapResolver {
        let mut systems = HashMap::new();
        let mut jita = system(30000142, "Jita", 10000002, 0.9);
        jita.x = -993254832640.0;
        jita.y = 216484356096.0;
        jita.z = -973193297920.0;
        systems.insert(30000142, jita);
        systems.insert(30002539, system(30002539, "Siseide", 10000030, 0.3));

        let mut groups = HashMap::new();
        groups.insert(587, 25); // Rifter -> Frigate
        groups.insert(671, 27); // Catalyst -> Destroyer
        groups.insert(17738, 419); // Golem -> Marauder
        groups.insert(19720, 485); // Naglfar -> Dreadnought
        groups.insert(19722, 485); // Revelation -> Dreadnought

        let mut names = HashMap::new();
        names.insert(587, "Rifter".to_string());
        names.insert(671, "Catalyst".to_string());
        names.insert(3, "125mm Gatling AutoCannon II".to_string());
        names.insert(19722, "Revelation".to_string());

        MapResolver {
            systems,
            groups,
            names,
        }
    }

    fn appraisal(total: f64) -> Appraisal {
        Appraisal {
            location_id: None,
            hash: String::new(),
            fitted_value: 0.0,
            dropped_value: 1_000_000.0,
            destroyed_value: 0.0,
            total_value: total,
            points: 0,
            npc: false,
            solo: false,
            awox: false,
        }
    }

    fn default_event() -> KillEvent {
        KillEvent {
            kill_id: 1,
            killmail: Killmail {
                killmail_id: 1,
                killmail_time: Utc.with_ymd_and_hms(2025, 7, 8, 12, 0, 0).unwrap(),
                solar_system_id: 30000142, // Jita
                victim: Victim {
                    character_id: Some(1),
                    corporation_id: Some(101),
                    alliance_id: Some(1001),
                    faction_id: None,
                    ship_type_id: 587, // Rifter
                    damage_taken: 1000,
                    position: Some(Position {
                        x: 0.0,
                        y: 0.0,
                        z: 0.0,
                    }),
                },
                attackers: vec![Attacker {
                    character_id: Some(2),
                    corporation_id: Some(102),
                    alliance_id: Some(1002),
                    faction_id: None,
                    ship_type_id: Some(671), // Catalyst
                    weapon_type_id: Some(3),
                    damage_done: 1000,
                    final_blow: true,
                    security_status: 0.5,
                }],
            },
            appraisal: appraisal(10_000_000.0),
        }
    }

    async fn check(node: &FilterNode, event: &KillEvent, expect_match: bool) -> MatchOutcome {
        let resolver = resolver();
        let outcome = evaluate(node, event, &resolver).await;
        assert_eq!(
            outcome.matched,
            expect_match,
            "unexpected outcome for {}",
            node.name()
        );
        outcome
    }

    fn condition(c: FilterCondition) -> FilterNode {
        FilterNode::Condition(c)
    }

    #[tokio::test]
    async fn empty_and_matches_everything() {
        let outcome = check(&FilterNode::And(vec![]), &default_event(), true).await;
        assert!(!outcome.victim_matched);
        assert!(outcome.matched_attackers.is_empty());
    }

    #[tokio::test]
    async fn empty_or_matches_nothing() {
        check(&FilterNode::Or(vec![]), &default_event(), false).await;
    }

    #[tokio::test]
    async fn not_inverts_and_clears_provenance() {
        let event = default_event();
        let inner = condition(FilterCondition::Alliance(vec![1001]));

        let direct = check(&inner, &event, true).await;
        assert!(direct.victim_matched);

        let negated = check(&FilterNode::Not(Box::new(inner)), &event, false).await;
        assert_eq!(negated, MatchOutcome::miss());

        let inverted = check(
            &FilterNode::Not(Box::new(condition(FilterCondition::Alliance(vec![9999])))),
            &event,
            true,
        )
        .await;
        assert!(!inverted.victim_matched);
        assert!(inverted.matched_attackers.is_empty());
    }

    #[tokio::test]
    async fn total_value_bounds_are_optional_and_inclusive() {
        let event = default_event(); // 10m total
        for (min, max, expect) in [
            (Some(5_000_000), None, true),
            (Some(10_000_000), None, true),
            (Some(15_000_000), None, false),
            (None, Some(10_000_000), true),
            (None, Some(5_000_000), false),
            (None, None, true),
        ] {
            check(
                &condition(FilterCondition::TotalValue { min, max }),
                &event,
                expect,
            )
            .await;
        }
    }

    #[tokio::test]
    async fn region_and_system_membership() {
        let event = default_event();
        check(&condition(FilterCondition::Region(vec![10000002])), &event, true).await;
        check(&condition(FilterCondition::Region(vec![10000043])), &event, false).await;
        check(&condition(FilterCondition::System(vec![30000142])), &event, true).await;
        check(&condition(FilterCondition::System(vec![31002222])), &event, false).await;
    }

    #[tokio::test]
    async fn security_rounds_up_to_tier_at_045_and_above() {
        // Raw statuses at or above 0.45 report as the 0.5 tier.
        for (raw, expect) in [
            (0.4608, true),
            (0.4567, true),
            (0.4405, false),
            (0.4387, false),
            (0.4257, false),
        ] {
            let mut resolver = resolver();
            resolver
                .systems
                .insert(30009999, system(30009999, "Test", 10000099, raw));
            let mut event = default_event();
            event.killmail.solar_system_id = 30009999;

            let node = condition(FilterCondition::Security {
                min: Some(0.5),
                max: None,
            });
            let outcome = evaluate(&node, &event, &resolver).await;
            assert_eq!(outcome.matched, expect, "raw status {}", raw);
        }
    }

    #[tokio::test]
    async fn lowsec_filter_uses_exclusive_tier_bounds() {
        let node = condition(FilterCondition::Security {
            min: Some(security_above(0.0)),
            max: Some(security_below(0.5)),
        });

        for (raw, expect) in [(0.029, true), (-0.005, false), (0.46, false)] {
            let mut resolver = resolver();
            resolver
                .systems
                .insert(30009999, system(30009999, "Test", 10000099, raw));
            let mut event = default_event();
            event.killmail.solar_system_id = 30009999;

            let outcome = evaluate(&node, &event, &resolver).await;
            assert_eq!(outcome.matched, expect, "raw status {}", raw);
        }
    }

    #[tokio::test]
    async fn ship_group_matches_whole_class_from_one_type_id() {
        // Filter configured with a Naglfar type ID; the victim flies a
        // Revelation. Same group (Dreadnought), different type.
        let mut event = default_event();
        event.killmail.victim.ship_type_id = 19722;

        let outcome = check(
            &condition(FilterCondition::ShipGroup(vec![19720])),
            &event,
            true,
        )
        .await;
        assert!(outcome.victim_matched);
        assert!(outcome.matched_attackers.is_empty());
    }

    #[tokio::test]
    async fn victim_match_short_circuits_attacker_scan() {
        // Victim and attacker are both in the set; the victim wins and the
        // attackers are not scanned.
        let event = default_event();
        let outcome = check(
            &condition(FilterCondition::Corporation(vec![101, 102])),
            &event,
            true,
        )
        .await;
        assert!(outcome.victim_matched);
        assert!(outcome.matched_attackers.is_empty());
    }

    #[tokio::test]
    async fn attacker_matches_are_collected_by_index() {
        let mut event = default_event();
        event.killmail.attackers.push(Attacker {
            character_id: Some(3),
            corporation_id: Some(103),
            alliance_id: Some(1002),
            faction_id: None,
            ship_type_id: Some(587),
            weapon_type_id: None,
            damage_done: 50,
            final_blow: false,
            security_status: 0.0,
        });

        let outcome = check(
            &condition(FilterCondition::Alliance(vec![1002])),
            &event,
            true,
        )
        .await;
        assert!(!outcome.victim_matched);
        assert_eq!(
            outcome.matched_attackers.iter().copied().collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn ship_type_checks_ship_and_weapon_ids_directly() {
        let event = default_event();
        // Victim's Rifter.
        let outcome = check(&condition(FilterCondition::ShipType(vec![587])), &event, true).await;
        assert!(outcome.victim_matched);
        // Attacker's weapon type.
        let outcome = check(&condition(FilterCondition::ShipType(vec![3])), &event, true).await;
        assert_eq!(
            outcome.matched_attackers.iter().copied().collect::<Vec<_>>(),
            vec![0]
        );
        check(&condition(FilterCondition::ShipType(vec![17738])), &event, false).await;
    }

    #[tokio::test]
    async fn and_unions_provenance_across_children() {
        let mut event = default_event();
        event.killmail.attackers.push(Attacker {
            character_id: Some(4),
            corporation_id: Some(104),
            alliance_id: Some(1004),
            faction_id: None,
            ship_type_id: Some(19720), // Naglfar
            weapon_type_id: None,
            damage_done: 9000,
            final_blow: false,
            security_status: -10.0,
        });

        // First child matches attacker 1 (Dreadnought), second child
        // matches attacker 0 (alliance). The union identifies both.
        let node = FilterNode::And(vec![
            condition(FilterCondition::ShipGroup(vec![19720])),
            condition(FilterCondition::Alliance(vec![1002])),
        ]);
        let outcome = check(&node, &event, true).await;
        assert!(!outcome.victim_matched);
        assert_eq!(
            outcome.matched_attackers.iter().copied().collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn and_fails_when_any_child_fails() {
        let event = default_event();
        let node = FilterNode::And(vec![
            condition(FilterCondition::Region(vec![10000002])),
            condition(FilterCondition::ShipGroup(vec![17738])), // Marauder, absent
        ]);
        check(&node, &event, false).await;
    }

    #[tokio::test]
    async fn or_takes_first_matching_child_in_list_order() {
        let event = default_event();
        // Both children match; the first one (victim-side corporation)
        // supplies the provenance.
        let node = FilterNode::Or(vec![
            condition(FilterCondition::Corporation(vec![101])),
            condition(FilterCondition::Alliance(vec![1002])),
        ]);
        let outcome = check(&node, &event, true).await;
        assert!(outcome.victim_matched);
        assert!(outcome.matched_attackers.is_empty());

        // Reversed order flips the winner.
        let node = FilterNode::Or(vec![
            condition(FilterCondition::Alliance(vec![1002])),
            condition(FilterCondition::Corporation(vec![101])),
        ]);
        let outcome = check(&node, &event, true).await;
        assert!(!outcome.victim_matched);
        assert_eq!(
            outcome.matched_attackers.iter().copied().collect::<Vec<_>>(),
            vec![0]
        );
    }

    #[tokio::test]
    async fn side_free_condition_does_not_erase_polarity_under_and() {
        let event = default_event();
        let node = FilterNode::And(vec![
            condition(FilterCondition::Alliance(vec![1001])),
            condition(FilterCondition::TotalValue {
                min: Some(5_000_000),
                max: None,
            }),
        ]);
        let outcome = check(&node, &event, true).await;
        assert!(outcome.victim_matched);
    }

    #[tokio::test]
    async fn name_fragment_is_case_sensitive_and_fails_closed() {
        let event = default_event();
        check(
            &condition(FilterCondition::NameFragment("Rift".to_string())),
            &event,
            true,
        )
        .await;
        check(
            &condition(FilterCondition::NameFragment("rift".to_string())),
            &event,
            false,
        )
        .await;
        // Attacker weapon name.
        check(
            &condition(FilterCondition::NameFragment("Gatling".to_string())),
            &event,
            true,
        )
        .await;

        // Unknown names resolve to errors and fail closed.
        let mut event = event;
        event.killmail.victim.ship_type_id = 99999;
        event.killmail.attackers.clear();
        check(
            &condition(FilterCondition::NameFragment("Rift".to_string())),
            &event,
            false,
        )
        .await;
    }

    #[tokio::test]
    async fn time_range_is_half_open_and_wraps_midnight() {
        let node = condition(FilterCondition::TimeRange { start: 20, end: 4 });
        for (hour, expect) in [(23, true), (2, true), (10, false), (4, false), (20, true)] {
            let mut event = default_event();
            event.killmail.killmail_time =
                Utc.with_ymd_and_hms(2025, 7, 8, hour, 30, 0).unwrap();
            check(&node, &event, expect).await;
        }

        // Non-wrapping range: end hour is excluded.
        let node = condition(FilterCondition::TimeRange { start: 11, end: 13 });
        for (hour, expect) in [(11, true), (12, true), (13, false), (10, false)] {
            let mut event = default_event();
            event.killmail.killmail_time =
                Utc.with_ymd_and_hms(2025, 7, 8, hour, 0, 0).unwrap();
            check(&node, &event, expect).await;
        }
    }

    #[tokio::test]
    async fn pilot_count_includes_victim_and_records_threshold() {
        let event = default_event(); // 1 attacker + victim = 2
        let outcome = check(
            &condition(FilterCondition::Pilots {
                min: Some(2),
                max: None,
            }),
            &event,
            true,
        )
        .await;
        assert_eq!(outcome.matched_pilot_threshold, Some(2));

        check(
            &condition(FilterCondition::Pilots {
                min: Some(3),
                max: None,
            }),
            &event,
            false,
        )
        .await;
        let outcome = check(
            &condition(FilterCondition::Pilots {
                min: None,
                max: Some(2),
            }),
            &event,
            true,
        )
        .await;
        assert_eq!(outcome.matched_pilot_threshold, None);
    }

    #[tokio::test]
    async fn ly_range_matches_within_any_base_threshold() {
        let mut resolver = resolver();
        let mut near = system(30000143, "Perimeter", 10000002, 0.9);
        // Roughly one light year from Jita on the x axis.
        near.x = -993254832640.0 + 9_460_730_472_580_800.0;
        near.y = 216484356096.0;
        near.z = -973193297920.0;
        resolver.systems.insert(30000143, near);

        let event = default_event(); // in Jita

        let node = condition(FilterCondition::LyRangeFrom(vec![SystemRange {
            system_id: 30000143,
            range_ly: 1.5,
        }]));
        assert!(evaluate(&node, &event, &resolver).await.matched);

        let node = condition(FilterCondition::LyRangeFrom(vec![SystemRange {
            system_id: 30000143,
            range_ly: 0.5,
        }]));
        assert!(!evaluate(&node, &event, &resolver).await.matched);
    }

    #[tokio::test]
    async fn resolution_failure_fails_the_condition_closed() {
        let mut event = default_event();
        event.killmail.solar_system_id = 31009999; // unknown to the resolver

        let security = condition(FilterCondition::Security {
            min: Some(0.5),
            max: None,
        });
        check(&security, &event, false).await;

        // Not(condition) over a failed resolution matches: the condition
        // itself evaluated to non-match.
        check(&FilterNode::Not(Box::new(security)), &event, true).await;
    }

    #[tokio::test]
    async fn npc_and_solo_flags() {
        let mut event = default_event();
        event.appraisal.npc = true;
        check(&condition(FilterCondition::IsNpc(true)), &event, true).await;
        check(&condition(FilterCondition::IsNpc(false)), &event, false).await;
        check(&condition(FilterCondition::IsSolo(false)), &event, true).await;
    }

    #[tokio::test]
    async fn dreadnought_kill_matches_capital_subscription_end_to_end() {
        let mut event = default_event();
        event.appraisal.total_value = 2_000_000_000.0;
        event.killmail.victim.ship_type_id = 19722; // Revelation
        event.killmail.solar_system_id = 30009999;

        let mut resolver = resolver();
        resolver
            .systems
            .insert(30009999, system(30009999, "Amamake", 10000030, 0.05));

        let node = FilterNode::And(vec![
            condition(FilterCondition::TotalValue {
                min: Some(1_000_000_000),
                max: None,
            }),
            condition(FilterCondition::ShipGroup(vec![19720])),
            condition(FilterCondition::Security {
                min: Some(0.0),
                max: Some(0.4999),
            }),
        ]);

        let outcome = evaluate(&node, &event, &resolver).await;
        assert!(outcome.matched);
        assert!(outcome.victim_matched);
    }
}
