//! Damage, death and respawn.
//!
//! A player is Alive until a hit takes their hp to zero or below, Dead until
//! their respawn fires, then Alive again. Hits against dead players are
//! dropped, so late-arriving hits can never award a second kill.

use crate::registry::PlayerRegistry;
use crate::router::Outbound;
use log::{debug, info};
use shared::{ClientId, Packet, MAX_HP};

/// A pending respawn for one death of one player.
///
/// `death_token` is the victim's death count at the moment they died. The
/// respawn only applies while the player is still dead from that same death.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnTicket {
    pub player_id: ClientId,
    pub death_token: u32,
}

/// Everything a single hit caused.
#[derive(Debug, Default)]
pub struct HitReport {
    pub messages: Vec<Outbound>,
    pub respawn: Option<RespawnTicket>,
}

impl HitReport {
    pub fn killed(&self) -> bool {
        self.respawn.is_some()
    }
}

/// Applies `damage` from `attacker` to `target`.
///
/// Damage is trusted as reported. The raw hp (possibly negative) is
/// broadcast; clients clamp it for display. A dead player's stored hp is
/// held at zero so later snapshots never carry a negative value.
pub fn apply_hit(
    registry: &mut PlayerRegistry,
    attacker: ClientId,
    target: ClientId,
    damage: i32,
) -> HitReport {
    let mut report = HitReport::default();

    let Some(victim) = registry.get_mut(target) else {
        debug!("Hit on unknown player {} from {} ignored", target, attacker);
        return report;
    };
    if victim.is_dead {
        debug!("Hit on dead player {} from {} ignored", target, attacker);
        return report;
    }

    victim.hp = victim.hp.saturating_sub(damage);
    let hp = victim.hp;
    report.messages.push(Outbound::broadcast(Packet::HpUpdate {
        player_id: target,
        hp,
    }));

    if hp > 0 {
        return report;
    }

    victim.hp = 0;
    victim.is_dead = true;
    victim.deaths += 1;
    let death_token = victim.deaths;

    match registry.get_mut(attacker) {
        Some(killer) => killer.kills += 1,
        None => debug!("Killer {} already gone, no credit for {}", attacker, target),
    }

    info!("Player {} killed by {}", target, attacker);
    report.messages.push(Outbound::broadcast(Packet::PlayerDied {
        player_id: target,
        killer_id: attacker,
    }));
    report
        .messages
        .push(Outbound::broadcast(Packet::ScoreUpdate(registry.scoreboard())));
    report.respawn = Some(RespawnTicket {
        player_id: target,
        death_token,
    });

    report
}

/// Fires a scheduled respawn.
///
/// Does nothing if the player left, was already revived (for example by a
/// map change), or has died again since the ticket was issued.
pub fn respawn(registry: &mut PlayerRegistry, ticket: RespawnTicket) -> Option<Outbound> {
    let current = registry.get(ticket.player_id)?;
    if !current.is_dead || current.deaths != ticket.death_token {
        debug!(
            "Stale respawn for player {} (death {}) skipped",
            ticket.player_id, ticket.death_token
        );
        return None;
    }

    let position = registry.spawn_point();
    let player = registry.get_mut(ticket.player_id)?;
    player.revive(position);

    info!(
        "Player {} respawned at ({:.1}, {:.1})",
        ticket.player_id, position.x, position.z
    );
    Some(Outbound::broadcast(Packet::PlayerRespawn {
        player_id: ticket.player_id,
        position,
        hp: MAX_HP,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::BuiltinLevels;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn registry_with(ids: &[ClientId]) -> PlayerRegistry {
        let mut registry =
            PlayerRegistry::with_rng(Box::new(BuiltinLevels::new()), "arena", StdRng::seed_from_u64(3))
                .unwrap();
        for &id in ids {
            registry.create_player(id, None);
        }
        registry
    }

    fn packets(report: &HitReport) -> Vec<&Packet> {
        report.messages.iter().map(|m| m.packet()).collect()
    }

    #[test]
    fn test_non_lethal_hit() {
        let mut registry = registry_with(&[1, 2]);
        let report = apply_hit(&mut registry, 2, 1, 60);

        assert!(!report.killed());
        assert_eq!(report.messages.len(), 1);
        assert!(matches!(packets(&report)[0], Packet::HpUpdate { player_id: 1, hp: 40 }));
        assert_eq!(registry.get(1).unwrap().hp, 40);
        assert!(!registry.get(1).unwrap().is_dead);
    }

    #[test]
    fn test_two_hits_kill_and_credit() {
        let mut registry = registry_with(&[1, 2]);
        apply_hit(&mut registry, 2, 1, 60);
        let report = apply_hit(&mut registry, 2, 1, 60);

        let sent = packets(&report);
        assert_eq!(sent.len(), 3);
        assert!(matches!(sent[0], Packet::HpUpdate { player_id: 1, hp: -20 }));
        assert!(matches!(sent[1], Packet::PlayerDied { player_id: 1, killer_id: 2 }));
        match sent[2] {
            Packet::ScoreUpdate(board) => {
                assert_eq!(board[0].id, 2);
                assert_eq!(board[0].kills, 1);
                assert_eq!(board[1].deaths, 1);
            }
            other => panic!("Expected score update, got {:?}", other),
        }

        assert_eq!(
            report.respawn,
            Some(RespawnTicket {
                player_id: 1,
                death_token: 1
            })
        );
        assert!(registry.get(1).unwrap().is_dead);
    }

    #[test]
    fn test_hit_on_dead_player_is_ignored() {
        let mut registry = registry_with(&[1, 2]);
        apply_hit(&mut registry, 2, 1, 150);

        let report = apply_hit(&mut registry, 2, 1, 150);
        assert!(report.messages.is_empty());
        assert!(!report.killed());
        assert_eq!(registry.get(2).unwrap().kills, 1);
        assert_eq!(registry.get(1).unwrap().deaths, 1);
        assert_eq!(registry.get(1).unwrap().hp, 0);
    }

    #[test]
    fn test_hit_on_unknown_player_is_ignored() {
        let mut registry = registry_with(&[1]);
        let report = apply_hit(&mut registry, 1, 77, 50);
        assert!(report.messages.is_empty());
    }

    #[test]
    fn test_kill_after_attacker_left_drops_credit() {
        let mut registry = registry_with(&[1, 2]);
        registry.remove(2);

        let report = apply_hit(&mut registry, 2, 1, 100);
        assert!(report.killed());
        assert_eq!(registry.get(1).unwrap().deaths, 1);
        assert!(matches!(
            packets(&report)[1],
            Packet::PlayerDied { player_id: 1, killer_id: 2 }
        ));
    }

    #[test]
    fn test_respawn_restores_player() {
        let mut registry = registry_with(&[1, 2]);
        let ticket = apply_hit(&mut registry, 2, 1, 100).respawn.unwrap();

        let message = respawn(&mut registry, ticket).unwrap();
        let player = registry.get(1).unwrap();
        assert_eq!(player.hp, MAX_HP);
        assert!(!player.is_dead);
        match message.packet() {
            Packet::PlayerRespawn { player_id, position, hp } => {
                assert_eq!(*player_id, 1);
                assert_eq!(*hp, MAX_HP);
                assert_eq!(*position, player.position);
            }
            other => panic!("Expected respawn, got {:?}", other),
        }
    }

    #[test]
    fn test_respawn_fires_once() {
        let mut registry = registry_with(&[1, 2]);
        let ticket = apply_hit(&mut registry, 2, 1, 100).respawn.unwrap();

        assert!(respawn(&mut registry, ticket).is_some());
        assert!(respawn(&mut registry, ticket).is_none());
    }

    #[test]
    fn test_stale_respawn_after_map_change_and_second_death() {
        let mut registry = registry_with(&[1, 2]);
        let first = apply_hit(&mut registry, 2, 1, 100).respawn.unwrap();

        // Map change revives the victim before the first timer fires
        registry.change_map("courtyard").unwrap();
        let second = apply_hit(&mut registry, 2, 1, 100).respawn.unwrap();

        assert!(respawn(&mut registry, first).is_none());
        assert!(registry.get(1).unwrap().is_dead);
        assert!(respawn(&mut registry, second).is_some());
    }

    #[test]
    fn test_respawn_for_departed_player() {
        let mut registry = registry_with(&[1, 2]);
        let ticket = apply_hit(&mut registry, 2, 1, 100).respawn.unwrap();
        registry.remove(1);

        assert!(respawn(&mut registry, ticket).is_none());
    }
}
