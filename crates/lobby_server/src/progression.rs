//! Level/XP transitions.
//!
//! The server is authoritative over the computed values; persistence is
//! peer-owned. After an award the coordinator sends the updated record back
//! to its owning peer, which forwards it to the external save collaborator.

use shared::records::Progression;
use tracing::debug;

use crate::config::LobbyConfig;

/// XP needed to advance out of `level`. Levels start at 1, so the first
/// threshold is exactly `base_xp`.
pub fn xp_threshold(config: &LobbyConfig, level: u32) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    (config.base_xp as f64 * config.xp_multiplier.powi(exponent)).floor() as u32
}

/// Adds `amount` to the progression's XP and applies as many level-ups as the
/// thresholds allow, carrying the remainder forward.
pub fn award_xp(config: &LobbyConfig, progression: &mut Progression, amount: u32) {
    progression.current_xp = progression.current_xp.saturating_add(amount);

    let mut needed = xp_threshold(config, progression.level);
    while progression.current_xp >= needed {
        progression.current_xp -= needed;
        progression.level += 1;
        needed = xp_threshold(config, progression.level);
    }

    debug!(
        level = progression.level,
        xp = progression.current_xp,
        "xp award applied"
    );
}
