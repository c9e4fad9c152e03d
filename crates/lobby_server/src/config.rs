//! Lobby configuration.

/// Tunables for the lobby coordinator.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Maximum number of admitted peers (roster capacity).
    pub max_players: usize,
    /// XP needed to leave level 1.
    pub base_xp: u32,
    /// Per-level growth factor for the XP threshold.
    pub xp_multiplier: f64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_players: 5,
            base_xp: 100,
            xp_multiplier: 1.2,
        }
    }
}
