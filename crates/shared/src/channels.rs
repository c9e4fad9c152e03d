//! Logical network channels for lobby traffic.

/// Identifier of a logical channel on the transport.
pub type ChannelId = u8;

/// Reliable ordered channel for lobby control (join, ready, start, acks).
pub const LOBBY_CONTROL: ChannelId = 0;

/// Reliable ordered channel for roster state (snapshots, spawn seeds, saves).
pub const ROSTER_STATE: ChannelId = 1;

/// Reliable ordered channel for chat relay traffic.
pub const CHAT: ChannelId = 2;

/// Human-readable labels, useful for logging and diagnostics.
pub const CHANNEL_LABELS: [(ChannelId, &str); 3] = [
    (LOBBY_CONTROL, "lobby-control"),
    (ROSTER_STATE, "roster-state"),
    (CHAT, "chat"),
];

/// Returns the label for a channel id, if it is a known lobby channel.
pub fn label(id: ChannelId) -> Option<&'static str> {
    CHANNEL_LABELS
        .iter()
        .find(|(channel, _)| *channel == id)
        .map(|(_, label)| *label)
}
