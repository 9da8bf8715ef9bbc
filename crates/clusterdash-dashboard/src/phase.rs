/// Progress of one send (chat) or generate interaction.
///
/// `Idle -> Sending -> Streaming -> Idle`, or straight back to `Idle` when a
/// non-streaming reply or an error arrives. Only `Idle` accepts a new send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionPhase {
    #[default]
    Idle,
    Sending,
    Streaming,
}

impl InteractionPhase {
    pub fn is_busy(self) -> bool {
        !matches!(self, InteractionPhase::Idle)
    }
}
