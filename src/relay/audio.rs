//! Audio session collaborator

/// Platform audio session used around reroute cues
pub trait AudioSession: Send {
    /// Mix navigation audio with other playing audio (ambient category)
    fn mix_ambient(&mut self) -> anyhow::Result<()>;

    /// Play the short cue announcing a reroute
    fn play_reroute_cue(&mut self);
}
