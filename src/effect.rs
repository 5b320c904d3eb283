use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Resume the battle script after `duration`.
    Wait { ticket: u64, duration: Duration },
    /// Reveal the next dialog character after `delay`.
    TypeLetter { ticket: u64, delay: Duration },
    PlaySound(&'static str),
    PlayMusic(&'static str),
    PauseMusic(bool),
}
