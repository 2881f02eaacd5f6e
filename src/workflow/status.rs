use crate::{
    foundation::error::{MockupError, MockupResult},
    store::artworks::ArtworkStatus,
};

/// Operations that move an artwork through its workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Approve,
    Decline,
    Retry,
    /// Background recompose of an already approved artwork.
    Reapply,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Decline => "decline",
            Self::Retry => "retry",
            Self::Reapply => "reapply",
        }
    }
}

/// Status an artwork ends in when `action` succeeds from `current`.
///
/// `Generating` is transient: nothing may act on an artwork while it is composing.
pub fn transition(current: ArtworkStatus, action: Action) -> MockupResult<ArtworkStatus> {
    use ArtworkStatus::*;

    let next = match (action, current) {
        (Action::Approve, Pending | Approved) => Approved,
        (Action::Decline, Pending | Approved | NeedsAttention) => NeedsAttention,
        (Action::Retry, NeedsAttention | Declined) => Pending,
        (Action::Reapply, Approved) => Approved,
        _ => {
            return Err(MockupError::conflict(format!(
                "cannot {} an artwork that is {current}",
                action.as_str()
            )));
        }
    };
    Ok(next)
}

#[cfg(test)]
#[path = "../../tests/unit/workflow/status.rs"]
mod tests;
