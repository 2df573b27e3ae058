//! Phase machine for multi-model deliberation

use std::fmt;

/// Where a deliberation currently stands
///
/// Driven entirely by caller-owned counters: nothing advances on its own
/// and no ordering between participants is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusPhase {
    /// Step 1: restate the proposal with the caller's model
    Framing,
    /// Ask participant `index` for its stance-shaped opinion
    Consulting { index: usize },
    /// Every participant is past; combine the collected responses
    Synthesizing,
}

impl ConsensusPhase {
    pub fn determine(step_number: u32, current_model_index: usize, participants: usize) -> Self {
        if step_number == 1 {
            ConsensusPhase::Framing
        } else if current_model_index < participants {
            ConsensusPhase::Consulting {
                index: current_model_index,
            }
        } else {
            ConsensusPhase::Synthesizing
        }
    }

    /// Index the caller should send next, while consulting
    pub fn next_model_index(&self) -> Option<usize> {
        match self {
            ConsensusPhase::Framing => Some(0),
            ConsensusPhase::Consulting { index } => Some(index + 1),
            ConsensusPhase::Synthesizing => None,
        }
    }
}

impl fmt::Display for ConsensusPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusPhase::Framing => write!(f, "framing"),
            ConsensusPhase::Consulting { .. } => write!(f, "consulting"),
            ConsensusPhase::Synthesizing => write!(f, "synthesizing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        assert_eq!(ConsensusPhase::determine(1, 0, 2), ConsensusPhase::Framing);
        // step 1 frames even when an index is supplied
        assert_eq!(ConsensusPhase::determine(1, 1, 2), ConsensusPhase::Framing);
        assert_eq!(
            ConsensusPhase::determine(2, 0, 2),
            ConsensusPhase::Consulting { index: 0 }
        );
        assert_eq!(
            ConsensusPhase::determine(3, 1, 2),
            ConsensusPhase::Consulting { index: 1 }
        );
        assert_eq!(ConsensusPhase::determine(4, 2, 2), ConsensusPhase::Synthesizing);
    }

    #[test]
    fn test_skipping_participants_is_allowed() {
        assert_eq!(
            ConsensusPhase::determine(2, 1, 3),
            ConsensusPhase::Consulting { index: 1 }
        );
    }

    #[test]
    fn test_next_model_index_hint() {
        assert_eq!(ConsensusPhase::Framing.next_model_index(), Some(0));
        assert_eq!(ConsensusPhase::Consulting { index: 0 }.next_model_index(), Some(1));
        assert_eq!(ConsensusPhase::Synthesizing.next_model_index(), None);
        assert_eq!(ConsensusPhase::Consulting { index: 0 }.to_string(), "consulting");
    }
}
