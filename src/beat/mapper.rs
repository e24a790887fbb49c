//! Beat index to round/block/slot coordinates
//!
//! Pure functions over non-negative beat indices. Divisors come from a
//! validated [`BeatConfig`] and are therefore non-zero.
//!
//! Blocks are counted globally, not per round: even blocks are silent reveal
//! blocks, odd blocks are active blocks that cue one slot per beat. A round's
//! reveal/active split only lines up with the round boundary when
//! `beats_per_round` is a multiple of `2 * block_size`.

use super::BeatConfig;

/// 1-based round number for a global beat index
pub fn round_of(beat: u64, beats_per_round: u64) -> u64 {
    beat / beats_per_round + 1
}

/// Global block index (not reset per round)
pub fn block_index_of(beat: u64, block_size: u64) -> u64 {
    beat / block_size
}

/// Odd blocks cue slots, even blocks reveal the round unhighlighted
pub fn is_active_block(block_index: u64) -> bool {
    block_index % 2 == 1
}

/// 0-based slot cued at this beat; only meaningful inside an active block
pub fn focused_slot_of(beat: u64, steps_per_round: u64) -> u64 {
    beat % steps_per_round
}

/// Whether the beat lies past the last round
pub fn is_complete(beat: u64, beats_per_round: u64, total_rounds: usize) -> bool {
    round_of(beat, beats_per_round) > total_rounds as u64
}

/// Whether `slot_index` is the highlighted slot at `beat`
pub fn should_highlight_slot(
    beat: u64,
    slot_index: u64,
    block_size: u64,
    steps_per_round: u64,
) -> bool {
    if !is_active_block(block_index_of(beat, block_size)) {
        return false;
    }
    focused_slot_of(beat, steps_per_round) == slot_index
}

/// Every coordinate derived from one beat index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatPosition {
    /// Global beat index
    pub beat: u64,
    /// 1-based round number
    pub round: u64,
    /// Global block index
    pub block_index: u64,
    /// Whether the block cues slots
    pub is_active: bool,
    /// Cued slot, `None` in reveal blocks
    pub focused_slot: Option<usize>,
    /// Beat lies past the last round
    pub is_complete: bool,
}

impl BeatPosition {
    /// Locate a beat within a challenge of `total_rounds` rounds
    pub fn locate(beat: u64, config: &BeatConfig, total_rounds: usize) -> Self {
        let round = round_of(beat, config.beats_per_round);
        let block_index = block_index_of(beat, config.block_size);
        let complete = is_complete(beat, config.beats_per_round, total_rounds);
        let is_active = !complete && is_active_block(block_index);
        let focused_slot = if is_active {
            Some(focused_slot_of(beat, config.steps_per_round) as usize)
        } else {
            None
        };

        BeatPosition {
            beat,
            round,
            block_index,
            is_active,
            focused_slot,
            is_complete: complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_of() {
        assert_eq!(round_of(0, 16), 1);
        assert_eq!(round_of(15, 16), 1);
        assert_eq!(round_of(16, 16), 2);
        assert_eq!(round_of(79, 16), 5);
    }

    #[test]
    fn test_block_index_of() {
        assert_eq!(block_index_of(0, 8), 0);
        assert_eq!(block_index_of(7, 8), 0);
        assert_eq!(block_index_of(8, 8), 1);
        assert_eq!(block_index_of(23, 8), 2);
    }

    #[test]
    fn test_active_blocks_alternate() {
        assert!(!is_active_block(0));
        assert!(is_active_block(1));
        assert!(!is_active_block(2));
        assert!(is_active_block(3));
    }

    #[test]
    fn test_focused_slot_of() {
        assert_eq!(focused_slot_of(9, 8), 1);
        assert_eq!(focused_slot_of(15, 8), 7);
        assert_eq!(focused_slot_of(16, 8), 0);
    }

    #[test]
    fn test_is_complete() {
        assert!(!is_complete(79, 16, 5));
        for beat in 80..200 {
            assert!(is_complete(beat, 16, 5), "beat {beat} should be complete");
        }
        assert!(is_complete(0, 16, 0));
    }

    #[test]
    fn test_should_highlight_slot() {
        // Reveal block never highlights
        for beat in 0..8 {
            assert!(!should_highlight_slot(beat, beat % 8, 8, 8));
        }
        assert!(should_highlight_slot(8, 0, 8, 8));
        assert!(should_highlight_slot(13, 5, 8, 8));
        assert!(!should_highlight_slot(13, 4, 8, 8));
    }

    #[test]
    fn test_locate_reveal_and_active() {
        let config = BeatConfig::default();

        let reveal = BeatPosition::locate(3, &config, 5);
        assert_eq!(reveal.round, 1);
        assert!(!reveal.is_active);
        assert_eq!(reveal.focused_slot, None);

        let active = BeatPosition::locate(12, &config, 5);
        assert_eq!(active.round, 1);
        assert_eq!(active.block_index, 1);
        assert!(active.is_active);
        assert_eq!(active.focused_slot, Some(4));
        assert!(!active.is_complete);
    }

    #[test]
    fn test_locate_past_last_round() {
        let config = BeatConfig::default();
        let done = BeatPosition::locate(88, &config, 5);
        assert!(done.is_complete);
        assert_eq!(done.round, 6);
        assert_eq!(done.focused_slot, None);
    }

    #[test]
    fn test_unaligned_round_keeps_global_blocks() {
        // 24 beats per round with 8-beat blocks: round 2 starts inside an active block
        let config = BeatConfig {
            beats_per_round: 24,
            ..BeatConfig::default()
        };
        let start_of_round_two = BeatPosition::locate(24, &config, 3);
        assert_eq!(start_of_round_two.round, 2);
        assert_eq!(start_of_round_two.block_index, 3);
        assert!(start_of_round_two.is_active);
    }
}
