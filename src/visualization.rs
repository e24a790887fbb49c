//! Terminal Visualization Utilities
//!
//! Text renderings of a [`RenderState`] for terminal front ends. Nothing here
//! talks to the terminal; callers print the returned strings.

use crate::challenge::Slot;
use crate::game::RenderState;
use crate::phase::GamePhase;
use std::fmt::Write;

/// Create a Unicode block bar for a progress fraction
///
/// Generates a fixed-width string with █ characters proportional to `fraction`,
/// padded with spaces to keep the width constant between frames.
///
/// # Arguments
/// * `fraction` - Progress value (0.0 to 1.0, clamped internally)
/// * `max_length` - Bar length in characters (also the fixed output width)
pub fn create_progress_bar(fraction: f64, max_length: usize) -> String {
    let normalized = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let block_count = ((normalized * max_length as f64) as usize).min(max_length);
    let blocks = "█".repeat(block_count);
    let spaces = " ".repeat(max_length - block_count);
    format!("{}{}", blocks, spaces)
}

/// Label shown for a slot: its display text when names are on, else the
/// image file name, else blank
fn slot_caption(slot: &Slot, show_names: bool) -> String {
    if show_names {
        if let Some(label) = slot.label.as_deref().filter(|l| !l.is_empty()) {
            return label.to_string();
        }
    }
    slot.image
        .as_deref()
        .and_then(|image| image.rsplit('/').next())
        .unwrap_or("")
        .to_string()
}

/// Create one row of slot cells with the focused slot highlighted
///
/// Each cell is `cell_width` characters of caption (truncated or padded)
/// wrapped in brackets; the focused cell uses `>` `<` instead.
pub fn create_slot_row(
    slots: &[Slot],
    focused: Option<usize>,
    show_names: bool,
    cell_width: usize,
) -> String {
    let mut row = String::with_capacity(slots.len() * (cell_width + 2));
    for (index, slot) in slots.iter().enumerate() {
        let caption: String = slot_caption(slot, show_names).chars().take(cell_width).collect();
        let (open, close) = if focused == Some(index) {
            ('>', '<')
        } else {
            ('[', ']')
        };
        write!(row, "{}{:^width$}{}", open, caption, close, width = cell_width).ok();
    }
    row
}

/// Create the status line above the slot row
pub fn create_status_line(state: &RenderState<'_>) -> String {
    match state.phase {
        GamePhase::Idle => "Press [space] to start".to_string(),
        GamePhase::Countdown => match state.start_failure {
            Some(reason) => format!("{} (press [space] to retry)", reason),
            None => format!("Get ready... {}", state.countdown.unwrap_or(0)),
        },
        GamePhase::Playing => {
            let mut line = format!("Round {}/{}", state.current_round, state.total_rounds);
            if let Some(beat) = state.beat {
                write!(line, " | beat {:>3}", beat).ok();
            }
            let cue = if state.focused_slot.is_some() {
                "repeat!"
            } else {
                "listen"
            };
            write!(line, " | {}", cue).ok();
            line
        }
        GamePhase::Finished => "All rounds complete! [r] restart, [q] quit".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots() -> Vec<Slot> {
        vec![
            Slot::image("img/cat.png").with_label("cat"),
            Slot::image("img/dog.png"),
            Slot::default(),
        ]
    }

    #[test]
    fn test_progress_bar_widths() {
        for length in [1, 5, 10, 20] {
            assert_eq!(create_progress_bar(1.0, length).chars().count(), length);
            assert_eq!(create_progress_bar(0.0, length).chars().count(), length);
        }
        assert_eq!(create_progress_bar(0.5, 10).trim().chars().count(), 5);
        assert_eq!(create_progress_bar(-1.0, 10).trim().len(), 0);
        assert_eq!(create_progress_bar(f64::NAN, 4).trim().len(), 0);
    }

    #[test]
    fn test_slot_row_highlights_focus() {
        let row = create_slot_row(&slots(), Some(1), false, 7);
        assert_eq!(row, "[cat.png]>dog.png<[       ]");
    }

    #[test]
    fn test_slot_row_names_and_truncation() {
        let row = create_slot_row(&slots(), None, true, 3);
        assert_eq!(row, "[cat][dog][   ]");
    }

    #[test]
    fn test_status_line_per_phase() {
        let slots = slots();
        let mut state = RenderState {
            phase: GamePhase::Playing,
            focused_slot: Some(0),
            current_round: 2,
            current_slots: &slots,
            total_rounds: 5,
            show_names: false,
            countdown: None,
            beat: Some(24),
            start_failure: None,
        };
        assert_eq!(create_status_line(&state), "Round 2/5 | beat  24 | repeat!");

        state.phase = GamePhase::Countdown;
        state.countdown = Some(2);
        assert_eq!(create_status_line(&state), "Get ready... 2");

        state.start_failure = Some("no device");
        assert!(create_status_line(&state).starts_with("no device"));
    }
}
