//! Color constants for the roadmap board.

use ratatui::style::Color;

use crate::fields::{Priority, Stage};

pub const ORANGE: Color = Color::Rgb(255, 140, 0);
pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);
/// Border and header of the quarter containing today.
pub const CURRENT_QUARTER: Color = Color::Cyan;

/// Card text colour by tier.
pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::P0 => Color::Red,
        Priority::P1 => ORANGE,
        Priority::P2 => GOLD,
        Priority::P3 => Color::Gray,
    }
}

/// Row label background by stage.
pub fn stage_color(stage: Stage) -> Color {
    match stage {
        Stage::Discovery => Color::Blue,
        Stage::BuildVsBuy => DARK_PURPLE,
        Stage::InitialDemo => Color::Magenta,
        Stage::Piloting => DARK_GREEN,
        Stage::Implementation => Color::Green,
    }
}
