use boksen_lib::decks::{BoxCounts, BOX_COUNT};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap `text` in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Color for a box: red for the hardest, green for the best known
fn box_color(box_index: usize) -> &'static str {
    match box_index {
        0 => Color::RED,
        i if i + 1 >= BOX_COUNT => Color::GREEN,
        _ => Color::YELLOW,
    }
}

pub fn box_label(box_index: usize, use_color: bool) -> String {
    paint(&format!("box {}", box_index), box_color(box_index), use_color)
}

const BAR_WIDTH: usize = 30;

/// One line per box with a bar scaled to the fullest box
pub fn render_box_counts(counts: &BoxCounts, use_color: bool) -> String {
    let max = counts.as_array().iter().copied().max().unwrap_or(0);
    let mut lines = Vec::with_capacity(BOX_COUNT + 1);

    for (box_index, &count) in counts.as_array().iter().enumerate() {
        let width = if max == 0 {
            0
        } else {
            // Any non-empty box gets at least one cell
            ((count as usize * BAR_WIDTH) / max as usize).max(usize::from(count > 0))
        };
        let bar = paint(&"#".repeat(width), box_color(box_index), use_color);
        lines.push(format!("{}  {:>5}  {}", box_label(box_index, use_color), count, bar));
    }

    lines.push(paint(&format!("total   {:>4}", counts.total()), Color::DIM, use_color));
    lines.join("\n")
}
