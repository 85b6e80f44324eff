use ratatui::prelude::*;

use crate::animator::{Ambience, Critter, Facing, HEART_GLYPHS};

const SPARK_COLORS: [(u8, u8, u8); 6] = [
    (255, 105, 180),
    (255, 20, 147),
    (220, 20, 60),
    (255, 99, 71),
    (255, 69, 0),
    (255, 215, 0),
];

fn cell(area: Rect, x: f32, y: f32) -> Option<(u16, u16)> {
    if !(0.0..100.0).contains(&x) || !(0.0..100.0).contains(&y) {
        return None;
    }
    let cx = area.x + (x / 100.0 * area.width as f32) as u16;
    let cy = area.y + (y / 100.0 * area.height as f32) as u16;
    (cx < area.x + area.width && cy < area.y + area.height).then_some((cx, cy))
}

fn dim((r, g, b): (u8, u8, u8), k: f32) -> Color {
    let k = k.clamp(0.0, 1.0);
    Color::Rgb((r as f32 * k) as u8, (g as f32 * k) as u8, (b as f32 * k) as u8)
}

/// Paints the decorative layer straight into the buffer; widgets drawn later
/// cover it.
pub fn render_ambience(frame: &mut Frame, area: Rect, ambience: &Ambience, critters: bool) {
    let buf = frame.buffer_mut();

    for heart in &ambience.hearts {
        if let Some((x, y)) = cell(area, heart.x, heart.y) {
            buf.set_string(x, y, HEART_GLYPHS[heart.glyph], Style::default().fg(dim((255, 105, 180), heart.opacity)));
        }
    }

    if critters {
        for w in &ambience.wanderers {
            if let Some((x, y)) = cell(area, w.x, w.y) {
                let sprite = match (w.kind, w.facing) {
                    (Critter::Kitty, Facing::Right) => "=^.^=>",
                    (Critter::Kitty, Facing::Left) => "<=^.^=",
                    (Critter::Puppy, Facing::Right) => "U·ᴥ·U>",
                    (Critter::Puppy, Facing::Left) => "<U·ᴥ·U",
                };
                let color = match w.kind {
                    Critter::Kitty => Color::Rgb(255, 190, 220),
                    Critter::Puppy => Color::Rgb(220, 180, 130),
                };
                buf.set_string(x, y, sprite, Style::default().fg(color));
            }
        }
    }

    for p in &ambience.particles {
        if let Some((x, y)) = cell(area, p.x, p.y) {
            let glyph = if p.opacity() > 0.5 { "♥" } else { "·" };
            buf.set_string(x, y, glyph, Style::default().fg(dim(SPARK_COLORS[p.hue % 6], p.opacity())));
        }
    }
}
