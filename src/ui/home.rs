use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::games::GameId;
use crate::typewriter::Typewriter;

const GIFT_BOX: &str = r#"
        ♥   ♥
      ╲  ╲ ╱  ╱
   ╔═════╪═╪═════╗
   ║     │ │     ║
   ╠═════╪═╪═════╣
   ║     │ │     ║
   ║     │ │     ║
   ║     │ │     ║
   ╚═════╧═╧═════╝"#;

const OPEN_BOX: &str = r#"
     ✨   ♥   ✨
   ╱═════╤═╤═════╲
    ♥  ✨ ♥ ✨  ♥
   ╔═════╪═╪═════╗
   ║     │ │     ║
   ║     │ │     ║
   ╚═════╧═╧═════╝"#;

struct GameTile {
    key: &'static str,
    icon: &'static str,
    desc: &'static str,
    color: Color,
    border_color: Color,
}

const GAME_TILES: [GameTile; 4] = [
    GameTile { key: "1", icon: "♥", desc: "Catch the falling\nhearts, dodge bombs!", color: Color::Rgb(255, 105, 180), border_color: Color::Rgb(140, 50, 90) },
    GameTile { key: "2", icon: "✿", desc: "Find all eight\nmatching pairs!", color: Color::Rgb(170, 120, 255), border_color: Color::Rgb(80, 60, 140) },
    GameTile { key: "3", icon: "❀", desc: "Swap the tiles\nback into order!", color: Color::Rgb(255, 120, 150), border_color: Color::Rgb(140, 60, 80) },
    GameTile { key: "4", icon: "♪", desc: "Hit the notes\non the beat!", color: Color::Rgb(230, 60, 90), border_color: Color::Rgb(120, 30, 50) },
];

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    let w = w.min(area.width);
    let h = h.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

fn box_lines(art: &'static str, color: Color) -> Vec<Line<'static>> {
    art.lines()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(color).add_modifier(Modifier::BOLD))))
        .collect()
}

pub fn render_gift(frame: &mut Frame, area: Rect) {
    let mut lines = box_lines(GIFT_BOX, Color::Rgb(255, 80, 140));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("🎁 Press ", Style::default().fg(Color::White)),
        Span::styled("Enter", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" or click to open the gift!", Style::default().fg(Color::White)),
    ]));
    let h = lines.len() as u16;
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered(area, 50, h),
    );
}

pub fn render_opening(frame: &mut Frame, area: Rect) {
    let lines = box_lines(OPEN_BOX, Color::Rgb(255, 215, 0));
    let h = lines.len() as u16;
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered(area, 50, h),
    );
}

pub fn render_message(frame: &mut Frame, area: Rect, tw: &Typewriter) {
    let popup = centered(area, 64, 11);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 150, 200)))
        .title(" 💌 ")
        .style(Style::default().bg(Color::Rgb(30, 12, 30)));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut text = tw.visible();
    if !tw.is_complete() {
        text.push('▌');
    }
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            text,
            Style::default().fg(Color::Rgb(255, 200, 230)).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if tw.is_complete() {
        lines.push(Line::from(vec![
            Span::styled("▶ Enter", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
            Span::styled(" play now", Style::default().fg(Color::Rgb(180, 160, 200))),
        ]));
    }
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true }),
        inner,
    );
}

fn render_game_tile(frame: &mut Frame, area: Rect, id: GameId, tile: &GameTile, selected: bool, best: u32) {
    let border_color = if selected { Color::Rgb(255, 220, 80) } else { tile.border_color };
    let border_type = if selected { BorderType::Double } else { BorderType::Rounded };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 { return; }

    let name_color = if selected { Color::Rgb(255, 255, 255) } else { tile.color };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("[{}] ", tile.key), Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{} ", tile.icon), Style::default().fg(tile.color)),
        Span::styled(id.title(), Style::default().fg(name_color).add_modifier(Modifier::BOLD)),
    ])];
    for desc_line in tile.desc.split('\n') {
        lines.push(Line::from(Span::styled(
            desc_line,
            Style::default().fg(if selected { Color::Rgb(180, 180, 200) } else { Color::Rgb(120, 120, 140) }),
        )));
    }
    if best > 0 {
        lines.push(Line::from(Span::styled(format!("Best: {}", best), Style::default().fg(Color::Cyan))));
    }
    if selected {
        lines.push(Line::from(Span::styled(
            "▶ Enter to play",
            Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD),
        )));
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Draws the 2x2 game grid and records each tile's rect for mouse hits.
pub fn render_menu(
    frame: &mut Frame,
    area: Rect,
    selected_game: usize,
    best: impl Fn(GameId) -> u32,
    tiles: &mut Vec<Rect>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(1)])
        .split(area);

    let grid = centered(chunks[0], 64, 16);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(grid);
    tiles.clear();
    for row in rows.iter() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
            .split(*row);
        tiles.extend(cols.iter().copied());
    }

    for (i, id) in GameId::all().iter().enumerate() {
        if let Some(rect) = tiles.get(i).copied() {
            frame.render_widget(Clear, rect);
            render_game_tile(frame, rect, *id, &GAME_TILES[i], selected_game == i, best(*id));
        }
    }

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("1-4", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" pick  ", Style::default().fg(Color::Rgb(100, 100, 130))),
        Span::styled("←↑↓→", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" move  ", Style::default().fg(Color::Rgb(100, 100, 130))),
        Span::styled("Ctrl+R", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" start over  ", Style::default().fg(Color::Rgb(100, 100, 130))),
        Span::styled("q", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" quit", Style::default().fg(Color::Rgb(100, 100, 130))),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[1]);
}
