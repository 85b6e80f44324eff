pub mod ambience;
pub mod header;
pub mod home;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;
use crate::games::GameId;
use crate::shell::{Phase, Stage, FINAL_BODY};
use crate::typewriter::Typewriter;

pub fn render(frame: &mut Frame, app: &mut App) {
    let phase = app.shell.phase();
    let show_energy = matches!(
        phase,
        Phase::GameMenu | Phase::Instructions(_) | Phase::GameActive(_) | Phase::FinalMessage
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                // Header
            Constraint::Length(if show_energy { 3 } else { 0 }), // Energy
            Constraint::Min(0),                                   // Content
        ])
        .split(frame.area());

    if !matches!(phase, Phase::GameActive(_)) {
        let critters = matches!(phase, Phase::GameMenu | Phase::Instructions(_) | Phase::FinalMessage);
        ambience::render_ambience(frame, chunks[2], app.shell.ambience(), critters);
    }

    let subtitle = match phase {
        Phase::Idle | Phase::GiftOpening => "A memory to keep",
        Phase::MessageShowing => "A message for you",
        Phase::GameMenu | Phase::Instructions(_) => "Play to fill the energy bar",
        Phase::GameActive(id) => id.title(),
        Phase::FinalMessage => "Forever",
    };
    header::render_header(frame, chunks[0], subtitle);
    if show_energy {
        header::render_energy(frame, chunks[1], app.shell.energy());
    }

    let content = chunks[2];
    match phase {
        Phase::Idle => home::render_gift(frame, content),
        Phase::GiftOpening => home::render_opening(frame, content),
        Phase::MessageShowing => {
            if let Stage::Message(tw) = app.shell.stage() {
                home::render_message(frame, content, tw);
            }
        }
        Phase::GameMenu | Phase::Instructions(_) | Phase::FinalMessage => {
            let shell = &app.shell;
            home::render_menu(frame, content, app.selected_game, |id| shell.best(id), &mut app.menu_tiles);
        }
        Phase::GameActive(_) => {
            if let Some(game) = app.shell.session_mut() {
                game.render(frame, content);
            }
        }
    }

    // Overlays render on top of the menu
    let full = frame.area();
    match app.shell.stage() {
        Stage::Instructions(id) => render_instructions(frame, full, *id),
        Stage::FinalMessage(tw) => render_final(frame, full, tw),
        _ => {}
    }
}

fn overlay(area: Rect, w: u16, h: u16) -> Rect {
    let overlay_w = w.min(area.width.saturating_sub(4));
    let overlay_h = h.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
    Rect::new(x, y, overlay_w, overlay_h)
}

fn render_instructions(frame: &mut Frame, area: Rect, id: GameId) {
    let steps = id.instructions();
    let overlay_area = overlay(area, 56, steps.len() as u16 + 7);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 150, 200)))
        .title(format!(" 📖 {} ", id.title()))
        .title_style(Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Rgb(20, 12, 25)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines = vec![Line::from("")];
    for step in steps {
        lines.push(Line::from(Span::styled(
            format!("  {}", step),
            Style::default().fg(Color::Rgb(220, 210, 235)),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Enter", Style::default().fg(Color::Rgb(80, 200, 255)).add_modifier(Modifier::BOLD)),
        Span::styled(" start  ", Style::default().fg(Color::Rgb(100, 100, 130))),
        Span::styled("Esc", Style::default().fg(Color::Rgb(80, 200, 255)).add_modifier(Modifier::BOLD)),
        Span::styled(" back", Style::default().fg(Color::Rgb(100, 100, 130))),
    ]));

    let p = Paragraph::new(lines).style(Style::default().bg(Color::Rgb(20, 12, 25)));
    frame.render_widget(p, inner);
}

fn render_final(frame: &mut Frame, area: Rect, tw: &Typewriter) {
    let overlay_area = overlay(area, 56, 12);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 105, 180)))
        .title(" ♥ ♥ ♥ ")
        .title_style(Style::default().fg(Color::Rgb(255, 80, 120)).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Rgb(30, 10, 25)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut headline = tw.visible();
    if !tw.is_complete() {
        headline.push('|');
    }
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            headline,
            Style::default().fg(Color::Rgb(255, 105, 180)).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(FINAL_BODY, Style::default().fg(Color::Rgb(220, 210, 235)))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Rgb(80, 200, 255)).add_modifier(Modifier::BOLD)),
            Span::styled(" close", Style::default().fg(Color::Rgb(100, 100, 130))),
        ]),
    ];
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(Color::Rgb(30, 10, 25)));
    frame.render_widget(p, inner);
}
