use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::energy::Energy;

pub fn render_header(frame: &mut Frame, area: Rect, subtitle: &str) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(" ♥ ", Style::default().fg(Color::Rgb(255, 80, 120))),
        Span::styled(
            "A Special Day",
            Style::default().fg(Color::Rgb(255, 150, 200)).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ♥ ", Style::default().fg(Color::Rgb(255, 80, 120))),
        Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 80))),
        Span::styled(subtitle.to_string(), Style::default().fg(Color::Rgb(200, 160, 230))),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(200, 80, 160)))
            .title(" 🎁 giftbox ")
            .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(title, area);
}

pub fn render_energy(frame: &mut Frame, area: Rect, energy: &Energy) {
    let status = if energy.is_full() {
        "✨ Energy full! ✨".to_string()
    } else {
        format!("{}% complete", energy.percent())
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Rgb(255, 150, 200)))
                .title(" ⚡ Love Energy ")
                .title_style(Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD))
                .title_bottom(Line::from(format!(" {} ", status)).right_aligned()),
        )
        .gauge_style(
            Style::default()
                .fg(if energy.is_full() { Color::Rgb(80, 220, 120) } else { Color::Rgb(255, 80, 150) })
                .bg(Color::Rgb(40, 20, 40)),
        )
        .ratio(energy.ratio().clamp(0.0, 1.0))
        .label(format!("{}/{}", energy.value(), energy.max()));
    frame.render_widget(gauge, area);
}
