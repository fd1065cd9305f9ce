// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Header line for performance mode.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph, Widget},
};

use super::PerformanceView;

/// Set name, step position and stopwatch
pub struct HeaderWidget<'a> {
    view: &'a PerformanceView,
    block: Option<Block<'a>>,
}

impl<'a> HeaderWidget<'a> {
    pub fn new(view: &'a PerformanceView) -> Self {
        Self { view, block: None }
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for HeaderWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(10),    // Set name
                Constraint::Length(12), // Position
                Constraint::Length(8),  // Stopwatch
            ])
            .split(area);

        Paragraph::new(self.view.set_name.as_str())
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .render(chunks[0], buf);

        if let Some(position) = &self.view.position {
            Paragraph::new(position.as_str())
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .render(chunks[1], buf);
        }

        let timer_style = if self.view.timer_running {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Yellow)
        };
        Paragraph::new(self.view.elapsed.as_str())
            .style(timer_style)
            .render(chunks[2], buf);
    }
}
