use ratatui::{buffer::Buffer, layout::Rect};

use crate::{
    app::{App, AppState},
    clock::Clock,
    ui::{render_mains_end, render_mains_timer, render_prelims_summary, render_prelims_timer},
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen<C: Clock + Clone> {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer);
}

/// Prelims countdown with the LAP control
pub struct PrelimsTimerScreen;

impl<C: Clock + Clone> Screen<C> for PrelimsTimerScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        render_prelims_timer(app, area, buf);
    }
}

/// Prelims summary - pacing numbers, heatmap and insight
pub struct PrelimsSummaryScreen;

impl<C: Clock + Clone> Screen<C> for PrelimsSummaryScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        render_prelims_summary(app, area, buf);
    }
}

/// Mains countdown with phase markers
pub struct MainsTimerScreen;

impl<C: Clock + Clone> Screen<C> for MainsTimerScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        render_mains_timer(app, area, buf);
    }
}

pub struct MainsEndScreen;

impl<C: Clock + Clone> Screen<C> for MainsEndScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        render_mains_end(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<C: Clock + Clone>(state: AppState) -> Box<dyn Screen<C>> {
    match state {
        AppState::PrelimsTimer => Box::new(PrelimsTimerScreen),
        AppState::PrelimsSummary => Box::new(PrelimsSummaryScreen),
        AppState::MainsTimer => Box::new(MainsTimerScreen),
        AppState::MainsEnd => Box::new(MainsEndScreen),
    }
}
