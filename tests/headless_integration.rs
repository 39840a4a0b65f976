use std::time::Duration;

use chronomaster::{
    analytics::{Insight, MainsVerdict, QuestionStatus},
    app::{App, AppState, Control, Practice},
    clock::ManualClock,
    config::MemoryConfigStore,
    runtime::{AppEvent, Runner, TestEventSource},
    session::{MainsSetup, MainsType, PrelimsPaper, PrelimsSetup, SessionStore},
    ticker::FixedTicker,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

type TestRunner = Runner<TestEventSource, FixedTicker>;

// Headless integration using the internal runtime without a TTY.
// Real tick threads feed the queue; time only moves when the test advances
// the manual clock.
fn setup(practice: Practice) -> (ManualClock, App<ManualClock>, TestRunner) {
    let clock = ManualClock::new();
    let store = SessionStore::new(clock.clone(), MemoryConfigStore::default());
    let app = App::new(store, clock.clone(), practice);
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(1)),
    );
    (clock, app, runner)
}

fn press(runner: &TestRunner, code: KeyCode) {
    runner
        .sender()
        .send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
        .unwrap();
}

/// Step the loop until `done` holds, with a generous bound.
fn drive_until(
    app: &mut App<ManualClock>,
    runner: &TestRunner,
    mut done: impl FnMut(&mut App<ManualClock>) -> bool,
) {
    for _ in 0..5_000u32 {
        if done(app) {
            return;
        }
        if let Some(event) = runner.step() {
            assert_eq!(app.handle(event, runner), Control::Continue);
        }
    }
    panic!("condition not reached; app state {:?}", app.state);
}

#[test]
fn headless_prelims_flow_runs_out_of_time() {
    let setup_args = PrelimsSetup::new(PrelimsPaper::Gs, 3, 3).unwrap();
    let (clock, mut app, runner) = setup(Practice::Prelims(setup_args));
    app.begin(&runner);

    clock.advance(50_000);
    press(&runner, KeyCode::Char(' '));
    drive_until(&mut app, &runner, |app| app.last_lap().is_some());

    clock.advance(40_000);
    press(&runner, KeyCode::Enter);
    drive_until(&mut app, &runner, |app| {
        app.last_lap().map(|l| l.question) == Some(2)
    });
    assert_eq!(app.state, AppState::PrelimsTimer);

    // the countdown ends the session on its own
    clock.advance(100_000);
    drive_until(&mut app, &runner, |app| app.state == AppState::PrelimsSummary);
    assert!(!app.is_ticking());

    let stats = app.store().prelims_stats().unwrap();
    assert_eq!(app.store().prelims().lap_times(), &[50_000, 40_000]);
    assert_eq!(stats.questions_answered, 2);
    assert_eq!(stats.omr_buffer_ms, 90_000);
    assert_eq!(stats.good_count, 2);
    assert_eq!(stats.insight, Insight::TightBuffer);
    assert_eq!(app.reports().len(), 1);
}

#[test]
fn headless_prelims_finishes_on_last_lap() {
    let setup_args = PrelimsSetup::new(PrelimsPaper::Csat, 2, 2).unwrap();
    let (clock, mut app, runner) = setup(Practice::Prelims(setup_args));
    app.begin(&runner);

    clock.advance(50_000);
    press(&runner, KeyCode::Char(' '));
    drive_until(&mut app, &runner, |app| app.last_lap().is_some());

    clock.advance(60_000);
    press(&runner, KeyCode::Char(' '));
    drive_until(&mut app, &runner, |app| app.state == AppState::PrelimsSummary);

    let stats = app.store().prelims_stats().unwrap();
    assert_eq!(stats.total_time_spent_ms, 110_000);
    assert_eq!(stats.question_stats[0].status, QuestionStatus::Good);
    assert_eq!(stats.question_stats[1].status, QuestionStatus::Good);

    // late ticks from the finished run must not change anything
    clock.advance(600_000);
    for _ in 0..20 {
        if let Some(event) = runner.step() {
            app.handle(event, &runner);
        }
    }
    assert_eq!(app.state, AppState::PrelimsSummary);
    assert_eq!(app.reports().len(), 1);
}

#[test]
fn headless_mains_phases_and_practise_again() {
    let setup_args = MainsSetup::new(MainsType::TenMark, None, 180).unwrap();
    let (clock, mut app, runner) = setup(Practice::Mains(setup_args));
    app.begin(&runner);
    assert_eq!(app.current_phase(), Some(0));

    clock.advance(150_000);
    drive_until(&mut app, &runner, |app| app.take_bell());
    assert_eq!(app.current_phase(), Some(1));

    clock.advance(5 * 60_000);
    drive_until(&mut app, &runner, |app| app.state == AppState::MainsEnd);
    let outcome = app.store().mains_outcome().unwrap();
    assert_eq!(outcome.actual_ms, 7 * 60_000);
    assert_eq!(outcome.verdict, MainsVerdict::OnTime);

    press(&runner, KeyCode::Char('r'));
    drive_until(&mut app, &runner, |app| app.state == AppState::MainsTimer);
    assert!(app.is_ticking());

    clock.advance(3 * 60_000);
    press(&runner, KeyCode::Esc);
    press(&runner, KeyCode::Char('y'));
    drive_until(&mut app, &runner, |app| app.state == AppState::MainsEnd);

    let outcome = app.store().mains_outcome().unwrap();
    assert_eq!(outcome.actual_ms, 3 * 60_000);
    assert_eq!(outcome.verdict, MainsVerdict::FinishedEarly);
    assert_eq!(app.reports().len(), 2);
}

#[test]
fn headless_essay_uses_proportional_phases() {
    let setup_args = MainsSetup::new(MainsType::Essay, Some(60), 180).unwrap();
    let (clock, mut app, runner) = setup(Practice::Mains(setup_args));
    app.begin(&runner);

    let phases = app.phases().unwrap();
    assert_eq!(
        phases.map(|p| (p.start_min, p.end_min)),
        [(0, 9), (9, 51), (51, 60)]
    );

    clock.advance(52 * 60_000);
    drive_until(&mut app, &runner, |app| app.current_phase() == Some(2));
    assert_eq!(app.state, AppState::MainsTimer);
}
