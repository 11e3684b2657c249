use async_trait::async_trait;
use devflow_focus::blocklist::BlockList;
use devflow_focus::enforcement::{EnforcementError, NavigationOutcome, Navigator, handle_navigation};
use devflow_focus::settings::Settings;
use devflow_focus::storage::{
    BLOCKED_SITES_KEY, MemoryStore, SETTINGS_KEY, TIMER_SETTINGS_KEY, TIMER_STATE_KEY, read_record,
    read_record_lenient, read_record_or_default, write_record,
};
use devflow_focus::timer::{FocusTimer, Phase, TimerSettings, TimerState};
use futures::executor::block_on;
use serde_json::json;
use std::cell::RefCell;

const START: f64 = 1_700_000_000_000.0;

#[derive(Default)]
struct RecordingTabs {
    redirects: RefCell<Vec<(i32, String)>>,
}

#[async_trait(?Send)]
impl Navigator for RecordingTabs {
    fn extension_url(&self, path: &str) -> String {
        format!("chrome-extension://test/{}", path)
    }

    async fn redirect(&self, tab_id: i32, url: &str) -> Result<(), EnforcementError> {
        self.redirects.borrow_mut().push((tab_id, url.to_string()));
        Ok(())
    }

    async fn open_tab(&self, _url: &str) -> Result<(), EnforcementError> {
        Ok(())
    }
}

/// Mount the dashboard against `store` the way the focus page does
fn mount(store: &MemoryStore, now_ms: f64) -> FocusTimer {
    let settings: TimerSettings = block_on(read_record_or_default(store, TIMER_SETTINGS_KEY));
    let stored: Option<TimerState> = block_on(read_record_lenient(store, TIMER_STATE_KEY));
    FocusTimer::restore(stored.as_ref(), settings, now_ms)
}

fn persist(store: &MemoryStore, timer: &FocusTimer, now_ms: f64) {
    block_on(write_record(store, TIMER_STATE_KEY, &timer.snapshot(now_ms))).unwrap();
}

#[test]
fn test_first_run_starts_from_defaults() {
    let store = MemoryStore::new();

    let timer = mount(&store, START);

    assert_eq!(timer.time_left(), 25 * 60);
    assert_eq!(timer.phase(), Phase::Work);
    assert!(!timer.is_running());
}

#[test]
fn test_full_work_session_end_to_end() {
    let store = MemoryStore::new();
    block_on(write_record(&store, TIMER_SETTINGS_KEY, &TimerSettings::default())).unwrap();

    let mut timer = mount(&store, START);
    timer.start();

    let mut completions = Vec::new();
    for second in 1..=1500 {
        if let Some(done) = timer.tick() {
            completions.push(done);
        }
        persist(&store, &timer, START + f64::from(second) * 1000.0);
    }

    assert_eq!(completions.len(), 1);
    assert_eq!(timer.session_count(), 1);
    assert_eq!(timer.phase(), Phase::Break);
    assert_eq!(timer.time_left(), 5 * 60);
    assert!(!timer.is_running());

    let persisted: TimerState = block_on(read_record(&store, TIMER_STATE_KEY)).unwrap().unwrap();
    assert!(persisted.is_break);
    assert!(!persisted.is_running);
    assert_eq!(persisted.session_count, 1);
}

#[test]
fn test_remount_catches_up_on_running_timer() {
    let store = MemoryStore::new();
    let mut timer = mount(&store, START);
    timer.start();
    for _ in 0..(1500 - 100) {
        timer.tick();
    }
    persist(&store, &timer, START);

    let remounted = mount(&store, START + 30_000.0);

    assert!(remounted.is_running());
    assert_eq!(remounted.time_left(), 70);
}

#[test]
fn test_remount_after_phase_ran_out_resets_to_work() {
    let store = MemoryStore::new();
    block_on(write_record(&store, TIMER_SETTINGS_KEY, &TimerSettings { work_duration: 40, ..TimerSettings::default() })).unwrap();
    store.insert(
        TIMER_STATE_KEY,
        json!({"isRunning": true, "timeLeft": 10, "isBreak": true, "sessionCount": 2, "lastUpdated": START - 30_000.0}),
    );

    let timer = mount(&store, START);

    assert!(!timer.is_running());
    assert_eq!(timer.phase(), Phase::Work);
    assert_eq!(timer.time_left(), 40 * 60);
    assert_eq!(timer.session_count(), 2);
}

#[test]
fn test_remounting_stopped_timer_twice_is_stable() {
    let store = MemoryStore::new();
    let mut timer = mount(&store, START);
    timer.start();
    timer.tick();
    timer.pause();
    persist(&store, &timer, START);

    let first = mount(&store, START + 5_000.0);
    persist(&store, &first, START + 5_000.0);
    let second = mount(&store, START + 5_000.0);

    assert_eq!(first, second);
    assert_eq!(second.time_left(), 25 * 60 - 1);
}

#[test]
fn test_corrupt_timer_state_falls_back_to_defaults() {
    let store = MemoryStore::new();
    store.insert(TIMER_STATE_KEY, json!("{not json"));

    let timer = mount(&store, START);

    assert_eq!(timer.time_left(), 25 * 60);
    assert_eq!(timer.session_count(), 0);
}

#[test]
fn test_blocklist_edits_reach_background_enforcement() {
    let store = MemoryStore::new();
    let tabs = RecordingTabs::default();

    let mut list = BlockList::new();
    list.add("News.YCombinator.com");
    block_on(write_record(&store, BLOCKED_SITES_KEY, &list)).unwrap();

    let outcome = block_on(handle_navigation(&store, &tabs, 3, "https://news.ycombinator.com/item?id=1")).unwrap();
    assert_eq!(outcome, NavigationOutcome::Redirected);

    block_on(write_record(&store, SETTINGS_KEY, &Settings::default().with_focus(false))).unwrap();
    let outcome = block_on(handle_navigation(&store, &tabs, 3, "https://news.ycombinator.com/")).unwrap();
    assert_eq!(outcome, NavigationOutcome::Allowed);

    assert_eq!(
        *tabs.redirects.borrow(),
        vec![(3, "chrome-extension://test/blocked.html".to_string())]
    );
}
