/// Focus mode page: Pomodoro timer, timer settings and blocked sites

use crate::blocklist::BlockList;
use crate::chrome::ChromeStore;
use crate::notify::{BrowserNotifier, persist_then_notify};
use crate::storage::{
    BLOCKED_SITES_KEY, TIMER_SETTINGS_KEY, TIMER_STATE_KEY, read_record_lenient, read_record_or_default,
    write_record,
};
use crate::timer::{FocusTimer, PhaseComplete, TimerSettings, TimerState};
use crate::ui::components::{DurationField, SiteRow, TimerDisplay};
use crate::ui::dom::{Interval, Listener};
use patternfly_yew::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, SubmitEvent, VisibilityState};
use yew::prelude::*;

const TICK_MILLIS: i32 = 1000;

/// Window events after which the page may be gone
const UNLOAD_EVENTS: [&str; 2] = ["pagehide", "beforeunload"];

type LatestTimer = Rc<RefCell<Option<FocusTimer>>>;

#[derive(Clone, PartialEq, Default)]
struct TimerModel {
    timer: FocusTimer,
    loaded: bool,
    /// Bumped on every action so each change is persisted once
    revision: u64,
    /// Phase completion produced by the action at this revision
    completion: Option<(u64, PhaseComplete)>,
}

enum TimerAction {
    Restore(FocusTimer),
    Toggle,
    Reset,
    Tick,
    ApplySettings(TimerSettings),
}

impl Reducible for TimerModel {
    type Action = TimerAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        // Nothing but the restore may touch the timer before it is loaded
        if !self.loaded && !matches!(action, TimerAction::Restore(_)) {
            return self;
        }

        let mut next = (*self).clone();
        next.revision += 1;
        match action {
            TimerAction::Restore(timer) => {
                next.timer = timer;
                next.loaded = true;
            }
            TimerAction::Toggle => next.timer.toggle(),
            TimerAction::Reset => next.timer.reset(),
            TimerAction::Tick => {
                if let Some(done) = next.timer.tick() {
                    next.completion = Some((next.revision, done));
                }
            }
            TimerAction::ApplySettings(settings) => next.timer.apply_settings(settings),
        }
        next.into()
    }
}

#[function_component(FocusMode)]
pub fn focus_mode() -> Html {
    let model = use_reducer(TimerModel::default);
    let blocked = use_state(BlockList::new);
    let new_site = use_state(String::new);
    let error = use_state(|| None::<String>);
    let latest: LatestTimer = use_mut_ref(|| None);

    if model.loaded {
        *latest.borrow_mut() = Some(model.timer.clone());
    }

    // Load persisted state on mount
    {
        let dispatcher = model.dispatcher();
        let blocked = blocked.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let store = ChromeStore;
                let (settings, stored, sites) = futures::join!(
                    read_record_or_default::<_, TimerSettings>(&store, TIMER_SETTINGS_KEY),
                    read_record_lenient::<_, TimerState>(&store, TIMER_STATE_KEY),
                    read_record_or_default::<_, BlockList>(&store, BLOCKED_SITES_KEY),
                );

                blocked.set(sites);
                let timer = FocusTimer::restore(stored.as_ref(), settings, now_ms());
                dispatcher.dispatch(TimerAction::Restore(timer));
            });
            || ()
        });
    }

    // One tick per second while running; dropping the interval cancels it
    {
        let dispatcher = model.dispatcher();
        let running = model.loaded && model.timer.is_running();

        use_effect_with(running, move |running| {
            let interval = if *running {
                Interval::new(TICK_MILLIS, move || dispatcher.dispatch(TimerAction::Tick))
                    .map_err(|e| log::error!("Failed to start timer interval: {:?}", e))
                    .ok()
            } else {
                None
            };
            move || drop(interval)
        });
    }

    // Persist every change, then announce a finished phase
    {
        let model = model.clone();

        use_effect_with(model.revision, move |revision| {
            if model.loaded {
                let snapshot = model.timer.snapshot(now_ms());
                let completion = model
                    .completion
                    .filter(|(seq, _)| seq == revision)
                    .map(|(_, done)| done);

                spawn_local(async move {
                    persist_then_notify(&ChromeStore, &BrowserNotifier, &snapshot, completion.as_ref()).await;
                });
            }
            || ()
        });
    }

    // Stamp lastUpdated when the page is hidden, closed or unmounted
    {
        let latest = latest.clone();

        use_effect_with((), move |_| {
            let listeners = lifecycle_listeners(&latest);
            move || {
                drop(listeners);
                persist_latest(&latest);
            }
        });
    }

    let on_toggle = {
        let dispatcher = model.dispatcher();
        Callback::from(move |_: MouseEvent| dispatcher.dispatch(TimerAction::Toggle))
    };

    let on_reset = {
        let dispatcher = model.dispatcher();
        Callback::from(move |_: MouseEvent| dispatcher.dispatch(TimerAction::Reset))
    };

    let settings_field = {
        let dispatcher = model.dispatcher();
        let current = *model.timer.settings();
        let loaded = model.loaded;
        let error = error.clone();

        move |update: fn(&mut TimerSettings, u32)| {
            let dispatcher = dispatcher.clone();
            let error = error.clone();
            Callback::from(move |value: u32| {
                let Some(settings) = accept_edit(loaded, current, |s| {
                    update(s, value);
                    true
                }) else {
                    return;
                };
                dispatcher.dispatch(TimerAction::ApplySettings(settings));

                let error = error.clone();
                spawn_local(async move {
                    if let Err(e) = write_record(&ChromeStore, TIMER_SETTINGS_KEY, &settings).await {
                        log::error!("Error saving timer settings: {}", e);
                        error.set(Some(format!("Failed to save timer settings: {}", e)));
                    }
                });
            })
        }
    };

    let on_site_input = {
        let new_site = new_site.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                new_site.set(input.value());
            }
        })
    };

    let on_add_site = {
        let blocked = blocked.clone();
        let new_site = new_site.clone();
        let loaded = model.loaded;
        let error = error.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(list) = accept_edit(loaded, (*blocked).clone(), |list| list.add(&new_site).is_some()) else {
                return;
            };
            blocked.set(list.clone());
            new_site.set(String::new());
            save_blocklist(list, error.clone());
        })
    };

    let on_remove_site = {
        let blocked = blocked.clone();
        let loaded = model.loaded;
        let error = error.clone();

        Callback::from(move |id: String| {
            if let Some(list) = accept_edit(loaded, (*blocked).clone(), |list| list.remove(&id)) {
                blocked.set(list.clone());
                save_blocklist(list, error.clone());
            }
        })
    };

    let settings = *model.timer.settings();

    html! {
        <div class="focus-page">
            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                    {err}
                </Alert>
            }

            // Timer
            <div class="card timer-card">
                if model.loaded {
                    <TimerDisplay time_left={model.timer.time_left()} phase={model.timer.phase()} />
                    <p class="timer-sessions">{format!("Sessions completed: {}", model.timer.session_count())}</p>
                    <div class="timer-controls">
                        <Button onclick={on_toggle} variant={ButtonVariant::Primary}>
                            {if model.timer.is_running() { "⏸ Pause" } else { "▶ Start" }}
                        </Button>
                        <Button onclick={on_reset} variant={ButtonVariant::Secondary}>
                            {"↺ Reset"}
                        </Button>
                    </div>
                } else {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading timer..."}</p>
                    </div>
                }
            </div>

            // Timer settings
            <div class="card settings-card">
                <h3 class="card-title">{"Timer Settings"}</h3>
                <div class="settings-grid">
                    <DurationField
                        label="Work Duration (minutes)"
                        value={settings.work_duration}
                        disabled={!model.loaded}
                        onchange={settings_field(|s: &mut TimerSettings, v: u32| s.work_duration = v)}
                    />
                    <DurationField
                        label="Break Duration (minutes)"
                        value={settings.break_duration}
                        disabled={!model.loaded}
                        onchange={settings_field(|s: &mut TimerSettings, v: u32| s.break_duration = v)}
                    />
                    <DurationField
                        label="Long Break Duration (minutes)"
                        value={settings.long_break_duration}
                        disabled={!model.loaded}
                        onchange={settings_field(|s: &mut TimerSettings, v: u32| s.long_break_duration = v)}
                    />
                    <DurationField
                        label="Sessions Before Long Break"
                        value={settings.sessions_before_long_break}
                        disabled={!model.loaded}
                        onchange={settings_field(|s: &mut TimerSettings, v: u32| s.sessions_before_long_break = v)}
                    />
                </div>
            </div>

            // Blocked sites
            <div class="card sites-card">
                <h3 class="card-title">{"Blocked Sites"}</h3>
                <form onsubmit={on_add_site} class="site-form">
                    <input
                        type="text"
                        placeholder="Enter domain (e.g., facebook.com)"
                        value={(*new_site).clone()}
                        oninput={on_site_input}
                        disabled={!model.loaded}
                        class="site-input"
                    />
                    <button type="submit" class="pf-v5-c-button pf-m-primary" disabled={!model.loaded}>{"+ Add Site"}</button>
                </form>
                if blocked.is_empty() {
                    <p class="empty-state-hint">{"No blocked sites yet."}</p>
                } else {
                    <div class="sites-list">
                        {for blocked.sites.iter().map(|site| html! {
                            <SiteRow key={site.id.clone()} site={site.clone()} on_remove={on_remove_site.clone()} />
                        })}
                    </div>
                }
            </div>
        </div>
    }
}

// Helper functions

fn now_ms() -> f64 {
    js_sys::Date::now()
}

fn persist_latest(latest: &LatestTimer) {
    let Some(snapshot) = latest.borrow().as_ref().map(|timer| timer.snapshot(now_ms())) else {
        return;
    };
    spawn_local(async move {
        persist_then_notify(&ChromeStore, &BrowserNotifier, &snapshot, None).await;
    });
}

/// Apply a form edit to a copy of `record`. Edits made before the stored
/// records have loaded are dropped, as are edits that change nothing.
fn accept_edit<T>(loaded: bool, mut record: T, edit: impl FnOnce(&mut T) -> bool) -> Option<T> {
    if !loaded {
        log::debug!("Ignoring edit before stored state has loaded");
        return None;
    }
    edit(&mut record).then_some(record)
}

fn lifecycle_listeners(latest: &LatestTimer) -> Vec<Listener> {
    let Some(window) = web_sys::window() else {
        return Vec::new();
    };
    let mut listeners = Vec::new();

    if let Some(document) = window.document() {
        let latest = latest.clone();
        let watched = document.clone();
        let on_visibility = move || {
            if watched.visibility_state() == VisibilityState::Hidden {
                persist_latest(&latest);
            }
        };
        match Listener::new(&document, "visibilitychange", on_visibility) {
            Ok(listener) => listeners.push(listener),
            Err(e) => log::warn!("Failed to watch visibility: {:?}", e),
        }
    }

    for event in UNLOAD_EVENTS {
        let unloading = latest.clone();
        match Listener::new(&window, event, move || persist_latest(&unloading)) {
            Ok(listener) => listeners.push(listener),
            Err(e) => log::warn!("Failed to watch {}: {:?}", event, e),
        }
    }

    listeners
}

fn save_blocklist(list: BlockList, error: UseStateHandle<Option<String>>) {
    spawn_local(async move {
        if let Err(e) = write_record(&ChromeStore, BLOCKED_SITES_KEY, &list).await {
            log::error!("Error saving blocked sites: {}", e);
            error.set(Some(format!("Failed to save blocked sites: {}", e)));
        }
    });
}
