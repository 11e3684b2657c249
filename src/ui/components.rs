/// Reusable UI components for the focus page

use crate::blocklist::BlockedSite;
use crate::timer::{Phase, format_time};
use patternfly_yew::prelude::*;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct TimerDisplayProps {
    pub time_left: u32,
    pub phase: Phase,
}

#[function_component(TimerDisplay)]
pub fn timer_display(props: &TimerDisplayProps) -> Html {
    html! {
        <div class="timer-display">
            <h2 class="timer-clock">{format_time(props.time_left)}</h2>
            <p class="timer-phase">{props.phase.label()}</p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DurationFieldProps {
    pub label: AttrValue,
    pub value: u32,
    pub onchange: Callback<u32>,
    #[prop_or_default]
    pub disabled: bool,
}

/// Numeric input that only reports whole numbers >= 1
#[function_component(DurationField)]
pub fn duration_field(props: &DurationFieldProps) -> Html {
    let oninput = {
        let onchange = props.onchange.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                if let Ok(value) = input.value().trim().parse::<u32>() {
                    if value >= 1 {
                        onchange.emit(value);
                    }
                }
            }
        })
    };

    html! {
        <div class="duration-field">
            <label class="duration-label">
                {props.label.clone()}
                <input
                    type="number"
                    min="1"
                    value={props.value.to_string()}
                    oninput={oninput}
                    disabled={props.disabled}
                    class="duration-input"
                />
            </label>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SiteRowProps {
    pub site: BlockedSite,
    pub on_remove: Callback<String>,
}

#[function_component(SiteRow)]
pub fn site_row(props: &SiteRowProps) -> Html {
    let onclick = {
        let id = props.site.id.clone();
        props.on_remove.reform(move |_: MouseEvent| id.clone())
    };

    html! {
        <div class="site-row">
            <span class="site-url">{&props.site.url}</span>
            <Button onclick={onclick} variant={ButtonVariant::Danger} size={ButtonSize::Small}>
                {"🗑️"}
            </Button>
        </div>
    }
}
