/// Full-page overlay injected by the content script on blocked sites

use crate::chrome::request_open_dashboard;
use crate::enforcement::{EnforcementError, PageHost};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, Window};

pub const OVERLAY_ID: &str = "devflow-focus-overlay";

const OVERLAY_STYLE: &str = "position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
    background-color: rgba(255, 255, 255, 0.98); z-index: 999999; display: flex; \
    flex-direction: column; align-items: center; justify-content: center; \
    font-family: system-ui, -apple-system, sans-serif;";
const CONTENT_STYLE: &str = "text-align: center; max-width: 400px; padding: 2rem;";
const TITLE_STYLE: &str = "font-size: 2rem; font-weight: bold; color: #1a1a1a; margin-bottom: 1rem;";
const MESSAGE_STYLE: &str = "color: #666; margin-bottom: 2rem; line-height: 1.5;";
const BUTTONS_STYLE: &str = "display: flex; gap: 1rem; justify-content: center;";
const BUTTON_STYLE: &str = "padding: 0.75rem 1.5rem; border-radius: 0.5rem; border: none; \
    cursor: pointer; font-weight: 500; transition: background-color 0.2s;";

struct ButtonColors {
    text: &'static str,
    background: &'static str,
    hover: &'static str,
}

const PRIMARY: ButtonColors = ButtonColors { text: "white", background: "#3b82f6", hover: "#2563eb" };
const SECONDARY: ButtonColors = ButtonColors { text: "#374151", background: "#e5e7eb", hover: "#d1d5db" };

/// The live page the content script was injected into
pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn current() -> Option<DomPage> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(DomPage { window, document })
    }
}

impl PageHost for DomPage {
    fn hostname(&self) -> Option<String> {
        self.window.location().hostname().ok()
    }

    fn overlay_present(&self) -> bool {
        self.document.get_element_by_id(OVERLAY_ID).is_some()
    }

    fn show_overlay(&self) -> Result<(), EnforcementError> {
        build_overlay(&self.window, &self.document).map_err(|e| EnforcementError::Overlay(format!("{:?}", e)))
    }
}

fn build_overlay(window: &Window, document: &Document) -> Result<(), JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("page has no body"))?;

    let overlay = styled(document, "div", OVERLAY_STYLE)?;
    overlay.set_id(OVERLAY_ID);

    let content = styled(document, "div", CONTENT_STYLE)?;

    let title = styled(document, "h1", TITLE_STYLE)?;
    title.set_text_content(Some("Stay Focused!"));

    let message = styled(document, "p", MESSAGE_STYLE)?;
    message.set_text_content(Some("This site is currently blocked to help you maintain focus."));

    let buttons = styled(document, "div", BUTTONS_STYLE)?;

    let history_window = window.clone();
    let go_back = button(document, "Go Back", &PRIMARY, move || {
        if let Err(e) = history_window.history().and_then(|h| h.back()) {
            log::error!("Failed to go back: {:?}", e);
        }
    })?;
    let open_dashboard = button(document, "Open Dashboard", &SECONDARY, request_open_dashboard)?;

    buttons.append_child(&go_back)?;
    buttons.append_child(&open_dashboard)?;
    content.append_child(&title)?;
    content.append_child(&message)?;
    content.append_child(&buttons)?;
    overlay.append_child(&content)?;
    body.append_child(&overlay)?;

    // Prevent scrolling on the page underneath
    body.style().set_property("overflow", "hidden")?;
    Ok(())
}

fn styled(document: &Document, tag: &str, style: &str) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    element.set_attribute("style", style)?;
    Ok(element)
}

fn button(
    document: &Document,
    label: &str,
    colors: &ButtonColors,
    on_click: impl FnMut() + 'static,
) -> Result<HtmlElement, JsValue> {
    let button: HtmlElement = styled(document, "button", BUTTON_STYLE)?.dyn_into()?;
    button.set_text_content(Some(label));
    button.style().set_property("color", colors.text)?;
    button.style().set_property("background-color", colors.background)?;

    listen(&button, "click", on_click)?;

    let hovered = button.clone();
    let hover = colors.hover;
    listen(&button, "mouseover", move || set_background(&hovered, hover))?;

    let unhovered = button.clone();
    let background = colors.background;
    listen(&button, "mouseout", move || set_background(&unhovered, background))?;

    Ok(button)
}

fn set_background(element: &HtmlElement, color: &str) {
    if let Err(e) = element.style().set_property("background-color", color) {
        log::warn!("Failed to restyle overlay button: {:?}", e);
    }
}

/// Listeners stay attached for the life of the page
fn listen(target: &HtmlElement, event: &str, handler: impl FnMut() + 'static) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut()>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_overlay_covers_page() {
        let page = DomPage::current().unwrap();
        assert!(!page.overlay_present());

        page.show_overlay().unwrap();

        assert!(page.overlay_present());
        let body = page.document.body().unwrap();
        assert_eq!(body.style().get_property_value("overflow").unwrap(), "hidden");
    }

    #[wasm_bindgen_test]
    fn test_button_hover_swaps_background() {
        let document = web_sys::window().unwrap().document().unwrap();
        let button = button(&document, "Go Back", &PRIMARY, || ()).unwrap();
        let background = || button.style().get_property_value("background-color").unwrap();
        let before = background();

        button.dispatch_event(&web_sys::Event::new("mouseover").unwrap()).unwrap();
        let hovered = background();
        button.dispatch_event(&web_sys::Event::new("mouseout").unwrap()).unwrap();

        assert_ne!(hovered, before);
        assert_eq!(background(), before);
    }
}
