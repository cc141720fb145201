use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Overlay plus positioned surface. Content renders its own header and buttons.
#[component]
pub fn ModalFrame(
    on_close: Callback<()>,
    #[prop(optional)] z_index: Option<i32>,
    #[prop(optional)] modal_class: Option<String>,
    #[prop(optional)] modal_style: Option<String>,
    children: Children,
) -> impl IntoView {
    let z_index = z_index.unwrap_or(1000);
    let pressed_on_overlay = RwSignal::new(false);

    fn on_overlay_itself(ev: &ev::MouseEvent) -> bool {
        matches!((ev.target(), ev.current_target()), (Some(t), Some(ct)) if t == ct)
    }

    // Both press and release must land on the overlay, so a text selection
    // that ends outside the surface does not close the modal.
    let on_mouse_down = move |ev: ev::MouseEvent| pressed_on_overlay.set(on_overlay_itself(&ev));
    let on_click = move |ev: ev::MouseEvent| {
        let should_close = pressed_on_overlay.get_untracked() && on_overlay_itself(&ev);
        pressed_on_overlay.set(false);
        if should_close {
            spawn_local(async move {
                TimeoutFuture::new(0).await;
                on_close.run(());
            });
        }
    };

    let surface_class = match modal_class.filter(|c| !c.is_empty()) {
        Some(cls) => format!("modal {cls}"),
        None => "modal".to_string(),
    };
    let surface_style = match modal_style.filter(|s| !s.is_empty()) {
        Some(extra) => format!("position: relative; {extra}"),
        None => "position: relative;".to_string(),
    };

    view! {
        <div
            class="modal-overlay"
            style={format!("z-index: {z_index};")}
            on:mousedown=on_mouse_down
            on:click=on_click
        >
            <div class=surface_class style=surface_style on:click=|ev: ev::MouseEvent| ev.stop_propagation()>
                {children()}
            </div>
        </div>
    }
}
