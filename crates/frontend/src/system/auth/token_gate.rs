use contracts::shared::error::CatalogError;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::shared::api_client::ApiClient;
use crate::shared::error_banner::ErrorBanner;

/// Asks for the API token and checks it against the backend. The token is
/// kept in memory only; reloading the page asks again.
#[component]
pub fn TokenGate(on_signed_in: Callback<ApiClient>) -> impl IntoView {
    let token = RwSignal::new(String::new());
    let error = RwSignal::new(None::<CatalogError>);
    let is_checking = RwSignal::new(false);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let client = ApiClient::for_current_location(token.get_untracked());

        is_checking.set(true);
        error.set(None);
        spawn_local(async move {
            let result = client.check_access().await;
            is_checking.set(false);
            match result {
                Ok(()) => {
                    log::info!("signed in to {}", client.base_url());
                    on_signed_in.run(client);
                }
                Err(e) => error.set(Some(e)),
            }
        });
    };

    view! {
        <div class="login-container">
            <div class="login-box">
                <h1>"Catalog back office"</h1>
                <h2>"Sign in"</h2>

                <ErrorBanner error=error />

                <form on:submit=on_submit>
                    <div class="form-group">
                        <label for="api-token">"API token"</label>
                        <input
                            type="password"
                            id="api-token"
                            autocomplete="off"
                            placeholder="leave empty if the server has no tokens"
                            prop:value=move || token.get()
                            on:input=move |ev| token.set(event_target_value(&ev))
                            disabled=move || is_checking.get()
                        />
                    </div>

                    <button type="submit" class="button button--primary" disabled=move || is_checking.get()>
                        {move || if is_checking.get() { "Checking..." } else { "Continue" }}
                    </button>
                </form>
            </div>
        </div>
    }
}
