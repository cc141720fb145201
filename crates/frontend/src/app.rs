use crate::domain::a001_category::ui::tree::CategoryTree;
use crate::shared::api_client::ApiClient;
use crate::shared::modal_stack::{ModalHost, ModalStackService};
use crate::system::auth::token_gate::TokenGate;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    let modal_stack = ModalStackService::new();
    provide_context(modal_stack);

    let client = RwSignal::new(None::<ApiClient>);
    let on_signed_in = Callback::new(move |c: ApiClient| client.set(Some(c)));
    let on_sign_out = Callback::new(move |_| {
        modal_stack.clear();
        client.set(None);
    });

    view! {
        {move || match client.get() {
            Some(client) => view! { <CategoryTree client=client on_sign_out=on_sign_out /> }.into_any(),
            None => view! { <TokenGate on_signed_in=on_signed_in /> }.into_any(),
        }}
        <ModalHost />
    }
}
