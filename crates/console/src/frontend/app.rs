//! Root component, routing and the store-to-signal bridge.

use std::sync::Arc;

use leptos::*;
use leptos_router::*;

use crate::frontend::layout::Protected;
use crate::frontend::pages::{DashboardPage, LoginPage, ProfileFormPage, ProfileListPage};
use crate::store::AppState;
use crate::{Console, ConsoleConfig};

/// Latest store snapshot as a signal.
#[derive(Clone, Copy)]
pub struct AppStateSignal(pub ReadSignal<Arc<AppState>>);

pub fn use_app_state() -> ReadSignal<Arc<AppState>> {
    expect_context::<AppStateSignal>().0
}

pub fn use_console() -> Console {
    expect_context::<Console>()
}

#[component]
pub fn App() -> impl IntoView {
    let console = Console::from_config(ConsoleConfig::from_env());

    // Before the first snapshot is taken: a returning user starts Pending,
    // so the guarded routes wait instead of bouncing to /login.
    let session = console.session();
    let pending = session.begin_restore().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "stored session could not be restored");
        None
    });

    let (state, set_state) = create_signal(console.snapshot());
    let mut updates = console.store().subscribe();
    spawn_local(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            set_state.set(snapshot);
        }
    });

    if let Some(pending) = pending {
        spawn_local(async move {
            if let Err(e) = session.complete_restore(pending).await {
                tracing::warn!(error = %e, "stored session could not be restored");
            }
        });
    }

    provide_context(console);
    provide_context(AppStateSignal(state));

    view! {
        <Router>
            <Routes>
                <Route path="/login" view=LoginPage/>
                <Route path="/" view=Protected>
                    <Route path="" view=DashboardPage/>
                    <Route path="profiles" view=ProfileListPage/>
                    <Route path="profiles/create" view=ProfileFormPage/>
                    <Route path="profiles/:id" view=ProfileFormPage/>
                </Route>
            </Routes>
        </Router>
    }
}
