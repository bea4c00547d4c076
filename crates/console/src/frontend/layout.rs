//! Guarded shell: header, sidebar and the routed page.

use leptos::*;
use leptos_router::*;

use omnicorp_auth::{GuardDecision, LOGIN_PATH};

use crate::frontend::app::{use_app_state, use_console};
use crate::navigation::{self, NavItem};

/// Renders the shell only for an authenticated session; nothing while one is
/// being established, the login page otherwise.
#[component]
pub fn Protected() -> impl IntoView {
    let state = use_app_state();
    let decision = create_memo(move |_| omnicorp_auth::guard(&state.get().session));

    move || match decision.get() {
        GuardDecision::Render => view! { <Shell/> }.into_view(),
        GuardDecision::Wait => ().into_view(),
        GuardDecision::RedirectToLogin => view! { <Redirect path=LOGIN_PATH/> }.into_view(),
    }
}

#[component]
fn Shell() -> impl IntoView {
    view! {
        <div class="shell">
            <Header/>
            <div class="shell-body">
                <Sidebar/>
                <main class="content">
                    <Outlet/>
                </main>
            </div>
        </div>
    }
}

#[component]
fn Header() -> impl IntoView {
    let console = use_console();
    let state = use_app_state();

    let user = move || state.with(|s| s.session.current_user().cloned());
    let logout = move |_| console.session().logout();

    view! {
        <header class="app-header">
            <span class="brand">"OmniCorp"</span>
            <div class="user">
                {move || user().map(|u| view! {
                    <span class="avatar">{u.initial().to_string()}</span>
                    <span class="name">{u.display_name().to_string()}</span>
                })}
                <button on:click=logout>"Sign out"</button>
            </div>
        </header>
    }
}

#[component]
fn Sidebar() -> impl IntoView {
    let console = use_console();
    let state = use_app_state();
    let location = use_location();

    let modules = console.modules();
    spawn_local(async move {
        let _ = modules.fetch_all().await;
    });

    let bar = create_memo(move |_| navigation::sidebar(&state.get(), console.policy()));

    let section = move |items: Vec<NavItem>| {
        items
            .into_iter()
            .map(|item| {
                let path = item.path.clone();
                let label = item.label.clone();
                let active = move || location.pathname.with(|p| item.is_active(p));
                view! {
                    <li class:active=active>
                        <A href=path>{label}</A>
                    </li>
                }
            })
            .collect_view()
    };

    view! {
        <nav class="sidebar">
            <ul>{move || section(bar.get().main)}</ul>
            <Show when=move || bar.with(|b| !b.administration.is_empty())>
                <h6>"Administration"</h6>
                <ul>{move || section(bar.get().administration)}</ul>
            </Show>
            <h6>"Modules"</h6>
            <ul>{move || section(bar.get().modules)}</ul>
        </nav>
    }
}
