//! Routed pages.

use leptos::*;
use leptos_router::*;

use omnicorp_core::{PermissionId, ProfileDraft, ProfileId};

use crate::dashboard;
use crate::frontend::app::{use_app_state, use_console};
use crate::frontend::confirm;

#[component]
pub fn LoginPage() -> impl IntoView {
    let console = use_console();
    let state = use_app_state();
    let navigate = use_navigate();

    let username = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());

    create_effect(move |_| {
        if state.with(|s| s.session.is_authenticated()) {
            navigate("/", Default::default());
        }
    });

    let pending = move || state.with(|s| s.session.is_pending());
    let error = move || state.with(|s| s.session.last_error().map(str::to_string));

    let session = console.session();
    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let session = session.clone();
        let (u, p) = (username.get_untracked(), password.get_untracked());
        spawn_local(async move {
            let _ = session.login(&u, &p).await;
        });
    };
    let dismiss = move |_| console.session().dismiss_error();

    view! {
        <div class="login">
            <h1>"OmniCorp"</h1>
            <form on:submit=submit>
                <input
                    type="text"
                    placeholder="Username"
                    prop:value=move || username.get()
                    on:input=move |ev| username.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
                <button type="submit" disabled=pending>
                    {move || if pending() { "Signing in..." } else { "Sign in" }}
                </button>
            </form>
            {move || error().map(|message| view! {
                <div class="alert error">
                    <span>{message}</span>
                    <button on:click=dismiss.clone()>"x"</button>
                </div>
            })}
        </div>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let state = use_app_state();
    let dashboard = create_memo(move |_| dashboard::dashboard(&state.get().session));

    view! {
        <section class="dashboard">
            <h2>"Dashboard"</h2>
            <p class="greeting">{move || dashboard.get().greeting}</p>
            <div class="cards">
                {move || dashboard.get().cards.into_iter().map(|card| view! {
                    <div class="card" style=format!("border-color: {}", card.accent)>
                        <span class="count">{card.count}</span>
                        <span class="title">{card.title}</span>
                    </div>
                }).collect_view()}
            </div>
        </section>
    }
}

#[component]
pub fn ProfileListPage() -> impl IntoView {
    let console = use_console();
    let state = use_app_state();

    let profiles = console.profiles();
    {
        let profiles = profiles.clone();
        spawn_local(async move {
            let _ = profiles.fetch_all().await;
        });
    }

    let delete = {
        let profiles = profiles.clone();
        move |id: ProfileId| {
            let profiles = profiles.clone();
            spawn_local(async move {
                let _ = profiles
                    .delete_confirmed(id, |p| {
                        let name = p.map(|p| p.name.as_str()).unwrap_or("this profile");
                        confirm(&format!("Delete {name}?"))
                    })
                    .await;
            });
        }
    };
    let clear = move |_| profiles.clear_error();

    let loading = move || state.with(|s| s.profiles.is_loading());
    let error = move || state.with(|s| s.profiles.last_error().map(str::to_string));
    let rows = move || state.with(|s| s.profiles.items().to_vec());

    view! {
        <section class="profiles">
            <header>
                <h2>"Profiles"</h2>
                <A href="/profiles/create">"New profile"</A>
            </header>
            {move || error().map(|message| view! {
                <div class="alert error">
                    <span>{message}</span>
                    <button on:click=clear.clone()>"x"</button>
                </div>
            })}
            <Show when=loading>
                <p class="loading">"Loading..."</p>
            </Show>
            <table>
                <thead>
                    <tr>
                        <th>"Name"</th>
                        <th>"Description"</th>
                        <th>"Permissions"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        let delete = delete.clone();
                        rows().into_iter().map(|profile| {
                            let delete = delete.clone();
                            let id = profile.id;
                            view! {
                                <tr>
                                    <td>{profile.name.clone()}</td>
                                    <td>{profile.description.clone().unwrap_or_default()}</td>
                                    <td>{profile.permissions.len()}</td>
                                    <td>
                                        <A href=format!("/profiles/{id}")>"Edit"</A>
                                        <button on:click=move |_| delete(id)>"Delete"</button>
                                    </td>
                                </tr>
                            }
                        }).collect_view()
                    }}
                </tbody>
            </table>
        </section>
    }
}

#[component]
pub fn ProfileFormPage() -> impl IntoView {
    let console = use_console();
    let state = use_app_state();
    let params = use_params_map();
    let navigate = use_navigate();

    let editing = create_memo(move |_| {
        params.with(|p| p.get("id").and_then(|raw| raw.parse::<ProfileId>().ok()))
    });

    let name = create_rw_signal(String::new());
    let description = create_rw_signal(String::new());
    let selected = create_rw_signal(Vec::<PermissionId>::new());
    let filled = create_rw_signal(false);

    let profiles = console.profiles();
    {
        let permissions = console.permissions();
        let profiles = profiles.clone();
        let need_profiles = editing.get_untracked().is_some()
            && state.with_untracked(|s| s.profiles.items().is_empty());
        spawn_local(async move {
            let _ = permissions.fetch_all().await;
            if need_profiles {
                let _ = profiles.fetch_all().await;
            }
        });
    }

    create_effect(move |_| {
        let Some(id) = editing.get() else { return };
        if filled.get_untracked() {
            return;
        }
        if let Some(profile) = state.with(|s| s.profiles.get(id).cloned()) {
            name.set(profile.name.clone());
            description.set(profile.description.clone().unwrap_or_default());
            selected.set(profile.permission_ids());
            filled.set(true);
        }
    });

    let toggle = move |id: PermissionId| {
        selected.update(|ids| {
            if let Some(pos) = ids.iter().position(|p| *p == id) {
                ids.remove(pos);
            } else {
                ids.push(id);
            }
        })
    };

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let draft = ProfileDraft::new(name.get_untracked())
            .with_description(description.get_untracked())
            .with_permissions(selected.get_untracked());
        let profiles = profiles.clone();
        let navigate = navigate.clone();
        let target = editing.get_untracked();
        spawn_local(async move {
            let saved = match target {
                Some(id) => profiles.update(id, &draft).await,
                None => profiles.create(&draft).await,
            };
            if saved.is_ok() {
                navigate("/profiles", Default::default());
            }
        });
    };

    let error = move || state.with(|s| s.profiles.last_error().map(str::to_string));
    let permissions = move || state.with(|s| s.permissions.items().to_vec());

    view! {
        <section class="profile-form">
            <h2>{move || if editing.get().is_some() { "Edit profile" } else { "New profile" }}</h2>
            {move || error().map(|message| view! { <div class="alert error">{message}</div> })}
            <form on:submit=submit>
                <label>
                    "Name"
                    <input
                        type="text"
                        prop:value=move || name.get()
                        on:input=move |ev| name.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Description"
                    <textarea
                        prop:value=move || description.get()
                        on:input=move |ev| description.set(event_target_value(&ev))
                    ></textarea>
                </label>
                <fieldset>
                    <legend>"Permissions"</legend>
                    {move || permissions().into_iter().map(|permission| {
                        let id = permission.id;
                        let checked = move || selected.with(|ids| ids.contains(&id));
                        view! {
                            <label class="permission">
                                <input
                                    type="checkbox"
                                    prop:checked=checked
                                    on:change=move |_| toggle(id)
                                />
                                {permission.name.clone()}
                            </label>
                        }
                    }).collect_view()}
                </fieldset>
                <div class="actions">
                    <A href="/profiles">"Cancel"</A>
                    <button type="submit">"Save"</button>
                </div>
            </form>
        </section>
    }
}
