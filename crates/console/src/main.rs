//! Headless console entry point.
//!
//! Restores the persisted session (or logs in with `OMNICORP_USERNAME` /
//! `OMNICORP_PASSWORD`), loads every collection the user may see and logs a
//! summary. `omnicorp-console logout` forgets the stored credential.

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use omnicorp_console::{Console, ConsoleConfig};

    omnicorp_observability::init();

    let config = ConsoleConfig::from_env();
    tracing::info!(api_url = %config.api_url, "starting OmniCorp console");
    let console = Console::from_config(config);
    let session = console.session();

    if std::env::args().nth(1).as_deref() == Some("logout") {
        session.logout();
        return Ok(());
    }

    if let Err(e) = session.restore_session().await {
        tracing::warn!(error = %e, "stored session could not be restored");
    }

    if !console.snapshot().session.is_authenticated() {
        match (
            std::env::var("OMNICORP_USERNAME"),
            std::env::var("OMNICORP_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => {
                session.login(&username, &password).await?;
            }
            _ => {
                tracing::warn!("not signed in; set OMNICORP_USERNAME and OMNICORP_PASSWORD");
                return Ok(());
            }
        }
    }

    console.modules().fetch_all().await?;
    if console.is_admin() {
        console.profiles().fetch_all().await?;
        console.permissions().fetch_all().await?;
        console.users().fetch_all().await?;
    }

    let state = console.snapshot();
    let sidebar = console.sidebar();
    tracing::info!(
        greeting = %console.dashboard().greeting,
        profiles = state.profiles.items().len(),
        permissions = state.permissions.items().len(),
        users = state.users.items().len(),
        modules = state.modules.items().len(),
        sidebar = %serde_json::to_string(&sidebar)?,
        "console ready"
    );

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
