use crate::api::ApiClient;
use crate::auth::bootstrap::SessionBootstrap;
use crate::auth::bridge::IdentityBridge;
use crate::auth::guards::MemoryNavigator;
use crate::auth::provider::HttpIdentityProvider;
use crate::auth::state::SessionStore;
use crate::auth::{client, types::Identity};
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// The wired-up runtime behind every subcommand: session store, request
/// pipeline, identity bridge, and the bootstrap task that keeps the session
/// token in step with identity changes.
pub struct AppContext {
    pub api: Arc<ApiClient>,
    pub bridge: Arc<IdentityBridge>,
    pub navigator: Arc<MemoryNavigator>,
    pub bootstrap: SessionBootstrap,
}

/// Assembles the runtime from the connection settings.
///
/// # Errors
/// Returns an error when a base URL is invalid.
pub async fn context(globals: &GlobalArgs) -> Result<AppContext> {
    let config = globals.config();

    let session = if config.token_file.as_os_str().is_empty() {
        Arc::new(SessionStore::in_memory())
    } else {
        Arc::new(SessionStore::open(config.token_file.clone()))
    };

    let navigator = Arc::new(MemoryNavigator::new());
    let api = Arc::new(ApiClient::new(&config, session, navigator.clone())?);

    let provider = Arc::new(HttpIdentityProvider::new(&config)?);
    let bridge = Arc::new(IdentityBridge::init(provider).await);
    let bootstrap = SessionBootstrap::spawn(bridge.clone(), api.clone());

    Ok(AppContext {
        api,
        bridge,
        navigator,
        bootstrap,
    })
}

/// Handle the session actions
///
/// # Errors
/// Returns an error on rejected credentials, provider failure, or when a
/// sign-in succeeds but no session token could be minted.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let ctx = context(globals).await?;

    match action {
        Action::Register {
            email,
            password,
            name,
            photo,
        } => {
            let (identity, epoch) = ctx
                .bridge
                .register_with_password(&email, &password, name.as_deref(), photo.as_deref())
                .await?;
            ctx.bootstrap.settled(epoch).await;
            ensure_token(&ctx)?;
            println!("Registered and signed in as {}", identity.email);
        }

        Action::Login { email, password } => {
            let (identity, epoch) = ctx.bridge.sign_in_with_password(&email, &password).await?;
            ctx.bootstrap.settled(epoch).await;
            ensure_token(&ctx)?;
            println!("Signed in as {}", identity.email);
        }

        Action::LoginIdp { assertion } => {
            let (identity, epoch) = ctx.bridge.sign_in_federated(&assertion).await?;
            ctx.bootstrap.settled(epoch).await;
            ensure_token(&ctx)?;
            println!("Signed in as {}", identity.email);
        }

        Action::Logout => {
            let epoch = ctx.bridge.sign_out().await;
            ctx.bootstrap.settled(epoch).await;
            println!("Signed out");
        }

        Action::Status => {
            // Let the startup emission settle so a restored identity has its
            // token minted before we inspect anything.
            ctx.bootstrap.settled(0).await;

            match ctx.bridge.current_identity() {
                Some(identity) => {
                    let confirmed = client::verify_token(&ctx.api).await.unwrap_or(false);
                    print_status(&identity, confirmed);
                }
                None => println!("Not signed in"),
            }
        }

        other => return Err(anyhow!("not a session action: {other:?}")),
    }

    Ok(())
}

fn ensure_token(ctx: &AppContext) -> Result<()> {
    if ctx.api.session().is_authenticated() {
        Ok(())
    } else {
        Err(anyhow!(
            "signed in, but no session token was issued; check the API URL and try again"
        ))
    }
}

fn print_status(identity: &Identity, confirmed: bool) {
    println!(
        "serve-sync {} ({})",
        env!("CARGO_PKG_VERSION"),
        crate::GIT_COMMIT_HASH
    );
    println!("Signed in as {}", identity.email);
    if let Some(name) = &identity.display_name {
        println!("Name:    {name}");
    }
    println!("Uid:     {}", identity.uid);
    println!(
        "Session: {}",
        if confirmed { "valid" } else { "not confirmed" }
    );
}
