use anyhow::Result;
use serve_sync::cli::{actions, actions::Action, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    match action {
        Action::Register { .. }
        | Action::Login { .. }
        | Action::LoginIdp { .. }
        | Action::Logout
        | Action::Status => actions::session::handle(action, &globals).await?,
        _ => actions::posts::handle(action, &globals).await?,
    }

    Ok(())
}
