use crate::auth::guards::{GuardState, Route, RouteGuard};
use crate::auth::types::Identity;
use crate::cli::actions::session::{context, AppContext};
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::posts::types::{VolunteerApplication, VolunteerPost};
use crate::posts::{client, search};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// Handle the posts and applications actions
///
/// # Errors
/// Returns an error when the guard denies access or the backend rejects the
/// request.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let ctx = context(globals).await?;
    ctx.bootstrap.settled(0).await;

    match action {
        Action::Posts {
            search: term,
            upcoming,
        } => {
            let posts = if upcoming {
                client::upcoming_posts(&ctx.api).await?
            } else if let Some(term) = term {
                search(&ctx.api, &term).await?
            } else {
                client::list_posts(&ctx.api).await?
            };
            print_posts(&posts);
        }

        Action::Post { id } => {
            let post = client::get_post(&ctx.api, &id).await?;
            print_post(&post);
        }

        Action::MyPosts => {
            let identity = authorize(&ctx, Route::ManageMyPosts).await?;
            let posts = client::posts_by_organizer(&ctx.api, &identity.email).await?;
            print_posts(&posts);
        }

        Action::MyApplications => {
            let identity = authorize(&ctx, Route::MyApplications).await?;
            let applications = client::applications_by_volunteer(&ctx.api, &identity.email).await?;
            if applications.is_empty() {
                println!("No applications yet");
            }
            for application in &applications {
                print_application(application);
            }
        }

        Action::AddPost {
            title,
            description,
            category,
            location,
            volunteers_needed,
            deadline,
            thumbnail,
        } => {
            let identity = authorize(&ctx, Route::AddPost).await?;
            let deadline = deadline
                .parse::<DateTime<Utc>>()
                .map_err(|err| anyhow!("invalid deadline: {err}"))?;

            let post = VolunteerPost {
                id: None,
                thumbnail: thumbnail.unwrap_or_default(),
                title,
                description,
                category,
                location,
                volunteers_needed,
                deadline,
                organizer_name: identity.display_name.clone(),
                organizer_email: identity.email.clone(),
                created_at: Utc::now(),
                status: "active".to_string(),
            };

            client::create_post(&ctx.api, &post).await?;
            println!("Published \"{}\"", post.title);
        }

        Action::DeletePost { id } => {
            authorize(&ctx, Route::ManageMyPosts).await?;
            client::delete_post(&ctx.api, &id).await?;
            println!("Deleted post {id}");
        }

        Action::Apply { id } => {
            let identity = authorize(&ctx, Route::PostDetails(id.clone())).await?;
            let application = VolunteerApplication::pending(&id, &identity);
            client::apply(&ctx.api, &application).await?;
            println!("Applied to post {id}");
        }

        Action::Withdraw { id } => {
            authorize(&ctx, Route::MyApplications).await?;
            client::withdraw_application(&ctx.api, &id).await?;
            println!("Withdrew application {id}");
        }

        other => return Err(anyhow!("not a posts action: {other:?}")),
    }

    Ok(())
}

/// Runs the route guard for a protected view and hands back the signed-in
/// identity on success.
async fn authorize(ctx: &AppContext, requested: Route) -> Result<Identity> {
    let guard = RouteGuard::new(ctx.bridge.clone(), ctx.api.clone(), ctx.navigator.clone());

    match guard.resolve(requested).await {
        GuardState::Authorized => ctx
            .bridge
            .current_identity()
            .ok_or_else(|| anyhow!("signed out while authorizing")),
        _ => Err(anyhow!(
            "sign in first: serve-sync login --email <email> --password <password>"
        )),
    }
}

fn print_posts(posts: &[VolunteerPost]) {
    if posts.is_empty() {
        println!("No posts found");
        return;
    }
    for post in posts {
        let id = post.id.as_deref().unwrap_or("-");
        println!(
            "{id}  {title}  [{category}] {location}, needs {needed}, by {deadline}",
            title = post.title,
            category = post.category,
            location = post.location,
            needed = post.volunteers_needed,
            deadline = post.deadline.format("%Y-%m-%d"),
        );
    }
}

fn print_post(post: &VolunteerPost) {
    println!("Title:       {}", post.title);
    println!("Category:    {}", post.category);
    println!("Location:    {}", post.location);
    println!("Volunteers:  {}", post.volunteers_needed);
    println!("Deadline:    {}", post.deadline.format("%Y-%m-%d"));
    if let Some(name) = &post.organizer_name {
        println!("Organizer:   {name} <{}>", post.organizer_email);
    } else {
        println!("Organizer:   {}", post.organizer_email);
    }
    println!();
    println!("{}", post.description);
}

fn print_application(application: &VolunteerApplication) {
    let id = application.id.as_deref().unwrap_or("-");
    println!(
        "{id}  post {post}  {status}  applied {applied}",
        post = application.post_id,
        status = application.status,
        applied = application.applied_at.format("%Y-%m-%d"),
    );
}
