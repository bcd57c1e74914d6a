use crate::cli::actions::Action;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn optional(matches: &clap::ArgMatches, name: &str) -> Option<String> {
    matches.get_one::<String>(name).cloned()
}

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (subcommand, sub_m) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("missing subcommand"))?;

    let action = match subcommand {
        "register" => Action::Register {
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
            name: optional(sub_m, "name"),
            photo: optional(sub_m, "photo"),
        },
        "login" => Action::Login {
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
        },
        "login-idp" => Action::LoginIdp {
            assertion: required(sub_m, "assertion")?,
        },
        "logout" => Action::Logout,
        "status" => Action::Status,
        "posts" => Action::Posts {
            search: optional(sub_m, "search"),
            upcoming: sub_m.get_flag("upcoming"),
        },
        "post" => Action::Post {
            id: required(sub_m, "id")?,
        },
        "my-posts" => Action::MyPosts,
        "my-applications" => Action::MyApplications,
        "add-post" => Action::AddPost {
            title: required(sub_m, "title")?,
            description: required(sub_m, "description")?,
            category: required(sub_m, "category")?,
            location: required(sub_m, "location")?,
            volunteers_needed: sub_m
                .get_one::<i64>("volunteers")
                .copied()
                .context("missing required argument: --volunteers")?,
            deadline: required(sub_m, "deadline")?,
            thumbnail: optional(sub_m, "thumbnail"),
        },
        "delete-post" => Action::DeletePost {
            id: required(sub_m, "id")?,
        },
        "apply" => Action::Apply {
            id: required(sub_m, "id")?,
        },
        "withdraw" => Action::Withdraw {
            id: required(sub_m, "id")?,
        },
        _ => return Err(anyhow!("unknown subcommand: {subcommand}")),
    };

    Ok(action)
}
