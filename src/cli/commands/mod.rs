use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("serve-sync")
        .about("Volunteer opportunity hub client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Backend API base URL, example: https://api.servesync.tld")
                .env("SERVE_SYNC_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("identity-url")
                .long("identity-url")
                .help("Identity provider base URL")
                .env("SERVE_SYNC_IDENTITY_URL")
                .global(true),
        )
        .arg(
            Arg::new("identity-key")
                .long("identity-key")
                .help("Identity provider API key")
                .env("SERVE_SYNC_IDENTITY_KEY")
                .global(true),
        )
        .arg(
            Arg::new("token-file")
                .long("token-file")
                .help("File holding the session token, keeps you signed in across runs")
                .env("SERVE_SYNC_TOKEN_FILE")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SERVE_SYNC_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and sign in")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Account email")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Account password")
                        .env("SERVE_SYNC_PASSWORD")
                        .required(true),
                )
                .arg(Arg::new("name").long("name").help("Display name"))
                .arg(Arg::new("photo").long("photo").help("Profile photo URL")),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with email and password")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Account email")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Account password")
                        .env("SERVE_SYNC_PASSWORD")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("login-idp")
                .about("Sign in with a federated identity assertion")
                .arg(
                    Arg::new("assertion")
                        .help("Assertion payload from the identity provider flow")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and drop the session token"))
        .subcommand(Command::new("status").about("Show the current session"))
        .subcommand(
            Command::new("posts")
                .about("Browse volunteer need posts")
                .arg(
                    Arg::new("search")
                        .short('s')
                        .long("search")
                        .help("Filter posts by title"),
                )
                .arg(
                    Arg::new("upcoming")
                        .long("upcoming")
                        .help("Only posts with the nearest deadlines")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("search"),
                ),
        )
        .subcommand(
            Command::new("post")
                .about("Show one post")
                .arg(Arg::new("id").help("Post id").required(true)),
        )
        .subcommand(Command::new("my-posts").about("Posts you organize"))
        .subcommand(Command::new("my-applications").about("Your volunteer applications"))
        .subcommand(
            Command::new("add-post")
                .about("Publish a volunteer need post")
                .arg(Arg::new("title").long("title").required(true))
                .arg(Arg::new("description").long("description").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("location").long("location").required(true))
                .arg(
                    Arg::new("volunteers")
                        .long("volunteers")
                        .help("Number of volunteers needed")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("deadline")
                        .long("deadline")
                        .help("Deadline, RFC 3339")
                        .required(true),
                )
                .arg(Arg::new("thumbnail").long("thumbnail").help("Thumbnail URL")),
        )
        .subcommand(
            Command::new("delete-post")
                .about("Delete a post you organize")
                .arg(Arg::new("id").help("Post id").required(true)),
        )
        .subcommand(
            Command::new("apply")
                .about("Volunteer for a post")
                .arg(Arg::new("id").help("Post id").required(true)),
        )
        .subcommand(
            Command::new("withdraw")
                .about("Withdraw a volunteer application")
                .arg(Arg::new("id").help("Application id").required(true)),
        )
}
