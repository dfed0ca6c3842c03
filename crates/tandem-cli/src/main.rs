use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use tandem_client::{
    ApiClient, ChatView, ClientConfig, SessionState, SubmitError, ViewUpdate, WsChannelFactory,
};
use tandem_types::{ChatMessage, LocalUser, UserId};

const PROFILE_RETRY: Duration = Duration::from_secs(3);

type View = ChatView<WsChannelFactory, ApiClient>;

/// Chat with one of your connections from the terminal.
#[derive(Debug, Parser)]
#[command(name = "tandem", version)]
struct Cli {
    /// User id of the connection to chat with
    target_user_id: String,
}

/// A line typed into the composer.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Send(String),
    Switch(UserId),
    Quit,
}

impl Input {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed == "/quit" {
            return Self::Quit;
        }
        if let Some(target) = trimmed.strip_prefix("/switch ") {
            let target = target.trim();
            if !target.is_empty() {
                return Self::Switch(UserId::new(target));
            }
        }
        Self::Send(line.to_string())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the transcript on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env().context("loading configuration")?;
    let api = ApiClient::new(&config)?;

    let Some(user) = resolve_local_user(&api).await else {
        return Ok(());
    };
    info!("signed in as {} {}", user.first_name, user.last_name);

    let factory = WsChannelFactory::from_config(&config);
    let mut view: View = ChatView::new(
        factory,
        api,
        Some(user),
        Some(UserId::new(cli.target_user_id)),
    );

    let state = view.mount().await;
    print_transcript(&view);
    print_state(state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Quit => break,
                    Input::Switch(target) => {
                        let state = view.retarget(target).await;
                        print_transcript(&view);
                        print_state(state);
                    }
                    Input::Send(text) => match view.submit_text(text) {
                        Ok(()) | Err(SubmitError::Empty) => {}
                        Err(SubmitError::NotConnected) => println!("(not connected, message not sent)"),
                        Err(SubmitError::TooLong { .. }) => print_error(&view),
                    },
                }
            }
            update = view.next_update() => render(&view, update),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    view.unmount();
    Ok(())
}

/// Keep asking for the profile until it resolves; the chat cannot join
/// without the local display name. Returns `None` if interrupted.
async fn resolve_local_user(api: &ApiClient) -> Option<LocalUser> {
    loop {
        match api.fetch_profile().await {
            Ok(user) => return Some(user),
            Err(e) => {
                warn!("profile unavailable: {}", e);
                println!("Loading user data...");
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(PROFILE_RETRY) => {}
            _ = tokio::signal::ctrl_c() => return None,
        }
    }
}

fn render(view: &View, update: ViewUpdate) {
    match update {
        ViewUpdate::Message(message) => print_message(view.local_user(), &message),
        ViewUpdate::Error(error) => println!("! {}", error),
        ViewUpdate::ErrorCleared => {}
        ViewUpdate::Disconnected => println!("(connection lost)"),
    }
}

fn print_transcript(view: &View) {
    if let Some(target) = view.target_user_id() {
        println!("--- chat with {} ---", target);
    }
    for message in view.messages() {
        print_message(view.local_user(), message);
    }
}

fn print_message(me: Option<&LocalUser>, message: &ChatMessage) {
    if me.is_some_and(|me| message.is_from(me)) {
        println!("{:>40}", format!("{} <", message.text));
    } else {
        println!("{}: {}", message.sender_display_name(), message.text);
    }
}

fn print_error(view: &View) {
    if let Some(error) = view.error() {
        println!("! {}", error);
    }
}

fn print_state(state: SessionState) {
    if state != SessionState::Active {
        println!("(connecting...)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_composer_lines() {
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(
            Input::parse("/switch 65f0"),
            Input::Switch(UserId::new("65f0"))
        );
        assert_eq!(Input::parse("  hello "), Input::Send("  hello ".into()));
        assert_eq!(Input::parse("/switch "), Input::Send("/switch ".into()));
    }
}
