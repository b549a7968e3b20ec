//! Line-driven popup session on stdin.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use wo_app::usecases::{FlowError, PasswordForm};
use wo_core::error_page::GenericErrorPage;
use wo_core::ports::{TeardownSignal, WindowPort};
use wo_core::url::Url;
use wo_core::{AppConfig, OnboardingState, RouteUrl, SecretString};
use wo_infra::{KdfParams, KeyVault, TokenAuthRequestDecoder};

use super::wiring::{build_session, OnboardingSession};

const HELP: &str = "commands: type <pw> | strength | submit <pw> [confirm] | select <n> | \
                    cancel | back | close-tab | close-origin | state | quit";

enum Command {
    Type(Option<SecretString>),
    Strength,
    Submit(PasswordForm),
    Select(usize),
    Cancel,
    Back,
    CloseTab,
    CloseOrigin,
    State,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let command = match (parts.next()?, parts.next(), parts.next()) {
        ("type", value, None) => Command::Type(value.map(SecretString::from)),
        ("strength", None, None) => Command::Strength,
        ("submit", Some(password), confirm) => {
            Command::Submit(PasswordForm::new(password, confirm.unwrap_or_default()))
        }
        ("select", Some(index), None) => Command::Select(index.parse().ok()?),
        ("cancel", None, None) => Command::Cancel,
        ("back", None, None) => Command::Back,
        ("close-tab", None, None) => Command::CloseTab,
        ("close-origin", None, None) => Command::CloseOrigin,
        ("state", None, None) => Command::State,
        ("quit", None, None) => Command::Quit,
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(command)
}

/// Run one session for `launch_url` (the popup URL, possibly carrying an
/// `authRequest` token) until the window closes or stdin ends.
pub async fn run_app(config: AppConfig, launch_url: Option<String>) -> anyhow::Result<()> {
    let decoder = match launch_url {
        Some(raw) => {
            let url = Url::parse(&raw).with_context(|| format!("Invalid launch url: {raw}"))?;
            match TokenAuthRequestDecoder::from_url(&url) {
                Ok(decoder) => decoder,
                Err(err) => {
                    warn!(error = %err, "auth request could not be decoded");
                    show_error_page(
                        RouteUrl::UnauthorizedRequest,
                        &GenericErrorPage::unauthorized_request(),
                    );
                    return Ok(());
                }
            }
        }
        None => TokenAuthRequestDecoder::default(),
    };

    let vault = Arc::new(KeyVault::generate(KdfParams::default()));
    let mut session = build_session(&config, &decoder, vault);

    if let Some(details) = session.controller.app_details() {
        println!(
            "connect request from {} ({})",
            details.name,
            details.url.as_ref().map(Url::as_str).unwrap_or("unknown origin")
        );
    }
    let state = session.controller.mount().await?;
    report(&mut session, &state).await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.window.is_closed() {
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            println!("{HELP}");
            continue;
        };
        if matches!(command, Command::Quit) {
            break;
        }
        if let Err(err) = execute(&mut session, command).await {
            println!("error: {err}");
        }
    }

    info!(
        resolved = session.resolver.context().is_resolved(),
        "onboarding session finished"
    );
    Ok(())
}

async fn execute(session: &mut OnboardingSession, command: Command) -> Result<(), FlowError> {
    let state = match command {
        Command::Type(candidate) => {
            session.evaluator.schedule(candidate);
            return Ok(());
        }
        Command::Strength => {
            let result = session.evaluator.latest();
            println!(
                "strength: {:?} meets_all_strength_requirements={} reasons={:?}",
                result.strength, result.meets_all_strength_requirements, result.reasons
            );
            return Ok(());
        }
        Command::Submit(form) => session.controller.submit(form).await?,
        Command::Select(index) => session.controller.select_account(index).await?,
        Command::Cancel => session.controller.cancel().await?,
        Command::Back => session.controller.back().await?,
        Command::CloseTab => {
            session.window.close();
            settle().await;
            session.controller.get_state().await
        }
        Command::CloseOrigin => {
            session.teardown.fire(TeardownSignal::OriginTabClosed);
            settle().await;
            session.controller.get_state().await
        }
        Command::State | Command::Quit => session.controller.get_state().await,
    };
    report(session, &state).await;
    Ok(())
}

/// Let the tab guard react to a teardown signal.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

async fn report(session: &mut OnboardingSession, state: &OnboardingState) {
    while let Ok(route) = session.routes.try_recv() {
        println!("navigate: {}", route.path());
    }
    while let Ok(message) = session.origin_messages.try_recv() {
        println!("origin <- {message}");
    }
    if let Some(accounts) = session.controller.accounts() {
        if matches!(state, OnboardingState::ResolvingAccount { .. }) {
            for account in accounts.iter() {
                println!("  [{}] {}", account.index, account.address);
            }
        }
    }
    let loading = session.controller.is_loading().await;
    let last_emitted = session.states.borrow().clone();
    println!(
        "state: {:?} loading={} guarded={} window_closed={} last_emitted={:?}",
        state,
        loading,
        session.is_guarded(),
        session.window.is_closed(),
        last_emitted
    );
}

fn show_error_page(route: RouteUrl, page: &GenericErrorPage) {
    println!("navigate: {}", route.path());
    println!("{}", page.title);
    println!("{}", page.body);
    for help in &page.help_text {
        println!("  - {help}");
    }
}
