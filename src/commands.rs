//! One-shot command flows.
//!
//! Each command builds a [`SearchSession`], feeds it the same operations the
//! TUI would, lets the [`Dispatcher`] settle, then prints the resulting view.
//! Login redirects and error notices become [`SessionError`]s so the process
//! exit code reflects them.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{HttpBackend, SearchBackend};
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::{SessionError, ValidationError};
use crate::model::types::{CollectionItems, NewAccount, Suggestion};
use crate::search::query::{FilterField, QueryState};
use crate::session::{Command, Dispatcher, Event, NoticeLevel, ResultsPane, SearchSession};
use crate::ui::render::{
    NoticeView, SEARCH_FAILED, page_view, render_collections_text, render_history_text,
    render_saved_text, render_text,
};
use crate::{CollectionsCommand, HistoryCommand, QueryArgs, SavedCommand, SearchArgs};

pub struct CliContext {
    pub config: ClientConfig,
    pub json: bool,
}

impl CliContext {
    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::in_data_dir(&self.config.data_dir)
    }

    pub fn http(&self) -> Result<HttpBackend> {
        Ok(HttpBackend::new(
            &self.config.base_url,
            self.credentials(),
            self.config.request_timeout,
        )?)
    }

    fn backend(&self) -> Result<Arc<dyn SearchBackend>> {
        Ok(Arc::new(self.http()?))
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Split `name=value`; the name must be a known filter.
pub fn parse_filter(raw: &str) -> Result<(FilterField, String), ValidationError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| ValidationError::UnknownFilter(raw.to_string()))?;
    Ok((name.parse()?, value.trim().to_string()))
}

/// Query state from command-line arguments. Validation mirrors the
/// interactive add-term path.
pub fn query_from_args(args: &QueryArgs) -> Result<QueryState, ValidationError> {
    let mut query = QueryState::new();
    for term in &args.terms {
        query.add_term(term)?;
    }
    query.set_category(args.category);
    for raw in &args.filters {
        let (field, value) = parse_filter(raw)?;
        query.filters_mut().set(field, &value);
    }
    query.set_page(args.page);
    Ok(query)
}

fn spinner(ctx: &CliContext, message: &str) -> Option<ProgressBar> {
    if ctx.json || !console_is_tty() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

fn console_is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

/// Run `commands` to completion, including follow-ups, then turn a pending
/// login redirect into an error.
async fn drive(
    ctx: &CliContext,
    session: &mut SearchSession,
    commands: impl IntoIterator<Item = Command>,
) -> Result<(), SessionError> {
    let backend = ctx
        .backend()
        .map_err(|e| SessionError::Failed(format!("{e:#}")))?;
    let mut dispatcher = Dispatcher::new(backend, ctx.config.suggest_delay);
    dispatcher.submit_all(commands);
    let pb = spinner(ctx, "contacting backend");
    dispatcher.settle(session).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    if let Some(redirect) = session.take_redirect() {
        return Err(SessionError::LoginRequired { redirect });
    }
    Ok(())
}

/// An error notice left by the last operation, as a failure.
fn fail_on_error_notice(session: &SearchSession) -> Result<(), SessionError> {
    match session.notice() {
        Some(n) if n.level == NoticeLevel::Error => Err(SessionError::Failed(n.text.clone())),
        _ => Ok(()),
    }
}

fn print_notice(ctx: &CliContext, session: &SearchSession) {
    let Some(n) = session.notice() else {
        return;
    };
    if ctx.json {
        return;
    }
    let text = match n.level {
        NoticeLevel::Success => n.text.green(),
        NoticeLevel::Info => n.text.cyan(),
        NoticeLevel::Error => n.text.red(),
    };
    match &n.link {
        Some(link) => println!("{text} ({})", link.dimmed()),
        None => println!("{text}"),
    }
}

async fn run_query(ctx: &CliContext, args: &QueryArgs) -> Result<SearchSession, SessionError> {
    let query = query_from_args(args)?;
    let mut session = SearchSession::from_query(query);
    let command = session.begin_search().map(Command::Search);
    info!(terms = args.terms.len(), page = args.page, "cli_search");
    drive(ctx, &mut session, command).await?;
    if matches!(session.results(), ResultsPane::Failed) {
        return Err(SessionError::Failed(SEARCH_FAILED.to_string()));
    }
    Ok(session)
}

pub async fn search(ctx: &CliContext, args: SearchArgs) -> Result<()> {
    let mut session = run_query(ctx, &args.query).await?;

    for id in &args.select {
        if !session.toggle_product(*id)? {
            // Listed twice; keep it checked.
            session.toggle_product(*id)?;
        }
    }
    if let Some(collection_id) = args.add_to {
        let command = session.add_selected_to_collection(collection_id)?;
        drive(ctx, &mut session, [command]).await?;
        fail_on_error_notice(&session)?;
    }

    let view = page_view(&session);
    if ctx.json {
        ctx.print_json(&view)?;
    } else {
        println!("{}", render_text(&view));
        print_notice(ctx, &session);
    }
    Ok(())
}

#[derive(Serialize)]
struct SuggestOutput<'a> {
    input: &'a str,
    suggestions: &'a [Suggestion],
}

pub async fn suggest(ctx: &CliContext, text: &str) -> Result<()> {
    let mut session = SearchSession::new();
    if let Command::Suggest { seq, text: trimmed } = session.on_query_input(text) {
        let result = ctx.http()?.suggest(&trimmed).await;
        session.apply(Event::Suggestions { seq, result });
        if let Some(redirect) = session.take_redirect() {
            return Err(SessionError::LoginRequired { redirect }.into());
        }
    }

    if ctx.json {
        ctx.print_json(&SuggestOutput {
            input: text,
            suggestions: session.suggestions(),
        })?;
    } else {
        for s in session.suggestions() {
            println!("{}  {}", s.text, s.kind.dimmed());
        }
    }
    Ok(())
}

pub async fn collections(ctx: &CliContext, cmd: CollectionsCommand) -> Result<()> {
    let mut session = SearchSession::new();
    let command = match cmd {
        CollectionsCommand::List => session.open_collections(),
        CollectionsCommand::Create { title, description } => {
            session.create_collection(&title, description.as_deref())?
        }
        CollectionsCommand::Add {
            collection_id,
            product_ids,
        } => Command::AddItems {
            collection_id,
            body: CollectionItems {
                data_product_ids: product_ids,
            },
        },
    };
    let lists = matches!(
        command,
        Command::ListCollections | Command::CreateCollection(_)
    );
    drive(ctx, &mut session, [command]).await?;
    fail_on_error_notice(&session)?;

    let listing = session.collections().items.as_deref().unwrap_or(&[]);
    if ctx.json {
        #[derive(Serialize)]
        struct Out<'a> {
            collections: &'a [crate::model::types::Collection],
            #[serde(skip_serializing_if = "Option::is_none")]
            notice: Option<NoticeView>,
        }
        ctx.print_json(&Out {
            collections: listing,
            notice: page_view(&session).notice,
        })?;
    } else {
        print_notice(ctx, &session);
        if lists {
            println!("{}", render_collections_text(listing));
        }
    }
    Ok(())
}

pub async fn save_search(ctx: &CliContext, args: QueryArgs) -> Result<()> {
    let mut session = run_query(ctx, &args).await?;
    let command = session.save_current_search();
    drive(ctx, &mut session, [command]).await?;
    fail_on_error_notice(&session)?;
    if ctx.json {
        ctx.print_json(&page_view(&session).notice)?;
    } else {
        print_notice(ctx, &session);
    }
    Ok(())
}

pub async fn saved(ctx: &CliContext, cmd: SavedCommand) -> Result<()> {
    let mut session = SearchSession::new();
    let command = match cmd {
        SavedCommand::List => session.load_saved_searches(),
        SavedCommand::Run { id } => session.run_saved_search(id),
        SavedCommand::Delete { id } => session.delete_saved_search(id),
    };
    let executes = matches!(command, Command::RunSavedSearch(_));
    drive(ctx, &mut session, [command]).await?;
    fail_on_error_notice(&session)?;

    if executes {
        if matches!(session.results(), ResultsPane::Failed) {
            return Err(SessionError::Failed(SEARCH_FAILED.to_string()).into());
        }
        let view = page_view(&session);
        if ctx.json {
            ctx.print_json(&view)?;
        } else {
            println!("{}", render_text(&view));
        }
        return Ok(());
    }

    let saved = session.saved_searches().unwrap_or(&[]);
    if ctx.json {
        ctx.print_json(&saved)?;
    } else {
        print_notice(ctx, &session);
        println!("{}", render_saved_text(saved));
    }
    Ok(())
}

pub async fn history(ctx: &CliContext, cmd: HistoryCommand) -> Result<()> {
    let mut session = SearchSession::new();
    let command = match cmd {
        HistoryCommand::List => session.load_history(),
        HistoryCommand::Save { id } => session.save_history_entry(id),
    };
    drive(ctx, &mut session, [command]).await?;
    fail_on_error_notice(&session)?;

    match session.history() {
        Some(history) if ctx.json => ctx.print_json(&history)?,
        Some(history) => println!("{}", render_history_text(history)),
        None if ctx.json => ctx.print_json(&page_view(&session).notice)?,
        None => print_notice(ctx, &session),
    }
    Ok(())
}

pub async fn login(
    ctx: &CliContext,
    email: Option<String>,
    password: Option<String>,
    token: Option<String>,
) -> Result<()> {
    let token = match (token, email, password) {
        (Some(token), _, _) => token,
        (None, Some(email), Some(password)) => {
            let issued = ctx.http()?.login(&email, &password).await?;
            issued.access_token
        }
        _ => anyhow::bail!("pass --token, or --email together with --password"),
    };
    store_token(ctx, &token, "Signed in.")
}

pub async fn register(ctx: &CliContext, account: &NewAccount) -> Result<()> {
    let issued = ctx.http()?.register(account).await?;
    store_token(ctx, &issued.access_token, "Account created. Signed in.")
}

fn store_token(ctx: &CliContext, token: &str, message: &str) -> Result<()> {
    let store = ctx.credentials();
    store
        .save(token)
        .with_context(|| format!("storing credentials in {}", store.path().display()))?;
    info!(path = %store.path().display(), "credentials stored");
    if ctx.json {
        ctx.print_json(&serde_json::json!({ "signed_in": true }))?;
    } else {
        println!("{}", message.green());
    }
    Ok(())
}

pub fn logout(ctx: &CliContext) -> Result<()> {
    let removed = ctx.credentials().clear()?;
    if ctx.json {
        ctx.print_json(&serde_json::json!({ "signed_out": removed }))?;
    } else if removed {
        println!("Signed out.");
    } else {
        println!("{}", "No stored credentials.".dimmed());
    }
    Ok(())
}

pub async fn health(ctx: &CliContext) -> Result<()> {
    let backend = ctx.http()?;
    let healthy = backend.health().await?;
    let signed_in = ctx.credentials().token().is_some();
    if ctx.json {
        ctx.print_json(&serde_json::json!({
            "base_url": backend.base_url().as_str(),
            "healthy": healthy,
            "signed_in": signed_in,
        }))?;
    } else {
        let status = if healthy { "ok".green() } else { "unreachable".red() };
        println!("{} {status}", backend.base_url().as_str().bold());
        if !signed_in {
            println!("{}", "not signed in (run `studyscope login`)".dimmed());
        }
    }
    if !healthy {
        return Err(SessionError::Failed(format!(
            "backend at {} is not reachable",
            ctx.config.base_url
        ))
        .into());
    }
    Ok(())
}
