//! wt-comments - threaded comment client for the work tracker
//!
//! Usage: wt-comments [options] <entity-type> <entity-id>
//!
//! With no API base and no database, runs in demo mode against seeded
//! in-memory data.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use worktrack_ui::command::{help_text, parse_command};
use worktrack_ui::config::{ClientConfig, load_client_config, save_client_config};
use worktrack_ui::locator::parse_locator;
use worktrack_ui::model::{EntityKind, EntityRef};
use worktrack_ui::store::{CommentStore, HttpStore, SqliteStore};
use worktrack_ui::update::{Flow, update};
use worktrack_ui::view::TextPresenter;
use worktrack_ui::{CommentSession, logging};

const DEMO_ENTITY: EntityRef = EntityRef::new(EntityKind::Project, 1);

struct CliArgs {
    entity: Option<EntityRef>,
    api_base: Option<String>,
    token: Option<String>,
    db_path: Option<PathBuf>,
    page_size: Option<usize>,
    locator: Option<String>,
    save: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init_tracing();
    let args = parse_args()?;

    let mut config = load_client_config()?
        .unwrap_or_default()
        .with_env(|key| std::env::var(key).ok());
    apply_args(&mut config, &args);
    if args.save {
        let path = save_client_config(|stored| apply_args(stored, &args))
            .context("Failed to save config")?;
        info!(path = %path.display(), "saved options to config");
    }

    let (store, entity) = open_store(&config, args.entity)?;
    let presenter = TextPresenter::new(
        std::io::stdout(),
        config.utc_offset_minutes,
        config.wrap_width,
    );
    let session = CommentSession::new(store, presenter, entity, config.reply_page_size);

    // Initial load, deep-linked if a locator was given
    match args.locator.as_deref().map(|raw| (raw, parse_locator(raw))) {
        Some((_, Some(target))) => {
            session.resolve_locator(target).await;
        }
        Some((raw, None)) => {
            warn!(locator = raw, "ignoring unparseable locator");
            session.load().await;
        }
        None => {
            session.load().await;
        }
    }

    println!("Type `h` for commands.");
    prompt();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(msg)) => match update(&session, msg).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::ShowHelp) => print!("{}", help_text()),
                Ok(Flow::Continue) => {}
                Err(err) => eprintln!("error: {err}"),
            },
            Err(err) => eprintln!("{err}"),
        }
        prompt();
    }

    info!("exiting");
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn apply_args(config: &mut ClientConfig, args: &CliArgs) {
    if let Some(base) = &args.api_base {
        config.api_base = Some(base.clone());
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    if let Some(path) = &args.db_path {
        config.db_path = Some(path.clone());
    }
    if let Some(size) = args.page_size {
        config.reply_page_size = size;
    }
}

/// Pick a backend: API if configured, then a local database, then demo data.
fn open_store(
    config: &ClientConfig,
    entity: Option<EntityRef>,
) -> Result<(Box<dyn CommentStore>, EntityRef)> {
    if let Some(base) = &config.api_base {
        let entity = entity.context("<entity-type> <entity-id> is required with --api")?;
        let store = HttpStore::new(base, config.token.clone())
            .with_context(|| format!("Failed to set up API client for {base}"))?;
        info!(%base, %entity, "using API store");
        return Ok((Box::new(store), entity));
    }

    if let Some(path) = &config.db_path {
        let entity = entity.context("<entity-type> <entity-id> is required with --db")?;
        let store = SqliteStore::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        info!(path = %path.display(), %entity, "using local database");
        return Ok((Box::new(store), entity));
    }

    let entity = entity.unwrap_or(DEMO_ENTITY);
    let store = SqliteStore::open_in_memory().context("Failed to create demo store")?;
    store
        .seed_demo(entity)
        .context("Failed to seed demo comments")?;
    println!("Demo mode: showing sample comments for {entity}.");
    Ok((Box::new(store), entity))
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut positional: Vec<String> = Vec::new();
    let mut api_base: Option<String> = None;
    let mut token: Option<String> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut page_size: Option<usize> = None;
    let mut locator: Option<String> = None;
    let mut save = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!("Usage: wt-comments [options] <entity-type> <entity-id>");
                println!();
                println!("  <entity-type>    project or work_item");
                println!();
                println!("Options:");
                println!("  --api <url>        API base, e.g. http://tracker.local/api");
                println!("  --token <token>    Bearer token for the API");
                println!("  --db <path>        Local SQLite comment database");
                println!("  --page-size <n>    Replies per page in expanded threads");
                println!("  --locator <value>  Open at a comment (#comment-<id>, commentId=<id>, <id>)");
                println!("  --save             Store --api, --token, --db and --page-size in the config file");
                println!();
                println!("Environment:");
                println!("  WT_API_BASE, WT_TOKEN, WT_DB  Same as --api, --token, --db");
                println!("  WT_LOG                        Log filter (default: warn)");
                println!("  WT_LOG_JSON=1                 Log as JSON lines");
                println!();
                println!("With neither an API nor a database, runs in demo mode with sample data.");
                std::process::exit(0);
            }
            "--api" => {
                api_base = Some(option_value(&args, &mut i, "--api requires a URL")?);
            }
            "--token" => {
                token = Some(option_value(&args, &mut i, "--token requires a value")?);
            }
            "--db" => {
                db_path = Some(PathBuf::from(option_value(&args, &mut i, "--db requires a path")?));
            }
            "--page-size" => {
                let raw = option_value(&args, &mut i, "--page-size requires a number")?;
                let size: usize = raw
                    .parse()
                    .with_context(|| format!("Invalid page size: {raw}"))?;
                if size == 0 {
                    anyhow::bail!("--page-size must be at least 1");
                }
                page_size = Some(size);
            }
            "--locator" => {
                locator = Some(option_value(&args, &mut i, "--locator requires a value")?);
            }
            "--save" => save = true,
            arg if arg.starts_with('-') => {
                anyhow::bail!("Unknown option: {arg}");
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let entity = match positional.as_slice() {
        [] => None,
        [kind, id] => {
            let kind: EntityKind = kind.parse().map_err(anyhow::Error::msg)?;
            let id: i64 = id
                .parse()
                .with_context(|| format!("Invalid entity id: {id}"))?;
            Some(EntityRef::new(kind, id))
        }
        _ => anyhow::bail!("Expected <entity-type> <entity-id>"),
    };

    Ok(CliArgs {
        entity,
        api_base,
        token,
        db_path,
        page_size,
        locator,
        save,
    })
}

fn option_value(args: &[String], i: &mut usize, missing: &str) -> Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .with_context(|| missing.to_string())
}
