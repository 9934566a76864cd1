//! Lost & Found Claims - Entry Point
//!
//! Terminal front-end for the claim workflow: browse claimable items, preview
//! verification questions, score text, or walk through a claim chat.

use lostfound_claims::api::{ClaimsBackend, MockBackend, PortalClient, ProofImage};
use lostfound_claims::claim::{ClaimConversation, ClaimState, ConversationSettings};
use lostfound_claims::core::config::{self, PortalConfig};
use lostfound_claims::core::error::{ClaimError, Result};
use lostfound_claims::core::types::{Item, ItemStatus, ItemType, MessageRole};
use lostfound_claims::matching::similarity;
use lostfound_claims::questions::{ItemContext, QuestionGenerator};
use lostfound_claims::session::{BadgeCounter, FileStore, MemoryStore, SessionStore};

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// Campus Lost & Found claim assistant
#[derive(Parser, Debug)]
#[command(name = "lostfound-claims")]
#[command(about = "Claim found items through guided verification questions")]
struct Args {
    /// TOML config file (defaults apply to missing keys)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Run against a built-in sample item instead of the portal
    #[arg(long)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a claim chat for a found item
    Claim {
        /// Id of the found item
        item_id: String,

        /// Photo proving ownership (PNG, JPG, GIF or WEBP, up to 5 MiB)
        #[arg(long)]
        proof: Option<PathBuf>,
    },
    /// List found items you can claim
    Items,
    /// Show the verification questions for an item
    Questions {
        item_id: String,
    },
    /// Score free text against a reference text
    Score {
        candidate: String,
        reference: String,
    },
    /// Store a session token for later runs
    Login {
        token: String,
    },
}

const DEMO_ITEM_ID: &str = "demo-laptop";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lostfound_claims=info")),
        )
        .init();

    let args = Args::parse();

    let portal_config = match &args.config {
        Some(path) => PortalConfig::from_file(path)?,
        None => PortalConfig::default(),
    }
    .with_env_overrides()?;
    portal_config.validate().map_err(ClaimError::Config)?;
    if config::set_config(portal_config).is_err() {
        tracing::warn!("Portal config was already initialized");
    }
    let portal_config = config::config();

    let session = open_session(portal_config)?;

    if let Command::Score {
        candidate,
        reference,
    } = &args.command
    {
        let pct = similarity::score(candidate, reference);
        println!("{}% ({})", pct, similarity::confidence_band(pct));
        return Ok(());
    }
    if let Command::Login { token } = &args.command {
        session.set_token(token)?;
        println!("Token saved.");
        return Ok(());
    }

    let rt = Runtime::new()?;

    let (backend, generator) = if args.demo {
        tracing::info!("Running in demo mode with a sample item");
        let backend: Arc<dyn ClaimsBackend> = Arc::new(MockBackend::new(vec![demo_item()]));
        (backend, QuestionGenerator::offline())
    } else {
        let client = Arc::new(PortalClient::new(portal_config, session.clone())?);
        let backend: Arc<dyn ClaimsBackend> = client.clone();
        (
            backend,
            QuestionGenerator::new(client, portal_config.request_timeout()),
        )
    };

    match args.command {
        Command::Items => {
            let badges = BadgeCounter::new(session.clone());
            rt.block_on(list_items(backend.as_ref(), portal_config, &badges))
        }
        Command::Questions { item_id } => {
            rt.block_on(show_questions(backend.as_ref(), &generator, &item_id))
        }
        Command::Claim { item_id, proof } => {
            let settings = ConversationSettings::from(portal_config);
            let mut conversation = ClaimConversation::new(item_id, backend, generator, settings);
            if let Some(path) = proof {
                conversation.attach_proof(ProofImage::from_path(path)?)?;
            }
            run_claim_chat(&rt, conversation)
        }
        Command::Score { .. } | Command::Login { .. } => Ok(()),
    }
}

fn open_session(config: &PortalConfig) -> Result<Arc<dyn SessionStore>> {
    let session: Arc<dyn SessionStore> = match &config.session_file {
        Some(path) => Arc::new(FileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    if let Ok(token) = std::env::var("LOSTFOUND_TOKEN") {
        session.set_token(&token)?;
    }
    Ok(session)
}

const ITEMS_BADGE: &str = "claimable_items";

async fn list_items(
    backend: &dyn ClaimsBackend,
    config: &PortalConfig,
    badges: &BadgeCounter,
) -> Result<()> {
    let items = backend.public_items().await?;
    let claimable: Vec<&Item> = items
        .iter()
        .filter(|i| i.is_claimable_by(config.student_id.as_deref()))
        .collect();

    if claimable.is_empty() {
        badges.mark_viewed(ITEMS_BADGE, 0)?;
        println!("No items available to claim right now.");
        return Ok(());
    }

    let unseen = badges.visit(ITEMS_BADGE, claimable.len() as u64)?;
    if unseen > 0 {
        println!("{} item(s) you can claim ({} new):", claimable.len(), unseen);
    } else {
        println!("{} item(s) you can claim:", claimable.len());
    }
    for item in claimable {
        println!(
            "  {}  {:<12} {} (found at {})",
            item.id,
            item.item_keyword,
            item.description,
            if item.location.is_empty() {
                "unknown"
            } else {
                item.location.as_str()
            }
        );
    }
    Ok(())
}

async fn show_questions(
    backend: &dyn ClaimsBackend,
    generator: &QuestionGenerator,
    item_id: &str,
) -> Result<()> {
    let items = backend.public_items().await?;
    let item = items
        .iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| ClaimError::ItemNotFound(item_id.to_string()))?;

    let (questions, origin) = generator
        .generate_with_origin(&ItemContext::from(item))
        .await;
    println!("Questions ({:?}):", origin);
    for (i, question) in questions.iter().enumerate() {
        println!("  {}. {}", i + 1, question);
    }
    Ok(())
}

fn run_claim_chat(rt: &Runtime, mut conversation: ClaimConversation) -> Result<()> {
    if let Err(e) = rt.block_on(conversation.open()) {
        println!("! {}", e);
        return Ok(());
    }
    let mut shown = print_new_messages(&conversation, 0);

    loop {
        let state = conversation.state();
        if state.is_terminal() || matches!(state, ClaimState::Loading) {
            break;
        }

        let retrying = matches!(conversation.state(), ClaimState::Submitting);
        if retrying {
            print!("Submission failed. Retry? [y/N] ");
        } else {
            print!("> ");
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            conversation.abandon();
            println!();
            return Ok(());
        }
        let input = input.trim();

        if input == "quit" || input == "q" {
            conversation.abandon();
            println!("Claim abandoned. Nothing was submitted.");
            return Ok(());
        }

        let result = if retrying {
            if !input.eq_ignore_ascii_case("y") {
                conversation.abandon();
                println!("Claim abandoned.");
                return Ok(());
            }
            rt.block_on(conversation.retry_submission())
        } else {
            rt.block_on(conversation.submit_answer(input))
        };

        if let Err(e) = result {
            if e.is_validation() || matches!(e, ClaimError::NotAcceptingAnswers) {
                println!("! {}", e);
            } else {
                tracing::debug!("Submission error surfaced to user: {}", e);
            }
        }
        shown = print_new_messages(&conversation, shown);
    }

    if let ClaimState::Submitted(result) = conversation.state() {
        if let Some(analysis) = &result.outcome.ai_analysis {
            if let Some(reasoning) = &analysis.reasoning {
                println!("  Reasoning: {}", reasoning);
            }
            if let Some(note) = &analysis.advisory_note {
                println!("  Note: {}", note);
            }
        }
    }
    Ok(())
}

/// Print transcript lines added since `shown`; returns the new count
fn print_new_messages(conversation: &ClaimConversation, shown: usize) -> usize {
    let transcript = conversation.transcript();
    for message in &transcript[shown..] {
        let prefix = match (message.role, message.is_error(), message.is_success()) {
            (_, true, _) => "[assistant !]",
            (_, _, true) => "[assistant ✓]",
            (MessageRole::Bot, _, _) => "[assistant]",
            (MessageRole::User, _, _) => "[you]",
        };
        println!("{} {}", prefix, message.text);
    }
    transcript.len()
}

fn demo_item() -> Item {
    Item {
        id: DEMO_ITEM_ID.into(),
        item_type: ItemType::Found,
        item_keyword: "laptop".into(),
        description: "Black Dell laptop with a sticker".into(),
        location: "Library".into(),
        secret_message: "has a deep scratch on the lid and a red sticker".into(),
        status: ItemStatus::Active,
        student_id: None,
        is_owner: false,
    }
}
