//! # boba-feed
//!
//! Command-line client. Assembles the data layer from compile-time features,
//! runs one command against the backend and prints the rendered result.

use std::sync::Arc;

use anyhow::{bail, Context};
use bb_core::{ForumApi, ThreadView, DEFAULT_USER_NAME};
use bb_query::{CurrentUser, QueryCache, QueryClient, Session, ThreadMutations};
use bb_ui::{BoardFeed, BoardSidebarView, BoardsDisplay, Dispatched, MenuAction, Template, ThreadCard, ToastKind, ToastQueue};
use chrono::Utc;
use clap::{Parser, Subcommand};
use configs::ClientConfig;
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[cfg(feature = "http-reqwest")]
use bb_http::HttpForumApi;

#[cfg(feature = "snapshot-local")]
use bb_snapshot_local::LocalSnapshotStore;

#[cfg(not(feature = "http-reqwest"))]
compile_error!("boba-feed needs a backend adapter: enable the `http-reqwest` feature");

#[derive(Parser)]
#[command(name = "boba-feed", about = "Browse and act on BobaBoard threads")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every board.
    Boards,
    /// Show a board's sidebar and activity feed.
    Board {
        slug: String,
        /// Number of feed pages to load.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show a single thread.
    Thread { thread_id: Uuid },
    Mute { slug: String, thread_id: Uuid },
    Unmute { slug: String, thread_id: Uuid },
    Hide { slug: String, thread_id: Uuid },
    Unhide { slug: String, thread_id: Uuid },
    /// Mark a thread as read.
    Read { slug: String, thread_id: Uuid },
    /// Change the default view of a thread.
    View {
        slug: String,
        thread_id: Uuid,
        view: ThreadView,
    },
}

struct App {
    queries: QueryClient,
    mutations: ThreadMutations,
    toasts: Arc<ToastQueue>,
    public_origin: url::Url,
}

impl App {
    fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let session = match &config.auth_token {
            Some(_) => Session::logged_in(CurrentUser {
                username: DEFAULT_USER_NAME.to_string(),
                avatar_url: None,
            }),
            None => Session::logged_out(),
        };

        // 1. Backend adapter
        let mut http = HttpForumApi::new(config.backend_url()?, config.request_timeout())?;
        if let Some(token) = &config.auth_token {
            http = http.with_token(SecretString::from(token.expose_secret().to_owned()));
        }
        let api: Arc<dyn ForumApi> = Arc::new(http);

        // 2. Data layer
        let cache = Arc::new(QueryCache::new());
        let toasts = Arc::new(ToastQueue::new());
        let queries = QueryClient::new(api.clone(), cache.clone(), session.clone());

        // 3. Snapshot store
        #[cfg(feature = "snapshot-local")]
        let queries = queries.with_snapshots(Arc::new(LocalSnapshotStore::new(&config.snapshot_dir)));

        let mutations = ThreadMutations::new(api, cache, session, toasts.clone())
            .with_rollback(config.rollback_on_failure);

        Ok(Self {
            queries,
            mutations,
            toasts,
            public_origin: config.public_origin()?,
        })
    }

    fn feed(&self, slug: &str) -> BoardFeed {
        BoardFeed::new(
            slug,
            self.queries.clone(),
            self.mutations.clone(),
            self.toasts.clone(),
            self.public_origin.clone(),
        )
    }

    async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Boards => {
                if let Some(seeded) = self.queries.seed_all_boards().await? {
                    tracing::info!(count = seeded.boards().len(), "showing saved boards while fetching");
                }
                let entry = self.queries.all_boards().await?;
                println!("{}", BoardsDisplay::from_boards(entry.boards()).render()?);
            }
            Command::Board { slug, pages } => {
                let boards = self.queries.all_boards().await?;
                println!("{}", BoardSidebarView::for_slug(&slug, boards.boards()).render()?);

                let feed = self.feed(&slug);
                feed.mount().await?;
                for _ in 1..pages {
                    feed.on_reach_end().await?;
                }
                println!("{}", feed.render(Utc::now())?);
            }
            Command::Thread { thread_id } => {
                let mounted = self.queries.mount_thread(Some(thread_id)).await?;
                let Some(thread) = mounted.thread() else {
                    bail!("thread {thread_id} not found");
                };
                let logged_in = self.queries.session().is_logged_in();
                match ThreadCard::from_thread(&thread, &thread.board_slug, logged_in, Utc::now()) {
                    Some(ThreadCard::Visible(card)) => {
                        println!("{} ({})", card.secret_identity.name, card.created_label);
                        println!("{}", card.content);
                        println!(
                            "{} comments, {} contributions, {} replies",
                            card.total_comments, card.total_contributions, card.direct_contributions
                        );
                    }
                    Some(ThreadCard::Hidden(_)) => println!("This thread was hidden."),
                    None => bail!("thread {thread_id} has no posts"),
                }
            }
            Command::Mute { slug, thread_id } => self.act(&slug, thread_id, MenuAction::Mute).await?,
            Command::Unmute { slug, thread_id } => self.act(&slug, thread_id, MenuAction::Unmute).await?,
            Command::Hide { slug, thread_id } => self.act(&slug, thread_id, MenuAction::Hide).await?,
            Command::Unhide { slug, thread_id } => self.act(&slug, thread_id, MenuAction::Unhide).await?,
            Command::Read { slug, thread_id } => self.act(&slug, thread_id, MenuAction::MarkVisited).await?,
            Command::View { slug, thread_id, view } => {
                let feed = self.feed(&slug);
                feed.mount().await?;
                let target = bb_query::ThreadTarget::new(thread_id, slug.as_str());
                let settled = self.mutations.set_thread_view(target, view).settled().await;
                self.print_toasts();
                settled?;
            }
        }
        Ok(())
    }

    /// Loads the board so the action has something to patch, then waits for
    /// the server and prints the updated feed.
    async fn act(&self, slug: &str, thread_id: Uuid, action: MenuAction) -> anyhow::Result<()> {
        let feed = self.feed(slug);
        feed.mount().await?;
        let settled = match feed.dispatch(thread_id, action) {
            Ok(Dispatched::Pending(handle)) => handle.settled().await,
            Ok(Dispatched::Link(link)) => {
                println!("{link}");
                Ok(())
            }
            Err(err) => Err(err),
        };
        self.print_toasts();
        settled.with_context(|| format!("{} failed for thread {thread_id}", action.label()))?;
        println!("{}", feed.render(Utc::now())?);
        Ok(())
    }

    fn print_toasts(&self) {
        for toast in self.toasts.drain() {
            match toast.kind {
                ToastKind::Success => eprintln!("✔ {}", toast.message),
                ToastKind::Error => eprintln!("✘ {}", toast.message),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = App::new(&config)?;
    app.run(cli.command).await
}
