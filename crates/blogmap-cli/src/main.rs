use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use blogmap_core::breadcrumb::{Breadcrumbs, page_crumb};
use blogmap_core::config_file::{self, ConfigFile};
use blogmap_core::editor::{AUTHOR_NAME_MAX, AUTHOR_NAME_MIN};
use blogmap_core::views::{
    Missing, PageView, PaperFilter, filtered_papers, page_view, paper_editor_form,
    papers_by_author,
};
use blogmap_core::{
    Action, AuthorDraft, AuthorId, BACKEND_URI_ENV, BlogClient, Config, HttpGateway,
    MarkdownSanitizer, PaperForm, PaperId, PaperType, SafeHtml, StoreHandle, SubmitError,
};

mod output;

use output::ColorMode;

/// BlogMap - browse and edit papers on a BlogMap backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Backend base URI (overrides config and BLOGMAP_BACKEND_URI)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log requests and store updates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or change the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    #[command(flatten)]
    Blog(BlogCommand),
}

/// Commands that talk to the backend.
#[derive(Subcommand, Debug)]
enum BlogCommand {
    /// List papers, newest first
    List {
        /// Only papers carrying any of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Only papers whose title matches this pattern (case-insensitive)
        #[arg(long)]
        title: Option<String>,
    },

    /// Show one paper
    Show {
        id: String,

        /// Render the body as sanitized HTML
        #[arg(long)]
        html: bool,
    },

    /// Create a paper, creating its author if needed
    Add(PaperArgs),

    /// Edit a paper; omitted fields keep their current value
    Edit {
        id: String,

        #[command(flatten)]
        fields: PaperArgs,
    },

    /// Delete a paper
    Rm { id: String },

    /// List authors with their paper counts
    Authors,

    /// Rename an author
    RenameAuthor { id: String, name: String },

    /// Delete an author
    RmAuthor { id: String },
}

#[derive(Args, Debug, Default)]
struct PaperArgs {
    #[arg(long)]
    title: Option<String>,

    /// Author display name
    #[arg(long)]
    author: Option<String>,

    /// Markdown body
    #[arg(long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the markdown body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// Article, Block or White-Paper
    #[arg(long = "type")]
    kind: Option<PaperType>,

    #[arg(long)]
    category: Option<String>,

    /// Replace the tag list (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
}

impl PaperArgs {
    /// Overwrite the fields given on the command line.
    fn apply(self, form: &mut PaperForm) -> anyhow::Result<()> {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(author) = self.author {
            form.author_name = author;
        }
        if let Some(body) = self.body {
            form.body = body;
        } else if let Some(path) = self.body_file {
            form.body = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        }
        if let Some(kind) = self.kind {
            form.kind = kind;
        }
        if let Some(category) = self.category {
            form.category = Some(category);
        }
        if !self.tags.is_empty() {
            form.tags = self.tags;
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Save the backend URI to the platform config file
    SetBackend { uri: String },
    /// Show config file locations and the effective backend
    Show,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BLOGMAP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "blogmap=debug,blogmap_core=debug,warn"
        } else {
            "blogmap=info,blogmap_core=info,warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file = config_file::load_config();
    let color = ColorMode(!cli.no_color && file.color().unwrap_or(true));
    let mut out = std::io::stdout();

    let env_uri = env::var(BACKEND_URI_ENV).ok();
    let config = Config::from_sources(&file, env_uri.as_deref(), cli.backend.as_deref());

    match cli.command {
        Command::Config { action } => run_config(action, &file, &config, &mut out, color),
        Command::Blog(command) => {
            let client = connect(&config, &mut out, color).await?;
            run(&client, command, &mut out, color).await
        }
    }
}

/// Bootstrap the store for `config` and run the initial sync.
async fn connect(
    config: &Config,
    out: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<BlogClient> {
    if config.backend_uri.is_empty() {
        anyhow::bail!(
            "No backend configured. Pass --backend, set {BACKEND_URI_ENV}, or run `blogmap config set-backend <uri>`"
        );
    }

    let store = StoreHandle::default();
    store.dispatch(Action::SetInitStore(config.initial_store()));
    let client = BlogClient::new(store, Arc::new(HttpGateway::new()));

    if let Some(report) = client.ensure_synced().await {
        output::print_sync_failures(out, &report, color)?;
    }
    Ok(client)
}

async fn run(
    client: &BlogClient,
    command: BlogCommand,
    out: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    match command {
        BlogCommand::List { tags, title } => {
            let filter = PaperFilter {
                tags: tags.iter().collect(),
                title,
            };
            let snap = client.store().snapshot();
            let papers = filtered_papers(&snap.db, &filter);
            output::print_paper_list(out, &papers, &snap.db.authors, color)?;
        }
        BlogCommand::Show { id, html } => show(client, &PaperId::from(id), html, out, color)?,
        BlogCommand::Add(fields) => {
            let mut form = PaperForm::default();
            fields.apply(&mut form)?;
            let result = client.submit_paper(form).await;
            report_submit(result, "Created", out, color)?;
        }
        BlogCommand::Edit { id, fields } => {
            let id = PaperId::from(id);
            let Some(mut form) = client.store().read(|s| paper_editor_form(&s.db, &id)) else {
                anyhow::bail!("Paper {} not found", id);
            };
            fields.apply(&mut form)?;
            let result = client.submit_paper_edit(&id, form).await;
            report_submit(result, "Updated", out, color)?;
        }
        BlogCommand::Rm { id } => {
            let id = PaperId::from(id);
            client
                .rem_paper(&id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to delete paper {}: {}", id, e.message()))?;
            output::print_done(out, &format!("Deleted paper {id}"), color)?;
        }
        BlogCommand::Authors => {
            let snap = client.store().snapshot();
            let mut rows: Vec<_> = snap
                .db
                .authors
                .values()
                .map(|a| (a, papers_by_author(&snap.db, &a.id).len()))
                .collect();
            rows.sort_by_key(|(a, _)| a.name.to_lowercase());
            output::print_authors(out, &rows, color)?;
        }
        BlogCommand::RenameAuthor { id, name } => {
            let len = name.trim().chars().count();
            if !(AUTHOR_NAME_MIN..=AUTHOR_NAME_MAX).contains(&len) {
                anyhow::bail!(
                    "Author name must be between {AUTHOR_NAME_MIN} and {AUTHOR_NAME_MAX} characters"
                );
            }
            let id = AuthorId::from(id);
            let draft = AuthorDraft {
                name: name.trim().to_string(),
            };
            let author = client
                .mod_author(&id, &draft)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to rename author {}: {}", id, e.message()))?;
            output::print_done(out, &format!("Renamed author {} to {}", id, author.name), color)?;
        }
        BlogCommand::RmAuthor { id } => {
            let id = AuthorId::from(id);
            client
                .rem_author(&id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to delete author {}: {}", id, e.message()))?;
            output::print_done(out, &format!("Deleted author {id}"), color)?;
        }
    }

    Ok(())
}

fn show(
    client: &BlogClient,
    id: &PaperId,
    html: bool,
    out: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    let snap = client.store().snapshot();
    let mut trail = Breadcrumbs::new();
    trail.set_link_depth(1, page_crumb(&snap.db, id));
    output::print_breadcrumbs(out, &trail, color)?;

    match page_view(&snap.db, id) {
        PageView::Found { paper, author } => {
            let body = if html {
                SafeHtml::new().render(&paper.body)
            } else {
                paper.body.clone()
            };
            output::print_paper(out, paper, author, &body, color)?;
            Ok(())
        }
        PageView::NotFound(Missing::Paper) => anyhow::bail!("Paper {} not found", id),
        PageView::NotFound(Missing::Author) => {
            anyhow::bail!("Author of paper {} not found", id)
        }
    }
}

fn report_submit(
    result: Result<blogmap_core::Paper, SubmitError>,
    verb: &str,
    out: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    match result {
        Ok(paper) => {
            output::print_done(out, &format!("{verb} paper {} ({})", paper.id, paper.title), color)?;
            Ok(())
        }
        Err(SubmitError::Invalid(errors)) => {
            output::print_validation_errors(out, &errors, color)?;
            anyhow::bail!("Paper not saved")
        }
        Err(e) => anyhow::bail!("{}", e.message()),
    }
}

fn run_config(
    action: ConfigAction,
    file: &ConfigFile,
    effective: &Config,
    out: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::SetBackend { uri } => {
            let mut platform = match config_file::config_path() {
                Some(path) => config_file::load_from_path(&path)?.unwrap_or_default(),
                None => ConfigFile::default(),
            };
            platform.set_backend_uri(uri.trim());
            let path = config_file::save_config(&platform)?;
            output::print_done(
                out,
                &format!("Saved backend {} to {}", uri.trim(), path.display()),
                color,
            )?;
        }
        ConfigAction::Show => {
            output::print_config(
                out,
                config_file::config_path().as_deref(),
                file,
                &effective.backend_uri,
                color,
            )?;
        }
    }
    Ok(())
}
