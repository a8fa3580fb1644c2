use std::io;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use todo_core::config::{BACKEND_URL_VAR, TIMEOUT_VAR};
use todo_core::{ApiError, ClientConfig, Store, Todo, TodoId, TodoService};
use todo_cli::render::{render_error, render_list, render_todo};
use todo_cli::{Shell, UreqTransport};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(about = "Manage todos on a remote todo service")]
struct Args {
    /// Base URL of the todo service
    #[arg(long, env = "TODO_BACKEND_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Per-request timeout in seconds [default: 10]
    #[arg(
        long,
        env = "TODO_TIMEOUT_SECS",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Request(RequestCommand),
    /// Interactive session
    Shell,
}

/// One request against the service, then print the result.
#[derive(Subcommand, Debug)]
enum RequestCommand {
    /// Print every todo
    List,
    /// Print one todo
    Get { id: TodoId },
    /// Create a todo
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        completed: bool,
    },
    /// Change fields of an existing todo
    Update {
        id: TodoId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "BOOL")]
        completed: Option<bool>,
    },
    /// Mark a todo completed or not
    Status {
        id: TodoId,
        #[arg(action = ArgAction::Set, value_name = "BOOL")]
        completed: bool,
    },
    /// Delete a todo
    Delete { id: TodoId },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("todo_core=debug,todo_cli=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = ClientConfig::from_lookup(|name| match name {
        BACKEND_URL_VAR => args.base_url.clone(),
        TIMEOUT_VAR => args.timeout_secs.map(|secs| secs.to_string()),
        _ => None,
    })
    .context("invalid client configuration, see --help")?;
    info!(base_url = %config.base_url, timeout = ?config.timeout, "using todo service");

    let service = TodoService::from_config(&config, UreqTransport::from_config(&config));

    let command = match args.command {
        Command::Request(command) => command,
        Command::Shell => {
            let stdin = io::stdin();
            return Shell::new(service)
                .run(stdin.lock(), io::stdout())
                .context("shell i/o failed");
        }
    };

    let mut store = Store::new();
    match run(&service, &mut store, command) {
        Ok(Some(text)) => print!("{text}"),
        Ok(None) => print!("{}", render_list(store.state())),
        Err(e) => {
            eprint!("{}", render_error(&e));
            bail!("request failed");
        }
    }
    Ok(())
}

/// Run a one-shot command. `None` means "show the refreshed list".
fn run(
    service: &TodoService<UreqTransport>,
    store: &mut Store,
    command: RequestCommand,
) -> Result<Option<String>, ApiError> {
    match command {
        RequestCommand::List => service.fetch_todos(store)?,
        RequestCommand::Get { id } => return Ok(Some(render_todo(&service.get_one(id)?))),
        RequestCommand::Add {
            title,
            description,
            completed,
        } => {
            let mut todo = Todo::new(title, description);
            todo.completed = completed;
            service.add_todo(&todo, store)?;
        }
        RequestCommand::Update {
            id,
            title,
            description,
            completed,
        } => {
            let mut todo = service.get_one(id)?;
            if let Some(title) = title {
                todo.title = title;
            }
            if let Some(description) = description {
                todo.description = description;
            }
            if let Some(completed) = completed {
                todo.completed = completed;
            }
            service.update_todo(&todo, store)?;
        }
        RequestCommand::Status { id, completed } => {
            service.set_status(id, completed, store)?;
        }
        RequestCommand::Delete { id } => service.delete_todo(id, store)?,
    }
    Ok(None)
}
