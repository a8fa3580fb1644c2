//! Interactive session over one long-lived `Store`.
//!
//! A store subscriber flags the view as dirty; after each command the shell
//! re-renders the list once if anything changed.

use std::cell::Cell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use todo_core::{ApiError, Store, Todo, TodoId, TodoService, Transport};
use tracing::debug;

use crate::render::{render_error, render_list, render_todo};

pub const HELP: &str = "\
commands:
  list                          refresh the list
  show <id>                     print one record
  edit <id>                     open a record for editing
  cancel                        leave edit mode
  save <title> | <description>  save the open record, or add a new one
  done <id> / undo <id>         mark completed / not completed
  rm <id>                       delete a record
  help                          this text
  quit                          leave the shell
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Show(TodoId),
    Edit(TodoId),
    Cancel,
    Save { title: String, description: String },
    SetStatus { id: TodoId, completed: bool },
    Remove(TodoId),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("`{0}` is not a todo id")]
    InvalidId(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match word {
            "list" | "ls" => Ok(Self::List),
            "show" => parse_id("show", rest).map(Self::Show),
            "edit" => parse_id("edit", rest).map(Self::Edit),
            "cancel" => Ok(Self::Cancel),
            "save" => {
                let (title, description) = rest.split_once('|').unwrap_or((rest, ""));
                Ok(Self::Save {
                    title: title.trim().to_string(),
                    description: description.trim().to_string(),
                })
            }
            "done" => parse_id("done", rest).map(|id| Self::SetStatus {
                id,
                completed: true,
            }),
            "undo" => parse_id("undo", rest).map(|id| Self::SetStatus {
                id,
                completed: false,
            }),
            "rm" | "delete" => parse_id("rm", rest).map(Self::Remove),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn parse_id(command: &'static str, raw: &str) -> Result<TodoId, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            argument: "an id",
        });
    }
    raw.trim_start_matches('#')
        .parse()
        .map_err(|_| ParseError::InvalidId(raw.to_string()))
}

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Continue(Option<String>),
    Quit,
}

pub struct Shell<T> {
    service: TodoService<T>,
    store: Store,
    dirty: Rc<Cell<bool>>,
}

impl<T: Transport> Shell<T> {
    pub fn new(service: TodoService<T>) -> Self {
        let mut store = Store::new();
        let dirty = Rc::new(Cell::new(false));
        let flag = dirty.clone();
        store.subscribe(move |_| flag.set(true));
        Self {
            service,
            store,
            dirty,
        }
    }

    pub fn execute(&mut self, command: ShellCommand) -> Result<Reply, ApiError> {
        debug!(?command, "shell command");
        let message = match command {
            ShellCommand::List => {
                self.service.fetch_todos(&mut self.store)?;
                None
            }
            ShellCommand::Show(id) => Some(render_todo(&self.service.get_one(id)?)),
            ShellCommand::Edit(id) => {
                if self.store.list().iter().any(|t| t.id == Some(id)) {
                    self.store.set_editing_id(Some(id));
                    None
                } else {
                    Some(format!("#{id} is not in the list, try `list`\n"))
                }
            }
            ShellCommand::Cancel => {
                self.store.set_editing_id(None);
                None
            }
            ShellCommand::Save { title, description } => {
                let todo = match self.store.editing_todo() {
                    Some(editing) => Todo {
                        title,
                        description,
                        ..editing.clone()
                    },
                    None => Todo::new(title, description),
                };
                let saved = self.service.update_todo(&todo, &mut self.store)?;
                saved.id.map(|id| format!("saved #{id}\n"))
            }
            ShellCommand::SetStatus { id, completed } => {
                self.service.set_status(id, completed, &mut self.store)?;
                None
            }
            ShellCommand::Remove(id) => {
                self.service.delete_todo(id, &mut self.store)?;
                Some(format!("deleted #{id}\n"))
            }
            ShellCommand::Help => Some(HELP.to_string()),
            ShellCommand::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Continue(message))
    }

    /// Render the list if the store changed since the last call.
    pub fn take_view(&mut self) -> Option<String> {
        if self.dirty.replace(false) {
            Some(render_list(self.store.state()))
        } else {
            None
        }
    }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        if let Err(e) = self.service.fetch_todos(&mut self.store) {
            output.write_all(render_error(&e).as_bytes())?;
        }
        self.flush_view(&mut output)?;
        write!(output, "todo> ")?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                write!(output, "todo> ")?;
                output.flush()?;
                continue;
            }
            let reply = match ShellCommand::parse(&line) {
                Ok(command) => self.execute(command),
                Err(e) => Ok(Reply::Continue(Some(format!("{e}\n")))),
            };
            match reply {
                Ok(Reply::Quit) => return Ok(()),
                Ok(Reply::Continue(message)) => {
                    if let Some(message) = message {
                        output.write_all(message.as_bytes())?;
                    }
                }
                Err(e) => output.write_all(render_error(&e).as_bytes())?,
            }
            self.flush_view(&mut output)?;
            write!(output, "todo> ")?;
            output.flush()?;
        }
        Ok(())
    }

    fn flush_view<W: Write>(&mut self, output: &mut W) -> io::Result<()> {
        if let Some(view) = self.take_view() {
            output.write_all(view.as_bytes())?;
        }
        Ok(())
    }
}
