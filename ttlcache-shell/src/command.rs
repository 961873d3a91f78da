//! Parsing and execution of shell commands.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use ttlcache_core::{Store, Ttl, Value};

pub const HELP: &str = "\
Commands:
  set <key> <value> [ttl]      store a value (no ttl = never expires)
  add <key> <value> [ttl]      store only if the key is not live (no ttl = default)
  replace <key> <value> [ttl]  overwrite only if the key is live (no ttl = default)
  get <key>                    print a value
  del <key>                    delete a key
  all                          list every live key
  save [path]                  write a snapshot
  load [path]                  merge a snapshot into the cache
  help                         show this message
  quit | exit                  leave the shell
TTLs look like 500ms, 5s, 0.5h, 2m or a bare number of seconds.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { key: String, value: Value, ttl: Ttl },
    Add { key: String, value: Value, ttl: Ttl },
    Replace { key: String, value: Value, ttl: Ttl },
    Get { key: String },
    Delete { key: String },
    All,
    Save { path: Option<PathBuf> },
    Load { path: Option<PathBuf> },
    Help,
    Quit,
    Empty,
}

/// Parses a TTL such as `500ms`, `5s`, `2m`, `0.5h` or `30` (seconds)
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(input.len());
    let (amount, unit) = input.split_at(split);

    let amount: f64 = amount
        .parse()
        .with_context(|| format!("invalid duration `{}`", input))?;
    let scale = match unit {
        "" | "s" => 1.0,
        "ms" => 0.001,
        "m" => 60.0,
        "h" => 3600.0,
        other => bail!("unknown duration unit `{}` in `{}`", other, input),
    };
    if !amount.is_finite() || amount < 0.0 {
        bail!("duration `{}` must be a non-negative number", input);
    }

    Duration::try_from_secs_f64(amount * scale)
        .with_context(|| format!("duration `{}` is out of range", input))
}

/// Integers are stored as `Int`, anything else as `Str`
fn parse_value(token: &str) -> Value {
    token
        .parse::<i64>()
        .map(Value::Int)
        .unwrap_or_else(|_| Value::from(token))
}

fn parse_write(args: &[&str], name: &str, missing_ttl: Ttl) -> Result<(String, Value, Ttl)> {
    match args {
        [key, value] => Ok((key.to_string(), parse_value(value), missing_ttl)),
        [key, value, ttl] => Ok((
            key.to_string(),
            parse_value(value),
            Ttl::After(parse_duration(ttl)?),
        )),
        _ => bail!("usage: {} <key> <value> [ttl]", name),
    }
}

fn parse_key(args: &[&str], name: &str) -> Result<String> {
    match args {
        [key] => Ok(key.to_string()),
        _ => bail!("usage: {} <key>", name),
    }
}

fn parse_path(args: &[&str], name: &str) -> Result<Option<PathBuf>> {
    match args {
        [] => Ok(None),
        [path] => Ok(Some(PathBuf::from(path))),
        _ => bail!("usage: {} [path]", name),
    }
}

/// Parses one input line. Command words are case-insensitive.
pub fn parse(line: &str) -> Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((name, args)) = words.split_first() else {
        return Ok(Command::Empty);
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "set" => {
            let (key, value, ttl) = parse_write(args, "set", Ttl::Never)?;
            Command::Set { key, value, ttl }
        }
        "add" => {
            let (key, value, ttl) = parse_write(args, "add", Ttl::Default)?;
            Command::Add { key, value, ttl }
        }
        "replace" => {
            let (key, value, ttl) = parse_write(args, "replace", Ttl::Default)?;
            Command::Replace { key, value, ttl }
        }
        "get" => Command::Get { key: parse_key(args, "get")? },
        "del" | "delete" => Command::Delete { key: parse_key(args, "del")? },
        "all" => Command::All,
        "save" => Command::Save { path: parse_path(args, "save")? },
        "load" => Command::Load { path: parse_path(args, "load")? },
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("Not found the command `{}`, type `help` for a list", other),
    };
    Ok(command)
}

/// Runs a command against the store and returns the text to print.
///
/// `Quit` is the caller's business and yields no output here.
pub fn execute(store: &Store, command: Command, snapshot: &Path) -> Result<String> {
    let output = match command {
        Command::Set { key, value, ttl } => {
            store.set(key, value, ttl);
            "OK".to_string()
        }
        Command::Add { key, value, ttl } => {
            store.add(key, value, ttl)?;
            "OK".to_string()
        }
        Command::Replace { key, value, ttl } => {
            store.replace(key, value, ttl)?;
            "OK".to_string()
        }
        Command::Get { key } => match store.get(&key) {
            Some(value) => value.to_string(),
            None => format!("Not found: {}", key),
        },
        Command::Delete { key } => {
            if store.delete(&key) {
                "Deleted".to_string()
            } else {
                format!("Not found: {}", key)
            }
        }
        Command::All => {
            let mut pairs = store.all();
            if pairs.is_empty() {
                return Ok("(empty)".to_string());
            }
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            pairs
                .iter()
                .map(|(key, value)| format!("{} = {}", key, value))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Save { path } => {
            let path = path.as_deref().unwrap_or(snapshot);
            let written = store.save_to_file(path)?;
            format!("Saved {} entries to {}", written, path.display())
        }
        Command::Load { path } => {
            let path = path.as_deref().unwrap_or(snapshot);
            let merged = store.load_file(path)?;
            format!("Merged {} entries from {}", merged, path.display())
        }
        Command::Help => HELP.to_string(),
        Command::Quit | Command::Empty => String::new(),
    };
    Ok(output)
}

/// Runs [`execute`] on Tokio's blocking pool.
///
/// Snapshot commands and autosave do synchronous file I/O with `fsync`,
/// which must stay off the async worker threads.
pub async fn dispatch(store: &Store, command: Command, snapshot: &Path) -> Result<String> {
    let store = store.clone();
    let snapshot = snapshot.to_path_buf();
    tokio::task::spawn_blocking(move || execute(&store, command, &snapshot))
        .await
        .context("command task failed")?
}
