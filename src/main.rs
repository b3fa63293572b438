// Chunk: docs/chunks/shell_bootstrap - Interactive shell entry point and workspace
//!
//! conline: an interactive command shell.
//!
//! Reads a line with the conline editor, runs it as a pipeline, and repeats
//! until `exit`. Logs go to a file under the platform data directory, since
//! the terminal belongs to the editor; set `CONLINE_LOG` (or `RUST_LOG`) to
//! change the filter.

use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use conline::launch::{self, Mirrors};
use conline::restart::{load_restart_state, restart_file_path, save_restart_state, RestartState};
use conline::{ShellContext, ShellError};
use conline_editor::{
    ConsoleSurface, CrosstermConsole, EditorConfig, EditorError, EditorHooks, History, LineEditor,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FILENAME: &str = "conline.log";

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "shell exited with an error");
            eprintln!("conline: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs a file-backed subscriber. Without a data directory logging is
/// left off rather than interleaved with the prompt.
fn init_logging() {
    let Some(dir) = dirs::data_dir().map(|d| d.join("conline")) else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::create(dir.join(LOG_FILENAME)) else {
        return;
    };

    let filter = env::var("CONLINE_LOG")
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn run() -> Result<(), ShellError> {
    let mut ctx = ShellContext::new();
    let restart_path = restart_file_path();
    if let Some(state) = restart_path.as_deref().and_then(load_restart_state) {
        if let Some(cwd) = ctx.apply_restart_state(state) {
            if let Err(e) = env::set_current_dir(&cwd) {
                warn!(cwd = %cwd.display(), error = %e, "saved working directory is gone");
            }
        }
    }

    let mut console = CrosstermConsole::new().map_err(EditorError::Console)?;
    let mut editor = LineEditor::new(EditorConfig::from_env());
    info!(config = ?editor.config(), "shell started");

    loop {
        if console.cursor_position().x != 0 {
            console.print("\n").map_err(EditorError::Console)?;
        }
        console.print(&prompt()).map_err(EditorError::Console)?;

        let outcome = {
            let history = &ctx.history;
            let path = restart_path.as_deref();
            let mut save = || save_restart(path, history);
            let hooks = EditorHooks::new(history, &ctx.aliases).with_restart_hook(&mut save);
            editor.read_line(&mut console, hooks)?
        };
        if outcome.cancelled {
            continue;
        }
        let line = outcome.line.trim();
        if line.is_empty() {
            continue;
        }
        ctx.record(line);

        if line.eq_ignore_ascii_case("exit") {
            break;
        }
        if let Some(dir) = change_directory_target(line) {
            if let Err(e) = env::set_current_dir(&dir) {
                console
                    .print(&format!("cd: {}: {e}\n", dir.display()))
                    .map_err(EditorError::Console)?;
            }
            continue;
        }

        console.suspend().map_err(EditorError::Console)?;
        let result = launch::run_pipeline(&mut ctx, line, Mirrors::terminal());
        console.resume().map_err(EditorError::Console)?;
        match result {
            Ok(Some(outcome)) if !outcome.success() => {
                info!(line, statuses = ?outcome.statuses, "pipeline failed");
            }
            Ok(_) => {}
            Err(ShellError::Launch(e)) => {
                console
                    .print(&format!("{line}: {e}\n"))
                    .map_err(EditorError::Console)?;
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(path) = restart_path.as_deref() {
        save_restart_state(path, &ctx.restart_state())?;
    }
    Ok(())
}

fn prompt() -> String {
    match env::current_dir() {
        Ok(dir) => format!("{}> ", dir.display()),
        Err(_) => "> ".to_string(),
    }
}

/// The target of a `cd` line, if that is what `line` is.
fn change_directory_target(line: &str) -> Option<PathBuf> {
    let rest = line.strip_prefix("cd")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let target = rest.trim().trim_matches('"');
    if target.is_empty() {
        return dirs::home_dir();
    }
    Some(PathBuf::from(target))
}

fn save_restart(path: Option<&Path>, history: &History) {
    let Some(path) = path else {
        return;
    };
    let state = RestartState::new(history.to_vec(), env::current_dir().ok());
    if let Err(e) = save_restart_state(path, &state) {
        warn!(error = %e, "failed to save restart state");
    }
}
