// Chunk: docs/chunks/shell_bootstrap - Interactive shell entry point and workspace
//!
//! A minimal command launcher.
//!
//! A line is split into `|`-separated stages. Each stage runs as a child
//! process whose stdout and stderr are captured in a [`BufferedProcess`].
//! Once a stage's output is complete, its stdout buffer is forwarded into
//! the next stage's stdin. The last stage can be mirrored live.
//!
//! Redirection, quoting rules beyond double quotes, and built-ins other than
//! the ones the binary handles are out of scope.

use std::io::{self, PipeReader, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;

use conline_editor::{ArgumentParser, DefaultArgumentParser};
use conline_process::{BufferedProcess, ProcessStreams, StreamKind};
use tracing::{debug, warn};

use crate::{ShellContext, ShellError};

/// Where live output goes: stdout of the last stage, and stderr of every
/// stage through a fresh sink per stage.
pub struct Mirrors {
    pub stdout: Option<Box<dyn Write + Send>>,
    pub stderr: Option<Box<dyn Fn() -> Box<dyn Write + Send>>>,
}

impl Mirrors {
    /// No live output; everything is only captured.
    pub fn none() -> Self {
        Self {
            stdout: None,
            stderr: None,
        }
    }

    /// The shell's own stdout and stderr.
    pub fn terminal() -> Self {
        Self {
            stdout: Some(Box::new(io::stdout())),
            stderr: Some(Box::new(|| Box::new(io::stderr()))),
        }
    }
}

/// A finished pipeline.
pub struct PipelineOutcome {
    /// Buffer holding the last stage's output.
    pub output: Arc<BufferedProcess>,
    /// Exit status of each stage, in order.
    pub statuses: Vec<ExitStatus>,
}

impl PipelineOutcome {
    pub fn success(&self) -> bool {
        self.statuses.last().is_some_and(ExitStatus::success)
    }
}

/// Splits a command line into pipeline stages of program and arguments.
///
/// Double quotes group words and are removed. Empty stages are dropped.
pub fn split_pipeline(line: &str) -> Vec<Vec<String>> {
    let chars: Vec<char> = line.chars().collect();
    let mut stages = vec![Vec::new()];
    for arg in DefaultArgumentParser.parse(&chars) {
        let word: String = chars[arg.start..arg.end].iter().collect();
        if word == "|" {
            stages.push(Vec::new());
            continue;
        }
        let unquoted = word.replace('"', "");
        if let Some(stage) = stages.last_mut() {
            stage.push(unquoted);
        }
    }
    stages.retain(|stage| !stage.is_empty());
    stages
}

/// Runs `line` as a pipeline and waits for every stage to exit.
///
/// Returns `Ok(None)` for a blank line.
pub fn run_pipeline(
    ctx: &mut ShellContext,
    line: &str,
    mut mirrors: Mirrors,
) -> Result<Option<PipelineOutcome>, ShellError> {
    let stages = split_pipeline(line);
    let Some(last) = stages.len().checked_sub(1) else {
        return Ok(None);
    };

    let mut children: Vec<Child> = Vec::with_capacity(stages.len());
    // References held for the stage currently reading a forwarded buffer.
    let mut feeding: Vec<Arc<BufferedProcess>> = Vec::new();
    let mut stdin: Option<PipeReader> = None;
    let mut output = None;

    for (i, argv) in stages.iter().enumerate() {
        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => continue,
        };
        debug!(stage = i, program = %program, "starting pipeline stage");

        let mut command = Command::new(program);
        command.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(reader) = stdin.take() {
            command.stdin(Stdio::from(reader));
        }
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                reap(&mut children);
                return Err(ShellError::Launch(e));
            }
        };

        let mut streams = ProcessStreams::new();
        if let Some(out) = child.stdout.take() {
            streams = streams.stdout(out);
        }
        if let Some(err) = child.stderr.take() {
            streams = streams.stderr(err);
        }
        if i == last {
            if let Some(sink) = mirrors.stdout.take() {
                streams = streams.mirror_stdout(sink);
            }
        }
        if let Some(make_sink) = &mirrors.stderr {
            streams = streams.mirror_stderr(make_sink());
        }
        children.push(child);

        let process = BufferedProcess::start(streams)?;
        ctx.buffers.register(&process);

        if i < last {
            let (reader, successor) = process.forward_to_next(StreamKind::Out)?;
            stdin = Some(reader);
            feeding.push(successor);
        } else {
            output = Some(process);
        }
    }

    let statuses = reap(&mut children);
    let Some(output) = output else {
        return Ok(None);
    };
    output.wait_finalize()?;
    for upstream in &feeding {
        upstream.wait_finalize()?;
    }
    drop(feeding);
    ctx.buffers.sweep();

    Ok(Some(PipelineOutcome { output, statuses }))
}

/// Waits for every child, logging the ones that could not be waited on.
fn reap(children: &mut Vec<Child>) -> Vec<ExitStatus> {
    children
        .drain(..)
        .filter_map(|mut child| match child.wait() {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(pid = child.id(), error = %e, "failed to wait for child");
                None
            }
        })
        .collect()
}
