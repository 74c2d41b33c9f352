//! External command pipeline runner
//!
//! Runs an ordered chain of commands connected by anonymous pipes the
//! way a shell pipeline would, and reports every stage's exit status.
//! The runner owns all the descriptor bookkeeping: each intermediate
//! pipe end is handed to exactly one child and closed in the parent
//! right away, so downstream stages see EOF the moment their upstream
//! exits.

use std::fs::File;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::{Error, Result};

/// One external command in a pipeline
#[derive(Debug, Clone)]
pub struct Stage {
    pub program: String,
    pub args: Vec<String>,
}

impl Stage {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Where the first stage reads from
pub enum Input {
    /// An open file; the caller is responsible for its read position
    File(File),
    /// The parent's own standard input
    Inherit,
}

/// Where the last stage's stdout goes
pub enum Sink {
    /// Thrown away; the stage writes to the filesystem itself
    Discard,
    /// Collected into [`PipeRun::captured`]
    Capture,
    /// Streamed into an open file
    File(File),
}

/// A finished pipeline: one exit status per stage, in stage order, plus
/// captured stdout when [`Sink::Capture`] was requested
#[derive(Debug)]
pub struct PipeRun {
    pub statuses: Vec<ExitStatus>,
    pub captured: Vec<u8>,
}

/// Check that every program in the chain exists before spawning any of
/// them, so a missing tool is reported by name instead of surfacing as
/// a half-started pipeline.
fn check_tools(stages: &[Stage]) -> Result<()> {
    for stage in stages {
        if which::which(&stage.program).is_err() {
            return Err(Error::ToolNotFound {
                tool: stage.program.clone(),
            });
        }
    }
    Ok(())
}

fn reap(children: &mut [Child]) {
    for child in children {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Run `stages` as a pipeline: stage N's stdout feeds stage N+1's stdin.
///
/// A stage that fails to spawn aborts the whole run, but stages already
/// running are killed and waited on first so nothing is left behind.
/// With [`Sink::Capture`] the final stdout is drained before any child
/// is waited on; waiting first would deadlock once the pipe fills.
pub fn run(stages: &[Stage], input: Input, sink: Sink) -> Result<PipeRun> {
    if stages.is_empty() {
        return Err(Error::InvalidPath("empty pipeline".to_string()));
    }
    check_tools(stages)?;

    let capture = matches!(sink, Sink::Capture);
    let mut sink = Some(sink);
    let mut children: Vec<Child> = Vec::with_capacity(stages.len());
    let mut next_stdin = match input {
        Input::File(file) => Stdio::from(file),
        Input::Inherit => Stdio::inherit(),
    };

    for (index, stage) in stages.iter().enumerate() {
        let last = index + 1 == stages.len();
        let stdout = if last {
            match sink.take() {
                Some(Sink::Discard) | None => Stdio::null(),
                Some(Sink::Capture) => Stdio::piped(),
                Some(Sink::File(file)) => Stdio::from(file),
            }
        } else {
            Stdio::piped()
        };

        debug!("stage {}: {}", index, stage);
        let spawned = Command::new(&stage.program)
            .args(&stage.args)
            .stdin(next_stdin)
            .stdout(stdout)
            .spawn();
        next_stdin = Stdio::null();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                reap(&mut children);
                return Err(if err.kind() == std::io::ErrorKind::NotFound {
                    Error::ToolNotFound {
                        tool: stage.program.clone(),
                    }
                } else {
                    err.into()
                });
            }
        };

        if !last {
            // Hand the read end straight to the next stage; the parent
            // keeps no copy of it.
            match child.stdout.take() {
                Some(out) => next_stdin = Stdio::from(out),
                None => {
                    reap(&mut children);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Io(std::io::Error::other(
                        "pipeline stage lost its stdout",
                    )));
                }
            }
        }
        children.push(child);
    }

    let mut captured = Vec::new();
    if capture {
        if let Some(out) = children.last_mut().and_then(|child| child.stdout.take()) {
            let mut out = out;
            if let Err(err) = out.read_to_end(&mut captured) {
                reap(&mut children);
                return Err(err.into());
            }
        }
    }

    let mut statuses = Vec::with_capacity(children.len());
    for child in &mut children {
        statuses.push(child.wait()?);
    }

    Ok(PipeRun { statuses, captured })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_stage_reports_success() {
        let run = run(&[Stage::new("true")], Input::Inherit, Sink::Discard).unwrap();
        assert_eq!(run.statuses.len(), 1);
        assert!(run.statuses[0].success());
    }

    #[test]
    fn test_failing_stage_reports_nonzero() {
        let run = run(&[Stage::new("false")], Input::Inherit, Sink::Discard).unwrap();
        assert!(!run.statuses[0].success());
    }

    #[test]
    fn test_chain_pipes_stdout_to_stdin() {
        let stages = [Stage::new("echo").arg("hello"), Stage::new("cat")];
        let run = run(&stages, Input::Inherit, Sink::Capture).unwrap();
        assert!(run.statuses.iter().all(|status| status.success()));
        assert_eq!(run.captured, b"hello\n");
    }

    #[test]
    fn test_statuses_follow_stage_order() {
        let stages = [
            Stage::new("echo").arg("x"),
            Stage::new("false"),
            Stage::new("cat"),
        ];
        let run = run(&stages, Input::Inherit, Sink::Discard).unwrap();
        assert_eq!(run.statuses.len(), 3);
        assert!(run.statuses[0].success());
        assert!(!run.statuses[1].success());
    }

    #[test]
    fn test_file_input_feeds_the_first_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "payload").unwrap();
        let file = File::open(&path).unwrap();
        let run = run(&[Stage::new("cat")], Input::File(file), Sink::Capture).unwrap();
        assert_eq!(run.captured, b"payload");
    }

    #[test]
    fn test_file_sink_receives_the_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = File::create(&path).unwrap();
        run(&[Stage::new("echo").arg("sunk")], Input::Inherit, Sink::File(sink)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "sunk\n");
    }

    #[test]
    fn test_missing_tool_is_reported_by_name() {
        let err = run(
            &[Stage::new("shuck-no-such-tool")],
            Input::Inherit,
            Sink::Discard,
        )
        .unwrap_err();
        match err {
            Error::ToolNotFound { tool } => assert_eq!(tool, "shuck-no-such-tool"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_tool_mid_chain_aborts_cleanly() {
        let stages = [
            Stage::new("echo").arg("y"),
            Stage::new("shuck-no-such-tool"),
            Stage::new("cat"),
        ];
        assert!(matches!(
            run(&stages, Input::Inherit, Sink::Discard),
            Err(Error::ToolNotFound { .. })
        ));
    }

    #[test]
    fn test_stage_display_reads_like_a_command_line() {
        let stage = Stage::new("tar").arg("-x").arg("-f").arg("-");
        assert_eq!(stage.to_string(), "tar -x -f -");
    }
}
