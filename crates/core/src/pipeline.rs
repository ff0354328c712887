//! Command templates and subprocess plumbing around the interactive session.
//!
//! A downstream template is parsed once into a typed [`Plan`]: a sequence of
//! pipe-separated stages, each either an external command (optionally taking
//! the result through the `{}` placeholder) or a re-entry into the tool
//! itself. Execution is synchronous; each stage's output is fully captured
//! before the next stage runs.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use log::{debug, info, warn};

use crate::error::{Error, Result};

/// The tool's own name inside a template, meaning "re-enter the session".
pub const SELF_COMMAND: &str = "colander";

/// Placeholder substituted with the result text as a single argument.
pub const PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Command {
        argv: Vec<String>,
        takes_placeholder: bool,
    },
    /// Restart the interactive session on the text produced so far, instead
    /// of spawning a second instance that would contend for the terminal.
    SelfRerun,
}

/// A parsed command template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    stages: Vec<Stage>,
}

impl Plan {
    /// Parses a template string into stages.
    ///
    /// An empty template parses into the pass-through plan (print the result
    /// as-is).
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateParse`] when a segment has unbalanced quotes
    /// and [`Error::EmptyCommand`] when a pipe segment is blank.
    pub fn parse(template: &str) -> Result<Self> {
        if template.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut stages = Vec::new();
        for segment in template.split('|') {
            let argv = shell_words::split(segment)
                .map_err(|original| Error::TemplateParse(original.to_string()))?;

            let Some(program) = argv.first() else {
                return Err(Error::EmptyCommand);
            };

            if program == SELF_COMMAND {
                stages.push(Stage::SelfRerun);
            } else {
                let takes_placeholder = argv.iter().any(|argument| argument.contains(PLACEHOLDER));
                stages.push(Stage::Command {
                    argv,
                    takes_placeholder,
                });
            }
        }

        Ok(Self { stages })
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// True for the empty template: the result is printed unchanged.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn mentions_self(&self) -> bool {
        self.stages.iter().any(|stage| *stage == Stage::SelfRerun)
    }
}

/// What running a plan produced.
#[derive(Debug, PartialEq, Eq)]
pub enum PlanOutcome {
    /// The text left over after the final stage; the caller displays it.
    Delivered(String),
    /// A self stage was reached; the session restarts on this text.
    Rerun(String),
}

/// Runs a plan over the result text, stage by stage.
///
/// Stage stdout is captured in full before the next stage proceeds. The
/// result text is streamed into the first command's stdin unless that
/// command takes the placeholder, in which case stdin is closed.
///
/// # Errors
///
/// Returns an error when a stage cannot be spawned or exits non-zero; the
/// caller keeps the result text and may retry with a corrected template.
pub fn execute_plan(plan: &Plan, text: &str) -> Result<PlanOutcome> {
    let mut current = text.to_string();

    for stage in plan.stages() {
        match stage {
            Stage::SelfRerun => return Ok(PlanOutcome::Rerun(current)),
            Stage::Command {
                argv,
                takes_placeholder,
            } => {
                current = run_stage(argv, *takes_placeholder, &current)?;
            }
        }
    }

    Ok(PlanOutcome::Delivered(current))
}

fn run_stage(argv: &[String], takes_placeholder: bool, input: &str) -> Result<String> {
    let display = argv.join(" ");
    let rendered = render_argv(argv, input);
    let program = shellexpand::tilde(&rendered[0]).to_string();

    debug!("Running stage `{display}` (placeholder: {takes_placeholder})");

    let mut command = Command::new(program);
    command
        .args(&rendered[1..])
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .stdin(if takes_placeholder {
            Stdio::null()
        } else {
            Stdio::piped()
        });

    let mut child = command
        .spawn()
        .map_err(|original| Error::spawn_failed(&display, original))?;

    // Stdin is fed from its own thread: writing it to completion before
    // draining stdout deadlocks once the child's output fills the pipe
    // buffer. EPIPE means the child stopped reading; its exit status
    // decides success.
    let feeder = child.stdin.take().map(|mut stdin| {
        let payload = input.as_bytes().to_vec();
        thread::spawn(move || match stdin.write_all(&payload) {
            Err(original) if original.kind() != io::ErrorKind::BrokenPipe => Err(original),
            _ => Ok(()),
        })
    });

    let output = child.wait_with_output()?;
    if let Some(handle) = feeder {
        if let Ok(Err(original)) = handle.join() {
            return Err(Error::Stdio(original));
        }
    }
    if !output.status.success() {
        warn!("Stage `{display}` exited with {}", output.status);
        return Err(Error::sub_process_exit(&display));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Substitutes the placeholder with the result text, one argument at a time.
///
/// The text loses its trailing newline so that `{}` behaves like a plain
/// argument rather than a line.
fn render_argv(argv: &[String], text: &str) -> Vec<String> {
    let substituted = text.trim_end_matches('\n');
    argv.iter()
        .map(|argument| {
            if argument.contains(PLACEHOLDER) {
                argument.replace(PLACEHOLDER, substituted)
            } else {
                argument.clone()
            }
        })
        .collect()
}

/// Spawns an upstream command and captures its standard output in full.
///
/// Used when the tool's own stdin is a terminal and the user typed the
/// command to filter.
///
/// # Errors
///
/// Returns an error when the command line is blank, cannot be spawned, or
/// exits non-zero. All of these are recoverable by re-prompting.
pub fn capture_command_output(command_line: &str) -> Result<String> {
    let argv = shell_words::split(command_line)
        .map_err(|original| Error::TemplateParse(original.to_string()))?;

    let Some(program) = argv.first() else {
        return Err(Error::EmptyCommand);
    };
    let program = shellexpand::tilde(program).to_string();

    info!("Capturing output of `{command_line}`");

    let output = Command::new(program)
        .args(&argv[1..])
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|original| Error::spawn_failed(command_line, original))?;

    if !output.status.success() {
        return Err(Error::sub_process_exit(command_line));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_command() {
        let plan = Plan::parse("grep foo").unwrap();

        assert_eq!(
            plan.stages(),
            [Stage::Command {
                argv: vec!["grep".to_string(), "foo".to_string()],
                takes_placeholder: false,
            }]
        );
    }

    #[test]
    fn test_parse_pipe_segments() {
        let plan = Plan::parse("sort | uniq -c").unwrap();

        assert_eq!(plan.stages().len(), 2);
        assert_eq!(
            plan.stages()[1],
            Stage::Command {
                argv: vec!["uniq".to_string(), "-c".to_string()],
                takes_placeholder: false,
            }
        );
    }

    #[test]
    fn test_parse_detects_placeholder() {
        let plan = Plan::parse("kill {}").unwrap();

        assert_eq!(
            plan.stages(),
            [Stage::Command {
                argv: vec!["kill".to_string(), "{}".to_string()],
                takes_placeholder: true,
            }]
        );
    }

    #[test]
    fn test_parse_self_reference() {
        let plan = Plan::parse("grep foo | colander").unwrap();

        assert_eq!(plan.stages().len(), 2);
        assert_eq!(plan.stages()[1], Stage::SelfRerun);
        assert!(plan.mentions_self());
    }

    #[test]
    fn test_parse_empty_template_is_passthrough() {
        let plan = Plan::parse("   ").unwrap();

        assert!(plan.is_passthrough());
    }

    #[test]
    fn test_parse_blank_pipe_segment_is_an_error() {
        assert!(matches!(
            Plan::parse("sort | | uniq"),
            Err(Error::EmptyCommand)
        ));
    }

    #[test]
    fn test_parse_unbalanced_quote_is_an_error() {
        assert!(matches!(
            Plan::parse("echo \"unterminated"),
            Err(Error::TemplateParse(_))
        ));
    }

    #[test]
    fn test_render_argv_substitutes_as_single_argument() {
        let argv = vec!["kill".to_string(), "{}".to_string()];

        let rendered = render_argv(&argv, "1234\n");
        assert_eq!(rendered, vec!["kill", "1234"]);
    }

    #[test]
    fn test_execute_passthrough_returns_text_unchanged() {
        let plan = Plan::parse("").unwrap();

        let outcome = execute_plan(&plan, "a\nb\n").unwrap();
        assert_eq!(outcome, PlanOutcome::Delivered("a\nb\n".to_string()));
    }

    #[test]
    fn test_execute_streams_text_through_stages() {
        let plan = Plan::parse("sort | tr a-z A-Z").unwrap();

        let outcome = execute_plan(&plan, "banana\napple\n").unwrap();
        assert_eq!(outcome, PlanOutcome::Delivered("APPLE\nBANANA\n".to_string()));
    }

    #[test]
    fn test_execute_placeholder_command_gets_text_as_argument() {
        let plan = Plan::parse("echo {}").unwrap();

        let outcome = execute_plan(&plan, "apple 1\n").unwrap();
        assert_eq!(outcome, PlanOutcome::Delivered("apple 1\n".to_string()));
    }

    #[test]
    fn test_execute_self_stage_requests_rerun_with_current_text() {
        let plan = Plan::parse("sort | colander").unwrap();

        let outcome = execute_plan(&plan, "b\na\n").unwrap();
        assert_eq!(outcome, PlanOutcome::Rerun("a\nb\n".to_string()));
    }

    #[test]
    fn test_execute_handles_input_larger_than_the_pipe_buffer() {
        let plan = Plan::parse("cat").unwrap();
        let text = "0123456789abcdef\n".repeat(65536);

        let outcome = execute_plan(&plan, &text).unwrap();
        assert_eq!(outcome, PlanOutcome::Delivered(text));
    }

    #[test]
    fn test_execute_stage_that_ignores_large_stdin_still_succeeds() {
        let plan = Plan::parse("echo hi").unwrap();
        let text = "x".repeat(1 << 20);

        let outcome = execute_plan(&plan, &text).unwrap();
        assert_eq!(outcome, PlanOutcome::Delivered("hi\n".to_string()));
    }

    #[test]
    fn test_execute_missing_command_is_a_spawn_failure() {
        let plan = Plan::parse("definitely-not-a-real-command-xyz").unwrap();

        assert!(matches!(
            execute_plan(&plan, "text\n"),
            Err(Error::SpawnFailed { .. })
        ));
    }

    #[test]
    fn test_capture_command_output() {
        let text = capture_command_output("echo hello").unwrap();

        assert_eq!(text, "hello\n");
    }

    #[test]
    fn test_capture_blank_command_is_an_error() {
        assert!(matches!(
            capture_command_output("  "),
            Err(Error::EmptyCommand)
        ));
    }

    #[test]
    fn test_spawn_failures_are_recoverable() {
        let error = capture_command_output("definitely-not-a-real-command-xyz").unwrap_err();

        assert!(error.is_recoverable());
    }
}
