//! Input acquisition and output delivery around the interactive session.
//!
//! Both stdin and stdout may be pipes: input is read from stdin when piped
//! and captured from a prompted command when not, and the result either goes
//! straight to the piped stdout or through a prompted downstream template.
//! All prompting happens on the controlling terminal, never on the standard
//! streams.

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Read, Write};

use log::{debug, info};

use colander_core::error::{Error, Result};
use colander_core::pipeline::{self, Plan, PlanOutcome};

const TTY_PATH: &str = "/dev/tty";

const OUTPUT_TIPS: &str = "\
Leave empty to print the result as-is. `{}` inserts the result as one \
argument; `colander` in a pipe re-opens the picker on the intermediate \
output.";

/// The controlling terminal, for prompting while the standard streams are
/// busy carrying data.
pub struct Tty {
    reader: BufReader<File>,
    writer: File,
}

impl Tty {
    /// # Errors
    ///
    /// Returns [`Error::Tty`] when there is no controlling terminal, e.g.
    /// when run from a non-interactive context.
    pub fn open() -> Result<Self> {
        let reader = File::open(TTY_PATH).map_err(Error::Tty)?;
        let writer = File::options()
            .write(true)
            .open(TTY_PATH)
            .map_err(Error::Tty)?;

        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.writer, "{message}")?;
        Ok(())
    }

    /// Prints the prompt without a newline and reads one trimmed line back.
    pub fn prompt(&mut self, prompt: &str) -> Result<String> {
        write!(self.writer, "{prompt}")?;
        self.writer.flush()?;

        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Obtains the text to filter.
///
/// When stdin is piped, it is read in full. When stdin is a terminal, the
/// user is prompted for an upstream command and its captured output becomes
/// the input; spawn failures re-prompt rather than abort.
///
/// # Errors
///
/// Returns an error when stdin cannot be read or the controlling terminal
/// cannot be opened.
pub fn acquire_input() -> Result<String> {
    let mut stdin = io::stdin();
    if !stdin.is_terminal() {
        debug!("Reading piped stdin");
        let mut raw = Vec::new();
        stdin.read_to_end(&mut raw)?;
        return Ok(String::from_utf8_lossy(&raw).into_owned());
    }

    let mut tty = Tty::open()?;
    loop {
        let command_line = tty.prompt("Enter command: ")?;
        match pipeline::capture_command_output(&command_line) {
            Ok(text) => return Ok(text),
            Err(error) if error.is_recoverable() => {
                tty.say(&error.to_string())?;
            }
            Err(error) => return Err(error),
        }
    }
}

/// How the finalized result left the program.
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The downstream template re-entered the tool; the session restarts on
    /// this text.
    RerunRequested(String),
}

/// Hands the result text onward.
///
/// A piped stdout receives the text directly. On a terminal stdout the user
/// is prompted for a downstream template instead, and recoverable template
/// failures re-prompt with the result text intact.
///
/// # Errors
///
/// Returns an error when stdout cannot be written or the controlling
/// terminal cannot be opened.
pub fn deliver_output(text: &str) -> Result<Delivery> {
    let mut stdout = io::stdout();
    if !stdout.is_terminal() {
        debug!("Writing result to piped stdout");
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        return Ok(Delivery::Delivered);
    }

    let mut tty = Tty::open()?;
    tty.say(OUTPUT_TIPS)?;

    loop {
        let template = tty.prompt("Pipe output to: ")?;

        let attempt = Plan::parse(&template).and_then(|plan| pipeline::execute_plan(&plan, text));
        match attempt {
            Ok(PlanOutcome::Delivered(result)) => {
                info!("Delivered through `{template}`");
                write!(tty.writer, "{result}")?;
                return Ok(Delivery::Delivered);
            }
            Ok(PlanOutcome::Rerun(seed)) => return Ok(Delivery::RerunRequested(seed)),
            Err(error) if error.is_recoverable() => {
                tty.say(&error.to_string())?;
            }
            Err(error) => return Err(error),
        }
    }
}
