//! Candidate selection on the terminal for `--interactive`.

use std::io::{BufRead, BufReader, Write};
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use scrapyard_core::{CandidateEntry, FileDescriptor};
use scrapyard_lib::CandidateChooser;

/// Lists the candidates and reads a number from stdin.
///
/// Enter accepts the suggestion at its automatic score, so a weak suggestion
/// is still rejected by the minimum match. `0` (or `s`) rejects every
/// candidate. Interactive runs use a single worker, so prompts never
/// interleave. Needs the multi-threaded runtime.
pub(crate) struct StdinChooser {
    input: Mutex<Box<dyn BufRead + Send>>,
}

impl StdinChooser {
    pub(crate) fn new() -> Self {
        Self::with_input(Box::new(BufReader::new(std::io::stdin())))
    }

    fn with_input(input: Box<dyn BufRead + Send>) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl CandidateChooser for StdinChooser {
    fn choose(
        &self,
        file: &FileDescriptor,
        candidates: &[CandidateEntry],
        suggested: Option<usize>,
    ) -> Option<usize> {
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stdout = std::io::stdout();
        let _ = writeln!(
            stdout,
            "\n{}",
            file.file_name().if_supports_color(Stdout, |t| t.bold())
        );
        for (i, candidate) in candidates.iter().enumerate() {
            let marker = if Some(i) == suggested { "*" } else { " " };
            let _ = writeln!(
                stdout,
                " {}{:>3}) {} {}",
                marker,
                i + 1,
                candidate.title,
                format!("[{}]", candidate.platform).if_supports_color(Stdout, |t| t.dimmed()),
            );
        }

        // Blocks on stdin; the runtime hands this thread's other tasks on.
        tokio::task::block_in_place(|| loop {
            let _ = write!(stdout, "Choice (Enter = suggested, 0 = skip): ");
            let _ = stdout.flush();
            let mut line = String::new();
            match input.read_line(&mut line) {
                // EOF: fall back to the suggestion, which still has to pass
                // the minimum match
                Ok(0) | Err(_) => return suggested,
                Ok(_) => {}
            }
            match parse_choice(&line, candidates.len(), suggested) {
                Ok(choice) => return choice,
                Err(()) => {
                    let _ = writeln!(stdout, "Enter a number between 0 and {}", candidates.len());
                }
            }
        })
    }
}

fn parse_choice(input: &str, count: usize, suggested: Option<usize>) -> Result<Option<usize>, ()> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(suggested);
    }
    if input.eq_ignore_ascii_case("s") {
        return Ok(None);
    }
    match input.parse::<usize>() {
        Ok(0) => Ok(None),
        Ok(n) if n <= count => Ok(Some(n - 1)),
        _ => Err(()),
    }
}
