//! Name-conflict resolution: decides which name to keep when the model's extracted
//! candidate name shares no words with the name guessed from the filename.

use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::bail;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

/// Policy applied to a soft name mismatch. Non-interactive policies never block.
///
/// Parsed from `NAME_CONFLICT_POLICY`: `extracted` (alias `model`), `filename`,
/// or `interactive` (alias `prompt`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictResolver {
    #[default]
    AutoPreferExtracted,
    AutoPreferFilename,
    Interactive,
}

impl FromStr for ConflictResolver {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extracted" | "model" => Ok(ConflictResolver::AutoPreferExtracted),
            "filename" => Ok(ConflictResolver::AutoPreferFilename),
            "interactive" | "prompt" => Ok(ConflictResolver::Interactive),
            other => bail!("unknown name conflict policy '{other}' (expected extracted, filename or interactive)"),
        }
    }
}

/// A mismatch between the model's name and the filename-derived name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConflict<'a> {
    pub filename: &'a str,
    pub extracted: &'a str,
    pub probable: &'a str,
}

impl ConflictResolver {
    /// Returns the name to store. Always logs the mismatch.
    pub fn resolve(&self, conflict: &NameConflict<'_>) -> String {
        warn!(
            "Extracted name '{}' doesn't match filename '{}' (probable name: '{}')",
            conflict.extracted, conflict.filename, conflict.probable
        );

        match self {
            ConflictResolver::AutoPreferExtracted => conflict.extracted.to_string(),
            ConflictResolver::AutoPreferFilename => conflict.probable.to_string(),
            ConflictResolver::Interactive => blocking_terminal_io(|| {
                let stdin = std::io::stdin();
                let stdout = std::io::stdout();
                prompt_for_choice(conflict, &mut stdin.lock(), &mut stdout.lock())
            }),
        }
    }
}

/// Asks the operator whether to use the filename-derived name.
/// Anything other than `y` (including a closed stdin) keeps the extracted name.
fn prompt_for_choice<R: BufRead, W: Write>(
    conflict: &NameConflict<'_>,
    input: &mut R,
    output: &mut W,
) -> String {
    let written = write!(
        output,
        "Extracted name '{}' doesn't match filename '{}'.\nProbable name from filename: {}\nUse name from filename instead? (y/n): ",
        conflict.extracted, conflict.filename, conflict.probable
    )
    .and_then(|_| output.flush());
    if let Err(e) = written {
        debug!("Could not write name prompt: {e}");
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) if answer.trim().eq_ignore_ascii_case("y") => conflict.probable.to_string(),
        _ => conflict.extracted.to_string(),
    }
}

/// Runs terminal I/O off the async worker when a multi-threaded runtime allows it.
fn blocking_terminal_io<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Lowercase words longer than two characters.
fn significant_words(name: &str) -> HashSet<String> {
    name.split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// True when both names have significant words and none are shared.
pub fn names_conflict(extracted: &str, probable: &str) -> bool {
    let extracted_words = significant_words(extracted);
    let probable_words = significant_words(probable);
    !extracted_words.is_empty()
        && !probable_words.is_empty()
        && extracted_words.is_disjoint(&probable_words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn conflict() -> NameConflict<'static> {
        NameConflict {
            filename: "jane_doe.pdf",
            extracted: "John Smith",
            probable: "jane doe",
        }
    }

    #[test]
    fn test_disjoint_names_conflict() {
        assert!(names_conflict("John Smith", "jane doe"));
    }

    #[test]
    fn test_shared_word_is_not_a_conflict() {
        assert!(!names_conflict("Jane A. Doe", "jane doe"));
        assert!(!names_conflict("JANE Smith", "jane doe"));
    }

    #[test]
    fn test_short_words_ignored() {
        // "Al" and "Li" are too short to compare, so there is nothing to disagree on
        assert!(!names_conflict("Al Li", "bob lee"));
        assert!(!names_conflict("Jane Doe", ""));
    }

    #[test]
    fn test_auto_policies() {
        assert_eq!(ConflictResolver::AutoPreferExtracted.resolve(&conflict()), "John Smith");
        assert_eq!(ConflictResolver::AutoPreferFilename.resolve(&conflict()), "jane doe");
    }

    #[test]
    fn test_prompt_yes_uses_filename_name() {
        let mut input = Cursor::new(b"y\n".to_vec());
        let mut output = Vec::new();
        assert_eq!(prompt_for_choice(&conflict(), &mut input, &mut output), "jane doe");
        assert!(String::from_utf8(output).unwrap().contains("(y/n)"));
    }

    #[test]
    fn test_prompt_no_or_eof_keeps_extracted() {
        let mut output = Vec::new();
        let mut no = Cursor::new(b"n\n".to_vec());
        assert_eq!(prompt_for_choice(&conflict(), &mut no, &mut output), "John Smith");
        let mut eof = Cursor::new(Vec::new());
        assert_eq!(prompt_for_choice(&conflict(), &mut eof, &mut output), "John Smith");
    }

    #[test]
    fn test_prompt_write_failure_still_reads_answer() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let mut input = Cursor::new(b"y\n".to_vec());
        assert_eq!(prompt_for_choice(&conflict(), &mut input, &mut BrokenPipe), "jane doe");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_terminal_io_runs_inside_multi_thread_runtime() {
        assert_eq!(blocking_terminal_io(|| 7), 7);
    }

    #[tokio::test]
    async fn test_terminal_io_runs_inside_current_thread_runtime() {
        assert_eq!(blocking_terminal_io(|| 7), 7);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("extracted".parse::<ConflictResolver>().unwrap(), ConflictResolver::AutoPreferExtracted);
        assert_eq!("Filename".parse::<ConflictResolver>().unwrap(), ConflictResolver::AutoPreferFilename);
        assert_eq!("interactive".parse::<ConflictResolver>().unwrap(), ConflictResolver::Interactive);
        assert_eq!("model".parse::<ConflictResolver>().unwrap(), ConflictResolver::AutoPreferExtracted);
        assert_eq!("prompt".parse::<ConflictResolver>().unwrap(), ConflictResolver::Interactive);
        assert!("other".parse::<ConflictResolver>().is_err());
    }
}
