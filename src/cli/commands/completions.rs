//! Shell completions generation.

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;
use crate::error::TrackerError;

/// Generate the completion script for `shell`.
///
/// # Errors
///
/// Returns an error if the generated script is not valid UTF-8.
pub fn completions(shell: Shell) -> Result<String, TrackerError> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "studytrack", &mut buf);
    String::from_utf8(buf).map_err(|e| {
        TrackerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions_mention_subcommands() {
        let script = completions(Shell::Bash).unwrap();
        assert!(script.contains("studytrack"));
        assert!(script.contains("session"));
    }

    #[test]
    fn test_zsh_completions() {
        let script = completions(Shell::Zsh).unwrap();
        assert!(script.contains("#compdef studytrack"));
    }
}
