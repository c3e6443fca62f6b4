use pulse_core::pr_summary::{is_affirmative, Confirm};
use std::io::{BufRead, Write};

/// Shows the preview on stderr and reads one line from stdin. End of input
/// counts as no.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, key: &str, preview: &str) -> pulse_core::Result<bool> {
        let mut err = std::io::stderr().lock();
        writeln!(err, "----- comment preview -----")?;
        writeln!(err, "{}", preview.trim_end())?;
        writeln!(err, "---------------------------")?;
        write!(err, "Post this comment to {key}? [y/N] ")?;
        err.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(is_affirmative(&answer))
    }
}

/// Confirmation given up front with `--yes`.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, key: &str, _preview: &str) -> pulse_core::Result<bool> {
        tracing::info!(key, "confirmation given by --yes");
        Ok(true)
    }
}
