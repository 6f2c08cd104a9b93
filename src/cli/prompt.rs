//! Interactive yes/no confirmation before long or destructive runs.
//!
//! Only an explicit `yes` (any case) proceeds; anything else, including EOF,
//! declines.

use std::io::{self, BufRead, Write};

use crate::error::AppError;

/// Ask `question` on stdout and read the answer from stdin.
pub fn confirm(question: &str) -> Result<bool, AppError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    confirm_with(question, &mut stdin.lock(), &mut stdout.lock())
}

pub fn confirm_with<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> Result<bool, AppError> {
    write!(output, "{question} (yes/no): ")
        .and_then(|_| output.flush())
        .map_err(|e| AppError::failure(format!("Failed to write prompt: {e}")))?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| AppError::failure(format!("Failed to read input: {e}")))?;

    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(answer: &str) -> bool {
        let mut out = Vec::new();
        let ok = confirm_with("Continue?", &mut Cursor::new(answer.as_bytes()), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Continue? (yes/no): ");
        ok
    }

    #[test]
    fn only_yes_confirms() {
        assert!(ask("yes\n"));
        assert!(ask("  YES \n"));
        assert!(!ask("y\n"));
        assert!(!ask("no\n"));
        assert!(!ask(""));
    }
}
