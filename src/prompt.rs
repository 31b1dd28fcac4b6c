use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const QUESTION: &str = "Pictures taken earlier are stored privately. Move them to your Downloads folder? [y/N] ";

/// Whether an answer is a yes. Anything else, including nothing, is a no.
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Ask on stderr and read the answer from stdin.
pub async fn confirm_migration() -> bool {
    let mut stderr = tokio::io::stderr();
    if stderr.write_all(QUESTION.as_bytes()).await.is_err() || stderr.flush().await.is_err() {
        return false;
    }
    let mut answer = String::new();
    match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            tracing::warn!(error = ?e, "Could not read answer");
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("y\n", true)]
    #[case("YES\n", true)]
    #[case("  yes  ", true)]
    #[case("n\n", false)]
    #[case("\n", false)]
    #[case("", false)]
    #[case("yep", false)]
    fn test_is_yes(#[case] answer: &str, #[case] expected: bool) {
        assert_eq!(is_yes(answer), expected);
    }
}
