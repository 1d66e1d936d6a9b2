//! Turning raw oracle content into structured task output.

use std::sync::LazyLock;

use nlprag_core::{TaskKind, TaskOutput};
use regex::Regex;

use crate::TRACING_TARGET;

/// Matches an opening ```` ```json ```` line or a closing ```` ``` ```` line.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*```[A-Za-z]*[ \t]*\r?\n|\r?\n?```\s*$").expect("fence pattern is valid")
});

/// Removes a surrounding Markdown code fence, if any.
pub fn strip_fences(content: &str) -> String {
    FENCE.replace_all(content, "").trim().to_owned()
}

/// Parses oracle content for `kind`, substituting the kind's stub when the
/// content is not valid JSON of the expected shape.
pub fn parse_or_stub(kind: TaskKind, content: &str) -> TaskOutput {
    let json = strip_fences(content);

    match TaskOutput::parse(kind, &json) {
        Ok(output) => output,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                task = %kind,
                error = %error,
                content = %content,
                "Unparsable inference content, using default result"
            );
            kind.fallback_output()
        }
    }
}
