//! Pre-chunking text cleanup.
//!
//! Strips note markup that carries no semantic weight for embedding:
//! fenced code blocks, `%% … %%` structural comments, and `![[ … ]]`
//! embedded file references. Each removal is an independent pattern
//! pass, and the whole cleanup is idempotent — cleaning already-cleaned
//! text is a no-op.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)%%.*?%%").unwrap());
static EMBED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[\[[^\]]*\]\]").unwrap());

/// Remove fenced code blocks.
///
/// Returns `Cow::Borrowed` when the text contains no fence (zero
/// allocation).
fn strip_code_fences(input: &str) -> Cow<'_, str> {
    if !input.contains("```") {
        return Cow::Borrowed(input);
    }
    FENCE_RE.replace_all(input, "")
}

/// Remove `%% … %%` structural comments.
fn strip_comments(input: &str) -> Cow<'_, str> {
    if !input.contains("%%") {
        return Cow::Borrowed(input);
    }
    COMMENT_RE.replace_all(input, "")
}

/// Remove `![[ … ]]` embedded file-reference tokens.
fn strip_embeds(input: &str) -> Cow<'_, str> {
    if !input.contains("![[") {
        return Cow::Borrowed(input);
    }
    EMBED_RE.replace_all(input, "")
}

/// Apply the full cleanup to `input`.
///
/// Borrows when nothing matches. Whitespace is preserved; callers decide
/// whether the cleaned result still holds anything worth indexing (see
/// [`is_blank`]).
pub fn clean(input: &str) -> Cow<'_, str> {
    let mut current = Cow::Borrowed(input);

    for pass in [strip_code_fences, strip_comments, strip_embeds] {
        if let Cow::Owned(stripped) = pass(&current) {
            current = Cow::Owned(stripped);
        }
    }

    current
}

/// Whether cleaned text contains nothing to index.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

// ── Tests ──────────────────────────────────────────────────────────────
