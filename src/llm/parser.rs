//! Response cleanup for LLM outputs.
//!
//! Models often wrap SQL in markdown code fences even when told not to.
//! Only a fence at the very start and one at the very end are removed;
//! fences elsewhere in the text are left alone.

use regex::Regex;
use std::sync::OnceLock;

/// Opening fence: a tag on its own line, an inline `sql` tag, or no tag.
const LEADING_FENCE: &str = r"^```(?:(?P<tag>[A-Za-z0-9_+-]+)[ \t]*\r?\n|(?i:sql)\s+|\s*)";

/// Words that start a statement and so are never a language tag.
const STATEMENT_KEYWORDS: [&str; 2] = ["select", "with"];

/// Closing fence plus surrounding whitespace.
const TRAILING_FENCE: &str = r"\s*```\s*$";

fn leading_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LEADING_FENCE).expect("leading fence pattern is valid"))
}

fn trailing_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TRAILING_FENCE).expect("trailing fence pattern is valid"))
}

/// Strips leading/trailing markdown code-fence markers, then trims.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    let without_open = match leading_fence().captures(trimmed) {
        Some(caps) if caps.name("tag").is_some_and(|tag| is_statement_keyword(tag.as_str())) => {
            &trimmed["```".len()..]
        }
        Some(caps) => &trimmed[caps.get(0).map_or(0, |m| m.end())..],
        None => trimmed,
    };
    let without_close = trailing_fence().replace(without_open, "");
    without_close.trim().to_string()
}

fn is_statement_keyword(word: &str) -> bool {
    STATEMENT_KEYWORDS
        .iter()
        .any(|keyword| word.eq_ignore_ascii_case(keyword))
}
