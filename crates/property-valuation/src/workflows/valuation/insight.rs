//! Cleanup for the narrative text returned by the analysis endpoint.
//!
//! Servers may answer with a JSON-quoted string, and some double-escape newlines so the text
//! arrives with literal `\n` sequences. The steps are repeated until the text stops changing,
//! which keeps the output stable when a payload was quoted more than once.
//!
//! Repeating has a cost. A decoded text that itself starts and ends with a quote, such as
//! `"Invest" now, says the "analyst"`, is not valid JSON, so the next pass takes the lenient
//! fallback and strips those quotes too. A single pass would keep them, but then normalizing the
//! output again would strip them anyway. Stable output wins here; `repaired_quotes` reports
//! every such strip so callers can log it.

/// Display-ready insight plus whether the lenient quote fallback had to be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInsight {
    pub text: String,
    pub repaired_quotes: bool,
}

/// Normalize a raw analysis payload into display text.
pub fn normalize(raw: &str) -> String {
    normalize_insight(raw).text
}

pub fn normalize_insight(raw: &str) -> NormalizedInsight {
    let mut repaired_quotes = false;
    let mut current = raw.to_string();
    loop {
        // Every pass that changes the text makes it strictly shorter, so this terminates.
        let (next, repaired) = normalize_pass(&current);
        repaired_quotes |= repaired;
        if next == current {
            return NormalizedInsight {
                text: next,
                repaired_quotes,
            };
        }
        current = next;
    }
}

fn normalize_pass(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    let mut repaired = false;

    let unquoted = if is_quoted(trimmed) {
        match serde_json::from_str::<String>(trimmed) {
            Ok(decoded) => decoded,
            Err(_) => {
                repaired = true;
                strip_outer_quotes(trimmed).to_string()
            }
        }
    } else {
        trimmed.to_string()
    };

    let text = unquoted.replace("\\n", "\n").trim().to_string();
    (text, repaired)
}

fn is_quoted(text: &str) -> bool {
    ['"', '\''].into_iter().any(|quote| {
        text.starts_with(quote) && text.ends_with(quote)
    })
}

fn strip_outer_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}
