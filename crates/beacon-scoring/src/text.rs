//! Token-level phrase matching used by alignment scoring.
//!
//! Matching is on whole tokens, so `"sso"` matches `"SSO login"` but not
//! `"lasso"`.

/// Lowercase and split on anything that is not alphanumeric.
#[must_use]
pub fn normalize(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether the tokens of `phrase` occur as a contiguous run in `haystack`.
///
/// Empty phrases never match.
#[must_use]
pub fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle = normalize(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

/// Tokenised theme text. Title, description and each tag are kept as
/// separate segments so a phrase never spans two of them.
#[derive(Debug, Clone)]
pub struct ThemeText {
    segments: Vec<Vec<String>>,
}

impl ThemeText {
    #[must_use]
    pub fn new(title: &str, description: Option<&str>, tags: &[String]) -> Self {
        let mut segments = vec![normalize(title)];
        if let Some(description) = description {
            segments.push(normalize(description));
        }
        segments.extend(tags.iter().map(|t| normalize(t)));
        Self { segments }
    }

    /// Whether any segment contains `phrase`.
    #[must_use]
    pub fn mentions(&self, phrase: &str) -> bool {
        self.segments.iter().any(|s| contains_phrase(s, phrase))
    }
}
