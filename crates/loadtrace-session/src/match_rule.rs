use serde::{Deserialize, Serialize};

/// Decides which URLs end up in the timeline.
///
/// A URL is of interest when it contains at least one include substring and
/// none of the exclude substrings, or when it is exactly the page URL. An
/// empty include list therefore matches nothing; pass `[""]` to match
/// everything. Likewise an exclude entry of `""` excludes every URL except
/// the page itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRule {
    pub include_substrings: Vec<String>,
    pub exclude_substrings: Vec<String>,
    pub exact_url: String,
}

impl MatchRule {
    pub fn new(
        include_substrings: Vec<String>,
        exclude_substrings: Vec<String>,
        exact_url: impl Into<String>,
    ) -> Self {
        Self {
            include_substrings,
            exclude_substrings,
            exact_url: exact_url.into(),
        }
    }

    pub fn is_of_interest(&self, url: &str) -> bool {
        if url == self.exact_url {
            return true;
        }
        let included = self
            .include_substrings
            .iter()
            .any(|needle| url.contains(needle.as_str()));
        included
            && self
                .exclude_substrings
                .iter()
                .all(|needle| !url.contains(needle.as_str()))
    }
}
