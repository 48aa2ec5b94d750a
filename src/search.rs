use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::ItemKind;

/// Accumulates GitHub search qualifiers into a query string.
#[derive(Debug, Default)]
pub struct SearchQueryBuilder {
    terms: Vec<String>,
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn org(&mut self, org: &str) -> &mut Self {
        self.terms.push(format!("org:{}", org));
        self
    }

    pub fn kind(&mut self, kind: ItemKind) -> &mut Self {
        self.terms.push(format!("is:{}", kind.as_str()));
        self
    }

    pub fn updated_after(&mut self, since: DateTime<Utc>) -> &mut Self {
        self.terms.push(format!(
            "updated:>{}",
            since.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        self
    }

    pub fn build(&self) -> String {
        self.terms.join(" ")
    }
}

/// Builds the query for items of `kind` in `org` updated after `since`.
pub fn build_updated_items_query(org: &str, kind: ItemKind, since: DateTime<Utc>) -> String {
    SearchQueryBuilder::new()
        .org(org)
        .kind(kind)
        .updated_after(since)
        .build()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn test_issue_query() {
        let since = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(
            build_updated_items_query("acme", ItemKind::Issue, since),
            "org:acme is:issue updated:>2024-01-15T10:00:00Z"
        );
    }

    #[test]
    fn test_pr_query_drops_subseconds() {
        let since =
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap() + Duration::milliseconds(750);
        assert_eq!(
            build_updated_items_query("acme", ItemKind::PullRequest, since),
            "org:acme is:pr updated:>2024-01-15T10:00:00Z"
        );
    }
}
