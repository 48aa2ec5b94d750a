//! Decides which comments on a thread are worth a notification.
//!
//! A thread is an issue, a pull request or a discussion: an author plus an
//! ordered list of comments. Nothing in here performs I/O.

use chrono::{DateTime, Utc};

use crate::types::{Comment, NotificationEvent, TargetHandle};

/// Reports whether `comment` should be forwarded to `target`.
///
/// A comment newer than `since` qualifies when any of the following holds:
/// the body mentions the target, the thread belongs to the target (their own
/// replies included), or the target has commented on the thread and this
/// comment is from someone else.
pub fn is_relevant(
    comment: &Comment,
    item_author: &str,
    target_participated: bool,
    since: DateTime<Utc>,
    target: &TargetHandle,
) -> bool {
    if comment.created_at <= since {
        return false;
    }

    target.is_mentioned_in(&comment.body)
        || target.is(item_author)
        || (target_participated && !target.is(&comment.author))
}

/// Whether the target wrote any comment on the thread, at any time.
pub fn has_participated(comments: &[Comment], target: &TargetHandle) -> bool {
    comments.iter().any(|c| target.is(&c.author))
}

/// Collects one event per relevant comment, in thread order.
pub fn thread_events(
    item_author: &str,
    comments: &[Comment],
    since: DateTime<Utc>,
    target: &TargetHandle,
) -> Vec<NotificationEvent> {
    let participated = has_participated(comments, target);

    comments
        .iter()
        .filter(|comment| is_relevant(comment, item_author, participated, since, target))
        .map(|comment| NotificationEvent {
            actor: comment.author.clone(),
            url: comment.url.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    fn comment(author: &str, body: &str, offset_secs: i64) -> Comment {
        Comment {
            author: author.to_string(),
            body: body.to_string(),
            created_at: t0() + Duration::seconds(offset_secs),
            url: format!("https://github.com/acme/widgets/issues/1#c{offset_secs}"),
        }
    }

    #[test]
    fn test_old_comments_never_qualify() {
        let alice = TargetHandle::new("alice");
        for offset in [-3600, -1, 0] {
            let c = comment("bob", "ping @alice", offset);
            assert!(!is_relevant(&c, "alice", true, t0(), &alice));
        }
    }

    #[test]
    fn test_mention_is_case_insensitive() {
        let alice = TargetHandle::new("Alice");
        let c = comment("bob", "cc @ALICE for review", 1);
        assert!(is_relevant(&c, "dave", false, t0(), &alice));
    }

    #[test]
    fn test_mention_matches_unanchored_substring() {
        let ed = TargetHandle::new("ed");
        let c = comment("bob", "I renamed the module", 1);
        assert!(is_relevant(&c, "dave", false, t0(), &ed));
    }

    #[test]
    fn test_mention_by_target_still_qualifies() {
        let alice = TargetHandle::new("alice");
        let c = comment("alice", "note to self: alice fixes this", 1);
        assert!(is_relevant(&c, "dave", true, t0(), &alice));
    }

    #[test]
    fn test_own_item_includes_own_replies() {
        let alice = TargetHandle::new("alice");
        let c = comment("alice", "bump", 1);
        assert!(is_relevant(&c, "alice", true, t0(), &alice));
    }

    #[test]
    fn test_author_comparison_is_case_sensitive() {
        let alice = TargetHandle::new("alice");
        let c = comment("carol", "looks fine", 1);
        assert!(!is_relevant(&c, "Alice", false, t0(), &alice));
    }

    #[test]
    fn test_participation_rule_skips_target_replies() {
        let alice = TargetHandle::new("alice");
        assert!(is_relevant(&comment("erin", "agreed", 1), "dave", true, t0(), &alice));
        assert!(!is_relevant(&comment("alice", "thanks", 2), "dave", true, t0(), &alice));
    }

    #[test]
    fn test_unrelated_comment_is_ignored() {
        let alice = TargetHandle::new("alice");
        let c = comment("erin", "agreed", 1);
        assert!(!is_relevant(&c, "dave", false, t0(), &alice));
    }

    #[test]
    fn test_thread_events_counts_participation_before_window() {
        let alice = TargetHandle::new("alice");
        let comments = vec![
            comment("alice", "first thoughts", -10),
            comment("erin", "agreed", 1),
            comment("alice", "thanks", 2),
        ];

        let events = thread_events("dave", &comments, t0(), &alice);
        assert_eq!(
            events,
            vec![NotificationEvent {
                actor: "erin".to_string(),
                url: comments[1].url.clone(),
            }]
        );
    }

    #[test]
    fn test_thread_events_emits_once_per_comment() {
        let alice = TargetHandle::new("alice");
        // Matches all three rules at once.
        let comments = vec![
            comment("alice", "earlier", -5),
            comment("bob", "@alice see above", 3),
        ];

        let events = thread_events("alice", &comments, t0(), &alice);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor, "bob");
    }

    #[test]
    fn test_thread_events_preserves_order() {
        let alice = TargetHandle::new("alice");
        let comments = vec![
            comment("carol", "one", 1),
            comment("dave", "two", 2),
            comment("erin", "three", 3),
        ];

        let actors: Vec<_> = thread_events("alice", &comments, t0(), &alice)
            .into_iter()
            .map(|e| e.actor)
            .collect();
        assert_eq!(actors, ["carol", "dave", "erin"]);
    }
}
