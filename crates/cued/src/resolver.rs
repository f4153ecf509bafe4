//! Two-tier resolution: local match first, remote completion second.
//!
//! The ordering is fixed. The only configuration is `force_remote`, which
//! skips the local tier entirely.

use tracing::warn;

use crate::matcher::{self, MatchConfig, MatchOutcome, MatchSource, SCORE_SENTINEL};
use crate::remote::RemoteClient;
use crate::store::AnswerStore;

/// Shown when neither tier produced an answer.
pub const NOT_FOUND: &str = "[404]";

/// Resolve `query` through the fallback chain.
pub async fn resolve(
    query: &str,
    store: &AnswerStore,
    config: &MatchConfig,
    remote: &dyn RemoteClient,
) -> MatchOutcome {
    if config.force_remote {
        return remote_outcome(query, remote).await;
    }

    let local = matcher::find_best_match(store, query, config);
    if local.source == MatchSource::Local {
        return local;
    }

    remote_outcome(query, remote).await
}

/// Resolve to the final answer string, substituting the not-found sentinel
/// when both tiers come up empty.
pub async fn resolve_answer(
    query: &str,
    store: &AnswerStore,
    config: &MatchConfig,
    remote: &dyn RemoteClient,
) -> String {
    resolve(query, store, config, remote)
        .await
        .answer
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Render an outcome into the message pushed to the presenter. Local
/// matches expose the matched key and score; remote answers pass through
/// verbatim.
pub fn format_answer(outcome: &MatchOutcome) -> String {
    match (&outcome.source, &outcome.matched_key, &outcome.answer) {
        (MatchSource::Local, Some(key), Some(answer)) => {
            format!("Match: {key}\nDiff: {}\nAnswer: {answer}", outcome.score)
        }
        (MatchSource::Remote, _, Some(answer)) => answer.clone(),
        _ => NOT_FOUND.to_string(),
    }
}

async fn remote_outcome(query: &str, remote: &dyn RemoteClient) -> MatchOutcome {
    match remote.complete(query).await {
        Ok(answer) => MatchOutcome {
            matched_key: None,
            score: SCORE_SENTINEL,
            answer: Some(answer),
            source: MatchSource::Remote,
        },
        Err(e) => {
            warn!("remote fallback failed: {e}");
            MatchOutcome::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{FakeRemoteClient, RemoteError};

    fn store_of(entries: &[(&str, &str)]) -> AnswerStore {
        let mut store = AnswerStore::new();
        store.replace(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        store
    }

    #[tokio::test]
    async fn local_hit_never_touches_remote() {
        let store = store_of(&[("hello", "hi there")]);
        let remote = FakeRemoteClient::always("should not be used");

        let answer = resolve_answer("hello", &store, &MatchConfig::default(), &remote).await;
        assert_eq!(answer, "hi there");
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn score_above_threshold_falls_back_to_remote() {
        let store = store_of(&[("aaaaaaaaaaaaaaaaaaaaaaaa", "far away")]);
        let remote = FakeRemoteClient::always("remote answer");
        let config = MatchConfig {
            fitness_threshold: 6,
            ..MatchConfig::default()
        };

        let answer = resolve_answer(
            "bbbbbbbbbbbbbbbbbbbbbbbb",
            &store,
            &config,
            &remote,
        )
        .await;
        assert_eq!(answer, "remote answer");
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_store_and_failing_remote_yields_sentinel() {
        let store = store_of(&[]);
        let remote = FakeRemoteClient::always_error(RemoteError::Http("boom".to_string()));

        let answer = resolve_answer("anything", &store, &MatchConfig::default(), &remote).await;
        assert_eq!(answer, NOT_FOUND);
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn force_remote_skips_local_matching() {
        let store = store_of(&[("hello", "hi there")]);
        let remote = FakeRemoteClient::always("remote answer");
        let config = MatchConfig {
            force_remote: true,
            ..MatchConfig::default()
        };

        let answer = resolve_answer("hello", &store, &config, &remote).await;
        assert_eq!(answer, "remote answer");
        assert_eq!(remote.call_count(), 1);
    }

    #[tokio::test]
    async fn force_remote_failure_yields_sentinel() {
        let store = store_of(&[("hello", "hi there")]);
        let remote = FakeRemoteClient::always_error(RemoteError::Timeout(30));
        let config = MatchConfig {
            force_remote: true,
            ..MatchConfig::default()
        };

        let answer = resolve_answer("hello", &store, &config, &remote).await;
        assert_eq!(answer, NOT_FOUND);
    }

    #[tokio::test]
    async fn format_local_outcome_includes_match_and_diff() {
        let store = store_of(&[("hello", "hi there")]);
        let remote = FakeRemoteClient::always("unused");
        let outcome = resolve("hello", &store, &MatchConfig::default(), &remote).await;
        assert_eq!(format_answer(&outcome), "Match: hello\nDiff: 0\nAnswer: hi there");
    }

    #[test]
    fn format_none_outcome_is_sentinel() {
        assert_eq!(format_answer(&MatchOutcome::none()), NOT_FOUND);
    }
}
