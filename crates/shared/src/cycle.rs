//! One query cycle: schedule guard, window computation, search, digest
//! rendering, delivery, and the `lastUpdate` bookkeeping.
//!
//! The search and delivery collaborators sit behind traits so the
//! persistence rules can be exercised without a network: the window is
//! consumed only by a confirmed delivery or a confirmed empty result set.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::arxiv::Paper;
use crate::config::ConfigStore;
use crate::digest::render_digest;
use crate::query::build_query;
use crate::schedule::{due_for_update, submission_window, DEFAULT_LOOKBACK_DAYS};

/// Where papers come from. The real implementation is [`crate::ArxivClient`].
#[async_trait]
pub trait PaperSource {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Paper>>;
}

/// How the digest goes out. The real implementation is [`crate::Mailer`].
#[async_trait]
pub trait DigestSender {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The notification schedule has not elapsed yet.
    NotDue,
    /// The window was empty. No email, but the window still counts as
    /// consumed.
    NoNewPapers,
    /// The digest was delivered.
    Delivered { papers: usize },
}

/// Run one query cycle against injected collaborators.
///
/// A failed send propagates without touching `lastUpdate`, so the next run
/// re-covers the same window rather than silently skipping it.
pub async fn run_query_cycle(
    source: &impl PaperSource,
    sender: &impl DigestSender,
    store: &mut ConfigStore,
    now: DateTime<Utc>,
) -> Result<CycleOutcome> {
    let config = store.config().clone();

    if !due_for_update(
        config.last_update.as_deref(),
        config.notification_schedule,
        now,
    ) {
        return Ok(CycleOutcome::NotDue);
    }

    let lookback = config
        .notification_schedule
        .filter(|days| *days > 0.0)
        .unwrap_or(DEFAULT_LOOKBACK_DAYS);
    let window = submission_window(now, lookback);
    let query = build_query(&window, &config.interests, config.last_update.as_deref())?;
    println!("{query}");

    let papers = source
        .search(&query, config.max_results)
        .await
        .context("Failed to query arXiv")?;

    for paper in &papers {
        println!("{}", paper.title);
    }

    if papers.is_empty() {
        store.mark_updated(window.end_stamp());
        store.save_if_dirty()?;
        return Ok(CycleOutcome::NoNewPapers);
    }

    let html = render_digest(&config.name, &papers);
    sender.send(&config.email, &config.email_title, html).await?;

    // Delivery confirmed; only now is the window consumed.
    store.mark_updated(window.end_stamp());
    store.save_if_dirty()?;

    Ok(CycleOutcome::Delivered {
        papers: papers.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EMAIL_TITLE;
    use crate::interest::InterestFilter;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct StubSource(Vec<Paper>);

    #[async_trait]
    impl PaperSource for StubSource {
        async fn search(&self, _query: &str, _max_results: u32) -> Result<Vec<Paper>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DigestSender for RecordingSender {
        async fn send(&self, to: &str, subject: &str, _html_body: String) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    struct FailingSender;

    #[async_trait]
    impl DigestSender for FailingSender {
        async fn send(&self, _to: &str, _subject: &str, _html_body: String) -> Result<()> {
            anyhow::bail!("SMTP authentication failed")
        }
    }

    fn paper() -> Paper {
        Paper {
            title: "Bandits with Budgets".to_string(),
            authors: vec!["A. Researcher".to_string()],
            summary: "We study budgeted bandits.".to_string(),
            entry_id: "http://arxiv.org/abs/2608.05678v2".to_string(),
        }
    }

    fn store_at(name: &str) -> ConfigStore {
        let mut path = std::env::temp_dir();
        path.push(format!("arxiv-scan-cycle-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_file(&path);
        let mut store = ConfigStore::load(path).unwrap();
        store.register_personal_details(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            Some(2.0),
            None,
        );
        store.register_interest(InterestFilter::parse("title:bandits").unwrap());
        store
    }

    fn cleanup(store: &ConfigStore) {
        let _ = std::fs::remove_file(store.path());
    }

    // Tue 2026-08-25 10:00 UTC-5; the window end resolves to Monday's
    // 14:00 cutoff, "202608241900".
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 15, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn schedule_guard_returns_early() {
        let mut store = store_at("not-due.json");
        store.mark_updated("202608241200".to_string()); // 27h ago, schedule 2d

        let source = StubSource(vec![paper()]);
        let sender = RecordingSender::default();
        let outcome = run_query_cycle(&source, &sender, &mut store, now())
            .await
            .unwrap();

        assert_eq!(outcome, CycleOutcome::NotDue);
        assert!(sender.sent.lock().unwrap().is_empty());
        assert_eq!(
            store.config().last_update.as_deref(),
            Some("202608241200")
        );
        cleanup(&store);
    }

    #[tokio::test]
    async fn empty_window_advances_without_sending() {
        let mut store = store_at("empty.json");

        let source = StubSource(Vec::new());
        let sender = RecordingSender::default();
        let outcome = run_query_cycle(&source, &sender, &mut store, now())
            .await
            .unwrap();

        assert_eq!(outcome, CycleOutcome::NoNewPapers);
        assert!(sender.sent.lock().unwrap().is_empty());
        assert_eq!(
            store.config().last_update.as_deref(),
            Some("202608241900")
        );
        cleanup(&store);
    }

    #[tokio::test]
    async fn delivery_consumes_the_window() {
        let mut store = store_at("delivered.json");

        let source = StubSource(vec![paper(), paper()]);
        let sender = RecordingSender::default();
        let outcome = run_query_cycle(&source, &sender, &mut store, now())
            .await
            .unwrap();

        assert_eq!(outcome, CycleOutcome::Delivered { papers: 2 });
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ada@example.com");
        assert_eq!(sent[0].1, DEFAULT_EMAIL_TITLE);
        assert_eq!(
            store.config().last_update.as_deref(),
            Some("202608241900")
        );
        cleanup(&store);
    }

    #[tokio::test]
    async fn failed_delivery_does_not_consume_the_window() {
        let mut store = store_at("failed.json");

        let source = StubSource(vec![paper()]);
        let result = run_query_cycle(&source, &FailingSender, &mut store, now()).await;

        assert!(result.is_err());
        assert!(store.config().last_update.is_none());
        // The config file was never written either: the next run re-covers
        // the same window.
        assert!(!store.path().exists());
        cleanup(&store);
    }

    #[tokio::test]
    async fn empty_interest_list_fails_before_any_search() {
        let mut path = std::env::temp_dir();
        path.push(format!("arxiv-scan-cycle-{}-no-interests.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let mut store = ConfigStore::load(path).unwrap();
        store.register_personal_details(
            "Ada".to_string(),
            "ada@example.com".to_string(),
            Some(2.0),
            None,
        );

        let source = StubSource(vec![paper()]);
        let sender = RecordingSender::default();
        let result = run_query_cycle(&source, &sender, &mut store, now()).await;

        assert!(result.is_err());
        assert!(sender.sent.lock().unwrap().is_empty());
        assert!(store.config().last_update.is_none());
        cleanup(&store);
    }
}
