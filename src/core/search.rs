use super::analyzer::{Analyzer, Subject};
use super::price::SymbolMatch;
use super::task::Debouncer;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Symbol lookup as a user types. Each keystroke supersedes the previous query, and only
/// the latest query's results are returned.
#[derive(Clone)]
pub struct SearchSession {
    analyzer: Arc<Analyzer>,
    subject: Subject,
    debouncer: Debouncer,
}

impl SearchSession {
    pub fn new(analyzer: Arc<Analyzer>, subject: Subject, delay: Duration) -> Self {
        Self {
            analyzer,
            subject,
            debouncer: Debouncer::new(delay),
        }
    }

    /// `Ok(None)` when a newer query superseded this one. A blank query cancels whatever
    /// is pending and yields no matches without calling upstream.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<SymbolMatch>>> {
        let query = query.trim();
        if query.is_empty() {
            self.debouncer.cancel_pending();
            return Ok(Some(Vec::new()));
        }

        let outcome = self
            .debouncer
            .run(|| self.analyzer.search_symbols(&self.subject, query))
            .await;
        match outcome {
            Some(result) => result.map(Some),
            None => {
                debug!(query, "Search superseded");
                Ok(None)
            }
        }
    }

    pub fn cancel(&self) {
        self.debouncer.cancel_pending();
    }
}
