//! Debounced currency search for picker UIs.

use converter_common::{Currency, CurrencyCatalog};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Filters the catalog as the user types.
///
/// A query is evaluated only once it has stayed unchanged for the debounce
/// window, and only if it differs from the last evaluated query after
/// trimming and lower-casing.
pub struct CurrencySearch {
    query_tx: watch::Sender<String>,
    results_rx: watch::Receiver<Vec<Currency>>,
    task: JoinHandle<()>,
}

impl CurrencySearch {
    /// Start the search task. Results initially hold the whole catalog.
    pub fn spawn(catalog: CurrencyCatalog, debounce: Duration) -> Self {
        let (query_tx, query_rx) = watch::channel(String::new());
        let (results_tx, results_rx) = watch::channel(catalog.currencies().to_vec());

        let task = tokio::spawn(run_search(catalog, debounce, query_rx, results_tx));

        Self {
            query_tx,
            results_rx,
            task,
        }
    }

    /// Submit the current text of the search box.
    pub fn set_query(&self, query: impl Into<String>) {
        self.query_tx.send_replace(query.into());
    }

    /// Receiver of filtered results.
    pub fn results(&self) -> watch::Receiver<Vec<Currency>> {
        self.results_rx.clone()
    }
}

impl Drop for CurrencySearch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_search(
    catalog: CurrencyCatalog,
    debounce: Duration,
    mut query_rx: watch::Receiver<String>,
    results_tx: watch::Sender<Vec<Currency>>,
) {
    let mut last_query = String::new();

    while query_rx.changed().await.is_ok() {
        // Restart the window on every keystroke.
        loop {
            tokio::select! {
                _ = tokio::time::sleep(debounce) => break,
                changed = query_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let query = query_rx.borrow_and_update().trim().to_lowercase();
        if query == last_query {
            continue;
        }

        let results = catalog.search(&query);
        debug!(query = %query, matches = results.len(), "Currency search");
        results_tx.send_replace(results);
        last_query = query;
    }
}
