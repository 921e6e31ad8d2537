//! Engine service: runs the [`ConversionEngine`] on its own task.
//!
//! Events are consumed from a single queue in arrival order and each one is
//! fully applied, derived amounts and favorites included, before the next is
//! taken. Rate snapshots and favorites lists are read from watch channels and
//! always reflect the latest delivered value.

use std::sync::Arc;

use converter_common::CurrencyCatalog;
use converter_rates::SnapshotReceiver;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::engine::ConversionEngine;
use crate::error::{EngineError, EngineResult};
use crate::event::{EngineEvent, FavoritesEvent, FormEvent};
use crate::favorites::FavoritesStore;
use crate::state::{FormState, UiState};

enum Command {
    Event(EngineEvent),
    /// Answered once every command queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Client side of a running engine.
pub struct EngineHandle {
    commands_tx: mpsc::Sender<Command>,
    form_rx: watch::Receiver<FormState>,
    ui_rx: watch::Receiver<UiState>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Queue an event. Fails only if the engine has stopped.
    pub async fn send(&self, event: impl Into<EngineEvent>) -> EngineResult<()> {
        self.commands_tx
            .send(Command::Event(event.into()))
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Wait until every event sent so far has been applied.
    pub async fn flush(&self) -> EngineResult<()> {
        let (tx, rx) = oneshot::channel();
        self.commands_tx
            .send(Command::Flush(tx))
            .await
            .map_err(|_| EngineError::Stopped)?;
        rx.await.map_err(|_| EngineError::Stopped)
    }

    /// Live form state.
    pub fn form_state(&self) -> watch::Receiver<FormState> {
        self.form_rx.clone()
    }

    /// Live UI state.
    pub fn ui_state(&self) -> watch::Receiver<UiState> {
        self.ui_rx.clone()
    }

    /// Current form state.
    pub fn current_form(&self) -> FormState {
        self.form_rx.borrow().clone()
    }

    /// Current UI state.
    pub fn current_ui(&self) -> UiState {
        self.ui_rx.borrow().clone()
    }

    /// Stop the engine and wait for its task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

/// The task owning the engine.
pub struct EngineService {
    engine: ConversionEngine,
    config: EngineConfig,
    commands_rx: mpsc::Receiver<Command>,
    rates_rx: SnapshotReceiver,
    favorites_rx: watch::Receiver<Vec<String>>,
    favorites_tx: mpsc::UnboundedSender<FavoritesEvent>,
    form_tx: watch::Sender<FormState>,
    ui_tx: watch::Sender<UiState>,
    shutdown_rx: mpsc::Receiver<()>,
    seeded: bool,
}

impl EngineService {
    /// Start the engine on a new task.
    pub fn spawn(
        config: EngineConfig,
        catalog: CurrencyCatalog,
        rates_rx: SnapshotReceiver,
        store: Arc<dyn FavoritesStore>,
    ) -> EngineHandle {
        let (commands_tx, commands_rx) = mpsc::channel(config.event_buffer.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (form_tx, form_rx) = watch::channel(FormState::default());
        let (ui_tx, ui_rx) = watch::channel(UiState::Loading);
        let favorites_rx = store.subscribe();
        let favorites_tx = spawn_favorites_writer(store);

        let service = Self {
            engine: ConversionEngine::new(catalog),
            config,
            commands_rx,
            rates_rx,
            favorites_rx,
            favorites_tx,
            form_tx,
            ui_tx,
            shutdown_rx,
            seeded: false,
        };

        let task = tokio::spawn(service.run());

        EngineHandle {
            commands_tx,
            form_rx,
            ui_rx,
            shutdown_tx,
            task,
        }
    }

    #[instrument(skip(self), name = "engine")]
    async fn run(mut self) {
        info!("Conversion engine started");

        let codes = self.favorites_rx.borrow_and_update().clone();
        self.engine.set_favorites(codes);
        let rates = self.rates_rx.borrow_and_update().clone();
        if let Some(rates) = rates {
            self.engine.set_rates(rates);
        }
        self.seed_defaults();
        self.publish();

        let mut rates_open = true;
        let mut favorites_open = true;

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.recv() => break,

                changed = self.rates_rx.changed(), if rates_open => {
                    if changed.is_err() {
                        debug!("Rate feed closed, keeping last snapshot");
                        rates_open = false;
                        continue;
                    }
                    let rates = self.rates_rx.borrow_and_update().clone();
                    if let Some(rates) = rates {
                        debug!(rates = rates.len(), "New rate snapshot");
                        self.engine.set_rates(rates);
                        self.seed_defaults();
                    }
                }

                changed = self.favorites_rx.changed(), if favorites_open => {
                    if changed.is_err() {
                        favorites_open = false;
                        continue;
                    }
                    let codes = self.favorites_rx.borrow_and_update().clone();
                    self.engine.set_favorites(codes);
                }

                command = self.commands_rx.recv() => match command {
                    Some(Command::Event(event)) => self.handle_event(event),
                    Some(Command::Flush(done)) => {
                        let _ = done.send(());
                    }
                    None => break,
                },
            }

            self.publish();
        }

        info!("Conversion engine stopped");
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Form(event) => {
                self.engine.apply(event);
            }
            EngineEvent::Favorites(event) => {
                if self.favorites_tx.send(event).is_err() {
                    warn!("Favorites writer stopped, dropping favorites change");
                }
            }
        }
    }

    /// Seed the configured currency pair once the first rates arrive, unless
    /// the form already has currencies.
    fn seed_defaults(&mut self) {
        if self.seeded || !self.engine.ui().is_ready() {
            return;
        }
        self.seeded = true;

        let form = self.engine.form();
        if !form.from_currency.is_empty() || !form.to_currency.is_empty() {
            return;
        }

        let catalog = self.engine.catalog();
        let from_currency = catalog.lookup(&self.config.default_from).unwrap_or_default();
        let to_currency = catalog.lookup(&self.config.default_to).unwrap_or_default();
        self.engine.apply(FormEvent::InitialDataLoaded {
            from_currency,
            to_currency,
        });
    }

    fn publish(&self) {
        self.form_tx.send_if_modified(|form| {
            if form != self.engine.form() {
                *form = self.engine.form().clone();
                true
            } else {
                false
            }
        });
        self.ui_tx.send_if_modified(|ui| {
            if ui != self.engine.ui() {
                *ui = self.engine.ui().clone();
                true
            } else {
                false
            }
        });
    }
}

/// Apply favorites changes to the store in order without blocking the engine.
fn spawn_favorites_writer(store: Arc<dyn FavoritesStore>) -> mpsc::UnboundedSender<FavoritesEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<FavoritesEvent>();

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let result = match &event {
                FavoritesEvent::FavoriteAdded(currency) => store.insert(currency.code()).await,
                FavoritesEvent::FavoriteRemoved(currency) => store.delete(currency.code()).await,
            };
            if let Err(e) = result {
                warn!(event = ?event, error = %e, "Favorites store update failed");
            }
        }
    });

    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::MemoryFavoritesStore;
    use converter_common::{Currency, RateSnapshot};
    use converter_rates::RateFeed;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn catalog() -> CurrencyCatalog {
        CurrencyCatalog::supported()
    }

    fn currency(code: &str) -> Currency {
        catalog().lookup(code).unwrap()
    }

    fn snapshot(pairs: &[(&str, Decimal)]) -> RateSnapshot {
        let catalog = catalog();
        RateSnapshot::from_rates(
            catalog.lookup("USD").unwrap(),
            pairs.iter().map(|(c, r)| (*c, *r)),
            &catalog,
            None,
        )
    }

    fn start(feed: &RateFeed, store: Arc<MemoryFavoritesStore>) -> EngineHandle {
        EngineService::spawn(EngineConfig::default(), catalog(), feed.subscribe(), store)
    }

    async fn wait_ui<F>(handle: &EngineHandle, predicate: F) -> UiState
    where
        F: FnMut(&UiState) -> bool,
    {
        let mut rx = handle.ui_state();
        let ui = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for ui state")
            .expect("engine stopped");
        let result = ui.clone();
        result
    }

    #[tokio::test]
    async fn test_loading_until_first_snapshot_then_seeded() {
        let feed = RateFeed::new(catalog());
        let handle = start(&feed, Arc::new(MemoryFavoritesStore::new()));

        handle.flush().await.unwrap();
        assert_eq!(handle.current_ui(), UiState::Loading);
        assert!(handle.current_form().from_currency.is_empty());

        feed.publish_snapshot(snapshot(&[("PKR", dec!(278.5))]));
        wait_ui(&handle, |ui| ui.is_ready()).await;
        handle.flush().await.unwrap();

        let form = handle.current_form();
        assert_eq!(form.from_currency.code, "USD");
        assert_eq!(form.to_currency.code, "PKR");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_events_applied_in_order() {
        let feed = RateFeed::new(catalog());
        feed.publish_snapshot(snapshot(&[("PKR", dec!(278.5)), ("EUR", dec!(0.9))]));
        let handle = start(&feed, Arc::new(MemoryFavoritesStore::new()));

        handle.send(FormEvent::FromAmountChanged("10".into())).await.unwrap();
        handle.send(FormEvent::ToCurrencyChanged(currency("EUR"))).await.unwrap();
        handle.flush().await.unwrap();

        let form = handle.current_form();
        assert_eq!(form.to_currency.code, "EUR");
        assert_eq!(form.to_amount, "9.0");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_last_amount_edit_wins() {
        let feed = RateFeed::new(catalog());
        feed.publish_snapshot(snapshot(&[("PKR", dec!(278.5))]));
        let handle = start(&feed, Arc::new(MemoryFavoritesStore::new()));

        for text in ["1", "12", "12.", "2"] {
            handle.send(FormEvent::FromAmountChanged(text.into())).await.unwrap();
        }
        handle.flush().await.unwrap();

        let form = handle.current_form();
        assert_eq!(form.from_amount, "2");
        assert_eq!(form.to_amount, "557.0");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_favorites_forwarded_and_valued() {
        let feed = RateFeed::new(catalog());
        feed.publish_snapshot(snapshot(&[("PKR", dec!(278.5)), ("EUR", dec!(2.0))]));
        let store = Arc::new(MemoryFavoritesStore::new());
        let handle = start(&feed, store.clone());

        handle.send(FormEvent::FromAmountChanged("5".into())).await.unwrap();
        handle
            .send(FavoritesEvent::FavoriteAdded(currency("EUR")))
            .await
            .unwrap();

        let ui = wait_ui(&handle, |ui| !ui.favorites().is_empty()).await;
        let favorite = &ui.favorites()[0];
        assert_eq!(favorite.favorite_currency.code, "EUR");
        assert_eq!(favorite.exchange_rate, dec!(2.0));
        assert_eq!(favorite.result_amount, dec!(10.0));
        assert_eq!(store.list_all(), vec!["EUR"]);

        handle
            .send(FavoritesEvent::FavoriteRemoved(currency("EUR")))
            .await
            .unwrap();
        wait_ui(&handle, |ui| ui.favorites().is_empty()).await;
        assert!(store.list_all().is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_snapshot_refresh_keeps_ready_and_recomputes() {
        let feed = RateFeed::new(catalog());
        feed.publish_snapshot(snapshot(&[("PKR", dec!(278.5))]));
        let handle = start(&feed, Arc::new(MemoryFavoritesStore::new()));

        handle.send(FormEvent::FromAmountChanged("2".into())).await.unwrap();
        handle.flush().await.unwrap();
        assert_eq!(handle.current_form().to_amount, "557.0");

        feed.publish_snapshot(snapshot(&[("PKR", dec!(280))]));
        let mut form_rx = handle.form_state();
        tokio::time::timeout(
            Duration::from_secs(2),
            form_rx.wait_for(|form| form.to_amount == "560.0"),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(handle.current_ui().is_ready());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_existing_favorites_loaded_at_start() {
        let feed = RateFeed::new(catalog());
        feed.publish_snapshot(snapshot(&[("PKR", dec!(278.5)), ("EUR", dec!(0.9))]));
        let store = Arc::new(MemoryFavoritesStore::with_codes(vec!["EUR".into()]));

        let handle = start(&feed, store);
        handle.flush().await.unwrap();

        let ui = handle.current_ui();
        assert_eq!(ui.favorites().len(), 1);
        assert_eq!(ui.favorites()[0].exchange_rate, dec!(0.9));

        handle.shutdown().await;
    }

    /// Store whose writes always fail.
    struct BrokenStore {
        codes: watch::Sender<Vec<String>>,
        attempts: tokio::sync::Notify,
    }

    impl BrokenStore {
        fn new() -> Self {
            Self {
                codes: watch::channel(Vec::new()).0,
                attempts: tokio::sync::Notify::new(),
            }
        }

        fn fail(&self) -> EngineResult<()> {
            self.attempts.notify_one();
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[async_trait::async_trait]
    impl FavoritesStore for BrokenStore {
        async fn insert(&self, _code: &str) -> EngineResult<()> {
            self.fail()
        }

        async fn delete(&self, _code: &str) -> EngineResult<()> {
            self.fail()
        }

        fn list_all(&self) -> Vec<String> {
            self.codes.borrow().clone()
        }

        fn subscribe(&self) -> watch::Receiver<Vec<String>> {
            self.codes.subscribe()
        }
    }

    #[tokio::test]
    async fn test_store_failure_leaves_engine_running() {
        let feed = RateFeed::new(catalog());
        feed.publish_snapshot(snapshot(&[("PKR", dec!(278.5)), ("EUR", dec!(2.0))]));
        let store = Arc::new(BrokenStore::new());
        let handle = EngineService::spawn(
            EngineConfig::default(),
            catalog(),
            feed.subscribe(),
            store.clone(),
        );

        handle.send(FormEvent::FromAmountChanged("5".into())).await.unwrap();
        handle.flush().await.unwrap();
        let form_before = handle.current_form();
        let ui_before = handle.current_ui();

        handle
            .send(FavoritesEvent::FavoriteAdded(currency("EUR")))
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(2), store.attempts.notified())
            .await
            .expect("store was never written to");
        handle.flush().await.unwrap();

        assert_eq!(handle.current_form(), form_before);
        assert_eq!(handle.current_ui(), ui_before);
        assert!(handle.current_ui().favorites().is_empty());

        handle.send(FormEvent::FromAmountChanged("2".into())).await.unwrap();
        handle.flush().await.unwrap();
        assert_eq!(handle.current_form().to_amount, "557.0");

        handle
            .send(FavoritesEvent::FavoriteRemoved(currency("EUR")))
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(2), store.attempts.notified())
            .await
            .expect("store was never written to");
        handle.flush().await.unwrap();
        assert_eq!(handle.current_form().from_amount, "2");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let feed = RateFeed::new(catalog());
        let handle = start(&feed, Arc::new(MemoryFavoritesStore::new()));
        let commands_tx = handle.commands_tx.clone();

        handle.shutdown().await;

        let result = commands_tx.send(Command::Event(FormEvent::FromAmountChanged("1".into()).into())).await;
        assert!(result.is_err());
    }
}
