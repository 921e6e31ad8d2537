//! Currency Converter Engine
//!
//! Two-sided conversion form driven by user events and live rate snapshots.
//!
//! # Features
//!
//! - Bidirectional conversion through the base currency, floored to cents
//! - Ordered event processing on a single engine task
//! - Favorite currencies valued against the current "from" amount
//! - Debounced currency search
//!
//! # Example
//!
//! ```rust,ignore
//! use converter_engine::{EngineConfig, EngineService, FormEvent, MemoryFavoritesStore};
//!
//! let handle = EngineService::spawn(config, catalog, feed.subscribe(), Arc::new(MemoryFavoritesStore::new()));
//! handle.send(FormEvent::FromAmountChanged("10".into())).await?;
//! handle.flush().await?;
//! println!("{}", handle.current_form().to_amount);
//! ```

pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod event;
pub mod favorites;
pub mod search;
pub mod service;
pub mod state;

pub use config::EngineConfig;
pub use conversion::{convert, favorite_valuations, try_convert};
pub use engine::ConversionEngine;
pub use error::{ConversionError, EngineError, EngineResult};
pub use event::{EngineEvent, FavoritesEvent, FormEvent};
pub use favorites::{FavoritesStore, JsonFavoritesStore, MemoryFavoritesStore};
pub use search::CurrencySearch;
pub use service::{EngineHandle, EngineService};
pub use state::{DrivingField, FavoriteValuation, FormState, UiState};
