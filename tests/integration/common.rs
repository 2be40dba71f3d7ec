//! Shared fixtures for integration tests

use async_trait::async_trait;
use market_indices::quote::{SourceQuote, Symbol, TrackedIndex};
use market_indices::source::{FetchResults, QuoteSource, SourceError, SymbolError};
use market_indices::server::{self, AppState};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Source answering from a fixed table; symbols absent from it fail with no data
pub struct TableSource {
    quotes: HashMap<Symbol, SourceQuote>,
    fail_all: bool,
    calls: AtomicUsize,
}

impl TableSource {
    pub fn new(quotes: Vec<(&str, Decimal, Decimal)>) -> Self {
        let quotes = quotes
            .into_iter()
            .map(|(symbol, current, previous)| {
                (
                    Symbol::from(symbol),
                    SourceQuote {
                        current_price: current,
                        previous_close: previous,
                        open: None,
                    },
                )
            })
            .collect();

        Self {
            quotes,
            fail_all: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            quotes: HashMap::new(),
            fail_all: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for TableSource {
    async fn fetch(&self, symbols: &[Symbol]) -> Result<FetchResults, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_all {
            return Err(SourceError::Upstream {
                failed: symbols.len(),
                last: SymbolError::Status(503),
            });
        }

        Ok(symbols
            .iter()
            .map(|symbol| {
                let result = self
                    .quotes
                    .get(symbol)
                    .cloned()
                    .ok_or_else(|| SymbolError::NoData(format!("{} not found", symbol)));
                (symbol.clone(), result)
            })
            .collect())
    }
}

pub fn tracked(pairs: &[(&str, &str)]) -> Vec<TrackedIndex> {
    pairs
        .iter()
        .map(|(name, symbol)| TrackedIndex::new(*name, *symbol))
        .collect()
}

/// A server bound to an ephemeral local port
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start(state: AppState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(server::serve(listener, state, async {
            let _ = rx.await;
        }));

        Self {
            addr,
            shutdown: Some(tx),
            task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await.unwrap().unwrap();
    }
}
