#![allow(dead_code)]

use std::fs;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::Semaphore;

use capedeck::catalog::error::ApiError;
use capedeck::catalog::{BrowseRequest, CatalogClient, CatalogItem, FixtureCatalog, Page};
use capedeck::{CatalogScreen, Config, Result};

/// A backend call as the catalog saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Browse(BrowseRequest),
    Owned(String),
    Lookup(Vec<String>),
}

/// Catalog double that records every call and can hold calls in flight
/// until the test releases them.
pub struct ScriptedCatalog {
    inner: FixtureCatalog,
    calls: Mutex<Vec<Call>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedCatalog {
    pub fn new(inner: FixtureCatalog) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    /// Catalog of `count` capes `cape0..`, cape `i` used `i` times
    pub fn with_capes(count: usize) -> Self {
        Self::new(
            FixtureCatalog::new(
                (0..count)
                    .map(|i| {
                        CatalogItem::new(format!("cape{i}"))
                            .with_usage(i as u64)
                            .with_first_seen_by(format!("player{}", i % 3))
                    })
                    .collect(),
            )
            .with_owned("steve", &["cape0", "cape1", "cape2"]),
        )
    }

    pub fn inner(&self) -> &FixtureCatalog {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn browse_requests(&self) -> Vec<BrowseRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Browse(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn fail_next(&self, error: ApiError) {
        self.inner.fail_next(error);
    }

    /// Hold every following call until [`release`](Self::release) or
    /// [`open`](Self::open)
    pub fn hold(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let one held call through
    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Stop holding calls, releasing any that wait
    pub fn open(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    async fn pass_gate(&self, call: Call) {
        self.calls.lock().push(call);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate
            && let Ok(permit) = gate.acquire().await
        {
            permit.forget();
        }
    }
}

impl CatalogClient for ScriptedCatalog {
    async fn browse(&self, request: &BrowseRequest) -> Result<Page> {
        self.pass_gate(Call::Browse(request.clone())).await;
        self.inner.browse(request).await
    }

    async fn list_owned(&self, identity: &str) -> Result<Vec<CatalogItem>> {
        self.pass_gate(Call::Owned(identity.to_string())).await;
        self.inner.list_owned(identity).await
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<CatalogItem>> {
        self.pass_gate(Call::Lookup(ids.to_vec())).await;
        self.inner.fetch_by_ids(ids).await
    }
}

pub fn screen(catalog: ScriptedCatalog, page_size: u32) -> (Arc<ScriptedCatalog>, CatalogScreen<ScriptedCatalog>) {
    let catalog = Arc::new(catalog);
    let config = Config {
        page_size,
        ..Config::default()
    };
    let screen = CatalogScreen::new(catalog.clone(), &config);
    (catalog, screen)
}

pub fn ids(items: &[CatalogItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

pub fn favorites(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

/// Yield until `catalog` has seen `count` calls
pub async fn wait_for_calls(catalog: &ScriptedCatalog, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while catalog.call_count() < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("catalog call never arrived");
}

/// Runs the `capedeck` binary in an isolated temp directory
pub struct DeckTest {
    pub temp_dir: TempDir,
}

impl DeckTest {
    pub fn new() -> Self {
        DeckTest {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_capedeck"))
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("CAPEDECK_IDENTITY")
            .env_remove("CAPEDECK_PAGE_SIZE")
            .env("RUST_LOG", "off")
            .output()
            .expect("Failed to execute capedeck")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    /// Write `.capedeck/catalog.json`
    pub fn write_catalog(&self, content: &str) {
        let dir = self.temp_dir.path().join(".capedeck");
        fs::create_dir_all(&dir).expect("Failed to create .capedeck directory");
        fs::write(dir.join("catalog.json"), content).expect("Failed to write catalog");
    }

    /// Write `.capedeck/config.yaml`
    pub fn write_config(&self, content: &str) {
        let dir = self.temp_dir.path().join(".capedeck");
        fs::create_dir_all(&dir).expect("Failed to create .capedeck directory");
        fs::write(dir.join("config.yaml"), content).expect("Failed to write config");
    }
}

/// Catalog document with `count` capes and one owner
pub fn catalog_json(count: usize) -> String {
    let items: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "id": format!("cape{i}"),
                "usageCount": i,
                "firstSeenBy": format!("player{}", i % 3),
                "isElytraVariant": i % 5 == 0,
            })
        })
        .collect();
    serde_json::json!({
        "items": items,
        "owned": { "steve": ["cape0", "cape1", "cape2"] },
    })
    .to_string()
}
