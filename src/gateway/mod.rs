//! Operation Gateway - asynchronous front of the store
//!
//! The store lives on a dedicated worker thread. Callers send a [`Request`]
//! over a bounded channel and await the [`Response`] on a oneshot reply.
//! Requests are served one at a time in arrival order.
//!
//! The gateway never hands an error to its caller: a failed request is logged
//! and answered with the neutral value of its response (an empty list or
//! `None`).

mod request;

pub use request::{Category, Request, Response, WriteAck};

use crate::fields::{Fields, Row};
use crate::record::{AnalyticsEvent, FeatureFlag, Preferences, PreferencesUpdate};
use crate::storage::{DbStats, Snapshot, SqliteStore};
use crate::Result;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// Pending requests the channel holds before senders wait
const QUEUE_SIZE: usize = 64;

enum Command {
    Run {
        request: Request,
        respond: oneshot::Sender<Response>,
    },
    Shutdown {
        respond: oneshot::Sender<()>,
    },
}

/// Handle to the store worker
pub struct Gateway {
    tx: mpsc::Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl Gateway {
    /// Move the store onto its worker thread.
    pub fn new(store: SqliteStore) -> Result<Self> {
        if store.is_closed() {
            warn!("Store is already closed; every request will get a neutral reply");
        }
        match store.path() {
            Some(path) => debug!("Serving {}", path.display()),
            None => debug!("Serving an in-memory store"),
        }

        let (tx, rx) = mpsc::channel(QUEUE_SIZE);
        let worker = std::thread::Builder::new()
            .name("organizio-store".to_string())
            .spawn(move || worker_loop(store, rx))?;

        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// Serve one request. Always resolves.
    pub async fn call(&self, request: Request) -> Response {
        let fallback = request.neutral();
        let name = request.name();
        let (respond, rx) = oneshot::channel();

        if self.tx.send(Command::Run { request, respond }).await.is_err() {
            error!("{}: store worker is not running", name);
            return fallback;
        }

        match rx.await {
            Ok(response) => response,
            Err(_) => {
                error!("{}: store worker dropped the request", name);
                fallback
            }
        }
    }

    /// Every stored record of a category
    pub async fn get_records(&self, category: Category) -> Vec<Row> {
        match self.call(Request::GetRecords(category)).await {
            Response::Records(rows) => rows,
            _ => Vec::new(),
        }
    }

    /// Insert a record; the new id, or `None` if the store refused it
    pub async fn save_record(&self, category: Category, fields: Fields) -> Option<i64> {
        match self.call(Request::SaveRecord(category, fields)).await {
            Response::Id(id) => id,
            _ => None,
        }
    }

    /// Change some fields of one record
    pub async fn update_record(&self, category: Category, id: i64, fields: Fields) -> Option<WriteAck> {
        self.ack(Request::UpdateRecord(category, id, fields)).await
    }

    /// Dependent password rows go with an account
    pub async fn delete_record(&self, category: Category, id: i64) -> Option<WriteAck> {
        self.ack(Request::DeleteRecord(category, id)).await
    }

    /// `None` if the singleton row is missing
    pub async fn get_preferences(&self) -> Option<Preferences> {
        match self.call(Request::GetPreferences).await {
            Response::Preferences(prefs) => prefs,
            _ => None,
        }
    }

    /// Fields left `None` in the update keep their stored value.
    pub async fn save_preferences(&self, update: PreferencesUpdate) -> Option<WriteAck> {
        self.ack(Request::SavePreferences(update)).await
    }

    /// The whole flag catalog
    pub async fn get_feature_flags(&self) -> Vec<FeatureFlag> {
        match self.call(Request::GetFeatureFlags).await {
            Response::FeatureFlags(flags) => flags,
            _ => Vec::new(),
        }
    }

    /// Toggle a flag by name. An unknown name acks zero changes.
    pub async fn update_feature_flag(&self, name: &str, enabled: bool) -> Option<WriteAck> {
        self.ack(Request::UpdateFeatureFlag {
            name: name.to_string(),
            enabled,
        })
        .await
    }

    /// Events, most recent first
    pub async fn get_analytics(&self) -> Vec<AnalyticsEvent> {
        match self.call(Request::GetAnalytics).await {
            Response::Analytics(events) => events,
            _ => Vec::new(),
        }
    }

    /// `None` both on failure and when the user has not opted in
    pub async fn save_analytics_event(&self, event_type: &str, data: serde_json::Value) -> Option<WriteAck> {
        self.ack(Request::SaveAnalyticsEvent {
            event_type: event_type.to_string(),
            data,
        })
        .await
    }

    /// Drop the whole analytics log
    pub async fn clear_analytics(&self) -> Option<WriteAck> {
        self.ack(Request::ClearAnalytics).await
    }

    /// Everything in one snapshot
    pub async fn export_data(&self) -> Option<Snapshot> {
        match self.call(Request::ExportData).await {
            Response::Snapshot(snapshot) => snapshot,
            _ => None,
        }
    }

    /// Row counts per table
    pub async fn get_stats(&self) -> Option<DbStats> {
        match self.call(Request::GetStats).await {
            Response::Stats(stats) => stats,
            _ => None,
        }
    }

    async fn ack(&self, request: Request) -> Option<WriteAck> {
        match self.call(request).await {
            Response::Ack(ack) => ack,
            _ => None,
        }
    }

    /// Stop the worker and close the store. Requests queued ahead of the
    /// shutdown are still served.
    pub async fn shutdown(mut self) {
        let (respond, rx) = oneshot::channel();
        if self.tx.send(Command::Shutdown { respond }).await.is_ok() {
            let _ = rx.await;
        }

        // The thread is already past its loop; join it off the runtime
        if let Some(worker) = self.worker.take() {
            match tokio::task::spawn_blocking(move || worker.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => error!("Store worker panicked"),
                Err(e) => error!("Failed to join store worker: {}", e),
            }
        }
    }
}

fn worker_loop(mut store: SqliteStore, mut rx: mpsc::Receiver<Command>) {
    debug!("Store worker started");

    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::Run { request, respond } => {
                let fallback = request.neutral();
                let name = request.name();
                let response = match request.execute(&store) {
                    Ok(response) => response,
                    Err(e) => {
                        error!("{} failed: {}", name, e);
                        fallback
                    }
                };
                if respond.send(response).is_err() {
                    warn!("{}: caller went away before the reply", name);
                }
            }
            Command::Shutdown { respond } => {
                close_store(&mut store);
                let _ = respond.send(());
                return;
            }
        }
    }

    // Every handle dropped without an explicit shutdown
    close_store(&mut store);
}

fn close_store(store: &mut SqliteStore) {
    match store.close() {
        Ok(()) => debug!("Store worker stopped"),
        Err(e) => error!("Failed to close store: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Theme;
    use serde_json::json;

    fn gateway() -> Gateway {
        Gateway::new(SqliteStore::open_in_memory().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_record_lifecycle() {
        let gateway = gateway();

        let fields = Fields::new().set("service", "Gmail").set("email", "a@b.com");
        let id = gateway.save_record(Category::Email, fields).await.unwrap();

        let rows = gateway.get_records(Category::Email).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("email"), Some("a@b.com"));

        let ack = gateway
            .update_record(Category::Email, id, Fields::new().set("importance", 5))
            .await;
        assert_eq!(ack, Some(WriteAck::new(1)));

        let ack = gateway.delete_record(Category::Email, id + 1).await;
        assert_eq!(ack, Some(WriteAck::new(0)));
        let ack = gateway.delete_record(Category::Email, id).await;
        assert_eq!(ack, Some(WriteAck::new(1)));
        assert!(gateway.get_records(Category::Email).await.is_empty());

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_failures_are_neutral() {
        let gateway = gateway();

        // Missing required column
        let id = gateway
            .save_record(Category::Account, Fields::new().set("service", "Bank"))
            .await;
        assert_eq!(id, None);

        // Unknown column
        let ack = gateway
            .update_record(Category::Account, 1, Fields::new().set("password", "hunter2"))
            .await;
        assert_eq!(ack, None);

        // The worker keeps serving after a failure
        assert_eq!(gateway.get_feature_flags().await.len(), 10);
        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_closed_store_yields_neutral_results() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.close().unwrap();
        let gateway = Gateway::new(store).unwrap();

        assert!(gateway.get_records(Category::Account).await.is_empty());
        assert!(gateway.get_preferences().await.is_none());
        assert!(gateway.get_analytics().await.is_empty());
        assert!(gateway.clear_analytics().await.is_none());
        assert!(gateway.export_data().await.is_none());
        assert_eq!(gateway.call(Request::GetFeatureFlags).await.into_json(), json!([]));
    }

    #[tokio::test]
    async fn test_preferences_and_analytics_gate() {
        let gateway = gateway();

        assert_eq!(gateway.save_analytics_event("app_start", json!({})).await, None);

        let update = PreferencesUpdate::analytics(true);
        assert_eq!(gateway.save_preferences(update).await, Some(WriteAck::new(1)));
        assert_eq!(
            gateway.save_analytics_event("app_start", json!({"v": 1})).await,
            Some(WriteAck::new(1))
        );

        let prefs = gateway.get_preferences().await.unwrap();
        assert!(prefs.analytics_enabled);
        assert_eq!(gateway.get_analytics().await.len(), 1);
        assert_eq!(gateway.clear_analytics().await, Some(WriteAck::new(1)));

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_named_requests_round_trip() {
        let gateway = gateway();

        let save = Request::from_named(
            "save-privacy-setting",
            vec![json!({"category": "browser", "setting_name": "Do Not Track", "importance": 3})],
        )
        .unwrap();
        assert_eq!(gateway.call(save).await.into_json(), json!(1));

        let toggle =
            Request::from_named("update-feature-flag", vec![json!("nope"), json!(true)]).unwrap();
        assert_eq!(gateway.call(toggle).await.into_json(), json!({"changes": 0}));

        let list = Request::from_named("get-privacy-settings", vec![]).unwrap();
        let rows = gateway.call(list).await.into_json();
        assert_eq!(rows[0]["setting_name"], json!("Do Not Track"));

        let snapshot = gateway.export_data().await.unwrap();
        assert_eq!(snapshot.privacy_settings.len(), 1);
        assert_eq!(gateway.get_stats().await.unwrap().privacy_settings, 1);

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_partial_preferences_payloads() {
        let gateway = gateway();
        let save = |payload| Request::from_named("save-preferences", vec![payload]).unwrap();

        let both = save(json!({"theme": "dark", "analytics_enabled": true}));
        assert_eq!(gateway.call(both).await.into_json(), json!({"changes": 1}));

        gateway.call(save(json!({"theme": "light"}))).await;
        let prefs = gateway.get_preferences().await.unwrap();
        assert_eq!(prefs.theme, Theme::Light);
        assert!(prefs.analytics_enabled);

        gateway.call(save(json!({"theme": "dark"}))).await;
        gateway.call(save(json!({"analytics_enabled": 0}))).await;
        let prefs = gateway.get_preferences().await.unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(!prefs.analytics_enabled);

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_numeric_values_in_free_text_columns() {
        let gateway = gateway();

        let save = Request::from_named(
            "save-account",
            vec![json!({"service": "Bank", "username": 12345})],
        )
        .unwrap();
        assert_eq!(gateway.call(save).await.into_json(), json!(1));

        let save = Request::from_named(
            "save-social-account",
            vec![json!({"platform": "Mastodon", "username": "me", "post_frequency": 7})],
        )
        .unwrap();
        assert_eq!(gateway.call(save).await.into_json(), json!(1));

        let accounts = gateway.get_records(Category::Account).await;
        assert_eq!(accounts[0].get_str("username"), Some("12345"));
        let social = gateway.get_records(Category::SocialAccount).await;
        assert_eq!(social[0].get_str("post_frequency"), Some("7"));

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_flushes_and_releases_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("organizio.db");
        let gateway = Gateway::new(SqliteStore::open(&path).unwrap()).unwrap();

        let fields = Fields::new().set("service", "Gmail").set("email", "a@b.com");
        assert!(gateway.save_record(Category::Email, fields).await.is_some());
        tokio::time::timeout(std::time::Duration::from_secs(5), gateway.shutdown())
            .await
            .unwrap();

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count(crate::relation::Relation::Emails).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers() {
        let gateway = std::sync::Arc::new(gateway());

        let mut handles = Vec::new();
        for i in 0..20 {
            let gateway = gateway.clone();
            handles.push(tokio::spawn(async move {
                let fields = Fields::new()
                    .set("platform", "Mastodon")
                    .set("username", format!("user{}", i));
                gateway.save_record(Category::SocialAccount, fields).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        assert_eq!(gateway.get_records(Category::SocialAccount).await.len(), 20);
    }
}
