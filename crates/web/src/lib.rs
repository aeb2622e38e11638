use std::{collections::HashMap, env, path::PathBuf, sync::Arc};

use axum::Router;
use engine::{Engine, PlanDefaults, StopGraph};
use geocode::Geocoder;
use gtfs::schedule::Schedule;
use kv::{pairing::PairingStore, KvStore, MemoryStore};
use model::AuState;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::timeout::TimeoutLayer;
use transit::{FeedFetcher, HttpFetcher, TransitData};
use weather::WeatherClient;

pub mod api;
pub mod common;
pub mod provider;
pub mod token;

/// Every handler must finish inside this budget, degraded or not.
pub const REQUEST_BUDGET: std::time::Duration = std::time::Duration::from_secs(5);

/// Server knobs. The admin password is the one permitted environment
/// variable; transit and geocoder keys only ever arrive in tokens or the
/// shared store.
pub struct ServerConfig {
    pub bind_addr: String,
    pub refresh_seconds: u64,
    pub admin_password: Option<String>,
    pub schedule_path: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_owned(),
            refresh_seconds: 60,
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            schedule_path: PathBuf::from("./data/gtfs"),
        }
    }
}

/// Lazily builds one transit data layer per state. A deployment serves a
/// single owner, so this map holds one entry in practice; the caches live
/// for the process.
pub struct TransitRegistry {
    schedule: Arc<Schedule>,
    fetcher: Arc<dyn FeedFetcher>,
    by_state: RwLock<HashMap<AuState, Arc<TransitData>>>,
}

impl TransitRegistry {
    pub fn new(schedule: Arc<Schedule>, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            schedule,
            fetcher,
            by_state: RwLock::new(HashMap::new()),
        }
    }

    pub async fn for_state(&self, state: AuState) -> Arc<TransitData> {
        if let Some(data) = self.by_state.read().await.get(&state) {
            return data.clone();
        }
        let mut map = self.by_state.write().await;
        map.entry(state)
            .or_insert_with(|| {
                Arc::new(TransitData::new(
                    state,
                    self.schedule.clone(),
                    self.fetcher.clone(),
                ))
            })
            .clone()
    }

    pub async fn all(&self) -> Vec<Arc<TransitData>> {
        self.by_state.read().await.values().cloned().collect()
    }

    pub fn schedule(&self) -> &Arc<Schedule> {
        &self.schedule
    }
}

#[derive(Clone)]
pub struct WebState {
    pub engine: Arc<Engine>,
    pub transit: Arc<TransitRegistry>,
    pub weather: Arc<WeatherClient>,
    pub geocoder: Arc<Geocoder>,
    pub store: Arc<dyn KvStore>,
    pub pairing: PairingStore,
    pub config: Arc<ServerConfig>,
}

impl WebState {
    pub fn new(schedule: Arc<Schedule>, config: ServerConfig) -> Self {
        Self::with_parts(
            schedule,
            Arc::new(HttpFetcher::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(WeatherClient::new()),
            config,
        )
    }

    pub fn with_parts(
        schedule: Arc<Schedule>,
        fetcher: Arc<dyn FeedFetcher>,
        store: Arc<dyn KvStore>,
        weather: Arc<WeatherClient>,
        config: ServerConfig,
    ) -> Self {
        // Route-id conventions identify the mode more precisely than the
        // bundle's route types; the graph resolver tries them first.
        let graph = StopGraph::from_schedule(&schedule, |route_id| {
            use gtfs::AuthorityRules as _;
            transit::Authority::for_state(AuState::Vic).mode_for_route(route_id)
        });
        let engine = Arc::new(Engine::new(graph, PlanDefaults::default()));
        Self {
            engine,
            transit: Arc::new(TransitRegistry::new(schedule, fetcher)),
            weather,
            geocoder: Arc::new(Geocoder::new(store.clone())),
            pairing: PairingStore::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .nest("/api", api::routes(state))
        .layer(TimeoutLayer::new(REQUEST_BUDGET))
}

pub async fn start_web_server(state: WebState) -> std::io::Result<()> {
    let bind_addr = state.config.bind_addr.clone();
    let routes = router(state);
    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("listening on {bind_addr}");
    axum::serve(listener, routes.into_make_service()).await?;
    Ok(())
}
