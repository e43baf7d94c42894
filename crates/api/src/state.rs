use std::sync::Arc;

use courier_core::clock::ReferenceZone;
use courier_events::delivery::{
    EmailConfig, EmailSender, HttpMessageSender, HttpPushSender, MessageSender, MessagingConfig,
    PushConfig, PushSender, SmtpEmailSender,
};
use courier_events::{
    Dispatcher, EngineConfig, EventBus, GlobalSettingsCache, PgStore, ReportEngine, WeeklyDigest,
    WebhookVerifier,
};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: courier_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Publish/subscribe hub for dispatch outcomes and accepted webhooks.
    pub event_bus: Arc<EventBus>,
    /// Cached global settings; refreshed by the admin endpoint on update.
    pub settings_cache: Arc<GlobalSettingsCache>,
    pub dispatcher: Arc<Dispatcher>,
    pub report_engine: Arc<ReportEngine>,
    pub digest: Arc<WeeklyDigest>,
    pub verifier: Arc<WebhookVerifier>,
    /// Zone report schedules are computed in.
    pub zone: ReferenceZone,
}

impl AppState {
    /// Wire the engine over `pool` with whichever transports are available.
    pub fn new(
        pool: courier_db::DbPool,
        config: ServerConfig,
        engine: &EngineConfig,
        transports: Transports,
    ) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        let event_bus = Arc::new(EventBus::default());
        let settings_cache = Arc::new(GlobalSettingsCache::new(engine.global_settings_ttl));
        let zone = engine.reference_zone;

        let mut dispatcher = Dispatcher::new(
            store.clone(),
            Arc::clone(&settings_cache),
            zone,
            Arc::clone(&event_bus),
        );
        if let Some(push) = &transports.push {
            dispatcher = dispatcher.with_push(Arc::clone(push));
        }
        if let Some(email) = &transports.email {
            dispatcher = dispatcher.with_email(Arc::clone(email));
        }
        let dispatcher = Arc::new(dispatcher);

        let mut report_engine = ReportEngine::new(store.clone(), zone, engine.report_item_timeout)
            .with_claims(engine.report_claim_enabled);
        if let Some(email) = transports.email {
            report_engine = report_engine.with_email(email);
        }
        if let Some(messaging) = transports.messaging {
            report_engine = report_engine.with_messaging(messaging);
        }

        let digest = WeeklyDigest::new(
            Arc::clone(&dispatcher),
            store.clone(),
            store.clone(),
            Arc::clone(&settings_cache),
            zone,
        );
        let verifier = WebhookVerifier::new(store, engine.verification_mode);

        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            settings_cache,
            dispatcher,
            report_engine: Arc::new(report_engine),
            digest: Arc::new(digest),
            verifier: Arc::new(verifier),
            zone,
        }
    }
}

/// Outbound channel transports. A `None` channel is unavailable: dispatch
/// treats it as not attempted and reports cannot use it.
#[derive(Clone, Default)]
pub struct Transports {
    pub push: Option<Arc<dyn PushSender>>,
    pub email: Option<Arc<dyn EmailSender>>,
    pub messaging: Option<Arc<dyn MessageSender>>,
}

impl Transports {
    /// Build every transport whose environment is configured.
    pub fn from_env() -> Self {
        let push = PushConfig::from_env().and_then(|config| match HttpPushSender::new(config) {
            Ok(sender) => Some(Arc::new(sender) as Arc<dyn PushSender>),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build push transport");
                None
            }
        });

        let email = EmailConfig::from_env().and_then(|config| match SmtpEmailSender::new(config) {
            Ok(sender) => Some(Arc::new(sender) as Arc<dyn EmailSender>),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build email transport");
                None
            }
        });

        let messaging = MessagingConfig::from_env()
            .map(|config| Arc::new(HttpMessageSender::new(config)) as Arc<dyn MessageSender>);

        tracing::info!(
            push = push.is_some(),
            email = email.is_some(),
            messaging = messaging.is_some(),
            "Delivery transports configured"
        );

        Self {
            push,
            email,
            messaging,
        }
    }
}
