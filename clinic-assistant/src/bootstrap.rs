use crate::chat_completion::ChatCompletionResponder;
use crate::error::{AssistantError, AssistantResult};
use crate::orchestrator::ClinicAssistant;
use config_engine::{AssistantConfig, ResponderKind, StorageKind};
use database_layer::{
    DatabasePool, PostgresProcedureCatalog, PostgresSchedulingDirectory, PostgresTranscriptStore,
};
use insurance_service::{AuthorizationService, DocumentExtractor, LayeredExtractor, PlainTextExtractor};
use procedure_matcher::{InMemoryProcedureCatalog, ProcedureCatalog, ProcedureMatcher};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use workflow_engine::{
    DialogEngine, FreeTextResponder, InMemorySchedulingDirectory, InMemoryTranscriptStore,
    KeywordFaqResponder, SchedulingDirectory, TranscriptStore,
};

struct Backends {
    store: Arc<dyn TranscriptStore>,
    catalog: Arc<dyn ProcedureCatalog>,
    scheduling: Arc<dyn SchedulingDirectory>,
}

/// Wire a [`ClinicAssistant`] from a loaded configuration.
pub async fn build_assistant(config: &AssistantConfig) -> AssistantResult<ClinicAssistant> {
    let backends = match config.storage.kind {
        StorageKind::Memory => memory_backends(config)?,
        StorageKind::Postgres => postgres_backends(config).await?,
    };

    let responder: Arc<dyn FreeTextResponder> = match config.responder.kind {
        ResponderKind::Faq => Arc::new(KeywordFaqResponder::with_default_entries()),
        ResponderKind::ChatCompletion => {
            info!(model = %config.responder.model, "Using chat completion responder");
            Arc::new(ChatCompletionResponder::new(&config.responder)?)
        }
    };

    let matcher = Arc::new(ProcedureMatcher::new(backends.catalog, config.matcher.clone()));
    let extractor: Arc<dyn DocumentExtractor> =
        Arc::new(LayeredExtractor::new(Arc::new(PlainTextExtractor), None));
    let authorization = Arc::new(AuthorizationService::new(matcher, extractor));

    let engine = DialogEngine::new(backends.scheduling, responder, config.session.clone());
    Ok(ClinicAssistant::new(engine, backends.store, authorization))
}

fn memory_backends(config: &AssistantConfig) -> AssistantResult<Backends> {
    let catalog = match &config.storage.catalog_fixture {
        Some(path) => InMemoryProcedureCatalog::from_json_reader(
            open_fixture(path)?,
            config.matcher.tier_weights,
        )?,
        None => {
            warn!("No catalog fixture configured, authorization lookups will find nothing");
            InMemoryProcedureCatalog::new(Vec::new(), config.matcher.tier_weights)
        }
    };

    let scheduling = match &config.storage.schedule_fixture {
        Some(path) => {
            InMemorySchedulingDirectory::from_json_reader(open_fixture(path)?, config.booking)?
        }
        None => {
            warn!("No schedule fixture configured, booking has no specialties");
            InMemorySchedulingDirectory::new(Vec::new(), Vec::new(), config.booking)
        }
    }
    .anchored_to_now();

    info!(catalog_records = catalog.len(), "In-memory backends ready");
    Ok(Backends {
        store: Arc::new(InMemoryTranscriptStore::new()),
        catalog: Arc::new(catalog),
        scheduling: Arc::new(scheduling),
    })
}

async fn postgres_backends(config: &AssistantConfig) -> AssistantResult<Backends> {
    let url = config
        .storage
        .database_url
        .as_deref()
        .ok_or_else(|| AssistantError::Setup("storage.database_url is required".to_string()))?;

    let pool = DatabasePool::new(url, config.storage.max_connections).await?;
    if !pool.is_healthy().await {
        return Err(AssistantError::Setup("database is not reachable".to_string()));
    }
    if config.storage.run_migrations {
        pool.run_migrations().await?;
    }

    Ok(Backends {
        store: Arc::new(PostgresTranscriptStore::new(&pool)),
        catalog: Arc::new(PostgresProcedureCatalog::new(&pool)),
        scheduling: Arc::new(PostgresSchedulingDirectory::new(&pool, config.booking)),
    })
}

fn open_fixture(path: &Path) -> AssistantResult<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        AssistantError::Setup(format!("cannot open fixture {}: {e}", path.display()))
    })?;
    Ok(BufReader::new(file))
}
