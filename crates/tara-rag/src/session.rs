//! Per-user session: upload batches, question dispatch and reset

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::{AnalysisFailure, TabularAnalyzer};
use crate::config::{EmbeddingBackend, RetrievalConfig, TabularConfig, TaraConfig};
use crate::conversation::{ConversationEngine, EngineProviders, Role, Turn};
use crate::error::{Error, Result};
use crate::ingestion::{pdf_chunks, Stager, TextChunker};
use crate::providers::{
    EmbeddingProvider, HashingEmbedder, LlmProvider, OllamaClient, OllamaEmbedder, OllamaLlm,
};
use crate::retrieval::IndexMode;
use crate::routing::{self, QueryRoute};
use crate::tabular::{descriptor_chunk, ColumnProfile, DatasetRegistry, TabularLoader};
use crate::types::{
    AskResponse, BatchReport, Chunk, FileReport, FileType, ProcessingStatus, SourceRef,
    UploadedFile,
};

/// Handles and settings shared by every session
#[derive(Clone)]
pub struct SessionServices {
    pub providers: EngineProviders,
    pub analyzer: Arc<TabularAnalyzer>,
    pub chunker: TextChunker,
    pub stager: Stager,
    pub retrieval: RetrievalConfig,
    pub tabular: TabularConfig,
}

impl SessionServices {
    /// Build the production backends described by `config`
    pub fn from_config(config: &TaraConfig) -> Result<Self> {
        let ollama = Arc::new(OllamaClient::new(&config.llm)?);

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
            EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::from_client(
                ollama.clone(),
                config.embeddings.dimensions,
            )),
            EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)),
        };
        let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::from_client(ollama));

        tracing::info!(
            "Session services: embeddings={}, generation={} ({})",
            embedder.name(),
            llm.name(),
            llm.model()
        );

        Ok(Self {
            providers: EngineProviders { embedder, llm },
            analyzer: Arc::new(TabularAnalyzer::from_config(&config.analysis)?),
            chunker: TextChunker::from_config(&config.chunking)?,
            stager: Stager::new(),
            retrieval: config.retrieval.clone(),
            tabular: config.tabular.clone(),
        })
    }

    /// Services over explicit providers with default settings
    pub fn new(providers: EngineProviders, analyzer: TabularAnalyzer) -> Result<Self> {
        let config = TaraConfig::default();
        Ok(Self {
            providers,
            analyzer: Arc::new(analyzer),
            chunker: TextChunker::from_config(&config.chunking)?,
            stager: Stager::new(),
            retrieval: config.retrieval,
            tabular: config.tabular,
        })
    }

    pub fn with_stager(mut self, stager: Stager) -> Self {
        self.stager = stager;
        self
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }
}

/// Loaded dataset as shown in the session summary
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub filename: String,
    pub rows: usize,
    pub columns: usize,
    pub profiles: Vec<ColumnProfile>,
}

/// Snapshot of a session for display
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Role greeting once materials are loaded, upload guidance before
    pub message: String,
    pub library_title: String,
    /// Processed filenames, sorted
    pub materials: Vec<String>,
    pub total_documents: usize,
    pub indexed_chunks: usize,
    pub conversation_turns: usize,
    pub datasets: Vec<DatasetSummary>,
    /// Per-file status of the most recent batch
    pub last_batch: Vec<FileReport>,
    pub analysis_available: bool,
}

/// One user's knowledge base, conversation and upload state
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    role: Role,
    engine: Option<ConversationEngine>,
    processed: BTreeSet<String>,
    datasets: DatasetRegistry,
    batch_status: Vec<FileReport>,
    services: Arc<SessionServices>,
}

impl Session {
    pub fn new(services: Arc<SessionServices>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            role: Role::default(),
            engine: None,
            processed: BTreeSet::new(),
            datasets: DatasetRegistry::new(),
            batch_status: Vec::new(),
            services,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Whether an engine exists
    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn processed_files(&self) -> &BTreeSet<String> {
        &self.processed
    }

    pub fn datasets(&self) -> &DatasetRegistry {
        &self.datasets
    }

    pub fn engine(&self) -> Option<&ConversationEngine> {
        self.engine.as_ref()
    }

    /// Status of the current batch
    pub fn batch_status(&self) -> &[FileReport] {
        &self.batch_status
    }

    /// Chat history, oldest first
    pub fn history(&self) -> &[Turn] {
        match &self.engine {
            Some(engine) => engine.memory().turns(),
            None => &[],
        }
    }

    /// Ingest every new upload, one file at a time.
    ///
    /// Files already processed, or repeated within the batch, are skipped.
    /// A failed file never stops the rest of the batch.
    pub async fn process_batch(&mut self, uploads: Vec<UploadedFile>) -> BatchReport {
        let start = Instant::now();
        self.batch_status.clear();

        let mut seen = HashSet::new();
        let mut skipped = Vec::new();
        let mut pending = Vec::new();
        for upload in uploads {
            if self.processed.contains(&upload.name) || !seen.insert(upload.name.clone()) {
                skipped.push(upload.name);
                continue;
            }
            let mut report = FileReport::pending(&upload.name);
            report.file_type = FileType::from_filename(&upload.name).ok();
            self.batch_status.push(report);
            pending.push(upload);
        }

        tracing::info!(
            "Processing batch: {} new file(s), {} skipped",
            pending.len(),
            skipped.len()
        );

        for (idx, upload) in pending.iter().enumerate() {
            self.batch_status[idx].status = ProcessingStatus::Processing;

            match self.ingest(upload).await {
                Ok(chunks) => {
                    self.processed.insert(upload.name.clone());
                    let report = &mut self.batch_status[idx];
                    report.status = ProcessingStatus::Complete;
                    report.chunks_created = chunks;
                    tracing::info!("Processed {}: {} chunks", upload.name, chunks);
                }
                Err(e) => {
                    let message = format!("Failed to process {}: {}", upload.name, e);
                    tracing::warn!("{}", message);
                    let report = &mut self.batch_status[idx];
                    report.status = ProcessingStatus::Failed;
                    report.message = Some(message);
                    report.error_type = Some(e.kind().to_string());
                }
            }
        }

        let report = BatchReport {
            files: self.batch_status.clone(),
            skipped,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        if report.is_fully_successful() && !report.files.is_empty() {
            tracing::info!("All new document(s) have been added to the knowledge base");
        }
        report
    }

    /// Stage, parse and index one upload; returns the number of chunks indexed.
    /// The staged copy is removed before this returns.
    async fn ingest(&mut self, upload: &UploadedFile) -> Result<usize> {
        let file_type = FileType::from_filename(&upload.name)?;
        let staged = self.services.stager.stage(upload, file_type.suffix())?;
        let mode = IndexMode::for_slot(&self.engine);

        if file_type.is_tabular() {
            let dataset = TabularLoader::load(&upload.name, staged.path())?;
            drop(staged);

            let chunk = descriptor_chunk(&dataset)?;
            let added = self.merge(mode, vec![chunk]).await?;
            if self.datasets.insert(dataset).is_some() {
                tracing::info!("Replaced dataset {}", upload.name);
            }
            Ok(added)
        } else {
            let chunks = pdf_chunks(&upload.name, staged.path(), &self.services.chunker)?;
            drop(staged);

            self.merge(mode, chunks).await
        }
    }

    async fn merge(&mut self, mode: IndexMode, chunks: Vec<Chunk>) -> Result<usize> {
        ConversationEngine::merge(
            &mut self.engine,
            mode,
            chunks,
            &self.services.providers,
            &self.services.retrieval,
        )
        .await
    }

    /// Answer a question, routing between analysis and narrative retrieval
    pub async fn ask(&mut self, question: &str) -> Result<AskResponse> {
        let start = Instant::now();
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::invalid_request("question must not be empty"));
        }

        let engine = self.engine.as_mut().ok_or_else(|| {
            Error::no_data("no materials have been processed yet; upload documents first")
        })?;

        let route = routing::classify(question, !self.datasets.is_empty());
        match routing::explain(question) {
            Some(rule) => tracing::debug!("Route {} via {}", route, rule),
            None => tracing::debug!("Route {}", route),
        }
        tracing::info!("Answering question on {} path", route);

        let (answer, sources) = match route {
            QueryRoute::Analysis => {
                let outcome = self.services.analyzer.analyze(question, &self.datasets).await;
                if !outcome.success {
                    return Err(match outcome.failure {
                        Some(AnalysisFailure::NotConfigured) => Error::NotConfigured(outcome.error),
                        Some(AnalysisFailure::NoData) => Error::NoData(outcome.error),
                        _ => Error::Generation(outcome.error),
                    });
                }
                engine.record_exchange(question, &outcome.output);
                (outcome.output, Vec::new())
            }
            QueryRoute::Narrative => {
                let reply = engine.ask(question, self.role).await?;
                let sources = reply.sources.iter().map(SourceRef::from_hit).collect();
                (reply.answer, sources)
            }
        };

        Ok(AskResponse {
            answer,
            route,
            sources,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Drop the engine, memory, processed set, datasets and batch status together
    pub fn clear_knowledge_base(&mut self) {
        self.engine = None;
        self.processed.clear();
        self.datasets.clear();
        self.batch_status.clear();
        tracing::info!("Knowledge base cleared for session {}", self.id);
    }

    pub fn summary(&self) -> SessionSummary {
        let mut rng = rand::thread_rng();
        let sample_size = self.services.tabular.sample_size;

        let datasets = self
            .datasets
            .iter()
            .map(|ds| {
                let (rows, columns) = ds.shape();
                let profiles = ds
                    .column_names()
                    .into_iter()
                    .filter_map(|name| ds.column_profile(name, sample_size, &mut rng))
                    .collect();
                DatasetSummary {
                    filename: ds.filename().to_string(),
                    rows,
                    columns,
                    profiles,
                }
            })
            .collect();

        let message = if self.is_ready() {
            self.role.greeting()
        } else {
            self.role.upload_guidance()
        };

        SessionSummary {
            id: self.id,
            role: self.role,
            created_at: self.created_at,
            message: message.to_string(),
            library_title: self.role.library_title().to_string(),
            materials: self.processed.iter().cloned().collect(),
            total_documents: self.processed.len(),
            indexed_chunks: self.engine.as_ref().map_or(0, |e| e.index().len()),
            conversation_turns: self.history().len(),
            datasets,
            last_batch: self.batch_status.clone(),
            analysis_available: self.services.analyzer.is_configured(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ScriptedLlm, SwitchableEmbedder};

    fn session_with(llm: Arc<ScriptedLlm>, analyzer: TabularAnalyzer) -> Session {
        let providers = EngineProviders {
            embedder: Arc::new(HashingEmbedder::new(128)),
            llm,
        };
        Session::new(Arc::new(SessionServices::new(providers, analyzer).unwrap()))
    }

    fn csv(name: &str, body: &str) -> UploadedFile {
        UploadedFile::new(name, body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_ask_without_engine_is_no_data() {
        let mut session = session_with(Arc::new(ScriptedLlm::answering("x")), TabularAnalyzer::unconfigured());
        let err = session.ask("hello").await.unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[tokio::test]
    async fn test_tabular_upload_creates_engine() {
        let mut session = session_with(Arc::new(ScriptedLlm::answering("x")), TabularAnalyzer::unconfigured());
        let report = session
            .process_batch(vec![csv("scores.csv", "name,score\nana,91\nben,78\n")])
            .await;

        assert!(report.is_fully_successful());
        assert_eq!(report.files[0].chunks_created, 1);
        assert!(session.is_ready());
        assert!(session.datasets().contains("scores.csv"));
        assert!(session.processed_files().contains("scores.csv"));
    }

    #[tokio::test]
    async fn test_processed_and_repeated_files_are_skipped() {
        let mut session = session_with(Arc::new(ScriptedLlm::answering("x")), TabularAnalyzer::unconfigured());
        session.process_batch(vec![csv("a.csv", "x\n1\n")]).await;

        let report = session
            .process_batch(vec![
                csv("a.csv", "x\n1\n"),
                csv("b.csv", "y\n2\n"),
                csv("b.csv", "y\n3\n"),
            ])
            .await;
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].filename, "b.csv");
        assert_eq!(report.skipped, vec!["a.csv", "b.csv"]);
    }

    #[tokio::test]
    async fn test_unsupported_file_fails_alone() {
        let mut session = session_with(Arc::new(ScriptedLlm::answering("x")), TabularAnalyzer::unconfigured());
        let report = session
            .process_batch(vec![csv("notes.docx", "binary"), csv("a.csv", "x\n1\n")])
            .await;

        assert_eq!(report.status_of("notes.docx"), Some(ProcessingStatus::Failed));
        assert_eq!(report.status_of("a.csv"), Some(ProcessingStatus::Complete));
        let failed = report.failed().next().unwrap();
        assert!(failed.message.as_deref().unwrap().contains("notes.docx"));
        assert_eq!(failed.error_type.as_deref(), Some("unsupported_format"));
        assert!(failed.file_type.is_none());
    }

    #[tokio::test]
    async fn test_embedding_failure_marks_file_failed() {
        let embedder = Arc::new(SwitchableEmbedder::new(HashingEmbedder::new(64)));
        embedder.set_failing(true);
        let providers = EngineProviders {
            embedder: embedder.clone(),
            llm: Arc::new(ScriptedLlm::answering("x")),
        };
        let services = SessionServices::new(providers, TabularAnalyzer::unconfigured()).unwrap();
        let mut session = Session::new(Arc::new(services));

        let report = session.process_batch(vec![csv("a.csv", "x\n1\n")]).await;
        assert_eq!(report.status_of("a.csv"), Some(ProcessingStatus::Failed));
        assert!(!session.is_ready());
        assert!(session.datasets().is_empty());
        assert!(session.processed_files().is_empty());

        embedder.set_failing(false);
        let report = session.process_batch(vec![csv("a.csv", "x\n1\n")]).await;
        assert!(report.is_fully_successful());
    }

    #[tokio::test]
    async fn test_analysis_route_records_exchange() {
        let analysis = Arc::new(ScriptedLlm::answering("Mean score is 84.5"));
        let mut session = session_with(
            Arc::new(ScriptedLlm::answering("narrative")),
            TabularAnalyzer::with_backend(analysis),
        );
        session
            .process_batch(vec![csv("scores.csv", "name,score\nana,91\nben,78\n")])
            .await;

        let response = session.ask("Calculate the average score").await.unwrap();
        assert_eq!(response.route, QueryRoute::Analysis);
        assert_eq!(response.answer, "Mean score is 84.5");
        assert_eq!(session.history().len(), 2);

        let response = session.ask("Who is ana?").await.unwrap();
        assert_eq!(response.route, QueryRoute::Narrative);
        assert_eq!(response.answer, "narrative");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn test_unconfigured_analysis_is_not_added_to_memory() {
        let mut session = session_with(Arc::new(ScriptedLlm::answering("x")), TabularAnalyzer::unconfigured());
        session
            .process_batch(vec![csv("scores.csv", "name,score\nana,91\n")])
            .await;

        let err = session.ask("compute the mean score").await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_clear_knowledge_base() {
        let mut session = session_with(Arc::new(ScriptedLlm::answering("x")), TabularAnalyzer::unconfigured());
        session.process_batch(vec![csv("a.csv", "x\n1\n")]).await;
        session.ask("what is in the file").await.unwrap();

        session.clear_knowledge_base();
        assert!(!session.is_ready());
        assert!(session.processed_files().is_empty());
        assert!(session.datasets().is_empty());
        assert!(session.history().is_empty());
        assert!(session.batch_status().is_empty());
        assert!(matches!(session.ask("again").await, Err(Error::NoData(_))));
    }

    #[tokio::test]
    async fn test_summary_reflects_role_and_materials() {
        let mut session = session_with(Arc::new(ScriptedLlm::answering("x")), TabularAnalyzer::unconfigured());
        assert_eq!(session.summary().message, Role::Student.upload_guidance());

        session.set_role(Role::Professor);
        session
            .process_batch(vec![csv("b.csv", "v\n1\n2\n"), csv("a.csv", "w\nx\n")])
            .await;

        let summary = session.summary();
        assert_eq!(summary.role, Role::Professor);
        assert_eq!(summary.message, Role::Professor.greeting());
        assert_eq!(summary.materials, vec!["a.csv", "b.csv"]);
        assert_eq!(summary.indexed_chunks, 2);
        assert_eq!(summary.datasets.len(), 2);
        assert_eq!(summary.datasets[0].profiles.len(), 1);
        assert!(!summary.analysis_available);
    }
}
