//! The `Kontext` client facade.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use kontext_core::config::KontextConfig;
use kontext_core::error::{KontextError, KontextResult};
use kontext_core::memory::{ContextBuilder, MemoryAdder, MemorySearcher};
use kontext_core::traits::{GraphStore, LlmClient};
use kontext_core::types::{
    AddOptions, AddOutcome, GroupScope, MessageInput, SearchOptions, SearchResult,
};
use kontext_graph::GraphStoreFactory;
use kontext_llm::LlmClientFactory;

/// Handle to a background add. Dropping the handle detaches the task.
#[derive(Debug)]
pub struct AddTask {
    handle: JoinHandle<KontextResult<AddOutcome>>,
}

impl AddTask {
    /// Wait for the pipeline to finish and return its outcome.
    pub async fn join(self) -> KontextResult<AddOutcome> {
        self.handle
            .await
            .map_err(|e| KontextError::Internal(format!("Background add task failed: {}", e)))?
    }

    /// Cancel the background pipeline.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the pipeline has completed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// What `add` returns immediately. For foreground adds the counts reflect
/// the persisted records; for background adds they are zero and the real
/// outcome is available through `task`.
#[derive(Debug)]
pub struct AddReceipt {
    pub entities: usize,
    pub edges: usize,
    pub task: Option<AddTask>,
}

enum StoreState {
    Uninitialized,
    Connected(Arc<dyn GraphStore>),
    Closed,
}

/// Main entry point to the memory layer.
///
/// The LLM client is built eagerly so misconfiguration fails at
/// construction; the graph store connects lazily on first use.
pub struct Kontext {
    config: KontextConfig,
    llm: Arc<dyn LlmClient>,
    store: RwLock<StoreState>,
}

impl Kontext {
    /// Create a client from configuration.
    pub fn new(config: KontextConfig) -> KontextResult<Self> {
        let llm = LlmClientFactory::create(&config.llm, config.embedder.as_ref())?;
        Ok(Self::with_llm_client(config, llm))
    }

    /// Create a client with a caller-supplied LLM client, bypassing the
    /// provider factory.
    pub fn with_llm_client(config: KontextConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            llm,
            store: RwLock::new(StoreState::Uninitialized),
        }
    }

    /// Resolve the graph store, connecting on first use.
    async fn store(&self) -> KontextResult<Arc<dyn GraphStore>> {
        {
            let state = self.store.read().await;
            match &*state {
                StoreState::Connected(store) => return Ok(store.clone()),
                StoreState::Closed => {
                    return Err(KontextError::store("Client is closed"));
                }
                StoreState::Uninitialized => {}
            }
        }

        let mut state = self.store.write().await;
        match &*state {
            StoreState::Connected(store) => Ok(store.clone()),
            StoreState::Closed => Err(KontextError::store("Client is closed")),
            StoreState::Uninitialized => {
                let store = GraphStoreFactory::create(&self.config.graph).await?;
                info!(provider = ?self.config.graph.provider, "graph store connected");
                *state = StoreState::Connected(store.clone());
                Ok(store)
            }
        }
    }

    /// Ingest a conversation: persist the episode, extract entities and
    /// relations, and write them to the graph.
    ///
    /// With `options.background` set, the pipeline runs detached and the
    /// receipt carries a task handle instead of counts.
    pub async fn add(
        &self,
        messages: impl Into<MessageInput>,
        options: AddOptions,
    ) -> KontextResult<AddReceipt> {
        // Scope problems surface here, before any connection or spawn.
        options.scope.group_id()?;

        let messages = messages.into().normalize();
        let store = self.store().await?;
        let adder = MemoryAdder::new(store, self.llm.clone(), self.config.memory.edge_policy);

        if options.background {
            let handle = tokio::spawn(async move { adder.add(&messages, &options).await });
            debug!("add pipeline spawned in background");
            return Ok(AddReceipt {
                entities: 0,
                edges: 0,
                task: Some(AddTask { handle }),
            });
        }

        let outcome = adder.add(&messages, &options).await?;
        Ok(AddReceipt {
            entities: outcome.entities.len(),
            edges: outcome.edges.len(),
            task: None,
        })
    }

    /// Search stored memory for a group.
    pub async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> KontextResult<SearchResult> {
        // Scope problems surface before the store is even connected.
        options.scope.group_id()?;
        let store = self.store().await?;
        MemorySearcher::new(store).search(query, &options).await
    }

    /// Search and format the results as a prompt-ready context block.
    pub async fn get_context(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> KontextResult<String> {
        options.scope.group_id()?;
        let store = self.store().await?;
        ContextBuilder::new(store).get_context(query, &options).await
    }

    /// Delete every record in the scope's group.
    pub async fn delete(&self, scope: GroupScope) -> KontextResult<()> {
        let group_id = scope.group_id()?.to_string();
        let store = self.store().await?;
        store.delete_group(&group_id).await
    }

    /// Close the client. Further operations fail with a store error.
    pub async fn close(&self) -> KontextResult<()> {
        let mut state = self.store.write().await;
        *state = StoreState::Closed;
        Ok(())
    }
}
