//! Configuration system for kontext.

use serde::{Deserialize, Serialize};

use crate::error::{KontextError, KontextResult};
use crate::traits::{
    EmbedderConfig, GraphStoreConfig, GraphStoreProvider, LlmProvider, LlmProviderConfig,
};

/// Edge write policy for repeated mentions of the same relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Every extracted relation creates a fresh edge row; repeated mentions
    /// of the same fact are kept as provenance.
    #[default]
    AppendOnly,
    /// A new write folds into an existing live edge with the same
    /// (source, relation label, target) triple, appending the episode uuid.
    MergeOnDuplicateTriple,
}

/// Pipeline-level options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryOptions {
    pub edge_policy: EdgePolicy,
}

/// Main kontext configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KontextConfig {
    /// Graph store connection.
    pub graph: GraphStoreConfig,
    /// LLM provider selection.
    pub llm: LlmProviderConfig,
    /// Optional embedder override. Required for text providers without a
    /// native embeddings API (Anthropic) when embeddings are used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedder: Option<EmbedderConfig>,
    /// Pipeline options.
    pub memory: MemoryOptions,
}

impl KontextConfig {
    /// Build configuration using the builder pattern.
    pub fn builder() -> KontextConfigBuilder {
        KontextConfigBuilder::default()
    }

    /// Load configuration from a TOML or JSON file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> KontextResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| KontextError::config(format!("Failed to read config file: {}", e)))?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| KontextError::config(e.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| KontextError::config(e.to_string()))
            }
            _ => Err(KontextError::config(
                "Unsupported config file format. Use .toml or .json",
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var("KONTEXT_LLM_PROVIDER") {
            config.llm.provider = match provider.to_lowercase().as_str() {
                "anthropic" => LlmProvider::Anthropic,
                "gemini" => LlmProvider::Gemini,
                "ollama" => LlmProvider::Ollama,
                _ => LlmProvider::OpenAI,
            };
        }
        if let Ok(model) = std::env::var("KONTEXT_LLM_MODEL") {
            config.llm.config.model = model;
        }

        if let Ok(url) = std::env::var("KONTEXT_GRAPH_URL") {
            config.graph.provider = GraphStoreProvider::Neo4j;
            config.graph.url = url;
        }
        if let Ok(username) = std::env::var("KONTEXT_GRAPH_USERNAME") {
            config.graph.username = Some(username);
        }
        if let Ok(password) = std::env::var("KONTEXT_GRAPH_PASSWORD") {
            config.graph.password = Some(password);
        }
        if let Ok(database) = std::env::var("KONTEXT_GRAPH_DATABASE") {
            config.graph.database = Some(database);
        }

        config
    }
}

/// Builder for `KontextConfig`.
#[derive(Default)]
pub struct KontextConfigBuilder {
    config: KontextConfig,
}

impl KontextConfigBuilder {
    /// Set the graph store configuration.
    pub fn graph(mut self, graph: GraphStoreConfig) -> Self {
        self.config.graph = graph;
        self
    }

    /// Set the LLM provider configuration.
    pub fn llm(mut self, llm: LlmProviderConfig) -> Self {
        self.config.llm = llm;
        self
    }

    /// Set the embedder override.
    pub fn embedder(mut self, embedder: EmbedderConfig) -> Self {
        self.config.embedder = Some(embedder);
        self
    }

    /// Set the edge write policy.
    pub fn edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.config.memory.edge_policy = policy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> KontextConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_append_only() {
        let config = KontextConfig::default();
        assert_eq!(config.memory.edge_policy, EdgePolicy::AppendOnly);
    }

    #[test]
    fn test_builder_sets_edge_policy() {
        let config = KontextConfig::builder()
            .edge_policy(EdgePolicy::MergeOnDuplicateTriple)
            .build();
        assert_eq!(
            config.memory.edge_policy,
            EdgePolicy::MergeOnDuplicateTriple
        );
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = KontextConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: KontextConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.graph.url, config.graph.url);
    }
}
