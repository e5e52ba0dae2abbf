//! Process-wide startup: credential, dataset, primer, and the session factory.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, DatasetSettings};
use crate::dataset;
use crate::error::StartupError;
use crate::llm::{CompletionClient, OpenAiClient};
use crate::prompts::build_system_primer;
use crate::sampler;
use crate::session::Session;

/// Immutable state shared by every session in the process
#[derive(Clone)]
pub struct Helpline {
    primer: Arc<str>,
    client: Arc<dyn CompletionClient>,
}

impl Helpline {
    /// Resolve the credential, then build the primer from the dataset.
    ///
    /// Any failure here is fatal; no session can be created without both.
    pub fn bootstrap(config: &Config) -> Result<Self, StartupError> {
        let api_key = config.require_api_key()?;
        let primer = load_primer(&config.dataset)?;
        let client = OpenAiClient::new(config.completion.clone(), api_key);
        info!(url = client.url(), model = %config.completion.model, "completion client ready");

        Ok(Self::from_parts(primer, Arc::new(client)))
    }

    pub fn from_parts(primer: impl Into<Arc<str>>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            primer: primer.into(),
            client,
        }
    }

    pub fn primer(&self) -> &str {
        &self.primer
    }

    /// A fresh session with its own transcript
    pub fn new_session(&self) -> Session {
        Session::new(Arc::clone(&self.primer), Arc::clone(&self.client))
    }
}

/// Load, sample and render the dataset into the system primer
pub fn load_primer(settings: &DatasetSettings) -> Result<String, StartupError> {
    let rows = dataset::load_dataset(settings)?;
    let sampled = sampler::sample(&rows, settings.num_examples, settings.seed)?;
    let primer = build_system_primer(&sampled);
    info!(
        examples = sampled.len(),
        seed = settings.seed,
        chars = primer.len(),
        "built system primer"
    );
    Ok(primer)
}
