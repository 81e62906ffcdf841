// Glue between the form, the prompt templates, the chat client and the
// breakdown parser. Upstream failures never reach the page as errors; they
// are logged and replaced with the static error message.

use tracing::{error, info, instrument};

use crate::breakdown::Estimate;
use crate::constants::ERROR_MESSAGE;
use crate::form::ProjectSpec;
use crate::llm_interaction::{ChatClient, ChatError};
use crate::prompt::{build_estimate_prompt, QUOTATION_PROMPT};

#[derive(Debug, Clone)]
pub struct Estimator {
    client: ChatClient,
}

impl Estimator {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Like [`Estimator::estimate`] but hands the upstream error back to the
    /// caller (the JSON API and the CLI report it).
    #[instrument(skip(self, spec), fields(kind = %spec.kind(), tasks = spec.tasks.len()))]
    pub async fn try_estimate(&self, spec: &ProjectSpec) -> Result<Estimate, ChatError> {
        let prompt = build_estimate_prompt(spec);
        let reply = self.client.ask(&prompt).await?;
        let estimate = Estimate::parse(&reply);
        info!(
            headline = %estimate.headline,
            rows = estimate.breakdown.len(),
            "Estimate received"
        );
        Ok(estimate)
    }

    pub async fn estimate(&self, spec: &ProjectSpec) -> Estimate {
        match self.try_estimate(spec).await {
            Ok(estimate) => estimate,
            Err(e) => {
                error!("Estimate request failed: {}", e);
                Estimate::failed()
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn try_quotation(&self) -> Result<String, ChatError> {
        let quotation = self.client.ask(QUOTATION_PROMPT).await?;
        info!(len = quotation.len(), "Quotation received");
        Ok(quotation)
    }

    pub async fn quotation(&self) -> String {
        match self.try_quotation().await {
            Ok(quotation) => quotation,
            Err(e) => {
                error!("Quotation request failed: {}", e);
                ERROR_MESSAGE.to_string()
            }
        }
    }
}
