use crate::error::Result;
use crate::llm::traits::{LlmGateway, TokenDirection};

/// Running token totals for cost estimation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTracker {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub request_count: u64,
}

impl UsageTracker {
    pub fn track(&mut self, input: usize, output: usize) {
        self.total_input_tokens += input as u64;
        self.total_output_tokens += output as u64;
        self.request_count += 1;
    }

    /// Totals priced with the gateway's active model.
    pub fn estimated_cost(&self, gateway: &dyn LlmGateway) -> Result<f64> {
        let input = gateway.token_cost(self.total_input_tokens, TokenDirection::Input)?;
        let output = gateway.token_cost(self.total_output_tokens, TokenDirection::Output)?;
        Ok(input + output)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
