//! Provider-neutral completion result and token accounting.

use std::ops::AddAssign;

use serde::Serialize;

/// Token counts reported by a provider. Zero when the provider omits them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl LlmUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl AddAssign for LlmUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// Text returned by a single completion call plus its usage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LlmResponse {
    pub content: String,
    pub usage: LlmUsage,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, usage: LlmUsage) -> Self {
        Self {
            content: content.into(),
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_accumulates() {
        let mut total = LlmUsage::default();
        total += LlmUsage::new(120, 30);
        total += LlmUsage::new(80, 70);
        assert_eq!(total, LlmUsage::new(200, 100));
        assert_eq!(total.total(), 300);
    }
}
