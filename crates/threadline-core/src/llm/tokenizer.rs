use crate::llm::traits::TokenInput;
use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;

static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder() -> Option<&'static CoreBPE> {
    CL100K
        .get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(error = %e, "cl100k_base unavailable, falling back to length estimate");
                None
            }
        })
        .as_ref()
}

/// Token estimate with the `cl100k_base` encoding.
///
/// The same encoding is used for every backend, so counts (and the costs
/// derived from them) are approximate for models that tokenize differently.
pub fn count_tokens(input: TokenInput<'_>) -> usize {
    let text = input.joined();
    match encoder() {
        Some(bpe) => bpe.encode_with_special_tokens(&text).len(),
        None => text.len().div_ceil(4),
    }
}
