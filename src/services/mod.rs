pub mod ai_service; // ModelGateway trait
pub mod assembler;
pub mod extractor;
pub mod openai; // OpenAI-compatible provider
pub mod prompts;
pub mod validator;

pub use ai_service::{CompletionRequest, ModelGateway};
pub use openai::OpenAIService;

use sha2::{Digest, Sha256};

/// Short stable digest used to correlate payloads in logs without writing them out.
pub fn fingerprint(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let a = fingerprint("data:image/png;base64,AAAA");
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint("data:image/png;base64,AAAA"));
        assert_ne!(a, fingerprint("data:image/png;base64,AAAB"));
    }
}
