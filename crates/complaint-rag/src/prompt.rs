use complaint_core::types::{Prompt, RetrievalResult};

pub const CONTEXT_SEPARATOR: &str = "\n\n";

const PREAMBLE: &str = "You are a financial analyst assistant for CrediTrust.\n\
Use only the provided complaint excerpts to answer the question below.\n\
If the answer isn't in the context, say you don't have enough information.\n\n";

/// Renders retrieved chunks and a question into a grounding prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self { Self }

    /// Keep the longest rank-order prefix of hits whose joined text fits in
    /// `max_context_chars` characters, separators included.
    ///
    /// A top hit longer than the whole budget is cut to its first
    /// `max_context_chars` characters instead of being dropped.
    pub fn assemble(&self, retrieval: &RetrievalResult, question: &str, max_context_chars: usize) -> Prompt {
        let mut context = String::new();
        let mut used = 0usize;
        let mut included = 0usize;
        for hit in retrieval.iter() {
            let sep = if included == 0 { 0 } else { CONTEXT_SEPARATOR.chars().count() };
            let len = hit.chunk_text.chars().count();
            if included == 0 && len > max_context_chars && max_context_chars > 0 {
                tracing::warn!(len, max_context_chars, "top excerpt exceeds the context budget; truncating");
                context.extend(hit.chunk_text.chars().take(max_context_chars));
                included = 1;
                break;
            }
            if used + sep + len > max_context_chars { break; }
            if included > 0 { context.push_str(CONTEXT_SEPARATOR); }
            context.push_str(&hit.chunk_text);
            used += sep + len;
            included += 1;
        }
        if included < retrieval.len() {
            tracing::debug!(included, retrieved = retrieval.len(), max_context_chars, "context truncated");
        }
        let text = format!("{PREAMBLE}Context:\n{context}\n\nQuestion:\n{question}\n\nAnswer:");
        Prompt { context, question: question.to_string(), included, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complaint_core::types::RetrievalHit;

    fn result(texts: &[&str]) -> RetrievalResult {
        let hits = texts
            .iter()
            .enumerate()
            .map(|(i, t)| RetrievalHit { chunk_text: t.to_string(), doc_id: i.to_string(), chunk_id: 0, category: "BNPL".into(), score: 1.0 - i as f32 * 0.1 })
            .collect();
        RetrievalResult { hits }
    }

    #[test]
    fn joins_chunks_in_rank_order() {
        let p = PromptAssembler::new().assemble(&result(&["first", "second"]), "why?", 100);
        assert_eq!(p.context, "first\n\nsecond");
        assert_eq!(p.included, 2);
        assert!(p.render().contains("Context:\nfirst\n\nsecond\n\nQuestion:\nwhy?\n\nAnswer:"));
        assert!(p.render().starts_with("You are a financial analyst assistant for CrediTrust."));
    }

    #[test]
    fn drops_lowest_ranked_chunks_first() {
        // 5 + 2 + 6 = 13 fits exactly; the third chunk does not.
        let p = PromptAssembler::new().assemble(&result(&["aaaaa", "bbbbbb", "cc"]), "q", 13);
        assert_eq!(p.context, "aaaaa\n\nbbbbbb");
        assert_eq!(p.included, 2);

        let p = PromptAssembler::new().assemble(&result(&["aaaaa", "bbbbbb", "cc"]), "q", 12);
        assert_eq!(p.context, "aaaaa");
        assert_eq!(p.included, 1);
    }

    #[test]
    fn oversized_top_chunk_is_truncated_not_dropped() {
        let long = "x".repeat(300);
        let r = RetrievalResult { hits: vec![RetrievalHit { chunk_text: long, doc_id: "1".into(), chunk_id: 0, category: "BNPL".into(), score: 0.99 }] };
        let p = PromptAssembler::new().assemble(&r, "q", 100);
        assert_eq!(p.included, 1);
        assert_eq!(p.context.chars().count(), 100);
        assert!(p.has_context());
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let p = PromptAssembler::new().assemble(&result(&["éééé"]), "q", 4);
        assert_eq!(p.included, 1);
    }

    #[test]
    fn empty_retrieval_gives_empty_context() {
        let p = PromptAssembler::new().assemble(&RetrievalResult::default(), "anything?", 4000);
        assert_eq!(p.context, "");
        assert!(!p.has_context());
        assert!(p.render().contains("Context:\n\n\nQuestion:\nanything?"));
    }
}
