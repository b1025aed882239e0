//! Prompt templates for query expansion and grounded answering

use crate::types::Chunk;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Ask the LLM for `variants` alternative phrasings of a question
    pub fn build_multi_query_prompt(question: &str, variants: usize) -> String {
        format!(
            "You are an AI assistant generating alternative query perspectives.\n\
             Generate {variants} different versions of the given question to improve document retrieval:\n\
             Original question: {question}",
            variants = variants,
            question = question
        )
    }

    /// Join retrieved chunk texts with blank lines
    pub fn build_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the grounded answer prompt
    pub fn build_answer_prompt(question: &str, context: &str) -> String {
        format!(
            "Answer the question based ONLY on the following context:\n{context}\nQuestion: {question}\n",
            context = context,
            question = question
        )
    }

    /// Split LLM output into query variants, one per non-empty line
    pub fn parse_query_variants(output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentOrigin;

    #[test]
    fn test_answer_prompt_layout() {
        let prompt = PromptBuilder::build_answer_prompt("price of apples?", "name: Apple\nprice: 1.50");
        assert_eq!(
            prompt,
            "Answer the question based ONLY on the following context:\nname: Apple\nprice: 1.50\nQuestion: price of apples?\n"
        );
    }

    #[test]
    fn test_multi_query_prompt_mentions_count_and_question() {
        let prompt = PromptBuilder::build_multi_query_prompt("where is milk?", 5);
        assert!(prompt.contains("Generate 5 different versions"));
        assert!(prompt.ends_with("Original question: where is milk?"));
    }

    #[test]
    fn test_context_joins_with_blank_lines() {
        let chunks = vec![
            Chunk::new(0, DocumentOrigin::Row(1), 0, "a".to_string()),
            Chunk::new(1, DocumentOrigin::Row(2), 0, "b".to_string()),
        ];
        assert_eq!(PromptBuilder::build_context(&chunks), "a\n\nb");
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }

    #[test]
    fn test_parse_variants_drops_blank_lines() {
        let variants = PromptBuilder::parse_query_variants("1. first\n\n   \n2. second  \n");
        assert_eq!(variants, vec!["1. first", "2. second"]);
        assert!(PromptBuilder::parse_query_variants("\n \n").is_empty());
    }
}
