//! Prompt templates for query rewrite and answer synthesis.
//!
//! The corpus is bakery/pastry formulation documentation (enzymes, improvers,
//! dosages), so both prompts steer the model toward that vocabulary.

/// System instruction for rewriting a user question into a retrieval query.
pub const QUERY_OPTIMIZER_SYSTEM: &str = "\
You rewrite questions about bakery and pastry ingredient formulation into queries \
for semantic search over technical bakery documentation.

Rewrite rules:
1. Use the technical vocabulary of bakery science: enzymes, improvers, dosages in ppm.
2. Expand abbreviations and implicit references.
3. Name the specific enzyme (amylase, xylanase, lipase, ...) when the context reveals it.
4. Mention dosage units (ppm, %, g/kg) when the question is about quantities.
5. Turn vague goals like \"improve\" into technical outcomes such as crumb structure, \
fermentation tolerance or dough extensibility.
6. Drop casual wording, keep the query short, and keep the user's intent.

Reply with the rewritten query only, without explanations.";

/// System instruction for synthesizing an answer from retrieved fragments.
pub const ANSWER_FORMATTER_SYSTEM: &str = "\
You format technical bakery documentation into a direct answer to the user's question.

Instructions:
1. Combine the retrieved fragments into one coherent answer.
2. Group content under clear Markdown headers such as Dosage, Functions and Applications.
3. Put key numbers (ppm, percentages, temperatures) and technical terms in bold.
4. Use bullet lists for benefits, functions and applications.
5. Lead with what matters most for the question and skip repeated facts.
6. Stay technically accurate; close with a short practical summary when it helps.

Reply with the Markdown answer only. Do not mention fragments, sources or metadata.";

/// User prompt for the query rewrite.
pub fn query_prompt(question: &str) -> String {
    format!("User's original query: {question}")
}

/// User prompt for answer synthesis; fragments are numbered in rank order.
pub fn answer_prompt(question: &str, fragments: &[&str]) -> String {
    let numbered = fragments
        .iter()
        .enumerate()
        .map(|(i, f)| format!("**Result {}:**\n{f}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!("User's question: {question}\n\nRetrieved technical documents:\n\n{numbered}")
}
