//! Prompt augmentation with retrieved context.
//!
//! Generation itself happens elsewhere; this module only formats the user
//! turn that carries the retrieved snippets.

/// Context text used when retrieval returned nothing.
pub const NO_CONTEXT: &str = "No relevant context found.";

/// System prompt for an assistant that must answer from retrieved context only.
pub const SYSTEM_PROMPT: &str = "\
You are a RAG-powered assistant. Each user message contains:
1. RAG Context - passages retrieved from the reference document
2. User Question - the question being asked

Answer using ONLY the information in the RAG Context. If the context does not \
contain the answer, say that the document does not cover it. Decline questions \
unrelated to the reference document.";

/// Build the user turn from retrieved snippets and the question.
///
/// Snippets are separated by a blank line, in the order given.
///
/// ```rust
/// let prompt = docrag::prompt::augment("How long?", &["Cook 3 minutes.".to_string()]);
/// assert!(prompt.starts_with("RAG Context:\nCook 3 minutes.\n"));
/// assert!(prompt.ends_with("User Question:\nHow long?\n"));
/// ```
pub fn augment(question: &str, snippets: &[String]) -> String {
    let context = if snippets.is_empty() { NO_CONTEXT.to_string() } else { snippets.join("\n\n") };
    format!("RAG Context:\n{context}\n\n---\n\nUser Question:\n{question}\n")
}
