//! Prompts sent to the vision-language model.

/// Fixed instruction used to describe an image during enrichment.
pub const DESCRIBE_IMAGE_PROMPT: &str = "explain this image in detail";

/// Build the prompt for a question about an image.
///
/// Non-empty context is prepended as `Context: {context}\nQuestion: {question}`;
/// otherwise the bare question is sent.
pub fn build_question_prompt(question: &str, context: &str) -> String {
    if context.is_empty() {
        question.to_string()
    } else {
        format!("Context: {}\nQuestion: {}", context, question)
    }
}
