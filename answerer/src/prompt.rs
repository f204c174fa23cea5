//! Prompt Builder: fixed grounded template around the selected context.
//!
//! Identical `(question, window, answer_words)` inputs always yield
//! byte-identical prompts; nothing time- or order-dependent is embedded.

use crate::candidate::ContextWindow;

/// Character budget for the serialized context block. Total prompt size is
/// already bounded upstream by `top_k` and chunk size; this is a hard stop
/// against pathological chunks.
const MAX_CONTEXT_CHARS: usize = 8_000;

/// System instructions for grounded Q&A.
const SYSTEM: &str = "You are a precise Q&A assistant. Answer ONLY using the CONTEXT.\n\
- Provide a structured, detailed answer.\n\
- Be as thorough but as efficient as you can be in {answer_words} words or fewer.\n\
- If the answer is not fully supported, say \"I don't know based on the provided documents.\"\n\
- Cite sources inline as (File p.Page) at the END of each sentence you claim.";

/// Converts a token budget to an approximate word budget
/// (~0.5 words per token, a safe average for English text).
pub fn approx_tokens_to_words(tokens: u32) -> u32 {
    tokens / 2
}

/// Builds the full grounded prompt for one question.
///
/// Each context entry is serialized with its provenance label
/// (`source p.page [origins]`) so the model can be asked to cite sources.
/// An empty window degrades to an explicit "no relevant context" instruction
/// while still carrying the verbatim question.
pub fn build_prompt(question: &str, window: &ContextWindow, answer_words: u32) -> String {
    let system = SYSTEM.replace("{answer_words}", &answer_words.to_string());

    let user = if window.is_empty() {
        format!(
            "QUESTION:\n{}\n\nCONTEXT:\nNo relevant context was found in the document corpus.\n\n\
             INSTRUCTIONS:\n- State that the documents do not cover this question.\n\
             - Do not invent sources.",
            question.trim()
        )
    } else {
        let mut blocks = Vec::with_capacity(window.len());
        let mut citations = Vec::with_capacity(window.len());

        for (i, entry) in window.iter().enumerate() {
            let c = &entry.candidate;
            let origins = entry
                .origins
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("+");
            let label = format!("{} p.{} [{}]", c.source_id, c.page, origins);
            blocks.push(format!("[{}] {}\n{}", i + 1, label, c.text.trim()));
            citations.push(label);
        }

        let mut context = blocks.join("\n\n");
        if context.len() > MAX_CONTEXT_CHARS {
            context = format!(
                "{}\n… [truncated]",
                safe_truncate(&context, MAX_CONTEXT_CHARS)
            );
        }

        format!(
            "QUESTION:\n{}\n\nCONTEXT:\n{}\n\nINSTRUCTIONS:\n\
             - Include source references like ({}) after each supported claim.\n\
             - Use content verbatim where appropriate.",
            question.trim(),
            context,
            citations.join(", ")
        )
    };

    format!("<SYSTEM>\n{system}\n</SYSTEM>\n<USER>\n{user}\n</USER>")
}

fn safe_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::FusedResult;
    use doc_index::{Origin, ScoredCandidate};

    fn window(entries: Vec<(&str, u32, &str, Vec<Origin>)>) -> ContextWindow {
        ContextWindow {
            entries: entries
                .into_iter()
                .enumerate()
                .map(|(i, (source, page, text, origins))| FusedResult {
                    candidate: ScoredCandidate {
                        source_id: source.into(),
                        page,
                        text: text.into(),
                        score: 1.0,
                        origin: origins[0],
                    },
                    fused_rank: i + 1,
                    origins,
                })
                .collect(),
        }
    }

    #[test]
    fn prompt_is_byte_stable() {
        let w = window(vec![
            ("manual.pdf", 4, "Release the valve slowly.", vec![Origin::Vector]),
            (
                "notes.pdf",
                2,
                "Valve torque is 12 Nm.",
                vec![Origin::Vector, Origin::Lexical],
            ),
        ]);

        let a = build_prompt("How do I release the valve?", &w, 175);
        let b = build_prompt("How do I release the valve?", &w, 175);
        assert_eq!(a, b);
    }

    #[test]
    fn prompt_carries_provenance_and_question() {
        let w = window(vec![(
            "manual.pdf",
            4,
            "Release the valve slowly.",
            vec![Origin::Vector, Origin::Lexical],
        )]);

        let prompt = build_prompt("How do I release the valve?", &w, 175);
        assert!(prompt.contains("QUESTION:\nHow do I release the valve?"));
        assert!(prompt.contains("[1] manual.pdf p.4 [vector+lexical]"));
        assert!(prompt.contains("175 words or fewer"));
    }

    #[test]
    fn empty_window_degrades_but_keeps_question() {
        let prompt = build_prompt("What is chapter 9 about?", &ContextWindow::default(), 175);
        assert!(prompt.contains("No relevant context was found"));
        assert!(prompt.contains("QUESTION:\nWhat is chapter 9 about?"));
    }

    #[test]
    fn oversized_context_is_truncated_on_a_char_boundary() {
        let big = "é".repeat(9_000);
        let w = window(vec![("big.pdf", 1, big.as_str(), vec![Origin::Lexical])]);

        let prompt = build_prompt("q", &w, 175);
        assert!(prompt.contains("… [truncated]"));
        // Well-formed UTF-8 throughout.
        assert!(prompt.chars().count() > 0);
    }
}
