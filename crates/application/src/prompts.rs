//! Prompt templates for the orchestration roles
//!
//! Each stage of the protocol speaks to the models through one of these
//! templates. Verdict-bearing prompts (critique, verification) instruct the
//! model to lead with a fixed sentinel line so the engine can branch on the
//! reply without a second parsing call.

use domain::{EvidenceItem, ModelId};

/// First-line sentinel a clean critique must start with
pub const CRITIQUE_CLEAN_SENTINEL: &str = "NO CRITICAL ERRORS FOUND";

/// First-line sentinel a passing verification must start with
pub const VERIFY_PASS_SENTINEL: &str = "VERIFIED";

/// Constrained generation of a plausible-but-false claim about a topic
pub fn misconception_trap(topic: &str) -> String {
    format!(
        "Topic: {topic}\n\
         Task: Write a single sentence that makes a plausible but FACTUALLY \
         INCORRECT statement about this topic. It should sound like a common \
         misconception. Do not explain."
    )
}

/// Split a query into ordered sub-questions
pub fn decompose(query: &str) -> String {
    format!(
        "Question: {query}\n\n\
         Task: Break this question into the smallest ordered list of \
         sub-questions that together answer it. Output ONLY a numbered list, \
         one sub-question per line. Use a single item if the question is \
         already atomic."
    )
}

/// Draft a candidate answer for one sub-question (creative register)
pub fn hypothesize(sub_question: &str, context: &str, notes: &[String]) -> String {
    let mut prompt = format!(
        "You are the PROVOCATEUR. Your role is to be creative, expansive, and \
         think outside the box.\n\
         Sub-question: {sub_question}\n\
         Context: {context}\n"
    );
    if !notes.is_empty() {
        prompt.push_str("\nFeedback from earlier drafts - address every point:\n");
        for note in notes {
            prompt.push_str("- ");
            prompt.push_str(note);
            prompt.push('\n');
        }
    }
    prompt.push_str(
        "\nTask: Generate a comprehensive draft answer grounded in the \
         context. Explore unconventional angles if relevant; richness over \
         brevity.",
    );
    prompt
}

/// Audit a hypothesis against the evidence (strict register)
pub fn critique(hypothesis: &str, context: &str) -> String {
    format!(
        "You are the CRITIC. Your role is to be a strict auditor and \
         fact-checker.\n\
         Draft Answer: {hypothesis}\n\
         Original Context: {context}\n\n\
         Task: Identify any logical errors, factual inaccuracies, or \
         hallucinations in the draft, comparing it strictly against the \
         context. Be brief and direct; list the errors. If there are none, \
         reply with exactly '{CRITIQUE_CLEAN_SENTINEL}' on the first line."
    )
}

/// Check a hypothesis for factual consistency with the evidence
pub fn verify(hypothesis: &str, context: &str) -> String {
    format!(
        "You are the VERIFIER. Check the answer below strictly against the \
         retrieved evidence.\n\
         Answer: {hypothesis}\n\
         Evidence: {context}\n\n\
         Task: If every factual claim in the answer is consistent with the \
         evidence, reply with exactly '{VERIFY_PASS_SENTINEL}' on the first \
         line. Otherwise state on the first line what is inconsistent."
    )
}

/// Lead-model synthesis of panel candidates into one answer
pub fn synthesize(question: &str, candidates: &[(ModelId, String)]) -> String {
    let mut prompt = format!(
        "Question: {question}\n\n\
         Here are proposed answers from different agents:\n"
    );
    for (model, answer) in candidates {
        prompt.push_str(&format!("[{model}]: {answer}\n\n"));
    }
    prompt.push_str(
        "Task: Synthesize a final, single best answer that incorporates the \
         consensus view.",
    );
    prompt
}

/// One panel model scoring another model's candidate
pub fn peer_vote(question: &str, candidate: &str) -> String {
    format!(
        "Question: {question}\n\
         Candidate answer: {candidate}\n\n\
         Task: Rate how correct and complete the candidate answer is on a \
         scale from 0 to 10. Reply with ONLY the number."
    )
}

/// Arena-mode prompt: the identical RAG-augmented question both models get
pub fn arena(question: &str, context: &str) -> String {
    format!(
        "Use the following context to answer the user's question. If the \
         answer is not in the context, say so.\n\n\
         CONTEXT:\n{context}\n\
         Question: {question}"
    )
}

/// Panel prompt for the high-stakes consensus pass over a verified answer
pub fn high_stakes_review(question: &str, verified_answer: &str) -> String {
    format!(
        "Question: {question}\n\
         A verified draft answer:\n{verified_answer}\n\n\
         Task: Give your own best answer to the question. You may refine, \
         correct, or confirm the draft."
    )
}

/// Format merged evidence into the `---`-separated context block
pub fn evidence_context(items: &[EvidenceItem]) -> String {
    let mut context = String::new();
    for item in items {
        context.push_str("---\n");
        context.push_str(&item.text);
        context.push('\n');
    }
    context
}

/// Whether a critique reply reports no issues
pub fn is_clean_critique(reply: &str) -> bool {
    first_line_matches(reply, CRITIQUE_CLEAN_SENTINEL)
}

/// Whether a verification reply passes
pub fn is_verified(reply: &str) -> bool {
    first_line_matches(reply, VERIFY_PASS_SENTINEL)
}

// Prefix match, not substring: a negated verdict ("NOT VERIFIED: ...")
// names the sentinel without granting it.
fn first_line_matches(reply: &str, sentinel: &str) -> bool {
    reply
        .lines()
        .next()
        .is_some_and(|line| line.trim().to_uppercase().starts_with(sentinel))
}

#[cfg(test)]
mod tests {
    use domain::{EvidenceOrigin, SourceId};

    use super::*;

    #[test]
    fn trap_prompt_names_the_topic() {
        let prompt = misconception_trap("seasons");
        assert!(prompt.starts_with("Topic: seasons"));
        assert!(prompt.contains("FACTUALLY INCORRECT"));
    }

    #[test]
    fn hypothesize_without_notes_has_no_feedback_section() {
        let prompt = hypothesize("why?", "ctx", &[]);
        assert!(!prompt.contains("Feedback from earlier drafts"));
    }

    #[test]
    fn hypothesize_threads_notes() {
        let notes = vec!["cite the tilt angle".to_string()];
        let prompt = hypothesize("why?", "ctx", &notes);
        assert!(prompt.contains("- cite the tilt angle"));
    }

    #[test]
    fn synthesize_lists_candidates_in_order() {
        let candidates = vec![
            (ModelId::new("a"), "answer a".to_string()),
            (ModelId::new("b"), "answer b".to_string()),
        ];
        let prompt = synthesize("q", &candidates);
        let a_pos = prompt.find("[a]:").unwrap();
        let b_pos = prompt.find("[b]:").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn clean_critique_detection() {
        assert!(is_clean_critique("No critical errors found."));
        assert!(is_clean_critique("NO CRITICAL ERRORS FOUND\nmore text"));
        assert!(!is_clean_critique("The draft confuses distance with tilt."));
        // The sentinel only counts on the first line.
        assert!(!is_clean_critique("Errors:\nNo critical errors found"));
        // Naming the sentinel mid-line is not a clean verdict.
        assert!(!is_clean_critique(
            "Two errors, so 'no critical errors found' does not apply."
        ));
    }

    #[test]
    fn verification_detection() {
        assert!(is_verified("VERIFIED"));
        assert!(is_verified("verified - all claims check out"));
        assert!(!is_verified("The claim about the equinox is unsupported."));
    }

    #[test]
    fn negated_verification_is_not_a_pass() {
        assert!(!is_verified("NOT VERIFIED: the equinox claim is unsupported."));
        assert!(!is_verified("Unverified - the tilt angle contradicts the evidence."));
        assert!(!is_verified("The draft cannot be verified.\nVERIFIED"));
    }

    #[test]
    fn evidence_context_separates_passages() {
        let items = vec![
            EvidenceItem::new(SourceId::new("a"), "First.", 0.9, EvidenceOrigin::Direct),
            EvidenceItem::new(
                SourceId::new("b"),
                "Second.",
                0.8,
                EvidenceOrigin::MisconceptionCorrection,
            ),
        ];
        let context = evidence_context(&items);
        assert_eq!(context, "---\nFirst.\n---\nSecond.\n");
    }
}
