// Prompt constants and user-message builders for résumé scoring.
// The system messages are the only definition of the reply format the parser expects;
// nothing supplied at run time is ever spliced into them.

use crate::models::document::{Document, JobDescription};

/// System message for single-résumé requests. Reply: `name,score,reason`.
pub const SINGLE_SCORING_SYSTEM: &str = "You are a resume scorer. \
Score each resume based on the provided job description. \
The score is on the scale of 0-100. The score can be in decimal.

IMPORTANT - Your response format must be EXACTLY:
name,score,reason

Where:
- 'name' is ONLY the candidate's name with no other commentary
- 'score' is just the numeric score (e.g., 87.5)
- 'reason' is EXACTLY ONE SHORT SENTENCE explaining the key factor in your decision, without using any commas

Example correct format: \"John Smith,87.5,Strong technical skills that match the job requirements\"
Example incorrect format: \"Good skills in database management John Smith,87.5,Strong skills. Also has experience with React.\"

DO NOT add any commentary, explanations, or notes outside this strict format. \
Keep the reason brief and to the point.";

/// System message for batched requests. Reply: `name,score,reason;name,score,reason;...`.
pub const BATCH_SCORING_SYSTEM: &str = "You are a resume scorer. \
Score each resume based on the provided job description. \
The score is on the scale of 0-100. The score can be in decimal.

You will receive several numbered resumes. Return exactly one record per resume, \
in the same order the resumes are given, with records separated by a semicolon.

IMPORTANT - Your response format must be EXACTLY:
name,score,reason;name,score,reason

Where:
- 'name' is ONLY the candidate's name with no other commentary
- 'score' is just the numeric score (e.g., 87.5)
- 'reason' is EXACTLY ONE SHORT SENTENCE explaining the key factor in your decision, without using any commas or semicolons

Example correct format: \"John Smith,87.5,Strong technical skills;Jane Doe,72,Limited cloud experience\"

DO NOT add any commentary, explanations, numbering or notes outside this strict format.";

/// Builds the user message for a single résumé.
pub fn single_user_message(
    job: &JobDescription,
    document: &Document,
    resume_text: &str,
    additional_criteria: Option<&str>,
) -> String {
    let mut content = format!(
        "Job Description: {}\n\nFilename: {}\nProbable name from filename: {}\n\nResume Text:\n{}",
        job.text(),
        document.filename,
        document.probable_name,
        resume_text
    );
    push_criteria_note(&mut content, additional_criteria, "name,score,reason");
    content
}

/// Builds the user message for a batch, numbering résumés in request order.
pub fn batch_user_message(
    job: &JobDescription,
    items: &[(&Document, &str)],
    additional_criteria: Option<&str>,
) -> String {
    let mut content = format!("Job Description: {}\n", job.text());
    for (index, (document, text)) in items.iter().enumerate() {
        content.push_str(&format!(
            "\n--- Resume {} ---\nFilename: {}\nProbable name from filename: {}\n\nResume Text:\n{}\n",
            index + 1,
            document.filename,
            document.probable_name,
            text
        ));
    }
    content.push_str(&format!(
        "\nReturn exactly {} records separated by semicolons, in the order above.",
        items.len()
    ));
    push_criteria_note(
        &mut content,
        additional_criteria,
        "name,score,reason;name,score,reason",
    );
    content
}

fn push_criteria_note(content: &mut String, criteria: Option<&str>, format_hint: &str) {
    let Some(criteria) = criteria.map(str::trim).filter(|c| !c.is_empty()) else {
        return;
    };
    content.push_str(&format!(
        "\n\nAdditional prioritization note: {criteria}\n\n\
         IMPORTANT: The above is ONLY for consideration in scoring. You must STILL follow the \
         EXACT output format specified in the system instructions:\n\
         \"{format_hint}\" with the name being exactly the candidate's name from the resume.\n"
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobDescription {
        JobDescription::new("Senior Rust Engineer".to_string())
    }

    #[test]
    fn test_single_message_carries_probable_name_and_text() {
        let doc = Document::from_filename("jane_doe_resume.pdf");
        let msg = single_user_message(&job(), &doc, "Rust, Tokio", None);
        assert!(msg.contains("Job Description: Senior Rust Engineer"));
        assert!(msg.contains("Filename: jane_doe_resume.pdf"));
        assert!(msg.contains("Probable name from filename: jane doe"));
        assert!(msg.ends_with("Rust, Tokio"));
        assert!(!msg.contains("Additional prioritization note"));
    }

    #[test]
    fn test_criteria_note_appended_when_present() {
        let doc = Document::from_filename("a.pdf");
        let msg = single_user_message(&job(), &doc, "text", Some("Prioritize NUS grads."));
        assert!(msg.contains("Additional prioritization note: Prioritize NUS grads."));
        assert!(msg.contains("\"name,score,reason\""));
    }

    #[test]
    fn test_blank_criteria_ignored() {
        let doc = Document::from_filename("a.pdf");
        let msg = single_user_message(&job(), &doc, "text", Some("   "));
        assert!(!msg.contains("Additional prioritization note"));
    }

    #[test]
    fn test_batch_message_numbers_resumes_in_order() {
        let a = Document::from_filename("alice.pdf");
        let b = Document::from_filename("bob.pdf");
        let msg = batch_user_message(&job(), &[(&a, "alpha"), (&b, "beta")], None);
        let first = msg.find("--- Resume 1 ---").unwrap();
        let second = msg.find("--- Resume 2 ---").unwrap();
        assert!(first < second);
        assert!(msg[first..second].contains("alice.pdf"));
        assert!(msg[second..].contains("bob.pdf"));
        assert!(msg.contains("Return exactly 2 records"));
    }

    #[test]
    fn test_system_messages_define_wire_format() {
        assert!(SINGLE_SCORING_SYSTEM.contains("name,score,reason"));
        assert!(BATCH_SCORING_SYSTEM.contains("name,score,reason;name,score,reason"));
    }
}
