//! Interactive collection of missing information.
//!
//! Presents clarifying questions through an injectable, blocking input
//! channel, extracts structured values from free-text answers, and
//! retries invalid input up to a bound. A question whose attempts are
//! exhausted is abandoned — the field simply stays unknown and the
//! pipeline degrades gracefully.

use std::io::Write;

use regex::Regex;

use super::report::{CollectedInfo, Question, RequiredField};

/// Blocking user-input channel.
///
/// May be backed by a terminal, a message exchanged over a live
/// connection, or a test double. The collector tolerates the call
/// blocking indefinitely; timeouts are the caller's concern.
pub trait UserInput: Send + Sync {
    /// Presents `prompt` and returns the user's response.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the channel is unavailable; the
    /// collector treats this like an empty answer.
    fn ask(&self, prompt: &str) -> std::io::Result<String>;
}

/// Terminal-backed input: prints the prompt to stdout and reads one
/// line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinInput;

impl UserInput for StdinInput {
    fn ask(&self, prompt: &str) -> std::io::Result<String> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "\n[Orchestrator] {prompt}")?;
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line)
    }
}

impl<F> UserInput for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn ask(&self, prompt: &str) -> std::io::Result<String> {
        Ok(self(prompt))
    }
}

/// Attempt state for one question, tracked alongside it rather than
/// grafted onto the question itself.
struct QuestionAttempt<'a> {
    question: &'a Question,
    attempts: u32,
}

/// Collects answers for the given questions (already sorted by
/// priority), allowing `max_attempts` tries per question.
///
/// Returns whatever subset of fields was successfully collected; an
/// empty result is valid, not an error.
#[must_use]
pub fn collect(
    questions: &[Question],
    input: &dyn UserInput,
    max_attempts: u32,
) -> CollectedInfo {
    let mut collected = CollectedInfo::default();

    for question in questions {
        let mut state = QuestionAttempt {
            question,
            attempts: 0,
        };

        while state.attempts < max_attempts {
            let response = match input.ask(&state.question.question) {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "input channel failed");
                    String::new()
                }
            };

            if response.is_empty() {
                state.attempts += 1;
                tracing::info!(
                    field = %state.question.field,
                    attempt = state.attempts,
                    max_attempts,
                    "no input provided"
                );
                continue;
            }

            match extract(&state.question.field, &response) {
                Some(value) => {
                    apply(&mut collected, &state.question.field, value);
                    break;
                }
                None => {
                    state.attempts += 1;
                    tracing::info!(
                        field = %state.question.field,
                        attempt = state.attempts,
                        max_attempts,
                        "could not extract a valid value"
                    );
                }
            }
        }

        if state.attempts >= max_attempts {
            tracing::warn!(
                field = %state.question.field,
                "skipping field after {max_attempts} failed attempts"
            );
        }
    }

    collected
}

/// Extracted value for one field.
enum Extracted {
    OrderId(i64),
    Email(String),
    Verbatim(String),
}

/// Extracts a structured value from a free-text answer.
///
/// OrderID takes the first run of digits; Email takes the first
/// email-shaped substring; anything else is taken verbatim.
fn extract(field: &RequiredField, response: &str) -> Option<Extracted> {
    match field {
        RequiredField::OrderId => Regex::new(r"(\d+)")
            .ok()
            .and_then(|re| re.find(response))
            .and_then(|m| m.as_str().parse().ok())
            .map(Extracted::OrderId),
        RequiredField::Email => Regex::new(r"[\w.\-]+@[\w.\-]+\.\w+")
            .ok()
            .and_then(|re| re.find(response))
            .map(|m| Extracted::Email(m.as_str().to_string())),
        RequiredField::Other(_) => Some(Extracted::Verbatim(response.to_string())),
    }
}

fn apply(collected: &mut CollectedInfo, field: &RequiredField, value: Extracted) {
    match value {
        Extracted::OrderId(id) => collected.order_id = Some(id),
        Extracted::Email(email) => collected.email = Some(email),
        Extracted::Verbatim(text) => {
            collected
                .extra
                .insert(field.as_str().to_lowercase(), text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn order_id_question() -> Question {
        Question {
            field: RequiredField::OrderId,
            question: "Could you please provide your Order ID?".to_string(),
            reason: "test".to_string(),
            priority: 1,
        }
    }

    fn email_question() -> Question {
        Question {
            field: RequiredField::Email,
            question: "Could you please provide your email address?".to_string(),
            reason: "test".to_string(),
            priority: 1,
        }
    }

    /// Input double that replays canned answers in order.
    struct Scripted {
        answers: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(answers: &[&str]) -> Self {
            let mut queued: Vec<String> = answers.iter().map(ToString::to_string).collect();
            queued.reverse();
            Self {
                answers: Mutex::new(queued),
            }
        }
    }

    impl UserInput for Scripted {
        fn ask(&self, _prompt: &str) -> std::io::Result<String> {
            let mut answers = self
                .answers
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Ok(answers.pop().unwrap_or_default())
        }
    }

    #[test]
    fn test_order_id_extracted_from_digits() {
        let input = Scripted::new(&["my order is number 42, thanks"]);
        let collected = collect(&[order_id_question()], &input, 3);
        assert_eq!(collected.order_id, Some(42));
    }

    #[test]
    fn test_email_extracted_from_sentence() {
        let input = Scripted::new(&["sure, it's alice@example.com!"]);
        let collected = collect(&[email_question()], &input, 3);
        assert_eq!(collected.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_retries_then_succeeds() {
        let input = Scripted::new(&["no idea", "hold on", "it's 7"]);
        let collected = collect(&[order_id_question()], &input, 3);
        assert_eq!(collected.order_id, Some(7));
    }

    #[test]
    fn test_field_abandoned_after_max_attempts() {
        let input = Scripted::new(&["nope", "still no", "sorry"]);
        let collected = collect(&[order_id_question()], &input, 3);
        assert!(collected.order_id.is_none());
        assert!(collected.is_empty());
    }

    #[test]
    fn test_abandoned_field_does_not_block_next_question() {
        let input = Scripted::new(&["", "", "", "alice@example.com"]);
        let questions = [email_question(), order_id_question()];
        // Email attempts exhaust on empty answers... but the email
        // arrives as the first answer to the OrderID question, which
        // extracts its digits only; nothing is collected for OrderID.
        let collected = collect(&questions, &input, 3);
        assert!(collected.email.is_none());
        assert!(collected.order_id.is_none());
    }

    #[test]
    fn test_questions_processed_in_given_order() {
        let input = Scripted::new(&["alice@example.com", "order 4"]);
        let questions = [email_question(), order_id_question()];
        let collected = collect(&questions, &input, 3);
        assert_eq!(collected.email.as_deref(), Some("alice@example.com"));
        assert_eq!(collected.order_id, Some(4));
    }

    #[test]
    fn test_other_field_taken_verbatim() {
        let question = Question {
            field: RequiredField::Other("Reason".to_string()),
            question: "Why?".to_string(),
            reason: "test".to_string(),
            priority: 1,
        };
        let input = Scripted::new(&["it arrived broken"]);
        let collected = collect(&[question], &input, 3);
        assert_eq!(
            collected.extra.get("reason").map(String::as_str),
            Some("it arrived broken")
        );
    }

    #[test]
    fn test_closure_implements_user_input() {
        let input = |_prompt: &str| "order 9".to_string();
        let collected = collect(&[order_id_question()], &input, 3);
        assert_eq!(collected.order_id, Some(9));
    }
}
