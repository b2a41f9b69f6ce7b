//! Question catalog for the intake conversation.

use super::model::{FieldName, Step};

/// Opening question asked when a step begins.
pub fn opening_question(step: Step) -> &'static str {
    match step {
        Step::Problem => {
            "Let's start with the problem you're trying to solve. What's the core \
             challenge, what's your role, and what industry is your company in?"
        }
        Step::Solution => {
            "What kind of solution are you looking for — software you run yourselves, \
             a managed service, or outside consulting?"
        }
        Step::Urgency => {
            "What does your timeline look like? Are you hoping to have something in \
             place this quarter, this year, or further out?"
        }
        Step::Budget => {
            "Last one — where does budget stand? Is there an approved budget for this, \
             or is it still being worked out?"
        }
    }
}

/// Clarifying question targeted at a single missing field.
pub fn follow_up_question(field: FieldName) -> &'static str {
    match field {
        FieldName::ProblemType => {
            "Could you tell me a bit more about the problem itself — is it about \
             growth, efficiency, compliance, costs, or hiring?"
        }
        FieldName::JobFunction => "And what's your role at the company?",
        FieldName::Industry => "Which industry is your company in?",
        FieldName::SolutionType => {
            "Are you leaning toward software, a managed service, or consulting help?"
        }
        FieldName::Timeline => "When would you like to have a solution in place?",
        FieldName::BudgetStatus => {
            "Has budget been approved for this, or is it still in planning?"
        }
    }
}

/// Closing message once all four steps are complete.
pub fn completion_message() -> &'static str {
    "That's everything I need — thanks! We're matching you with vendors now and \
     will be in touch shortly."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_questions_are_distinct() {
        let steps = [Step::Problem, Step::Solution, Step::Urgency, Step::Budget];
        for (i, a) in steps.iter().enumerate() {
            assert!(!opening_question(*a).is_empty());
            for b in &steps[i + 1..] {
                assert_ne!(opening_question(*a), opening_question(*b));
            }
        }
    }

    #[test]
    fn follow_ups_mention_their_topic() {
        assert!(follow_up_question(FieldName::Industry).contains("industry"));
        assert!(follow_up_question(FieldName::JobFunction).contains("role"));
        assert!(follow_up_question(FieldName::Timeline).contains("solution in place"));
        assert!(follow_up_question(FieldName::BudgetStatus).contains("budget"));
    }

    #[test]
    fn problem_opening_covers_all_required_fields() {
        let q = opening_question(Step::Problem);
        assert!(q.contains("challenge"));
        assert!(q.contains("role"));
        assert!(q.contains("industry"));
    }
}
