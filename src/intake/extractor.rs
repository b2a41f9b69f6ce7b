//! Keyword field extraction from free-text utterances.
//!
//! Case-insensitive regex matching against a fixed rule table. Pure: the
//! same utterance always yields the same partial field map, and nothing is
//! fabricated when no rule fires. Within one call, later rules override
//! earlier ones for the same field — rule order is part of the table.

use regex::Regex;
use tracing::debug;

use super::model::{ExtractedFields, FieldName};

/// A single keyword rule: if `regex` matches, `field` is proposed as `value`.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub regex: Regex,
    pub field: FieldName,
    pub value: String,
}

/// Immutable rule table. Built once, injected into the extractor.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    rules: Vec<FieldRule>,
}

impl ExtractionRules {
    /// The default rule table: industry, job-title, timeline, budget-status,
    /// solution-type, and problem-type keywords.
    ///
    /// Negation rules (e.g. "no budget") come after their positive
    /// counterparts so they win on overlap.
    pub fn default_rules() -> Self {
        let table: &[(&str, FieldName, &str)] = &[
            // Industry
            (r"(?i)\b(healthcare|health care|hospital|clinic|medical)\b", FieldName::Industry, "healthcare"),
            (r"(?i)\b(fintech|bank(ing)?|finance|financial services|insurance)\b", FieldName::Industry, "finance"),
            (r"(?i)\b(retail|e-?commerce|online store)\b", FieldName::Industry, "retail"),
            (r"(?i)\b(manufactur(ing|er)|factory|industrial)\b", FieldName::Industry, "manufacturing"),
            (r"(?i)\b(software|tech(nology)? (company|startup)|saas company)\b", FieldName::Industry, "technology"),
            (r"(?i)\b(education|school|university|edtech)\b", FieldName::Industry, "education"),
            (r"(?i)\b(logistics|shipping|supply chain|freight)\b", FieldName::Industry, "logistics"),
            // Job function
            (r"(?i)\b(ceo|chief executive)\b", FieldName::JobFunction, "ceo"),
            (r"(?i)\b(cto|chief technology officer)\b", FieldName::JobFunction, "cto"),
            (r"(?i)\b(cfo|chief financial officer)\b", FieldName::JobFunction, "cfo"),
            (r"(?i)\b(coo|chief operating officer)\b", FieldName::JobFunction, "coo"),
            (r"(?i)\b(vp|vice president)\b", FieldName::JobFunction, "vp"),
            (r"(?i)\bdirector\b", FieldName::JobFunction, "director"),
            (r"(?i)\b(manager|head of)\b", FieldName::JobFunction, "manager"),
            (r"(?i)\b(founder|owner|co-founder)\b", FieldName::JobFunction, "founder"),
            // Problem type
            (r"(?i)\b(grow(th|ing)?|sales pipeline|revenue|lead gen(eration)?|more customers)\b", FieldName::ProblemType, "growth"),
            (r"(?i)\b(efficien(cy|t)|manual process(es)?|automat(e|ion)|too slow|time-?consuming)\b", FieldName::ProblemType, "efficiency"),
            (r"(?i)\b(complian(ce|t)|regulat(ion|ory)|audit)\b", FieldName::ProblemType, "compliance"),
            (r"(?i)\b(cut(ting)? costs?|cost reduction|overspend(ing)?|too expensive)\b", FieldName::ProblemType, "cost_reduction"),
            (r"(?i)\b(hiring|recruit(ing|ment)|talent|staffing|turnover)\b", FieldName::ProblemType, "talent"),
            // Solution type
            (r"(?i)\b(software|platform|tool|saas|app(lication)?)\b", FieldName::SolutionType, "software"),
            (r"(?i)\b(managed service|outsourc(e|ing)|run it for us)\b", FieldName::SolutionType, "managed_service"),
            (r"(?i)\b(consult(ant|ing)?|advisor[sy]?|agency|expert help)\b", FieldName::SolutionType, "consulting"),
            // Timeline
            (r"(?i)\b(asap|immediately|urgent(ly)?|right away|yesterday)\b", FieldName::Timeline, "immediate"),
            (r"(?i)\b(this quarter|next month|within (a|one|two|\d+) months?|few weeks)\b", FieldName::Timeline, "this_quarter"),
            (r"(?i)\b(this year|within (six|6) months|by year.?end|next two quarters)\b", FieldName::Timeline, "this_year"),
            (r"(?i)\b(next year|no rush|eventually|just exploring|down the road)\b", FieldName::Timeline, "exploring"),
            // Budget status — negations last so they override
            (r"(?i)\b(budget (is )?(approved|allocated|in place)|approved (a |the )?budget|signed off|funds? (are )?allocated)\b", FieldName::BudgetStatus, "approved"),
            (r"(?i)\b(budget(ing)? (in|is in) (planning|progress)|working on (a |the )?budget|next fiscal|requesting budget)\b", FieldName::BudgetStatus, "planned"),
            (r"(?i)\b(no budget|don'?t have (a )?budget|budget hasn'?t|without (a )?budget|still justifying)\b", FieldName::BudgetStatus, "none"),
        ];

        let rules = table
            .iter()
            .map(|(pattern, field, value)| FieldRule {
                regex: Regex::new(pattern).unwrap(),
                field: *field,
                value: (*value).to_string(),
            })
            .collect();

        Self { rules }
    }

    /// An empty rule table (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a custom rule. Later rules override earlier ones on overlap.
    pub fn with_rule(
        mut self,
        pattern: &str,
        field: FieldName,
        value: &str,
    ) -> Result<Self, regex::Error> {
        self.rules.push(FieldRule {
            regex: Regex::new(pattern)?,
            field,
            value: value.to_string(),
        });
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Maps free text onto structured qualification fields.
///
/// The trait is the seam for swapping in a model-backed extractor without
/// touching the stepper.
pub trait Extractor: Send + Sync {
    fn extract(&self, utterance: &str) -> ExtractedFields;
}

/// Rule-table extractor.
pub struct KeywordExtractor {
    rules: ExtractionRules,
}

impl KeywordExtractor {
    pub fn new(rules: ExtractionRules) -> Self {
        Self { rules }
    }

    pub fn with_default_rules() -> Self {
        Self::new(ExtractionRules::default_rules())
    }
}

impl Extractor for KeywordExtractor {
    fn extract(&self, utterance: &str) -> ExtractedFields {
        let mut proposed = ExtractedFields::default();
        for rule in self.rules.iter() {
            if rule.regex.is_match(utterance) {
                debug!(field = %rule.field, value = %rule.value, "Extraction rule fired");
                proposed.set(rule.field, rule.value.clone());
            }
        }
        proposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::with_default_rules()
    }

    #[test]
    fn extracts_healthcare_industry() {
        let fields = extractor().extract("We're in healthcare");
        assert_eq!(fields.industry.as_deref(), Some("healthcare"));
    }

    #[test]
    fn extracts_vp_job_function() {
        let fields = extractor().extract("I'm the VP of Operations");
        assert_eq!(fields.job_function.as_deref(), Some("vp"));
    }

    #[test]
    fn no_match_yields_empty_map() {
        let fields = extractor().extract("Hello there, nice to meet you");
        assert!(fields.is_empty());
    }

    #[test]
    fn multiple_fields_from_one_utterance() {
        let fields = extractor().extract(
            "I'm the CTO of a manufacturing company and our manual processes are killing us",
        );
        assert_eq!(fields.job_function.as_deref(), Some("cto"));
        assert_eq!(fields.industry.as_deref(), Some("manufacturing"));
        assert_eq!(fields.problem_type.as_deref(), Some("efficiency"));
    }

    #[test]
    fn later_rule_wins_for_same_field() {
        // Matches both the "approved" and the "no budget" rules; the
        // negation comes later in the table and wins.
        let fields = extractor()
            .extract("The budget is approved for tooling but we have no budget for consultants");
        assert_eq!(fields.budget_status.as_deref(), Some("none"));
    }

    #[test]
    fn timeline_keywords() {
        assert_eq!(
            extractor().extract("We need this urgently").timeline.as_deref(),
            Some("immediate")
        );
        assert_eq!(
            extractor().extract("Hoping to land something this quarter").timeline.as_deref(),
            Some("this_quarter")
        );
        assert_eq!(
            extractor().extract("No rush on our side").timeline.as_deref(),
            Some("exploring")
        );
    }

    #[test]
    fn solution_type_keywords() {
        assert_eq!(
            extractor().extract("Ideally a SaaS platform").solution_type.as_deref(),
            Some("software")
        );
        assert_eq!(
            extractor().extract("We'd rather bring in a consultant").solution_type.as_deref(),
            Some("consulting")
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let fields = extractor().extract("WE ARE IN RETAIL");
        assert_eq!(fields.industry.as_deref(), Some("retail"));
    }

    #[test]
    fn empty_rules_extract_nothing() {
        let extractor = KeywordExtractor::new(ExtractionRules::empty());
        assert!(extractor.extract("We're in healthcare").is_empty());
    }

    #[test]
    fn custom_rule_set() {
        let rules = ExtractionRules::empty()
            .with_rule(r"(?i)\bwidgets\b", FieldName::Industry, "widgets")
            .unwrap();
        let extractor = KeywordExtractor::new(rules);

        let fields = extractor.extract("We make widgets");
        assert_eq!(fields.industry.as_deref(), Some("widgets"));
        assert!(extractor.extract("We make gadgets").is_empty());
    }

    #[test]
    fn custom_rule_overrides_default() {
        let rules = ExtractionRules::default_rules()
            .with_rule(r"(?i)\bhealthcare\b", FieldName::Industry, "health_services")
            .unwrap();
        let extractor = KeywordExtractor::new(rules);

        let fields = extractor.extract("We're in healthcare");
        assert_eq!(fields.industry.as_deref(), Some("health_services"));
    }
}
