//! Strategic alignment scoring.
//!
//! A theme starts at a neutral baseline and is pushed up or down by the
//! strategy's weighted keywords, then penalised once for touching problems
//! the company has chosen not to solve and rewarded once for touching
//! problems it does solve. The alignment score is combined with the theme's
//! customer signal into a final priority and a recommendation.

use serde::Serialize;
use tracing::debug;

use beacon_core::entities::{ProductStrategy, StrategicKeyword, Theme};
use beacon_core::enums::Recommendation;

use crate::params::{AlignmentParams, RecommendationThresholds};
use crate::recommendation::recommend;
use crate::text::{ThemeText, contains_phrase, normalize};

/// The parts of a theme that alignment scoring reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSignal {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub customer_signal_score: u8,
}

impl From<&Theme> for ThemeSignal {
    fn from(theme: &Theme) -> Self {
        Self {
            title: theme.title.clone(),
            description: theme.description.clone(),
            tags: theme.tags.clone(),
            customer_signal_score: theme.customer_signal_score,
        }
    }
}

/// The parts of a product strategy that alignment scoring reads.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyProfile {
    pub target_customer: String,
    pub problems_solved: Vec<String>,
    pub problems_not_solved: Vec<String>,
    pub keywords: Vec<StrategicKeyword>,
}

impl From<&ProductStrategy> for StrategyProfile {
    fn from(strategy: &ProductStrategy) -> Self {
        Self {
            target_customer: strategy.target_customer.clone(),
            problems_solved: strategy.problems_solved.clone(),
            problems_not_solved: strategy.problems_not_solved.clone(),
            keywords: strategy.strategic_keywords.clone(),
        }
    }
}

/// A strategic keyword found in the theme text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub weight: f64,
    /// Score change actually applied after clamping.
    pub applied: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentOutcome {
    pub alignment_score: u8,
    pub final_priority_score: u8,
    pub recommendation: Recommendation,
    pub reasoning: String,
    pub conflicts: Vec<String>,
    pub opportunities: Vec<String>,
    pub matched_keywords: Vec<KeywordMatch>,
}

/// Round and clamp a score into `0..=100`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// `round(signal × alignment / 100)`.
#[must_use]
pub fn final_priority(signal: u8, alignment: u8) -> u8 {
    to_score(f64::from(signal) * f64::from(alignment) / 100.0)
}

/// Whether a strategy problem statement touches the theme.
///
/// Either the theme text mentions the whole problem phrase, or one of the
/// theme's candidate terms (tags and matched keywords) appears inside it.
fn problem_matches(text: &ThemeText, terms: &[String], problem: &str) -> bool {
    if text.mentions(problem) {
        return true;
    }
    let problem_tokens = normalize(problem);
    terms.iter().any(|term| contains_phrase(&problem_tokens, term))
}

/// Score a theme against a strategy.
#[must_use]
pub fn score_alignment(
    theme: &ThemeSignal,
    strategy: &StrategyProfile,
    params: &AlignmentParams,
    thresholds: &RecommendationThresholds,
) -> AlignmentOutcome {
    let text = ThemeText::new(&theme.title, theme.description.as_deref(), &theme.tags);
    let mut score = clamp_score(params.baseline);
    let mut reasons = vec![format!(
        "Started from a neutral baseline of {}.",
        to_score(params.baseline)
    )];
    let mut conflicts = Vec::new();
    let mut opportunities = Vec::new();
    let mut matched = Vec::new();

    for keyword in &strategy.keywords {
        if !text.mentions(&keyword.keyword) {
            continue;
        }
        let before = score;
        score = clamp_score(score + keyword.weight * params.keyword_scale);
        matched.push(KeywordMatch {
            keyword: keyword.keyword.clone(),
            weight: keyword.weight,
            applied: score - before,
        });
        if keyword.weight > 0.0 {
            let mut line = format!(
                "Aligns with strategic keyword '{}' ({:+})",
                keyword.keyword, keyword.weight
            );
            if !keyword.reasoning.is_empty() {
                line.push_str(": ");
                line.push_str(&keyword.reasoning);
            }
            opportunities.push(line);
        }
    }

    if !matched.is_empty() {
        let listed: Vec<String> = matched
            .iter()
            .map(|m| format!("'{}' ({:+})", m.keyword, m.weight))
            .collect();
        reasons.push(format!("Matched strategic keywords {}.", listed.join(", ")));
    }

    let mut terms: Vec<String> = theme.tags.clone();
    terms.extend(matched.iter().map(|m| m.keyword.clone()));

    for problem in &strategy.problems_not_solved {
        if problem_matches(&text, &terms, problem) {
            conflicts.push(format!("Conflicts with a problem we do not solve: {problem}"));
        }
    }
    if !conflicts.is_empty() {
        score = clamp_score(score - params.conflict_penalty);
        reasons.push(format!(
            "Touches {} problem(s) outside our strategy, -{}.",
            conflicts.len(),
            params.conflict_penalty
        ));
    }

    let mut solved = 0usize;
    for problem in &strategy.problems_solved {
        if problem_matches(&text, &terms, problem) {
            opportunities.push(format!("Addresses a problem we solve: {problem}"));
            solved += 1;
        }
    }
    if solved > 0 {
        reasons.push(format!("Addresses {solved} problem(s) we solve."));
    }
    if !opportunities.is_empty() {
        score = clamp_score(score + params.opportunity_bonus);
        reasons.push(format!("Opportunity bonus +{}.", params.opportunity_bonus));
    }

    let alignment_score = to_score(score);
    let final_priority_score = final_priority(theme.customer_signal_score, alignment_score);
    let recommendation = recommend(theme.customer_signal_score, alignment_score, thresholds);
    reasons.push(format!(
        "Alignment {alignment_score} with customer signal {} gives priority {final_priority_score}: {recommendation}.",
        theme.customer_signal_score
    ));

    debug!(
        title = %theme.title,
        alignment_score,
        final_priority_score,
        %recommendation,
        "scored theme alignment"
    );

    AlignmentOutcome {
        alignment_score,
        final_priority_score,
        recommendation,
        reasoning: reasons.join(" "),
        conflicts,
        opportunities,
        matched_keywords: matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn theme(title: &str, tags: &[&str], signal: u8) -> ThemeSignal {
        ThemeSignal {
            title: title.into(),
            description: None,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            customer_signal_score: signal,
        }
    }

    fn keyword(kw: &str, weight: f64) -> StrategicKeyword {
        StrategicKeyword {
            keyword: kw.into(),
            weight,
            reasoning: String::new(),
        }
    }

    fn strategy() -> StrategyProfile {
        StrategyProfile {
            target_customer: "Finance teams at mid-market SaaS companies".into(),
            problems_solved: vec!["month-end close".into()],
            problems_not_solved: vec!["payroll processing".into()],
            keywords: vec![],
        }
    }

    fn score(theme: &ThemeSignal, strategy: &StrategyProfile) -> AlignmentOutcome {
        score_alignment(
            theme,
            strategy,
            &AlignmentParams::default(),
            &RecommendationThresholds::default(),
        )
    }

    #[test]
    fn no_matches_is_exactly_baseline() {
        let outcome = score(&theme("Dark mode", &["ui"], 40), &strategy());
        assert_eq!(outcome.alignment_score, 50);
        assert!(outcome.conflicts.is_empty());
        assert!(outcome.opportunities.is_empty());
        assert!(outcome.matched_keywords.is_empty());
    }

    #[test]
    fn positive_keyword_raises_score_with_one_opportunity() {
        let mut s = strategy();
        s.keywords.push(StrategicKeyword {
            keyword: "automation".into(),
            weight: 0.6,
            reasoning: "Core bet for 2026".into(),
        });
        let outcome = score(&theme("Invoice automation", &[], 60), &s);
        assert!(outcome.alignment_score > 50);
        assert_eq!(
            outcome.opportunities,
            vec!["Aligns with strategic keyword 'automation' (+0.6): Core bet for 2026".to_string()]
        );
        // 50 + 0.6 × 25 = 65, + 10 bonus
        assert_eq!(outcome.alignment_score, 75);
    }

    #[test]
    fn not_solved_match_lowers_score_with_one_conflict() {
        let outcome = score(&theme("Payroll exports", &["payroll"], 60), &strategy());
        assert!(outcome.alignment_score < 50);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(
            outcome.conflicts[0],
            "Conflicts with a problem we do not solve: payroll processing"
        );
        assert_eq!(outcome.alignment_score, 30);
    }

    #[test]
    fn negative_keyword_lowers_score_without_opportunity() {
        let mut s = strategy();
        s.keywords.push(keyword("gamification", -0.8));
        let outcome = score(&theme("Gamification badges", &[], 60), &s);
        assert_eq!(outcome.alignment_score, 30);
        assert!(outcome.opportunities.is_empty());
        assert!(outcome.reasoning.contains("'gamification' (-0.8)"));
    }

    #[test]
    fn solved_problem_mentioned_in_description() {
        let mut t = theme("Close faster", &[], 80);
        t.description = Some("Customers struggle with month-end close".into());
        let outcome = score(&t, &strategy());
        assert_eq!(
            outcome.opportunities,
            vec!["Addresses a problem we solve: month-end close".to_string()]
        );
        assert_eq!(outcome.alignment_score, 60);
    }

    #[test]
    fn penalty_and_bonus_apply_once() {
        let s = StrategyProfile {
            problems_solved: vec!["reporting".into(), "reporting exports".into()],
            problems_not_solved: vec!["hr reporting".into(), "reporting for payroll".into()],
            ..strategy()
        };
        let outcome = score(&theme("Reporting", &["reporting"], 50), &s);
        assert_eq!(outcome.conflicts.len(), 2);
        assert_eq!(outcome.opportunities.len(), 2);
        // 50 - 20 + 10
        assert_eq!(outcome.alignment_score, 40);
    }

    #[test]
    fn keyword_contributions_are_clamped() {
        let mut s = strategy();
        s.keywords = vec![keyword("sso", 1.0), keyword("saml", 1.0), keyword("okta", 1.0)];
        let outcome = score(&theme("SSO with SAML via Okta", &[], 90), &s);
        assert_eq!(outcome.alignment_score, 100);
        let applied: Vec<f64> = outcome.matched_keywords.iter().map(|m| m.applied).collect();
        assert_eq!(applied, vec![25.0, 25.0, 0.0]);
    }

    #[rstest]
    #[case(0)]
    #[case(33)]
    #[case(67)]
    #[case(92)]
    #[case(100)]
    fn final_is_rounded_product(#[case] signal: u8) {
        let mut s = strategy();
        s.keywords.push(keyword("export", 0.3));
        let outcome = score(&theme("CSV export", &["payroll"], signal), &s);
        let expected =
            (f64::from(signal) * f64::from(outcome.alignment_score) / 100.0).round() as u8;
        assert_eq!(outcome.final_priority_score, expected);
    }

    #[test]
    fn final_priority_rounds_half_up() {
        assert_eq!(final_priority(92, 95), 87);
        assert_eq!(final_priority(50, 1), 1);
        assert_eq!(final_priority(100, 100), 100);
        assert_eq!(final_priority(0, 100), 0);
    }

    #[test]
    fn recommendation_follows_signal_and_alignment() {
        let mut s = strategy();
        s.keywords.push(keyword("close", 1.0));
        let outcome = score(&theme("Faster close", &[], 92), &s);
        assert_eq!(outcome.alignment_score, 85);
        assert_eq!(outcome.recommendation, Recommendation::HighPriority);

        let outcome = score(&theme("Payroll", &["payroll"], 86), &strategy());
        assert_eq!(outcome.alignment_score, 30);
        assert_eq!(outcome.recommendation, Recommendation::ExploreLightweight);
    }
}
