//! End-to-end flows through the public `BeaconService` API:
//! survey link → response → analysis → discovery → scoring → review → initiative.

use serde_json::json;

use beacon_core::analysis::{AnalysisResult, Sentiment};
use beacon_core::entities::{StrategicKeyword, SurveyAnswer, SurveyQuestion};
use beacon_core::enums::{
    AuditAction, EntityType, InitiativeStatus, QuestionKind, ReviewDecision, SentimentLabel,
    SurveyStatus, ThemeStatus, Timeline,
};
use beacon_db::error::DatabaseError;
use beacon_db::repos::audit::AuditFilter;
use beacon_db::repos::customer::NewCustomer;
use beacon_db::repos::initiative::NewInitiative;
use beacon_db::repos::strategy::NewStrategy;
use beacon_db::repos::survey::NewSurvey;
use beacon_db::repos::theme::ThemeReview;
use beacon_db::service::{BeaconService, ServiceSettings};

async fn company_service() -> BeaconService {
    let svc = BeaconService::open_local(":memory:", ServiceSettings::default())
        .await
        .unwrap();
    let company = svc.create_company("Acme Analytics").await.unwrap();
    svc.for_company(company.id)
}

fn analysis(score: f64, tags: &[&str]) -> AnalysisResult {
    AnalysisResult {
        summary: "Reporting exports are too slow".into(),
        sentiment: Sentiment {
            score,
            label: SentimentLabel::from_score(score),
        },
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        priority_score: 70,
        cost: None,
    }
}

#[tokio::test]
async fn survey_feedback_becomes_a_roadmap_initiative() {
    let svc = company_service().await;

    let survey = svc
        .create_survey(&NewSurvey {
            title: "Reporting pulse".into(),
            description: None,
            questions: vec![
                SurveyQuestion {
                    id: "nps".into(),
                    prompt: "How likely are you to recommend us?".into(),
                    kind: QuestionKind::Nps,
                    required: true,
                },
                SurveyQuestion {
                    id: "pain".into(),
                    prompt: "What slows you down?".into(),
                    kind: QuestionKind::Text,
                    required: false,
                },
            ],
        })
        .await
        .unwrap();
    svc.transition_survey(&survey.id, SurveyStatus::Active)
        .await
        .unwrap();

    let mut feedback_ids = Vec::new();
    for name in ["Globex", "Initech", "Umbrella"] {
        let customer = svc
            .create_customer(&NewCustomer {
                name: name.into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let link = svc
            .create_survey_link(&survey.id, Some(&customer.id))
            .await
            .unwrap()
            .link;
        let response = svc
            .unscoped()
            .submit_survey_response(
                &link.token,
                &[
                    SurveyAnswer {
                        question_id: "nps".into(),
                        value: json!(4),
                    },
                    SurveyAnswer {
                        question_id: "pain".into(),
                        value: json!("Report exports take minutes"),
                    },
                ],
            )
            .await
            .unwrap();
        feedback_ids.push(response.feedback_item_id.unwrap());
    }

    for id in &feedback_ids {
        svc.apply_analysis(id, &analysis(-0.6, &["reporting", "export"]))
            .await
            .unwrap();
    }

    let discovered = svc.discover_themes().await.unwrap();
    assert_eq!(discovered.themes_created.len(), 1);
    let theme = &discovered.themes_created[0];
    assert_eq!(theme.mention_count, 3);
    assert_eq!(theme.customer_count, 3);

    let err = svc.score_theme(&theme.id).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Scoring(_)));

    svc.create_strategy(&NewStrategy {
        target_customer: "Finance teams".into(),
        problems_solved: vec!["reporting".into()],
        problems_not_solved: vec![],
        strategic_keywords: vec![StrategicKeyword {
            keyword: "reporting".into(),
            weight: 0.6,
            reasoning: "Our core bet".into(),
        }],
    })
    .await
    .unwrap();
    let scored = svc.score_theme(&theme.id).await.unwrap();
    assert!(scored.strategic_alignment_score.unwrap() > 50);

    let err = svc
        .create_initiative(&NewInitiative {
            theme_id: Some(theme.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidState(_)));

    let approved = svc
        .review_theme(
            &theme.id,
            &ThemeReview {
                decision: ReviewDecision::Approve,
                notes: Some("Clear signal".into()),
                declined_reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(approved.status, ThemeStatus::Approved);

    let initiative = svc
        .create_initiative(&NewInitiative {
            theme_id: Some(theme.id.clone()),
            timeline: Timeline::Now,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(initiative.title, theme.title);
    assert_eq!(initiative.priority_score, scored.final_priority_score);
    assert_eq!(initiative.status, InitiativeStatus::Planned);

    let audit = svc
        .query_audit(&AuditFilter {
            entity_type: Some(EntityType::Theme),
            entity_id: Some(theme.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    let actions: Vec<AuditAction> = audit.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::Reviewed, AuditAction::Scored, AuditAction::Created]
    );
}

#[tokio::test]
async fn companies_never_see_each_other() {
    let svc = BeaconService::open_local(":memory:", ServiceSettings::default())
        .await
        .unwrap();
    let a = svc.create_company("A").await.unwrap();
    let b = svc.create_company("B").await.unwrap();
    let svc_a = svc.for_company(a.id);
    let svc_b = svc.for_company(b.id);

    let customer = svc_a
        .create_customer(&NewCustomer {
            name: "Globex".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(svc_b.list_customers(None).await.unwrap().is_empty());
    assert!(matches!(
        svc_b.get_customer(&customer.id).await.unwrap_err(),
        DatabaseError::NotFound { .. }
    ));
    assert!(matches!(
        svc.list_customers(None).await.unwrap_err(),
        DatabaseError::Unscoped
    ));
}
