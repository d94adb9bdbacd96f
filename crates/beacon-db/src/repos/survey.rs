//! Survey repository: survey definitions, one-time response links, and
//! public response submission.
//!
//! Link lookup and submission run without a company scope; the company is
//! taken from the survey the link belongs to.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use beacon_core::audit_detail::StatusChangedDetail;
use beacon_core::entities::{Survey, SurveyAnswer, SurveyLink, SurveyQuestion, SurveyResponse};
use beacon_core::enums::{AuditAction, EntityType, FeedbackSource, QuestionKind, SurveyStatus};
use beacon_core::ids::{PREFIX_FEEDBACK, PREFIX_SURVEY, PREFIX_SURVEY_LINK, PREFIX_SURVEY_RESPONSE};
use beacon_core::responses::SurveyLinkResponse;

use crate::error::DatabaseError;
use crate::helpers::{
    days_after, get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_datetime,
    to_json_text,
};
use crate::service::BeaconService;

const SURVEY_COLS: &str = "id, company_id, title, description, questions, status, created_at, updated_at";
const LINK_COLS: &str = "id, survey_id, customer_id, token, url, expires_at, used_at, created_at";
const RESPONSE_COLS: &str = "id, survey_id, link_id, customer_id, answers, feedback_item_id, submitted_at";

/// Random bytes in a link token.
const TOKEN_BYTES: usize = 16;

fn row_to_survey(row: &libsql::Row) -> Result<Survey, DatabaseError> {
    Ok(Survey {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        questions: parse_json(&row.get::<String>(4)?)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

fn row_to_link(row: &libsql::Row) -> Result<SurveyLink, DatabaseError> {
    Ok(SurveyLink {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        customer_id: get_opt_string(row, 2)?,
        token: row.get(3)?,
        url: row.get(4)?,
        expires_at: parse_optional_datetime(get_opt_string(row, 5)?.as_deref())?,
        used_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

fn row_to_response(row: &libsql::Row) -> Result<SurveyResponse, DatabaseError> {
    Ok(SurveyResponse {
        id: row.get(0)?,
        survey_id: row.get(1)?,
        link_id: get_opt_string(row, 2)?,
        customer_id: get_opt_string(row, 3)?,
        answers: parse_json(&row.get::<String>(4)?)?,
        feedback_item_id: get_opt_string(row, 5)?,
        submitted_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

fn new_token() -> Result<String, DatabaseError> {
    let mut buf = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut buf).map_err(|e| anyhow::anyhow!("token generation failed: {e}"))?;
    Ok(buf.iter().map(|b| format!("{b:02x}")).collect())
}

/// Input for a new survey. Surveys start as drafts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSurvey {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<SurveyQuestion>,
}

impl NewSurvey {
    fn validate(&self) -> Result<(), DatabaseError> {
        if self.title.trim().is_empty() {
            return Err(DatabaseError::Validation("survey title must not be empty".into()));
        }
        if self.questions.is_empty() {
            return Err(DatabaseError::Validation("a survey needs at least one question".into()));
        }
        let mut seen = HashSet::new();
        for q in &self.questions {
            if q.id.trim().is_empty() || q.prompt.trim().is_empty() {
                return Err(DatabaseError::Validation("question id and prompt are required".into()));
            }
            if !seen.insert(q.id.as_str()) {
                return Err(DatabaseError::Validation(format!("duplicate question id '{}'", q.id)));
            }
        }
        Ok(())
    }
}

/// Whether an answer value counts as a response to its question.
fn is_answered(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn check_answer(question: &SurveyQuestion, value: &serde_json::Value) -> Result<(), DatabaseError> {
    let in_range = |min: i64, max: i64| value.as_i64().is_some_and(|v| (min..=max).contains(&v));
    let ok = match question.kind {
        QuestionKind::Rating => in_range(1, 5),
        QuestionKind::Nps => in_range(0, 10),
        QuestionKind::Text => value.is_string(),
    };
    if ok {
        Ok(())
    } else {
        let expected = match question.kind {
            QuestionKind::Rating => "an integer from 1 to 5",
            QuestionKind::Nps => "an integer from 0 to 10",
            QuestionKind::Text => "a string",
        };
        Err(DatabaseError::Validation(format!(
            "answer to '{}' must be {expected}",
            question.id
        )))
    }
}

/// Validate answers against the survey's questions and drop empty ones.
fn validate_answers(survey: &Survey, answers: &[SurveyAnswer]) -> Result<Vec<SurveyAnswer>, DatabaseError> {
    let questions: HashMap<&str, &SurveyQuestion> =
        survey.questions.iter().map(|q| (q.id.as_str(), q)).collect();
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(answers.len());

    for answer in answers {
        let question = questions.get(answer.question_id.as_str()).ok_or_else(|| {
            DatabaseError::Validation(format!("unknown question '{}'", answer.question_id))
        })?;
        if !seen.insert(answer.question_id.as_str()) {
            return Err(DatabaseError::Validation(format!(
                "question '{}' answered more than once",
                answer.question_id
            )));
        }
        if !is_answered(&answer.value) {
            continue;
        }
        check_answer(question, &answer.value)?;
        kept.push(answer.clone());
    }

    for q in survey.questions.iter().filter(|q| q.required) {
        if !kept.iter().any(|a| a.question_id == q.id) {
            return Err(DatabaseError::Validation(format!(
                "required question '{}' was not answered",
                q.id
            )));
        }
    }
    Ok(kept)
}

/// Free-text answers become the content of one feedback item.
fn feedback_content(survey: &Survey, answers: &[SurveyAnswer]) -> Option<String> {
    let parts: Vec<String> = survey
        .questions
        .iter()
        .filter(|q| q.kind == QuestionKind::Text)
        .filter_map(|q| {
            answers
                .iter()
                .find(|a| a.question_id == q.id)
                .and_then(|a| a.value.as_str())
                .map(|text| format!("{}: {}", q.prompt.trim(), text.trim()))
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Rows written for one submitted response.
struct ResponseRecord<'a> {
    id: String,
    company_id: &'a str,
    survey_id: &'a str,
    link_id: &'a str,
    customer_id: Option<&'a str>,
    answers_json: String,
    /// Feedback item id and content, when any text question was answered.
    feedback: Option<(String, String)>,
    now: DateTime<Utc>,
}

async fn insert_response(tx: &libsql::Transaction, r: &ResponseRecord<'_>) -> Result<(), DatabaseError> {
    let now = r.now.to_rfc3339();
    let claimed = tx
        .execute(
            "UPDATE survey_links SET used_at = ?1 WHERE id = ?2 AND used_at IS NULL",
            libsql::params![now.as_str(), r.link_id],
        )
        .await?;
    if claimed == 0 {
        return Err(DatabaseError::InvalidState("survey link has already been used".into()));
    }

    if let Some((ref feedback_id, ref content)) = r.feedback {
        tx.execute(
            "INSERT INTO feedback_items (id, company_id, customer_id, source, content, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, '[]', ?6)",
            libsql::params![
                feedback_id.as_str(),
                r.company_id,
                r.customer_id,
                FeedbackSource::Survey.as_str(),
                content.as_str(),
                now.as_str()
            ],
        )
        .await?;
    }

    if let Some(customer_id) = r.customer_id {
        tx.execute(
            "UPDATE customers SET last_activity_at = ?1, updated_at = ?1
             WHERE id = ?2 AND company_id = ?3
               AND (last_activity_at IS NULL OR last_activity_at < ?1)",
            libsql::params![now.as_str(), customer_id, r.company_id],
        )
        .await?;
        if r.feedback.is_some() {
            tx.execute(
                "UPDATE customers SET feedback_count = feedback_count + 1 WHERE id = ?1 AND company_id = ?2",
                [customer_id, r.company_id],
            )
            .await?;
        }
    }

    tx.execute(
        &format!("INSERT INTO survey_responses ({RESPONSE_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        libsql::params![
            r.id.as_str(),
            r.survey_id,
            r.link_id,
            r.customer_id,
            r.answers_json.as_str(),
            r.feedback.as_ref().map(|(id, _)| id.as_str()),
            now.as_str()
        ],
    )
    .await?;
    Ok(())
}

fn ensure_usable(link: &SurveyLink, now: DateTime<Utc>) -> Result<(), DatabaseError> {
    if link.used_at.is_some() {
        return Err(DatabaseError::InvalidState("survey link has already been used".into()));
    }
    if !link.is_usable(now) {
        return Err(DatabaseError::InvalidState("survey link has expired".into()));
    }
    Ok(())
}

impl BeaconService {
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an empty title, no questions,
    /// or duplicate question IDs.
    pub async fn create_survey(&self, input: &NewSurvey) -> Result<Survey, DatabaseError> {
        input.validate()?;
        let company_id = self.company_id()?.to_string();
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_SURVEY).await?;
        let title = input.title.trim();
        let questions = to_json_text(&input.questions)?;
        self.db()
            .execute_with(
                &format!(
                    "INSERT INTO surveys ({SURVEY_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, 'draft', ?6, ?6)"
                ),
                || {
                    libsql::params![
                        id.as_str(),
                        company_id.as_str(),
                        title,
                        input.description.as_deref(),
                        questions.as_str(),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;
        self.audit_simple(EntityType::Survey, &id, AuditAction::Created)
            .await?;

        Ok(Survey {
            id,
            company_id,
            title: title.to_string(),
            description: input.description.clone(),
            questions: input.questions.clone(),
            status: SurveyStatus::Draft,
            created_at: now,
            updated_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the survey is not in the scoped company.
    pub async fn get_survey(&self, id: &str) -> Result<Survey, DatabaseError> {
        let company_id = self.company_id()?;
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SURVEY_COLS} FROM surveys WHERE id = ?1 AND company_id = ?2"),
                || [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("survey", id))?;
        row_to_survey(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_surveys(&self, status: Option<SurveyStatus>) -> Result<Vec<Survey>, DatabaseError> {
        let mut params: Vec<libsql::Value> = vec![self.company_id()?.into()];
        let mut sql = format!("SELECT {SURVEY_COLS} FROM surveys WHERE company_id = ?1");
        if let Some(status) = status {
            params.push(status.as_str().into());
            sql.push_str(" AND status = ?2");
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");
        let mut rows = self
            .db()
            .query_with(&sql, || libsql::params_from_iter(params.clone()))
            .await?;
        let mut surveys = Vec::new();
        while let Some(row) = rows.next().await? {
            surveys.push(row_to_survey(&row)?);
        }
        Ok(surveys)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` for a transition the survey
    /// state machine does not allow.
    pub async fn transition_survey(&self, survey_id: &str, next: SurveyStatus) -> Result<Survey, DatabaseError> {
        let current = self.get_survey(survey_id).await?;
        if !current.status.can_transition_to(next) {
            return Err(DatabaseError::InvalidState(format!(
                "cannot move survey from {} to {next}",
                current.status
            )));
        }
        let company_id = self.company_id()?;
        let now = Utc::now();
        self.db()
            .execute_with(
                "UPDATE surveys SET status = ?1, updated_at = ?2 WHERE id = ?3 AND company_id = ?4",
                || libsql::params![next.as_str(), now.to_rfc3339(), survey_id, company_id],
            )
            .await?;
        self.audit_detail(
            EntityType::Survey,
            survey_id,
            AuditAction::StatusChanged,
            &StatusChangedDetail {
                from: current.status.to_string(),
                to: next.to_string(),
                reason: None,
            },
        )
        .await?;
        Ok(Survey {
            status: next,
            updated_at: now,
            ..current
        })
    }

    /// Issue a one-time response link, optionally tied to a customer.
    ///
    /// The URL is `{public_base_url}/surveys/{token}` and the link expires
    /// after the configured number of days.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` for a closed survey or
    /// `DatabaseError::NotFound` for an unknown survey or customer.
    pub async fn create_survey_link(
        &self,
        survey_id: &str,
        customer_id: Option<&str>,
    ) -> Result<SurveyLinkResponse, DatabaseError> {
        let survey = self.get_survey(survey_id).await?;
        if survey.status == SurveyStatus::Closed {
            return Err(DatabaseError::InvalidState(format!("survey {survey_id} is closed")));
        }
        if let Some(customer_id) = customer_id {
            self.get_customer(customer_id).await?;
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_SURVEY_LINK).await?;
        let token = new_token()?;
        let url = format!("{}/surveys/{token}", self.settings().public_base_url);
        let expires_at = days_after(
            now,
            self.settings().survey_link_ttl_days,
            "survey_link_ttl_days",
        )?;
        self.db()
            .execute_with(
                &format!("INSERT INTO survey_links ({LINK_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)"),
                || {
                    libsql::params![
                        id.as_str(),
                        survey_id,
                        customer_id,
                        token.as_str(),
                        url.as_str(),
                        expires_at.to_rfc3339(),
                        now.to_rfc3339()
                    ]
                },
            )
            .await?;
        self.audit_simple(EntityType::SurveyLink, &id, AuditAction::Created)
            .await?;

        Ok(SurveyLinkResponse {
            survey,
            link: SurveyLink {
                id,
                survey_id: survey_id.to_string(),
                customer_id: customer_id.map(String::from),
                token,
                url,
                expires_at: Some(expires_at),
                used_at: None,
                created_at: now,
            },
        })
    }

    /// Look up a link by its token. Needs no company scope.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_link_by_token(&self, token: &str) -> Result<Option<SurveyLink>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {LINK_COLS} FROM survey_links WHERE token = ?1"),
                || [token],
            )
            .await?;
        rows.next().await?.map(|row| row_to_link(&row)).transpose()
    }

    /// Resolve a token to its link and survey, checking both can take a response.
    async fn open_link(&self, token: &str) -> Result<(SurveyLink, Survey), DatabaseError> {
        let link = self
            .find_link_by_token(token)
            .await?
            .ok_or_else(|| DatabaseError::not_found("survey link", token))?;
        ensure_usable(&link, Utc::now())?;

        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {SURVEY_COLS} FROM surveys WHERE id = ?1"),
                || [link.survey_id.as_str()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("survey", &link.survey_id))?;
        let survey = row_to_survey(&row)?;
        drop(rows);

        if survey.status != SurveyStatus::Active {
            return Err(DatabaseError::InvalidState(format!(
                "survey is {} and not accepting responses",
                survey.status
            )));
        }
        Ok((link, survey))
    }

    /// The survey a respondent is about to answer.
    ///
    /// # Errors
    ///
    /// Same link and survey checks as [`Self::submit_survey_response`].
    pub async fn survey_for_token(&self, token: &str) -> Result<Survey, DatabaseError> {
        self.open_link(token).await.map(|(_, survey)| survey)
    }

    /// Record a public response through a one-time link.
    ///
    /// Text answers are stored as a `survey` feedback item attributed to the
    /// link's customer. Claiming the link and every row written for the
    /// response commit together, so a failed write leaves the link usable
    /// and a second submission with the same token fails.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown token,
    /// `DatabaseError::InvalidState` for a used or expired link or a survey
    /// that is not active, and `DatabaseError::Validation` for bad answers.
    pub async fn submit_survey_response(
        &self,
        token: &str,
        answers: &[SurveyAnswer],
    ) -> Result<SurveyResponse, DatabaseError> {
        let (link, survey) = self.open_link(token).await?;
        let answers = validate_answers(&survey, answers)?;

        let feedback = match feedback_content(&survey, &answers) {
            Some(content) => Some((self.db().generate_id(PREFIX_FEEDBACK).await?, content)),
            None => None,
        };
        let record = ResponseRecord {
            id: self.db().generate_id(PREFIX_SURVEY_RESPONSE).await?,
            company_id: &survey.company_id,
            survey_id: &survey.id,
            link_id: &link.id,
            customer_id: link.customer_id.as_deref(),
            answers_json: to_json_text(&answers)?,
            feedback,
            now: Utc::now(),
        };

        let guard = self.db().lock_transaction().await;
        let tx = self.db().conn().transaction().await?;
        match insert_response(&tx, &record).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        }
        drop(guard);

        let scoped = self.for_company(survey.company_id.clone());
        if let Some((ref feedback_id, _)) = record.feedback {
            scoped
                .audit_simple(EntityType::Feedback, feedback_id, AuditAction::Created)
                .await?;
        }
        scoped
            .audit_simple(EntityType::SurveyResponse, &record.id, AuditAction::Created)
            .await?;
        info!(survey_id = %survey.id, response_id = %record.id, "survey response recorded");

        Ok(SurveyResponse {
            id: record.id,
            survey_id: survey.id.clone(),
            link_id: Some(link.id.clone()),
            customer_id: link.customer_id.clone(),
            answers,
            feedback_item_id: record.feedback.map(|(id, _)| id),
            submitted_at: record.now,
        })
    }

    /// Responses to one survey, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the survey is not in the scoped company.
    pub async fn list_survey_responses(
        &self,
        survey_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<SurveyResponse>, DatabaseError> {
        self.get_survey(survey_id).await?;
        let limit = self.limit(limit);
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {RESPONSE_COLS} FROM survey_responses WHERE survey_id = ?1
                     ORDER BY submitted_at DESC, rowid DESC LIMIT {limit}"
                ),
                || [survey_id],
            )
            .await?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next().await? {
            responses.push(row_to_response(&row)?);
        }
        Ok(responses)
    }
}
