//! Request bodies for the mutating profile routes and their field rules.
//!
//! Every rule is declared on the request struct. Failures are reported in the
//! order the fields are listed in each type's `FIELDS`, one entry per failed
//! rule.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::{AppError, FieldError};
use crate::models::profile::{Education, Experience, ProfileFields, SocialLinks};

/// Declared rule order for a request type.
pub trait RuleOrder {
    const FIELDS: &'static [&'static str];
}

/// Runs the declarative rules and converts failures into a 400 response.
pub fn check<T: Validate + RuleOrder>(request: &T) -> Result<(), AppError> {
    match request.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(AppError::Validation(ordered_field_errors(
            &errors,
            T::FIELDS,
        ))),
    }
}

fn ordered_field_errors(errors: &ValidationErrors, order: &[&str]) -> Vec<FieldError> {
    let mut by_field: Vec<_> = errors.field_errors().into_iter().collect();
    by_field.sort_by_key(|(field, _)| {
        let field: &str = field.as_ref();
        order.iter().position(|f| *f == field).unwrap_or(usize::MAX)
    });

    by_field
        .into_iter()
        .flat_map(|(field, errs)| {
            let field: &str = field.as_ref();
            errs.iter()
                .map(|e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::body(field, msg)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Skills arrive either as comma-separated text or as a ready-made list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SkillsInput {
    Text(String),
    List(Vec<String>),
}

impl SkillsInput {
    /// Text is split on commas with each piece trimmed; lists are kept as sent.
    pub fn into_list(self) -> Vec<String> {
        match self {
            SkillsInput::Text(text) => text.split(',').map(|s| s.trim().to_string()).collect(),
            SkillsInput::List(list) => list,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            SkillsInput::Text(text) => text.is_empty(),
            SkillsInput::List(list) => list.is_empty(),
        }
    }
}

fn skills_present(skills: &SkillsInput) -> Result<(), ValidationError> {
    if skills.is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp. Empty means "not given".
fn valid_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || parse_date(value).is_some() {
        return Ok(());
    }
    Err(ValidationError::new("date"))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
}

/// Treats empty strings the same as absent fields.
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// POST /api/profile
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(
        required(message = "Status is required."),
        length(min = 1, message = "Status is required.")
    )]
    pub status: Option<String>,
    #[validate(
        required(message = "Skills is required"),
        custom(function = "skills_present", message = "Skills is required")
    )]
    pub skills: Option<SkillsInput>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub githubusername: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl RuleOrder for UpsertProfileRequest {
    const FIELDS: &'static [&'static str] = &["status", "skills"];
}

impl UpsertProfileRequest {
    /// Builds the partial document: only supplied fields are carried over.
    pub fn into_fields(self) -> ProfileFields {
        ProfileFields {
            company: supplied(self.company),
            website: supplied(self.website),
            location: supplied(self.location),
            status: supplied(self.status),
            skills: self
                .skills
                .filter(|s| !s.is_empty())
                .map(SkillsInput::into_list),
            bio: supplied(self.bio),
            githubusername: supplied(self.githubusername),
            social: SocialLinks {
                youtube: supplied(self.youtube),
                twitter: supplied(self.twitter),
                facebook: supplied(self.facebook),
                linkedin: supplied(self.linkedin),
                instagram: supplied(self.instagram),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PUT /api/profile/experience
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AddExperienceRequest {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, message = "Title is required")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "Company is required"),
        length(min = 1, message = "Company is required")
    )]
    pub company: Option<String>,
    #[validate(
        required(message = "from date is required"),
        length(min = 1, message = "from date is required"),
        custom(function = "valid_date", message = "from must be a valid date")
    )]
    pub from: Option<String>,
    #[validate(custom(function = "valid_date", message = "to must be a valid date"))]
    pub to: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl RuleOrder for AddExperienceRequest {
    const FIELDS: &'static [&'static str] = &["title", "company", "from", "to"];
}

impl AddExperienceRequest {
    /// Builds a new entry with a fresh id. Call after [`check`] has passed.
    pub fn into_entry(self) -> Result<Experience, AppError> {
        let from = self
            .from
            .as_deref()
            .and_then(parse_date)
            .ok_or_else(|| {
                AppError::Validation(vec![FieldError::body("from", "from date is required")])
            })?;

        Ok(Experience {
            id: Uuid::new_v4(),
            title: self.title.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            location: supplied(self.location),
            from,
            to: self.to.as_deref().and_then(parse_date),
            current: self.current,
            description: supplied(self.description),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PUT /api/profile/education
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AddEducationRequest {
    #[validate(
        required(message = "School is required"),
        length(min = 1, message = "School is required")
    )]
    pub school: Option<String>,
    #[validate(
        required(message = "Degree is required"),
        length(min = 1, message = "Degree is required")
    )]
    pub degree: Option<String>,
    #[validate(
        required(message = "Field of study is required"),
        length(min = 1, message = "Field of study is required")
    )]
    pub fieldofstudy: Option<String>,
    #[validate(custom(function = "valid_date", message = "from must be a valid date"))]
    pub from: Option<String>,
    #[validate(custom(function = "valid_date", message = "to must be a valid date"))]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl RuleOrder for AddEducationRequest {
    const FIELDS: &'static [&'static str] = &["school", "degree", "fieldofstudy", "from", "to"];
}

impl AddEducationRequest {
    pub fn into_entry(self) -> Education {
        Education {
            id: Uuid::new_v4(),
            school: self.school.unwrap_or_default(),
            degree: self.degree.unwrap_or_default(),
            fieldofstudy: self.fieldofstudy.unwrap_or_default(),
            from: self.from.as_deref().and_then(parse_date),
            to: self.to.as_deref().and_then(parse_date),
            current: self.current,
            description: supplied(self.description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upsert(body: serde_json::Value) -> UpsertProfileRequest {
        serde_json::from_value(body).unwrap()
    }

    fn params(err: AppError) -> Vec<(String, String)> {
        match err {
            AppError::Validation(errors) => errors.into_iter().map(|e| (e.param, e.msg)).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_skills_text_is_split_and_trimmed() {
        let skills = SkillsInput::Text("a, b ,c".to_string());
        assert_eq!(skills.into_list(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_skills_list_used_as_is() {
        let req = upsert(json!({"status": "Dev", "skills": [" rust ", "go"]}));
        assert_eq!(req.into_fields().skills.unwrap(), vec![" rust ", "go"]);
    }

    #[test]
    fn test_upsert_missing_both_reports_in_rule_order() {
        let err = check(&upsert(json!({}))).unwrap_err();
        assert_eq!(
            params(err),
            vec![
                ("status".to_string(), "Status is required.".to_string()),
                ("skills".to_string(), "Skills is required".to_string()),
            ]
        );
    }

    #[test]
    fn test_upsert_skills_required_alone() {
        let err = check(&upsert(json!({"status": "Developer"}))).unwrap_err();
        assert_eq!(
            params(err),
            vec![("skills".to_string(), "Skills is required".to_string())]
        );
        assert_eq!(
            serde_json::to_value(SkillsInput::List(vec!["rust".into()])).unwrap(),
            json!(["rust"])
        );
    }

    #[test]
    fn test_upsert_empty_values_fail() {
        let err = check(&upsert(json!({"status": "", "skills": []}))).unwrap_err();
        assert_eq!(params(err).len(), 2);
    }

    #[test]
    fn test_upsert_valid() {
        assert!(check(&upsert(json!({"status": "Developer", "skills": "rust"}))).is_ok());
    }

    #[test]
    fn test_into_fields_omits_unsupplied() {
        let fields = upsert(json!({
            "status": "Developer",
            "skills": "rust",
            "company": "",
            "twitter": "https://twitter.com/x"
        }))
        .into_fields();
        assert_eq!(fields.status.as_deref(), Some("Developer"));
        assert_eq!(fields.company, None);
        assert_eq!(fields.website, None);
        assert_eq!(fields.social.twitter.as_deref(), Some("https://twitter.com/x"));
        assert_eq!(fields.social.youtube, None);
    }

    #[test]
    fn test_experience_requires_title_company_from() {
        let req: AddExperienceRequest = serde_json::from_value(json!({"location": "Berlin"})).unwrap();
        let fields: Vec<_> = params(check(&req).unwrap_err())
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(fields, vec!["title", "company", "from"]);
    }

    #[test]
    fn test_experience_rejects_bad_dates() {
        let req: AddExperienceRequest = serde_json::from_value(json!({
            "title": "Engineer",
            "company": "Acme",
            "from": "last spring",
            "to": "2021-13-40"
        }))
        .unwrap();
        let errs = params(check(&req).unwrap_err());
        assert_eq!(
            errs,
            vec![
                ("from".to_string(), "from must be a valid date".to_string()),
                ("to".to_string(), "to must be a valid date".to_string()),
            ]
        );
    }

    #[test]
    fn test_experience_entry_built_with_fresh_id() {
        let req: AddExperienceRequest = serde_json::from_value(json!({
            "title": "Engineer",
            "company": "Acme",
            "from": "2020-03-01T00:00:00.000Z",
            "to": "",
            "current": true
        }))
        .unwrap();
        check(&req).unwrap();
        let entry = req.into_entry().unwrap();
        assert_eq!(entry.from, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(entry.to, None);
        assert!(entry.current);
        assert!(!entry.id.is_nil());
    }

    #[test]
    fn test_education_requires_school_degree_field() {
        let req: AddEducationRequest = serde_json::from_value(json!({"school": "MIT"})).unwrap();
        let errs = params(check(&req).unwrap_err());
        assert_eq!(
            errs,
            vec![
                ("degree".to_string(), "Degree is required".to_string()),
                ("fieldofstudy".to_string(), "Field of study is required".to_string()),
            ]
        );
    }

    #[test]
    fn test_education_from_is_optional() {
        let req: AddEducationRequest = serde_json::from_value(json!({
            "school": "MIT",
            "degree": "BSc",
            "fieldofstudy": "CS"
        }))
        .unwrap();
        check(&req).unwrap();
        assert_eq!(req.into_entry().from, None);
    }
}
