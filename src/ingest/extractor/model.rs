// src/ingest/extractor/model.rs
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::Extractor;
use crate::core::LanguageModel;
use crate::ingest::Source;
use crate::types::{CandidateJob, EmploymentType, ExperienceLevel, SalaryPeriod};
use crate::utils::{clean_text, truncate_chars};

const SYSTEM_PROMPT: &str = "You extract job listings from job board pages. \
Reply with a JSON array only, no prose. Each element has: title, company, \
companyWebsite, description, location, employmentType (full-time, part-time, \
contract, internship, freelance), experienceLevel (entry, mid, senior, lead, \
executive), salaryMin, salaryMax, salaryCurrency, salaryPeriod (hourly, monthly, \
yearly), skills (array of strings), applyUrl, postedAt (ISO date). \
Use null for anything the page does not state. Return [] when there are no jobs.";

/// Loose shape of one element in the model reply; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelJob {
    title: Option<Value>,
    company: Option<Value>,
    company_website: Option<Value>,
    description: Option<Value>,
    location: Option<Value>,
    employment_type: Option<Value>,
    experience_level: Option<Value>,
    salary_min: Option<Value>,
    salary_max: Option<Value>,
    salary_currency: Option<Value>,
    salary_period: Option<Value>,
    skills: Option<Value>,
    apply_url: Option<Value>,
    posted_at: Option<Value>,
}

/// Delegates extraction to a language model
pub struct ModelExtractor {
    model: Box<dyn LanguageModel>,
    content_budget: usize,
    array_start: Regex,
}

impl ModelExtractor {
    pub fn new(model: Box<dyn LanguageModel>, content_budget: usize) -> Result<Self> {
        Ok(Self {
            model,
            content_budget,
            array_start: Regex::new(r"\[\s*(\{|\])")?,
        })
    }

    /// Pull the first JSON array of jobs out of free-form model output.
    /// Anything unparseable yields an empty list.
    fn parse_reply(&self, reply: &str, source: &Source) -> Vec<CandidateJob> {
        let Some(start) = self.array_start.find(reply).map(|m| m.start()) else {
            warn!("No JSON array in model reply for {}", source.name);
            return Vec::new();
        };

        let mut stream = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Vec<ModelJob>>();
        let jobs = match stream.next() {
            Some(Ok(jobs)) => jobs,
            Some(Err(e)) => {
                warn!("Malformed model reply for {}: {}", source.name, e);
                return Vec::new();
            }
            None => return Vec::new(),
        };

        jobs.into_iter()
            .map(|job| job.into_candidate(source))
            .filter(CandidateJob::is_complete)
            .collect()
    }
}

#[async_trait]
impl Extractor for ModelExtractor {
    async fn extract(&self, content: &str, source: &Source) -> Result<Vec<CandidateJob>> {
        let excerpt = truncate_chars(content, self.content_budget);
        let user_prompt = format!(
            "Source: {} ({})\nExtract every job listing from this page:\n\n{}",
            source.name, source.url, excerpt
        );

        let reply = self.model.complete(SYSTEM_PROMPT, &user_prompt).await?;
        let candidates = self.parse_reply(&reply, source);

        info!("Model extracted {} jobs from {}", candidates.len(), source.name);
        Ok(candidates)
    }
}

impl ModelJob {
    fn into_candidate(self, source: &Source) -> CandidateJob {
        let title = text(self.title).unwrap_or_default();
        let company = text(self.company).unwrap_or_default();

        let experience_level = text(self.experience_level)
            .and_then(|level| level.parse().ok())
            .or_else(|| Some(ExperienceLevel::from_title(&title)));

        let salary_min = amount(self.salary_min);
        let salary_max = amount(self.salary_max);
        let (salary_min, salary_max) = match (salary_min, salary_max) {
            (Some(min), Some(max)) if min > max => (Some(max), Some(min)),
            pair => pair,
        };
        let has_salary = salary_min.is_some() || salary_max.is_some();

        CandidateJob {
            experience_level,
            company_website: text(self.company_website),
            description: text(self.description),
            location: text(self.location).or_else(|| Some(source.default_location.clone())),
            is_remote: source.remote,
            employment_type: text(self.employment_type).and_then(|t| t.parse::<EmploymentType>().ok()),
            salary_min,
            salary_max,
            salary_currency: text(self.salary_currency)
                .filter(|_| has_salary)
                .map(|c| c.to_uppercase()),
            salary_period: text(self.salary_period)
                .filter(|_| has_salary)
                .and_then(|p| p.parse::<SalaryPeriod>().ok()),
            skills: string_list(self.skills),
            source_url: text(self.apply_url)
                .filter(|url| url.starts_with("http"))
                .or_else(|| Some(source.url.clone())),
            posted_at: text(self.posted_at).and_then(|raw| parse_date(&raw)),
            title,
            company,
        }
    }
}

fn text(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => Some(clean_text(&s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    text.filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

fn amount(value: Option<Value>) -> Option<i64> {
    let amount: Option<i64> = match value? {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
        Value::String(s) => s
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .ok(),
        _ => None,
    };
    amount.filter(|n| *n > 0)
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| text(Some(item)))
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(clean_text)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(user_prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[async_trait]
    impl LanguageModel for std::sync::Arc<FakeModel> {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            self.as_ref().complete(system_prompt, user_prompt).await
        }
    }

    fn source() -> Source {
        Source {
            name: "Remote Board".to_string(),
            url: "https://remoteboard.example".to_string(),
            country: "ZA".to_string(),
            default_location: "Remote - Worldwide".to_string(),
            remote: true,
        }
    }

    fn extractor(reply: &str) -> ModelExtractor {
        ModelExtractor::new(Box::new(FakeModel::new(reply)), 100).unwrap()
    }

    #[tokio::test]
    async fn test_reply_wrapped_in_prose() {
        let reply = r#"Sure! Here are the jobs:
```json
[
  {"title": "Rust Engineer", "company": "Acme", "salaryMin": "150000", "salaryMax": 120000,
   "salaryCurrency": "usd", "salaryPeriod": "yearly", "skills": ["Rust", "Tokio"],
   "employmentType": "Full Time", "postedAt": "2024-05-01"},
  {"title": "Designer", "company": null},
  {"title": "", "company": "Ghost"}
]
```
Let me know if you need more."#;

        let jobs = extractor(reply).extract("page", &source()).await.unwrap();

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.title, "Rust Engineer");
        assert_eq!(job.company, "Acme");
        assert_eq!(job.salary_min, Some(120_000));
        assert_eq!(job.salary_max, Some(150_000));
        assert_eq!(job.salary_currency.as_deref(), Some("USD"));
        assert_eq!(job.salary_period, Some(SalaryPeriod::Yearly));
        assert_eq!(job.employment_type, Some(EmploymentType::FullTime));
        assert_eq!(job.skills, vec!["Rust", "Tokio"]);
        assert!(job.is_remote);
        assert_eq!(job.location.as_deref(), Some("Remote - Worldwide"));
        assert!(job.posted_at.is_some());
    }

    #[tokio::test]
    async fn test_malformed_reply_yields_nothing() {
        for reply in ["I could not find any jobs.", "[{\"title\": \"Broken", "[]"] {
            let jobs = extractor(reply).extract("page", &source()).await.unwrap();
            assert!(jobs.is_empty(), "expected no jobs for {reply:?}");
        }
    }

    #[tokio::test]
    async fn test_content_is_truncated_to_budget() {
        let model = std::sync::Arc::new(FakeModel::new("[]"));
        let extractor = ModelExtractor::new(Box::new(model.clone()), 10).unwrap();

        let page = "x".repeat(500);
        extractor.extract(&page, &source()).await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with(&"x".repeat(10)));
        assert!(!prompts[0].contains(&"x".repeat(11)));
    }

    #[test]
    fn test_salary_fields_dropped_without_amounts() {
        let job = ModelJob {
            title: Some(Value::from("Data Analyst")),
            company: Some(Value::from("Globex")),
            salary_currency: Some(Value::from("EUR")),
            salary_period: Some(Value::from("monthly")),
            ..Default::default()
        };

        let candidate = job.into_candidate(&source());
        assert_eq!(candidate.salary_currency, None);
        assert_eq!(candidate.salary_period, None);
        assert_eq!(candidate.experience_level, Some(ExperienceLevel::Mid));
    }
}
