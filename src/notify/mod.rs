// src/notify/mod.rs
//! Job alert e-mails for opted-in profiles

pub mod mailer;

pub use mailer::{Mailer, OutgoingEmail, ResendMailer};

use futures::future::join_all;
use html_escape::{encode_double_quoted_attribute, encode_safe};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::core::database::{CompanyRepository, JobRecord, JobRepository, ProfileRepository};
use crate::core::Settings;
use crate::error::{IngestError, IngestResult};
use crate::matching;
use crate::types::NotificationSummary;
use crate::utils::clean_text;

pub struct NotificationService<'a> {
    pool: &'a SqlitePool,
    mailer: &'a dyn Mailer,
    site_url: String,
    min_score: u8,
}

impl<'a> NotificationService<'a> {
    pub fn new(pool: &'a SqlitePool, mailer: &'a dyn Mailer, settings: &Settings) -> Self {
        Self {
            pool,
            mailer,
            site_url: settings.site_url.trim_end_matches('/').to_string(),
            min_score: settings.notify_min_score,
        }
    }

    /// Mail every opted-in profile whose match score reaches the threshold.
    /// Sends run concurrently; `notified` counts the ones the mailer accepted.
    pub async fn notify_job(&self, job_id: &str) -> IngestResult<NotificationSummary> {
        let job = JobRepository::new(self.pool)
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("Job {}", job_id)))?;

        let company = CompanyRepository::new(self.pool)
            .find_by_id(&job.company_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_else(|| "a hiring company".to_string());

        let profiles = ProfileRepository::new(self.pool).list_notifiable().await?;
        let emails: Vec<OutgoingEmail> = profiles
            .iter()
            .filter_map(|profile| {
                let score = matching::score(profile, &job);
                (score >= self.min_score).then(|| OutgoingEmail {
                    to: profile.email.clone(),
                    subject: clean_text(&format!("New job match: {} at {}", job.title, company)),
                    html: self.job_alert_html(&job, &company, profile.full_name.as_deref(), score),
                })
            })
            .collect();

        let results = join_all(emails.iter().map(|email| self.mailer.send(email))).await;
        let notified = results
            .iter()
            .zip(&emails)
            .filter(|(result, email)| match result {
                Ok(()) => true,
                Err(e) => {
                    warn!("Alert to {} failed: {:#}", email.to, e);
                    false
                }
            })
            .count();

        info!(
            "Job {} alert: {} of {} matching profiles notified ({} opted in)",
            job.id,
            notified,
            emails.len(),
            profiles.len()
        );

        Ok(NotificationSummary {
            notified,
            total: emails.len(),
        })
    }

    /// One sample alert to `email`; profiles are never read
    pub async fn send_test(&self, email: &str) -> IngestResult<NotificationSummary> {
        let email = email.trim();
        if !email.contains('@') || email.contains(char::is_whitespace) {
            return Err(IngestError::InvalidRequest(format!(
                "Not an e-mail address: {}",
                email
            )));
        }

        let message = OutgoingEmail {
            to: email.to_string(),
            subject: "Test job alert".to_string(),
            html: format!(
                "<h2>Job alerts are working</h2>\
                 <p>This is a test notification. Matching jobs will be sent to this address.</p>\
                 <p><a href=\"{}/jobs\">Browse jobs</a></p>",
                self.site_url
            ),
        };

        self.mailer.send(&message).await?;
        info!("Test alert sent to {}", email);

        Ok(NotificationSummary {
            notified: 1,
            total: 1,
        })
    }

    /// Scraped fields are untrusted; every one is escaped before it lands in the markup
    fn job_alert_html(&self, job: &JobRecord, company: &str, name: Option<&str>, score: u8) -> String {
        let greeting = name
            .map(|n| format!("Hi {},", encode_safe(n)))
            .unwrap_or_else(|| "Hi,".to_string());
        let location = match (&job.location, job.is_remote) {
            (Some(location), _) => location.as_str(),
            (None, true) => "Remote",
            (None, false) => job.country.as_str(),
        };
        let salary = match (job.salary_min, job.salary_max, &job.salary_currency) {
            (Some(min), Some(max), Some(currency)) => format!(
                "<p>Salary: {} {} - {} {}</p>",
                encode_safe(currency),
                min,
                max,
                encode_safe(job.salary_period.as_deref().unwrap_or(""))
            ),
            _ => String::new(),
        };
        let link = format!("{}/jobs/{}", self.site_url, job.id);

        format!(
            "<p>{greeting}</p>\
             <p>A new job matches your profile ({score}% match, {label}).</p>\
             <h2>{title}</h2>\
             <p>{company} · {location}</p>\
             {salary}\
             <p><a href=\"{link}\">View the job</a></p>",
            greeting = greeting,
            score = score,
            label = matching::label(score),
            title = encode_safe(&job.title),
            company = encode_safe(company),
            location = encode_safe(location),
            salary = salary,
            link = encode_double_quoted_attribute(&link),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_manager::test_settings;
    use crate::core::database::{NewJob, NewProfile};
    use crate::core::Database;
    use crate::ingest::resolver::{CompanyDetails, CompanyResolver};
    use crate::types::{ExperienceLevel, JobStatus};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        reject: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            if self.reject.as_deref() == Some(email.to.as_str()) {
                anyhow::bail!("mailbox unavailable");
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    async fn seed_job(db: &Database) -> String {
        seed_job_titled(db, "Acme Corp", "Senior Backend Engineer").await
    }

    async fn seed_job_titled(db: &Database, company: &str, title: &str) -> String {
        let company = CompanyResolver::new(db.pool())
            .resolve(company, None, CompanyDetails::default())
            .await
            .unwrap();

        JobRepository::new(db.pool())
            .insert_if_absent(&NewJob {
                company_id: company.id,
                title: title.to_string(),
                description: "Build the platform".to_string(),
                location: Some("Cape Town".to_string()),
                country: "ZA".to_string(),
                is_remote: false,
                employment_type: "full-time".to_string(),
                experience_level: Some("senior".to_string()),
                salary_min: Some(60000),
                salary_max: Some(80000),
                salary_currency: Some("ZAR".to_string()),
                salary_period: Some("monthly".to_string()),
                skills: vec!["Rust".to_string(), "AWS".to_string()],
                benefits: vec![],
                status: JobStatus::Active,
                source_name: None,
                source_url: None,
                posted_at: Utc::now(),
            })
            .await
            .unwrap()
            .unwrap()
    }

    async fn seed_profile(db: &Database, email: &str, skills: &[&str], opted_in: bool) {
        ProfileRepository::new(db.pool())
            .create(&NewProfile {
                email: email.to_string(),
                full_name: Some("Lerato".to_string()),
                country: Some("ZA".to_string()),
                desired_title: Some("Backend Engineer".to_string()),
                experience_level: Some(ExperienceLevel::Senior),
                skills: skills.iter().map(|s| s.to_string()).collect(),
                email_notifications: opted_in,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_only_matching_opted_in_profiles_are_mailed() {
        let db = Database::in_memory().await.unwrap();
        let job_id = seed_job(&db).await;
        seed_profile(&db, "match@example.com", &["Rust", "AWS"], true).await;
        seed_profile(&db, "quiet@example.com", &["Rust", "AWS"], false).await;

        let other = NewProfile {
            email: "far@example.com".to_string(),
            country: Some("NG".to_string()),
            desired_title: Some("Accountant".to_string()),
            experience_level: Some(ExperienceLevel::Entry),
            skills: vec!["Excel".to_string()],
            email_notifications: true,
            ..Default::default()
        };
        ProfileRepository::new(db.pool()).create(&other).await.unwrap();

        let mailer = RecordingMailer::default();
        let summary = NotificationService::new(db.pool(), &mailer, &test_settings())
            .notify_job(&job_id)
            .await
            .unwrap();

        assert_eq!(summary, NotificationSummary { notified: 1, total: 1 });
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "match@example.com");
        assert!(sent[0].html.contains(&format!("/jobs/{}", job_id)));
        assert!(sent[0].subject.contains("Acme Corp"));
    }

    #[tokio::test]
    async fn test_alert_escapes_scraped_markup() {
        let db = Database::in_memory().await.unwrap();
        let job_id = seed_job_titled(
            &db,
            "Evil & Sons",
            r#"Backend Engineer <a href="https://evil.example">click</a>"#,
        )
        .await;
        seed_profile(&db, "match@example.com", &["Rust", "AWS"], true).await;

        let mailer = RecordingMailer::default();
        NotificationService::new(db.pool(), &mailer, &test_settings())
            .notify_job(&job_id)
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let html = &sent[0].html;
        assert!(!html.contains("<a href=\"https://evil.example\">"));
        assert!(!html.contains("evil.example\""));
        assert!(html.contains("Backend Engineer &lt;a href=&quot;"));
        assert!(html.contains("&gt;click&lt;"));
        assert!(html.contains("Evil &amp; Sons"));
        assert!(html.contains(&format!("/jobs/{}\">View the job", job_id)));
        assert!(!sent[0].subject.contains('\n'));
    }

    #[tokio::test]
    async fn test_failed_sends_are_not_counted() {
        let db = Database::in_memory().await.unwrap();
        let job_id = seed_job(&db).await;
        seed_profile(&db, "a@example.com", &["Rust"], true).await;
        seed_profile(&db, "b@example.com", &["Rust"], true).await;

        let mailer = RecordingMailer {
            reject: Some("b@example.com".to_string()),
            ..Default::default()
        };
        let summary = NotificationService::new(db.pool(), &mailer, &test_settings())
            .notify_job(&job_id)
            .await
            .unwrap();

        assert_eq!(summary, NotificationSummary { notified: 1, total: 2 });
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let mailer = RecordingMailer::default();

        let err = NotificationService::new(db.pool(), &mailer, &test_settings())
            .notify_job("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_test_email_never_reads_profiles() {
        let db = Database::in_memory().await.unwrap();
        sqlx::query("DROP TABLE profiles").execute(db.pool()).await.unwrap();

        let mailer = RecordingMailer::default();
        let summary = NotificationService::new(db.pool(), &mailer, &test_settings())
            .send_test("admin@example.com")
            .await
            .unwrap();

        assert_eq!(summary, NotificationSummary { notified: 1, total: 1 });
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "admin@example.com");
    }

    #[tokio::test]
    async fn test_test_email_rejects_garbage() {
        let db = Database::in_memory().await.unwrap();
        let mailer = RecordingMailer::default();

        let err = NotificationService::new(db.pool(), &mailer, &test_settings())
            .send_test("not an address")
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidRequest(_)));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}
