// src/core/database.rs
//! Connection management, schema and repositories for the ingestion tables

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::types::{ExperienceLevel, JobStatus};

// ===== Core Database Connection Management =====

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!("Database connection established: {}", database_path.display());

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory database; a single connection keeps every query on the same store
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                industry TEXT,
                location TEXT,
                country TEXT,
                website TEXT,
                description TEXT,
                logo_url TEXT,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL REFERENCES companies(id),
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                location TEXT,
                country TEXT NOT NULL,
                is_remote BOOLEAN NOT NULL DEFAULT FALSE,
                employment_type TEXT NOT NULL DEFAULT 'full-time' CHECK (
                    employment_type IN ('full-time', 'part-time', 'contract', 'internship', 'freelance')
                ),
                experience_level TEXT CHECK (
                    experience_level IS NULL OR
                    experience_level IN ('entry', 'mid', 'senior', 'lead', 'executive')
                ),
                salary_min INTEGER,
                salary_max INTEGER,
                salary_currency TEXT,
                salary_period TEXT CHECK (
                    salary_period IS NULL OR salary_period IN ('hourly', 'monthly', 'yearly')
                ),
                skills TEXT NOT NULL DEFAULT '[]',
                benefits TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'active' CHECK (
                    status IN ('active', 'paused', 'closed', 'draft')
                ),
                source_name TEXT,
                source_url TEXT,
                posted_at TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                CONSTRAINT jobs_company_title_unique UNIQUE (company_id, title)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT,
                country TEXT,
                desired_title TEXT,
                experience_level TEXT,
                skills TEXT NOT NULL DEFAULT '[]',
                email_notifications BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_country ON jobs(country);")
            .execute(&self.pool)
            .await?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

fn json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

// ===== Company Models =====

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub slug: String,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

pub struct CompanyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CompanyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<CompanyRecord>> {
        let company = sqlx::query_as::<_, CompanyRecord>("SELECT * FROM companies WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(company)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<CompanyRecord>> {
        let company = sqlx::query_as::<_, CompanyRecord>("SELECT * FROM companies WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(company)
    }

    /// Insert unless the slug is taken; returns whether a row was written
    pub async fn insert_if_absent(&self, company: &NewCompany) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO companies
                (id, name, slug, industry, location, country, website, description, logo_url,
                 is_verified, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, TRUE, ?)
            ON CONFLICT(slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.industry)
        .bind(&company.location)
        .bind(&company.country)
        .bind(&company.website)
        .bind(&company.description)
        .bind(&company.logo_url)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to insert company: {}", company.name))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

// ===== Job Models =====

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRecord {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub country: String,
    pub is_remote: bool,
    pub employment_type: String,
    pub experience_level: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub skills: String,
    pub benefits: String,
    pub status: String,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn skill_list(&self) -> Vec<String> {
        json_list(&self.skills)
    }

    pub fn benefit_list(&self) -> Vec<String> {
        json_list(&self.benefits)
    }

    pub fn job_status(&self) -> Option<JobStatus> {
        self.status.parse().ok()
    }

    pub fn level(&self) -> Option<ExperienceLevel> {
        self.experience_level.as_deref().and_then(|l| l.parse().ok())
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub company_id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub country: String,
    pub is_remote: bool,
    pub employment_type: String,
    pub experience_level: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub skills: Vec<String>,
    pub benefits: Vec<String>,
    pub status: JobStatus,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub posted_at: DateTime<Utc>,
}

pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Single insert that leaves an existing (company, title) row untouched.
    /// Returns the new id, or `None` when the pair already exists.
    pub async fn insert_if_absent(&self, job: &NewJob) -> Result<Option<String>> {
        let id = Uuid::new_v4().to_string();
        let skills = serde_json::to_string(&job.skills)?;
        let benefits = serde_json::to_string(&job.benefits)?;

        let result = sqlx::query(
            r#"
            INSERT INTO jobs
                (id, company_id, title, description, location, country, is_remote,
                 employment_type, experience_level, salary_min, salary_max, salary_currency,
                 salary_period, skills, benefits, status, source_name, source_url,
                 posted_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(company_id, title) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(&job.company_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(&job.country)
        .bind(job.is_remote)
        .bind(&job.employment_type)
        .bind(&job.experience_level)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.salary_currency)
        .bind(&job.salary_period)
        .bind(skills)
        .bind(benefits)
        .bind(job.status.as_str())
        .bind(&job.source_name)
        .bind(&job.source_url)
        .bind(job.posted_at)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<JobRecord>> {
        let job = sqlx::query_as::<_, JobRecord>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(job)
    }

    pub async fn exists(&self, company_id: &str, title: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE company_id = ? AND title = ?")
                .bind(company_id)
                .bind(title)
                .fetch_one(self.pool)
                .await?;
        Ok(count > 0)
    }

    pub async fn count_active(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = 'active'")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_active(&self) -> Result<Vec<JobRecord>> {
        let jobs = sqlx::query_as::<_, JobRecord>(
            "SELECT * FROM jobs WHERE status = 'active' ORDER BY posted_at DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(jobs)
    }

    pub async fn list_by_country(&self, country: &str) -> Result<Vec<JobRecord>> {
        let jobs = sqlx::query_as::<_, JobRecord>(
            "SELECT * FROM jobs WHERE country = ? ORDER BY posted_at DESC",
        )
        .bind(country)
        .fetch_all(self.pool)
        .await?;

        Ok(jobs)
    }

    /// Admin status toggle; returns false when the job does not exist
    pub async fn set_status(&self, id: &str, status: JobStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE jobs SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(self.pool)
            .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!("Job {} set to {}", id, status);
        }
        Ok(updated)
    }
}

// ===== Profile Models =====

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileRecord {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub desired_title: Option<String>,
    pub experience_level: Option<String>,
    pub skills: String,
    pub email_notifications: bool,
}

impl ProfileRecord {
    pub fn skill_list(&self) -> Vec<String> {
        json_list(&self.skills)
    }

    pub fn level(&self) -> Option<ExperienceLevel> {
        self.experience_level.as_deref().and_then(|l| l.parse().ok())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub email: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub desired_title: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub skills: Vec<String>,
    pub email_notifications: bool,
}

pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, profile: &NewProfile) -> Result<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO profiles
                (id, email, full_name, country, desired_title, experience_level, skills,
                 email_notifications)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.country)
        .bind(&profile.desired_title)
        .bind(profile.experience_level.map(|l| l.as_str()))
        .bind(serde_json::to_string(&profile.skills)?)
        .bind(profile.email_notifications)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to create profile: {}", profile.email))?;

        Ok(id)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ProfileRecord>> {
        let profile = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT id, email, full_name, country, desired_title, experience_level, skills,
                   email_notifications
            FROM profiles WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// Profiles that opted into job alert e-mails
    pub async fn list_notifiable(&self) -> Result<Vec<ProfileRecord>> {
        let profiles = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT id, email, full_name, country, desired_title, experience_level, skills,
                   email_notifications
            FROM profiles
            WHERE email_notifications = TRUE
            ORDER BY email ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_company(db: &Database, name: &str) -> String {
        let repo = CompanyRepository::new(db.pool());
        let slug = crate::utils::slugify(name);
        repo.insert_if_absent(&NewCompany {
            name: name.to_string(),
            slug: slug.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
        repo.find_by_slug(&slug).await.unwrap().unwrap().id
    }

    fn new_job(company_id: &str, title: &str) -> NewJob {
        NewJob {
            company_id: company_id.to_string(),
            title: title.to_string(),
            description: "Build things".to_string(),
            location: Some("Cape Town".to_string()),
            country: "ZA".to_string(),
            is_remote: false,
            employment_type: "full-time".to_string(),
            experience_level: Some("mid".to_string()),
            salary_min: Some(30000),
            salary_max: Some(45000),
            salary_currency: Some("ZAR".to_string()),
            salary_period: Some("monthly".to_string()),
            skills: vec!["Rust".to_string()],
            benefits: vec!["Medical aid".to_string()],
            status: JobStatus::Active,
            source_name: None,
            source_url: None,
            posted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_company_slug_is_unique() {
        let db = Database::in_memory().await.unwrap();
        let repo = CompanyRepository::new(db.pool());
        let company = NewCompany {
            name: "Acme Corp".to_string(),
            slug: "acme-corp".to_string(),
            ..Default::default()
        };

        assert!(repo.insert_if_absent(&company).await.unwrap());
        assert!(!repo.insert_if_absent(&company).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);

        let stored = repo.find_by_slug("acme-corp").await.unwrap().unwrap();
        assert!(stored.is_active);
        assert!(!stored.is_verified);
    }

    #[tokio::test]
    async fn test_job_insert_ignores_conflict() {
        let db = Database::in_memory().await.unwrap();
        let company_id = seed_company(&db, "Acme Corp").await;
        let repo = JobRepository::new(db.pool());

        let first = repo.insert_if_absent(&new_job(&company_id, "Engineer")).await.unwrap();
        let second = repo.insert_if_absent(&new_job(&company_id, "Engineer")).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert!(repo.exists(&company_id, "Engineer").await.unwrap());
        assert_eq!(repo.count_active().await.unwrap(), 1);

        let stored = repo.find_by_id(&first.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.skill_list(), vec!["Rust".to_string()]);
        assert_eq!(stored.job_status(), Some(JobStatus::Active));
    }

    #[tokio::test]
    async fn test_job_requires_existing_company() {
        let db = Database::in_memory().await.unwrap();
        let repo = JobRepository::new(db.pool());
        assert!(repo.insert_if_absent(&new_job("missing", "Engineer")).await.is_err());
    }

    #[tokio::test]
    async fn test_status_toggle() {
        let db = Database::in_memory().await.unwrap();
        let company_id = seed_company(&db, "Acme Corp").await;
        let repo = JobRepository::new(db.pool());
        let id = repo
            .insert_if_absent(&new_job(&company_id, "Engineer"))
            .await
            .unwrap()
            .unwrap();

        assert!(repo.set_status(&id, JobStatus::Paused).await.unwrap());
        assert_eq!(repo.count_active().await.unwrap(), 0);
        assert!(!repo.set_status("nope", JobStatus::Closed).await.unwrap());
    }

    #[tokio::test]
    async fn test_notifiable_profiles_only() {
        let db = Database::in_memory().await.unwrap();
        let repo = ProfileRepository::new(db.pool());

        repo.create(&NewProfile {
            email: "a@example.com".to_string(),
            email_notifications: true,
            ..Default::default()
        })
        .await
        .unwrap();
        repo.create(&NewProfile {
            email: "b@example.com".to_string(),
            email_notifications: false,
            ..Default::default()
        })
        .await
        .unwrap();

        let profiles = repo.list_notifiable().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].email, "a@example.com");
    }
}
