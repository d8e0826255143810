// src/types/job.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
                match normalized.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => anyhow::bail!("Unknown {}: {}", stringify!($name), s),
                }
            }
        }
    };
}

text_enum!(JobStatus {
    Active => "active",
    Paused => "paused",
    Closed => "closed",
    Draft => "draft",
});

text_enum!(EmploymentType {
    FullTime => "full-time",
    PartTime => "part-time",
    Contract => "contract",
    Internship => "internship",
    Freelance => "freelance",
});

text_enum!(ExperienceLevel {
    Entry => "entry",
    Mid => "mid",
    Senior => "senior",
    Lead => "lead",
    Executive => "executive",
});

text_enum!(SalaryPeriod {
    Hourly => "hourly",
    Monthly => "monthly",
    Yearly => "yearly",
});

impl ExperienceLevel {
    /// Position on the seniority ladder, used for proximity scoring
    pub fn rank(&self) -> u8 {
        match self {
            Self::Entry => 0,
            Self::Mid => 1,
            Self::Senior => 2,
            Self::Lead => 3,
            Self::Executive => 4,
        }
    }

    /// Best-effort level from words in a job title
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        let has = |word: &str| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| token == word)
        };

        if has("chief") || has("vp") || has("director") || has("head") {
            Self::Executive
        } else if has("lead") || has("principal") || has("staff") {
            Self::Lead
        } else if has("senior") || has("sr") {
            Self::Senior
        } else if has("junior") || has("jr") || has("graduate") || has("intern") || has("trainee") {
            Self::Entry
        } else {
            Self::Mid
        }
    }
}

impl EmploymentType {
    /// Best-effort type from free text; full-time when nothing else matches
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("internship") || lower.contains("intern ") {
            Self::Internship
        } else if lower.contains("part-time") || lower.contains("part time") {
            Self::PartTime
        } else if lower.contains("freelance") {
            Self::Freelance
        } else if lower.contains("contract") || lower.contains("fixed-term") {
            Self::Contract
        } else {
            Self::FullTime
        }
    }
}

/// A partially populated listing produced by an extractor, not yet written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateJob {
    pub title: String,
    pub company: String,
    pub company_website: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_remote: bool,
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<SalaryPeriod>,
    pub skills: Vec<String>,
    pub source_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl CandidateJob {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    /// The only validation applied to extracted data
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_text_roundtrip() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), *status);
        }
        assert_eq!("Full Time".parse::<EmploymentType>().unwrap(), EmploymentType::FullTime);
        assert_eq!("part_time".parse::<EmploymentType>().unwrap(), EmploymentType::PartTime);
        assert!("sometimes".parse::<EmploymentType>().is_err());
    }

    #[test]
    fn test_level_from_title() {
        assert_eq!(ExperienceLevel::from_title("Senior Backend Engineer"), ExperienceLevel::Senior);
        assert_eq!(ExperienceLevel::from_title("Sr. Designer"), ExperienceLevel::Senior);
        assert_eq!(ExperienceLevel::from_title("Lead Data Engineer"), ExperienceLevel::Lead);
        assert_eq!(ExperienceLevel::from_title("Junior Developer"), ExperienceLevel::Entry);
        assert_eq!(ExperienceLevel::from_title("Head of Product"), ExperienceLevel::Executive);
        assert_eq!(ExperienceLevel::from_title("Data Analyst"), ExperienceLevel::Mid);
        assert_eq!(ExperienceLevel::from_title("Leading Analyst"), ExperienceLevel::Mid);
    }

    #[test]
    fn test_employment_type_detect() {
        assert_eq!(EmploymentType::detect("6 month contract"), EmploymentType::Contract);
        assert_eq!(EmploymentType::detect("Part-time, remote"), EmploymentType::PartTime);
        assert_eq!(EmploymentType::detect("Remote"), EmploymentType::FullTime);
    }

    #[test]
    fn test_candidate_completeness() {
        assert!(CandidateJob::new("Engineer", "Acme").is_complete());
        assert!(!CandidateJob::new("Engineer", "  ").is_complete());
        assert!(!CandidateJob::new("", "Acme").is_complete());
    }
}
