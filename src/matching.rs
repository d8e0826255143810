// src/matching.rs
//! Profile to job match score, 0 to 100

use std::collections::HashSet;

use crate::core::database::{JobRecord, ProfileRecord};

const SKILLS_WEIGHT: f64 = 50.0;
const TITLE_WEIGHT: f64 = 25.0;
const LOCATION_WEIGHT: f64 = 15.0;
const EXPERIENCE_WEIGHT: f64 = 10.0;

const TITLE_STOP_WORDS: &[&str] = &["and", "the", "for", "with", "of", "senior", "junior", "lead", "mid"];

pub fn score(profile: &ProfileRecord, job: &JobRecord) -> u8 {
    let total = skills_score(&profile.skill_list(), &job.skill_list())
        + title_score(profile.desired_title.as_deref(), &job.title)
        + location_score(profile.country.as_deref(), job)
        + experience_score(profile, job);

    total.round().clamp(0.0, 100.0) as u8
}

pub fn label(score: u8) -> &'static str {
    match score {
        80..=u8::MAX => "Excellent",
        60..=79 => "Good",
        40..=59 => "Fair",
        _ => "Low",
    }
}

/// Share of the job's skills the profile lists
fn skills_score(profile_skills: &[String], job_skills: &[String]) -> f64 {
    if job_skills.is_empty() {
        return SKILLS_WEIGHT / 2.0;
    }

    let known: HashSet<String> = profile_skills.iter().map(|s| s.trim().to_lowercase()).collect();
    let matched = job_skills
        .iter()
        .filter(|s| known.contains(&s.trim().to_lowercase()))
        .count();

    SKILLS_WEIGHT * matched as f64 / job_skills.len() as f64
}

fn title_score(desired_title: Option<&str>, job_title: &str) -> f64 {
    let Some(desired) = desired_title else {
        return 0.0;
    };

    let wanted = title_tokens(desired);
    if wanted.is_empty() {
        return 0.0;
    }
    let offered = title_tokens(job_title);
    let matched = wanted.intersection(&offered).count();

    TITLE_WEIGHT * matched as f64 / wanted.len() as f64
}

fn title_tokens(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 2 && !TITLE_STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

fn location_score(profile_country: Option<&str>, job: &JobRecord) -> f64 {
    let same_country = profile_country.is_some_and(|c| c.trim().eq_ignore_ascii_case(&job.country));
    if job.is_remote || same_country {
        LOCATION_WEIGHT
    } else {
        0.0
    }
}

fn experience_score(profile: &ProfileRecord, job: &JobRecord) -> f64 {
    match (profile.level(), job.level()) {
        (Some(wanted), Some(offered)) => match wanted.rank().abs_diff(offered.rank()) {
            0 => EXPERIENCE_WEIGHT,
            1 => EXPERIENCE_WEIGHT / 2.0,
            _ => 0.0,
        },
        _ => EXPERIENCE_WEIGHT / 2.0,
    }
}
