// src/ingest/extractor/heuristic.rs
//! Best-effort pattern matching over scraped markdown

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::Extractor;
use crate::ingest::Source;
use crate::types::{CandidateJob, EmploymentType, ExperienceLevel, SalaryPeriod};
use crate::utils::{capitalize, clean_text, host_of};

/// Lines after a title that may describe it, up to the next title
const WINDOW: usize = 6;

const ROLE_NOUNS: &[&str] = &[
    "developer",
    "engineer",
    "designer",
    "manager",
    "analyst",
    "scientist",
    "architect",
    "consultant",
    "specialist",
    "administrator",
    "lead",
    "writer",
    "marketer",
    "accountant",
    "coordinator",
    "director",
    "officer",
    "technician",
    "representative",
    "executive",
    "strategist",
    "researcher",
    "programmer",
    "tester",
    "intern",
    "partner",
    "editor",
];

const SUBDOMAIN_NOISE: &[&str] = &["www", "careers", "jobs", "boards", "apply", "job", "hire"];
const ATS_HOSTS: &[&str] = &[
    "boards.greenhouse.io",
    "job-boards.greenhouse.io",
    "jobs.lever.co",
    "apply.workable.com",
    "jobs.ashbyhq.com",
];

#[derive(Debug)]
struct TitleLine {
    title: String,
    inline_company: Option<String>,
    link: Option<String>,
}

pub struct HeuristicExtractor {
    skill_keywords: Vec<String>,
    link_re: Regex,
    url_re: Regex,
    company_line_re: Regex,
    company_label_re: Regex,
    at_handle_re: Regex,
    location_re: Regex,
    salary_re: Regex,
    hourly_re: Regex,
    monthly_re: Regex,
    yearly_re: Regex,
}

impl HeuristicExtractor {
    pub fn new(skill_keywords: &[String]) -> Result<Self> {
        const CURRENCY: &str = r"R|\$|USD|ZAR|€|EUR|£|GBP|₦|NGN|KES|GHS";
        const AMOUNT: &str = r"\d{1,3}(?:[,\s]\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?";

        let salary = format!(
            r"(?:^|[\s(:])({c})\s?({a})\s*([kK])?\s*(?:-|–|to)\s*(?:{c})?\s?({a})\s*([kK])?",
            c = CURRENCY,
            a = AMOUNT
        );

        Ok(Self {
            skill_keywords: skill_keywords.to_vec(),
            link_re: Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)")?,
            url_re: Regex::new(r"https?://[^\s)\]]+")?,
            company_line_re: Regex::new(r"(?i)^(?:at\s+|@\s*)(.+)$")?,
            company_label_re: Regex::new(r"(?i)^(?:company|employer)\s*:\s*(.+)$")?,
            at_handle_re: Regex::new(r"@\s?([A-Z][\w&.'-]*(?:\s[A-Z][\w&.'-]*){0,4})")?,
            location_re: Regex::new(r"(?i)^(?:location|📍)\s*:?\s*(.+)$")?,
            salary_re: Regex::new(&salary).context("Invalid salary pattern")?,
            hourly_re: Regex::new(r"(?i)(per hour|/\s?hr\b|/\s?hour|hourly)")?,
            monthly_re: Regex::new(r"(?i)(per month|/\s?month|/\s?mo\b|\bp\.?m\.?\b|monthly)")?,
            yearly_re: Regex::new(r"(?i)(per year|/\s?year|/\s?yr\b|annum|annually|\bp\.?a\.?\b|yearly)")?,
        })
    }

    /// Scan the content for title lines and describe each from the lines below it
    pub fn extract_from_markdown(&self, content: &str, source: &Source) -> Vec<CandidateJob> {
        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let source_host = host_of(&source.url);

        let mut candidates = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            let Some(heading) = self.parse_title_line(lines[i]) else {
                i += 1;
                continue;
            };

            let mut end = i + 1;
            while end < lines.len()
                && end <= i + WINDOW
                && self.parse_title_line(lines[end]).is_none()
            {
                end += 1;
            }

            match self.build_candidate(heading, &lines[i + 1..end], source, source_host.as_deref()) {
                Some(candidate) => candidates.push(candidate),
                None => debug!("Dropped title without company on line {}", i + 1),
            }
            i = end;
        }

        candidates
    }

    fn parse_title_line(&self, raw: &str) -> Option<TitleLine> {
        let heading_like = raw.starts_with('#')
            || (raw.starts_with("**") && raw.ends_with("**"))
            || raw.starts_with('[')
            || raw.starts_with("- [")
            || raw.starts_with("* [");
        if !heading_like {
            return None;
        }

        let link = self
            .link_re
            .captures(raw)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str().to_string());

        let stripped = raw.trim_start_matches(['#', '*', '-', '>', ' ']);
        let text = self.link_re.replace_all(stripped, "$1").replace("**", "");
        let text = clean_text(text.split(" | ").next().unwrap_or(""));

        let (title_part, inline_company) = match split_inline_company(&text) {
            Some((title, company)) => (title, clean_company(&company)),
            None => (text.clone(), None),
        };

        let title = best_title(&title_part)?;
        Some(TitleLine {
            title,
            inline_company,
            link,
        })
    }

    fn build_candidate(
        &self,
        heading: TitleLine,
        window: &[&str],
        source: &Source,
        source_host: Option<&str>,
    ) -> Option<CandidateJob> {
        let company = heading
            .inline_company
            .clone()
            .or_else(|| self.company_from_window(window))
            .or_else(|| self.company_from_links(heading.link.as_deref(), window, source_host))?;

        let window_text = window.join("\n");
        let full_text = format!("{}\n{}", heading.title, window_text);

        let location = window
            .iter()
            .find_map(|line| self.location_re.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| clean_text(&self.link_re.replace_all(m.as_str(), "$1").replace("**", "")))
            .filter(|loc| !loc.is_empty())
            .unwrap_or_else(|| source.default_location.clone());

        let is_remote = source.remote
            || location.to_lowercase().contains("remote")
            || window_text.to_lowercase().contains("remote");

        let mut candidate = CandidateJob::new(heading.title.clone(), company.clone());
        candidate.description = Some(format!(
            "{} at {}. Location: {}. See the original listing for the full description.",
            heading.title, company, location
        ));
        candidate.location = Some(location);
        candidate.is_remote = is_remote;
        candidate.employment_type = Some(EmploymentType::detect(&full_text));
        candidate.experience_level = Some(ExperienceLevel::from_title(&heading.title));
        candidate.skills = self.find_skills(&full_text);
        candidate.source_url = heading.link.or_else(|| Some(source.url.clone()));

        if let Some(salary) = self.parse_salary(&full_text) {
            candidate.salary_min = Some(salary.min);
            candidate.salary_max = Some(salary.max);
            candidate.salary_currency = Some(salary.currency);
            candidate.salary_period = Some(salary.period);
        }

        Some(candidate)
    }

    fn company_from_window(&self, window: &[&str]) -> Option<String> {
        for line in window {
            let plain = self.link_re.replace_all(line, "$1").replace("**", "");
            let plain = plain.trim_start_matches(['-', '*', ' ']);

            if let Some(caps) = self.company_line_re.captures(plain) {
                if let Some(company) = caps.get(1).and_then(|m| clean_company(m.as_str())) {
                    return Some(company);
                }
            }
            if let Some(caps) = self.company_label_re.captures(plain) {
                if let Some(company) = caps.get(1).and_then(|m| clean_company(m.as_str())) {
                    return Some(company);
                }
            }
            if let Some(caps) = self.at_handle_re.captures(plain) {
                if let Some(company) = caps.get(1).and_then(|m| clean_company(m.as_str())) {
                    return Some(company);
                }
            }
        }
        None
    }

    fn company_from_links(
        &self,
        title_link: Option<&str>,
        window: &[&str],
        source_host: Option<&str>,
    ) -> Option<String> {
        let window_urls = window
            .iter()
            .flat_map(|line| self.url_re.find_iter(line).map(|m| m.as_str()));

        title_link
            .into_iter()
            .chain(window_urls)
            .find_map(|url| company_from_url(url, source_host))
    }

    fn find_skills(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.skill_keywords
            .iter()
            .filter(|keyword| contains_word(&lower, &keyword.to_lowercase()))
            .cloned()
            .collect()
    }

    fn parse_salary(&self, text: &str) -> Option<ParsedSalary> {
        let caps = self.salary_re.captures(text)?;
        let currency = normalize_currency(caps.get(1)?.as_str());
        let min_thousands = caps.get(3).is_some();
        let max_thousands = caps.get(5).is_some();

        let mut min = parse_amount(caps.get(2)?.as_str())?;
        let mut max = parse_amount(caps.get(4)?.as_str())?;

        if max_thousands {
            max *= 1000.0;
            // "$120-150k" shares the suffix
            if min_thousands || min < 1000.0 {
                min *= 1000.0;
            }
        } else if min_thousands {
            min *= 1000.0;
        }

        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        if min <= 0.0 {
            return None;
        }

        let tail = &text[caps.get(0)?.end()..];
        let period_hint = tail.lines().next().unwrap_or("");
        let period = if self.hourly_re.is_match(period_hint) {
            SalaryPeriod::Hourly
        } else if self.monthly_re.is_match(period_hint) {
            SalaryPeriod::Monthly
        } else if self.yearly_re.is_match(period_hint) {
            SalaryPeriod::Yearly
        } else {
            default_period(&currency)
        };

        Some(ParsedSalary {
            min: min.round() as i64,
            max: max.round() as i64,
            currency,
            period,
        })
    }
}

#[async_trait]
impl Extractor for HeuristicExtractor {
    async fn extract(&self, content: &str, source: &Source) -> Result<Vec<CandidateJob>> {
        Ok(self.extract_from_markdown(content, source))
    }
}

#[derive(Debug, PartialEq)]
struct ParsedSalary {
    min: i64,
    max: i64,
    currency: String,
    period: SalaryPeriod,
}

fn is_title_shape(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if text.len() < 4 || text.len() > 100 || words.is_empty() || words.len() > 10 {
        return false;
    }
    if !text.chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }

    let last = words[words.len() - 1]
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    let singular = last.strip_suffix('s').unwrap_or(&last);
    ROLE_NOUNS.contains(&last.as_str()) || ROLE_NOUNS.contains(&singular)
}

/// Try the whole text, then without a trailing "(...)", then the part before " - "
fn best_title(text: &str) -> Option<String> {
    let without_paren = match text.rfind(" (") {
        Some(idx) if text.ends_with(')') => text[..idx].trim(),
        _ => text,
    };
    let before_dash = without_paren
        .split(" - ")
        .next()
        .and_then(|part| part.split(" – ").next())
        .unwrap_or(without_paren)
        .trim();

    [text, without_paren, before_dash]
        .into_iter()
        .find(|candidate| is_title_shape(candidate))
        .map(str::to_string)
}

fn split_inline_company(text: &str) -> Option<(String, String)> {
    let (title, company) = text
        .split_once(" at ")
        .or_else(|| text.split_once(" @ "))?;
    Some((title.trim().to_string(), company.trim().to_string()))
}

fn clean_company(raw: &str) -> Option<String> {
    let mut company = raw.replace(['*', '_'], "");
    for separator in [" - ", " – ", " | ", " · ", " • ", " (", ","] {
        if let Some(idx) = company.find(separator) {
            company.truncate(idx);
        }
    }

    let company = clean_text(company.trim_end_matches(['.', ':', ';', ' ']));
    if company.is_empty() || company.len() > 80 {
        None
    } else {
        Some(company)
    }
}

fn company_from_url(url: &str, source_host: Option<&str>) -> Option<String> {
    let host = host_of(url)?;
    if source_host.is_some_and(|source| source == host) {
        return None;
    }

    if ATS_HOSTS.contains(&host.as_str()) {
        let without_scheme = url.trim().split_once("://").map_or(url.trim(), |(_, rest)| rest);
        let path = without_scheme.split_once('/').map_or("", |(_, path)| path);
        let slug = path.split(['/', '?', '#']).next()?;
        return (!slug.is_empty()).then(|| capitalize(&slug.replace('-', " ")));
    }

    host.split('.')
        .find(|label| !SUBDOMAIN_NOISE.contains(label))
        .filter(|label| !label.is_empty())
        .map(capitalize)
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(idx, _)| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect::<String>()
        .parse()
        .ok()
}

fn normalize_currency(symbol: &str) -> String {
    match symbol {
        "R" | "ZAR" => "ZAR",
        "$" | "USD" => "USD",
        "€" | "EUR" => "EUR",
        "£" | "GBP" => "GBP",
        "₦" | "NGN" => "NGN",
        other => other,
    }
    .to_string()
}

/// Local African listings quote monthly pay, international ones yearly
fn default_period(currency: &str) -> SalaryPeriod {
    match currency {
        "ZAR" | "NGN" | "KES" | "GHS" | "BWP" => SalaryPeriod::Monthly,
        _ => SalaryPeriod::Yearly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_source() -> Source {
        Source {
            name: "Remote Board".to_string(),
            url: "https://remoteboard.example/jobs".to_string(),
            country: "ZA".to_string(),
            default_location: "Remote - Worldwide".to_string(),
            remote: true,
        }
    }

    fn local_source() -> Source {
        Source {
            name: "Local Board".to_string(),
            url: "https://www.localboard.co.za/jobs".to_string(),
            country: "ZA".to_string(),
            default_location: "South Africa".to_string(),
            remote: false,
        }
    }

    fn extractor() -> HeuristicExtractor {
        let skills = ["Rust", "Go", "C#", "Node.js", "AWS", "React"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        HeuristicExtractor::new(&skills).unwrap()
    }

    #[test]
    fn test_heading_followed_by_at_company() {
        let content = "# Remote jobs\n\n## Senior Backend Engineer\nat Acme Corp\n";
        let jobs = extractor().extract_from_markdown(content, &remote_source());

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.title, "Senior Backend Engineer");
        assert_eq!(job.company, "Acme Corp");
        assert!(job.is_remote);
        assert_eq!(job.location.as_deref(), Some("Remote - Worldwide"));
        assert_eq!(job.salary_min, None);
        assert_eq!(job.salary_max, None);
        assert_eq!(job.salary_currency, None);
        assert_eq!(job.salary_period, None);
        assert_eq!(job.experience_level, Some(ExperienceLevel::Senior));
        assert!(job.description.as_deref().unwrap().contains("Acme Corp"));
    }

    #[test]
    fn test_title_without_company_is_dropped() {
        let content = "## Frontend Developer\nGreat team, great perks\n## Data Analyst\n@Globex";
        let jobs = extractor().extract_from_markdown(content, &remote_source());

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Data Analyst");
        assert_eq!(jobs[0].company, "Globex");
    }

    #[test]
    fn test_non_title_headings_are_ignored() {
        let content = "## About us\nat Acme\n## Benefits\n- Medical aid";
        assert!(extractor().extract_from_markdown(content, &remote_source()).is_empty());
    }

    #[test]
    fn test_inline_company_link_and_location() {
        let content = "### [Platform Engineer at Initech](https://initech.com/jobs/42)\n\
                       Location: Cape Town, South Africa\n\
                       We use Rust, AWS and C# daily. Go is a plus.";
        let jobs = extractor().extract_from_markdown(content, &local_source());

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.title, "Platform Engineer");
        assert_eq!(job.company, "Initech");
        assert_eq!(job.location.as_deref(), Some("Cape Town, South Africa"));
        assert!(!job.is_remote);
        assert_eq!(job.source_url.as_deref(), Some("https://initech.com/jobs/42"));
        assert_eq!(job.skills, vec!["Rust", "Go", "C#", "AWS"]);
    }

    #[test]
    fn test_company_from_link_host() {
        let content = "## [Product Designer](https://careers.hooli.com/design/1)\nFull remote";
        let jobs = extractor().extract_from_markdown(content, &remote_source());

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Hooli");
    }

    #[test]
    fn test_company_from_ats_link() {
        let content = "## [QA Engineer](https://boards.greenhouse.io/umbrella-corp/jobs/9)";
        let jobs = extractor().extract_from_markdown(content, &remote_source());
        assert_eq!(jobs[0].company, "Umbrella corp");
    }

    #[test]
    fn test_company_from_ats_link_with_mixed_case_host() {
        let content = "## [QA Engineer](https://Boards.Greenhouse.io/umbrella-corp/jobs/9)";
        let jobs = extractor().extract_from_markdown(content, &remote_source());

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Umbrella corp");
    }

    #[test]
    fn test_source_host_is_not_a_company() {
        let content = "## [Data Engineer](https://remoteboard.example/jobs/7)";
        assert!(extractor().extract_from_markdown(content, &remote_source()).is_empty());
    }

    #[test]
    fn test_salary_ranges() {
        let ex = extractor();

        let usd = ex.parse_salary("Pay: $120k - $150k per year").unwrap();
        assert_eq!((usd.min, usd.max), (120_000, 150_000));
        assert_eq!(usd.currency, "USD");
        assert_eq!(usd.period, SalaryPeriod::Yearly);

        let shared_suffix = ex.parse_salary("$90-110k").unwrap();
        assert_eq!((shared_suffix.min, shared_suffix.max), (90_000, 110_000));

        let zar = ex.parse_salary("Salary: R35 000 - R45 000").unwrap();
        assert_eq!((zar.min, zar.max), (35_000, 45_000));
        assert_eq!(zar.currency, "ZAR");
        assert_eq!(zar.period, SalaryPeriod::Monthly);

        let hourly = ex.parse_salary("USD 40 to 55 /hr").unwrap();
        assert_eq!(hourly.period, SalaryPeriod::Hourly);

        assert!(ex.parse_salary("Founded 2010 - 2015").is_none());
        assert!(ex.parse_salary("for 20 - 30 people").is_none());
    }

    #[test]
    fn test_title_shapes() {
        assert!(is_title_shape("Senior Backend Engineer"));
        assert!(is_title_shape("Product Managers"));
        assert!(!is_title_shape("senior backend engineer"));
        assert!(!is_title_shape("Engineering culture"));
        assert_eq!(
            best_title("Backend Developer (Remote)").as_deref(),
            Some("Backend Developer")
        );
        assert_eq!(
            best_title("Backend Developer - Europe only").as_deref(),
            Some("Backend Developer")
        );
    }

    #[test]
    fn test_contains_word_respects_boundaries() {
        assert!(contains_word("we love go and rust", "go"));
        assert!(!contains_word("google cloud", "go"));
        assert!(contains_word("c# and .net", "c#"));
        assert!(contains_word("node.js, react", "node.js"));
    }
}
