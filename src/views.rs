//! What each screen shows for each fetch state. Shared by the one-shot
//! commands and the interactive browser.

use crate::api_state::ApiState;
use crate::models::{JobDetails, JobSummary, Profile};

pub const HOME_HEADING: &str = "Find The Job That Fits Your Life";
pub const HOME_DESCRIPTION: &str = "Millions of people are searching for jobs, salary information, \
     company reviews. Find the job that fits your abilities and potential.";

pub const NO_JOBS_HEADING: &str = "No Jobs Found";
pub const NO_JOBS_DESCRIPTION: &str = "We could not find any jobs. Try other filters.";

pub const FAILURE_DESCRIPTION: &str = "We cannot seem to find the page you are looking for.";

pub const NOT_FOUND_HEADING: &str = "Page Not Found";

#[derive(Debug, PartialEq)]
pub enum JobsView<'a> {
    Nothing,
    Loading,
    Jobs(&'a [JobSummary]),
    NoJobs,
    Failure(&'a str),
}

pub fn jobs_view(state: &ApiState<Vec<JobSummary>>) -> JobsView<'_> {
    match state {
        ApiState::Idle => JobsView::Nothing,
        ApiState::Loading => JobsView::Loading,
        ApiState::Success(jobs) if jobs.is_empty() => JobsView::NoJobs,
        ApiState::Success(jobs) => JobsView::Jobs(jobs),
        ApiState::Failure(message) => JobsView::Failure(message),
    }
}

#[derive(Debug, PartialEq)]
pub enum DetailView<'a> {
    Nothing,
    Loading,
    Detail(&'a JobDetails),
    Failure(&'a str),
}

pub fn detail_view(state: &ApiState<JobDetails>) -> DetailView<'_> {
    match state {
        ApiState::Idle => DetailView::Nothing,
        ApiState::Loading => DetailView::Loading,
        ApiState::Success(details) => DetailView::Detail(details),
        ApiState::Failure(message) => DetailView::Failure(message),
    }
}

/// The profile panel has no failure text, only a retry button.
#[derive(Debug, PartialEq)]
pub enum ProfileView<'a> {
    Nothing,
    Loading,
    Profile(&'a Profile),
    Retry,
}

pub fn profile_view(state: &ApiState<Profile>) -> ProfileView<'_> {
    match state {
        ApiState::Idle => ProfileView::Nothing,
        ApiState::Loading => ProfileView::Loading,
        ApiState::Success(profile) => ProfileView::Profile(profile),
        ApiState::Failure(_) => ProfileView::Retry,
    }
}

pub fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{:.0}", rating)
    } else {
        format!("{:.1}", rating)
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

// --- Plain text rendering for one-shot commands ---

pub fn jobs_lines(view: &JobsView) -> Vec<String> {
    match view {
        JobsView::Nothing => Vec::new(),
        JobsView::Loading => vec!["Loading...".to_string()],
        JobsView::NoJobs => vec![NO_JOBS_HEADING.to_string(), NO_JOBS_DESCRIPTION.to_string()],
        JobsView::Failure(message) => failure_lines(message),
        JobsView::Jobs(jobs) => {
            let mut lines = vec![
                format!(
                    "{:<38} {:<28} {:<12} {:<14} {:>10} {:>6}",
                    "ID", "TITLE", "TYPE", "LOCATION", "PACKAGE", "RATING"
                ),
                "-".repeat(113),
            ];
            for job in jobs.iter() {
                lines.push(format!(
                    "{:<38} {:<28} {:<12} {:<14} {:>10} {:>6}",
                    truncate(&job.id, 38),
                    truncate(&job.title, 28),
                    truncate(&job.employment_type, 12),
                    truncate(&job.location, 14),
                    truncate(&job.package_per_annum, 10),
                    format_rating(job.rating)
                ));
            }
            lines
        }
    }
}

pub fn detail_lines(view: &DetailView) -> Vec<String> {
    match view {
        DetailView::Nothing => Vec::new(),
        DetailView::Loading => vec!["Loading...".to_string()],
        DetailView::Failure(message) => failure_lines(message),
        DetailView::Detail(details) => {
            let job = &details.job;
            let summary = &job.summary;
            let mut lines = vec![
                summary.title.clone(),
                format!("Rating: {}", format_rating(summary.rating)),
                format!("Location: {}", summary.location),
                format!("Type: {}", summary.employment_type),
                format!("Package: {}", summary.package_per_annum),
            ];
            if !job.company_website_url.is_empty() {
                lines.push(format!("Website: {}", job.company_website_url));
            }
            if !summary.company_logo_url.is_empty() {
                lines.push(format!("Logo: {}", summary.company_logo_url));
            }
            lines.push(String::new());
            lines.push("Description".to_string());
            lines.extend(textwrap::fill(&summary.job_description, 78).lines().map(String::from));

            if !job.skills.is_empty() {
                lines.push(String::new());
                lines.push("Skills".to_string());
                for skill in &job.skills {
                    if skill.image_url.is_empty() {
                        lines.push(format!("  - {}", skill.name));
                    } else {
                        lines.push(format!("  - {} ({})", skill.name, skill.image_url));
                    }
                }
            }

            if !job.life_at_company.description.is_empty() {
                lines.push(String::new());
                lines.push("Life at Company".to_string());
                for line in textwrap::fill(&job.life_at_company.description, 76).lines() {
                    lines.push(format!("  {}", line));
                }
                if !job.life_at_company.image_url.is_empty() {
                    lines.push(format!("  {}", job.life_at_company.image_url));
                }
            }

            lines.push(String::new());
            lines.push(format!("Similar Jobs ({})", details.similar_jobs.len()));
            for similar in &details.similar_jobs {
                lines.push(format!(
                    "  {} | {} | {} | {}",
                    similar.title,
                    similar.location,
                    similar.employment_type,
                    format_rating(similar.rating)
                ));
            }
            lines
        }
    }
}

pub fn profile_lines(view: &ProfileView) -> Vec<String> {
    match view {
        ProfileView::Nothing => Vec::new(),
        ProfileView::Loading => vec!["Loading...".to_string()],
        ProfileView::Retry => vec!["Profile unavailable. Retry".to_string()],
        ProfileView::Profile(profile) => {
            let mut lines = vec![profile.name.clone(), profile.short_bio.clone()];
            if !profile.profile_image_url.is_empty() {
                lines.push(format!("Photo: {}", profile.profile_image_url));
            }
            lines
        }
    }
}

fn failure_lines(message: &str) -> Vec<String> {
    vec![
        message.to_string(),
        FAILURE_DESCRIPTION.to_string(),
        "Retry".to_string(),
    ]
}
