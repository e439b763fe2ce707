//! Wire shapes of the jobs API and the projections the views render from.

use serde::{Deserialize, Deserializer, Serialize};

// --- Wire types (as the API sends them) ---

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginSuccess {
    pub jwt_token: String,
}

/// Body of any non-ok response; `error_msg` is not always present.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error_msg: Option<String>,
}

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobWire {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company_logo_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub employment_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub job_description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub package_per_annum: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rating: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LifeAtCompanyWire {
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkillWire {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDetailWire {
    #[serde(flatten)]
    pub job: JobWire,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company_website_url: String,
    #[serde(default)]
    pub life_at_company: Option<LifeAtCompanyWire>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<SkillWire>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<JobWire>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobDetailsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_details: JobDetailWire,
    #[serde(default, deserialize_with = "null_as_default")]
    pub similar_jobs: Vec<JobWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileWire {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub profile_image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_bio: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile_details: ProfileWire,
}

// --- Projections ---

#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub company_logo_url: String,
    pub employment_type: String,
    pub job_description: String,
    pub location: String,
    pub package_per_annum: String,
    pub rating: f64,
}

/// Similar jobs carry the same fields as a list entry.
pub type SimilarJob = JobSummary;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifeAtCompany {
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDetail {
    pub summary: JobSummary,
    pub company_website_url: String,
    pub life_at_company: LifeAtCompany,
    pub skills: Vec<Skill>,
}

/// A detail response: the job itself plus its similar jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDetails {
    pub job: JobDetail,
    pub similar_jobs: Vec<SimilarJob>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub profile_image_url: String,
    pub short_bio: String,
}

impl From<JobWire> for JobSummary {
    fn from(job: JobWire) -> Self {
        Self {
            id: job.id,
            title: job.title,
            company_logo_url: job.company_logo_url,
            employment_type: job.employment_type,
            job_description: job.job_description,
            location: job.location,
            package_per_annum: job.package_per_annum,
            rating: job.rating,
        }
    }
}

impl From<JobsResponse> for Vec<JobSummary> {
    fn from(response: JobsResponse) -> Self {
        response.jobs.into_iter().map(JobSummary::from).collect()
    }
}

impl From<JobDetailWire> for JobDetail {
    fn from(detail: JobDetailWire) -> Self {
        let life_at_company = detail
            .life_at_company
            .map(|life| LifeAtCompany {
                description: life.description,
                image_url: life.image_url,
            })
            .unwrap_or_default();

        Self {
            summary: detail.job.into(),
            company_website_url: detail.company_website_url,
            life_at_company,
            skills: detail
                .skills
                .into_iter()
                .map(|skill| Skill {
                    name: skill.name,
                    image_url: skill.image_url,
                })
                .collect(),
        }
    }
}

impl From<JobDetailsResponse> for JobDetails {
    fn from(response: JobDetailsResponse) -> Self {
        Self {
            job: response.job_details.into(),
            similar_jobs: response.similar_jobs.into_iter().map(SimilarJob::from).collect(),
        }
    }
}

impl From<ProfileResponse> for Profile {
    fn from(response: ProfileResponse) -> Self {
        let profile = response.profile_details;
        Self {
            name: profile.name,
            profile_image_url: profile.profile_image_url,
            short_bio: profile.short_bio,
        }
    }
}
