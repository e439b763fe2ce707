use crate::api::JobsApi;
use crate::api_state::{ApiState, StatusMachine, Ticket};
use crate::credentials::Session;
use crate::models::JobSummary;
use crate::query::{EmploymentType, JobQuery, SalaryRange};

/// Search term plus filters for the jobs list, and the fetch state they drive.
///
/// Every mutation hands back exactly one ticket for the full, current query;
/// the caller runs it and reports back through [`JobSearch::complete`].
#[derive(Debug, Default)]
pub struct JobSearch {
    query: JobQuery,
    status: StatusMachine<JobQuery, Vec<JobSummary>>,
}

impl JobSearch {
    pub fn new(query: JobQuery) -> Self {
        Self {
            query,
            status: StatusMachine::new(),
        }
    }

    pub fn query(&self) -> &JobQuery {
        &self.query
    }

    pub fn state(&self) -> &ApiState<Vec<JobSummary>> {
        self.status.current_state()
    }

    /// Initial fetch when the list is first shown.
    pub fn load(&mut self) -> Ticket<JobQuery> {
        self.issue()
    }

    pub fn set_search_term(&mut self, term: &str) -> Ticket<JobQuery> {
        self.query.search = term.to_string();
        self.issue()
    }

    pub fn toggle_employment_type(&mut self, kind: EmploymentType, included: bool) -> Ticket<JobQuery> {
        self.query.set_employment_type(kind, included);
        self.issue()
    }

    pub fn set_salary_floor(&mut self, range: Option<SalaryRange>) -> Ticket<JobQuery> {
        self.query.minimum_package = range;
        self.issue()
    }

    /// Search button / enter key: same query again, no field change needed.
    pub fn submit_search(&mut self) -> Ticket<JobQuery> {
        self.issue()
    }

    pub fn retry(&mut self) -> Option<Ticket<JobQuery>> {
        self.status.retry()
    }

    pub fn complete(&mut self, generation: u64, result: Result<Vec<JobSummary>, crate::error::ApiError>) -> bool {
        self.status.complete(generation, result)
    }

    /// Run a ticket to completion in place.
    pub async fn fetch(&mut self, api: &dyn JobsApi, session: &Session, ticket: Ticket<JobQuery>) {
        let result = api.jobs(session, &ticket.request).await;
        self.complete(ticket.generation, result);
    }

    fn issue(&mut self) -> Ticket<JobQuery> {
        let ticket = self.status.begin(self.query.clone());
        tracing::debug!(generation = ticket.generation, query = ?ticket.request, "jobs query issued");
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Call, FakeApi};
    use crate::error::ApiError;
    use crate::query::salary_range;

    fn job(id: &str) -> JobSummary {
        JobSummary {
            id: id.to_string(),
            title: format!("Job {id}"),
            company_logo_url: String::new(),
            employment_type: "Full Time".to_string(),
            job_description: String::new(),
            location: "Hyderabad".to_string(),
            package_per_annum: "10 LPA".to_string(),
            rating: 4.0,
        }
    }

    fn sent_params(api: &FakeApi) -> Vec<Vec<(String, String)>> {
        api.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Jobs { params, .. } => Some(params),
                _ => None,
            })
            .collect()
    }

    fn expected(types: &str, salary: &str, search: &str) -> Vec<(String, String)> {
        vec![
            ("employment_type".to_string(), types.to_string()),
            ("minimum_package".to_string(), salary.to_string()),
            ("search".to_string(), search.to_string()),
        ]
    }

    #[test]
    fn test_each_mutation_issues_one_ticket_with_full_query() {
        let mut search = JobSearch::default();

        let t1 = search.toggle_employment_type(EmploymentType::FullTime, true);
        let t2 = search.set_salary_floor(Some(salary_range("1000000").unwrap()));
        let t3 = search.set_search_term("rust");
        let t4 = search.toggle_employment_type(EmploymentType::PartTime, true);

        assert!(t1.generation < t2.generation && t2.generation < t3.generation);
        assert_eq!(t3.generation + 1, t4.generation);
        assert_eq!(
            t4.request.to_params().map(|(_, v)| v),
            ["FULLTIME,PARTTIME".to_string(), "1000000".to_string(), "rust".to_string()]
        );
        assert_eq!(search.state(), &ApiState::Loading);
    }

    #[test]
    fn test_params_independent_of_mutation_order() {
        let mut a = JobSearch::default();
        a.set_search_term("dev");
        a.toggle_employment_type(EmploymentType::Freelance, true);
        a.toggle_employment_type(EmploymentType::FullTime, true);
        let ta = a.set_salary_floor(Some(salary_range("2000000").unwrap()));

        let mut b = JobSearch::default();
        b.set_salary_floor(Some(salary_range("4000000").unwrap()));
        b.toggle_employment_type(EmploymentType::FullTime, true);
        b.toggle_employment_type(EmploymentType::Freelance, true);
        b.set_salary_floor(Some(salary_range("2000000").unwrap()));
        let tb = b.set_search_term("dev");

        assert_eq!(ta.request.to_params(), tb.request.to_params());
        assert_eq!(ta.request.to_params()[0].1, "FULLTIME,FREELANCE");
    }

    #[test]
    fn test_only_latest_query_result_is_shown() {
        let mut search = JobSearch::default();
        let slow = search.set_search_term("a");
        let fast = search.set_search_term("ab");

        search.complete(fast.generation, Ok(vec![job("ab")]));
        search.complete(slow.generation, Ok(vec![job("a")]));

        assert_eq!(search.state(), &ApiState::Success(vec![job("ab")]));
    }

    #[tokio::test]
    async fn test_no_jobs_is_success_not_failure() {
        let api = FakeApi::default();
        api.push_jobs(Ok(Vec::new()));
        let session = Session::new("abc123");

        let mut search = JobSearch::default();
        search.toggle_employment_type(EmploymentType::FullTime, true);
        let ticket = search.set_salary_floor(Some(salary_range("1000000").unwrap()));
        search.fetch(&api, &session, ticket).await;

        assert_eq!(search.state(), &ApiState::Success(Vec::new()));
        assert_eq!(sent_params(&api), vec![expected("FULLTIME", "1000000", "")]);
    }

    #[tokio::test]
    async fn test_submit_and_retry_resend_same_params() {
        let api = FakeApi::default();
        api.push_jobs(Err(ApiError::Fetch {
            status: 500,
            message: None,
        }));
        api.push_jobs(Ok(vec![job("1")]));
        let session = Session::new("abc123");

        let mut search = JobSearch::default();
        let ticket = search.set_search_term("engineer");
        search.fetch(&api, &session, ticket).await;
        assert!(matches!(search.state(), ApiState::Failure(_)));

        let ticket = search.retry().unwrap();
        search.fetch(&api, &session, ticket).await;
        assert_eq!(search.state(), &ApiState::Success(vec![job("1")]));

        let ticket = search.submit_search();
        search.fetch(&api, &session, ticket).await;

        let params = sent_params(&api);
        assert_eq!(params.len(), 3);
        assert!(params.iter().all(|p| *p == expected("", "", "engineer")));
    }
}
