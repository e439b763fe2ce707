mod api;
mod api_state;
mod clock;
mod config;
mod credentials;
mod error;
mod login;
mod models;
mod query;
mod router;
mod search;
mod tui;
mod views;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use api::{HttpJobsApi, JobsApi, DEFAULT_API_URL};
use api_state::StatusMachine;
use clock::SystemClock;
use config::Config;
use credentials::{CredentialStore, FileStorage, Session};
use error::ApiError;
use login::LoginOutcome;
use models::{JobDetails, Profile};
use query::{salary_range, EmploymentType, JobQuery};
use router::{guard, Guarded, Navigator, Route};
use search::JobSearch;

#[derive(Parser)]
#[command(name = "jobby")]
#[command(about = "Job search client - log in, filter and browse job listings")]
struct Cli {
    /// Base URL of the jobs API
    #[arg(long, global = true, env = "JOBBY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Where the login token is kept
    #[arg(long, global = true, env = "JOBBY_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "JOBBY_TIMEOUT_SECS", default_value = "30")]
    timeout: u64,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(short, long)]
        username: String,

        /// Prompted for without echo when omitted
        #[arg(short, long, env = "JOBBY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Show whether a session token is stored
    Status,

    /// List jobs
    Jobs {
        /// Employment type (FULLTIME, PARTTIME, FREELANCE, INTERNSHIP); repeatable
        #[arg(short = 't', long = "type")]
        employment_types: Vec<String>,

        /// Minimum package (1000000, 2000000, 3000000, 4000000)
        #[arg(short, long)]
        salary: Option<String>,

        /// Search term
        #[arg(short = 'q', long, default_value = "")]
        search: String,
    },

    /// Show job details and similar jobs
    Show {
        /// Job ID
        id: String,
    },

    /// Show the logged-in user's profile
    Profile,

    /// Interactive browser
    Browse {
        /// Screen to open (/, /jobs, /jobs/<id>, /login)
        #[arg(default_value = "/")]
        path: String,
    },
}

/// One-shot commands go through the same guard as the browser's screens.
fn require_session(credentials: &CredentialStore, route: Route) -> Result<Session> {
    match guard(route, credentials.is_present()) {
        Guarded::Render(_) => credentials
            .session()
            .ok_or_else(|| anyhow!(ApiError::MissingCredential)),
        Guarded::Redirect(_) => Err(anyhow!("Not logged in. Run 'jobby login' first.")),
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new(cli.api_url, cli.credentials, cli.timeout, cli.verbose);

    if !matches!(cli.command, Commands::Browse { .. }) {
        config.init_logging();
    }

    let api: Arc<dyn JobsApi> = Arc::new(HttpJobsApi::new(&config.api_url, config.timeout)?);
    let mut credentials = CredentialStore::new(
        Box::new(FileStorage::new(&config.credentials_path)),
        Arc::new(SystemClock),
    );

    match cli.command {
        Commands::Login { username, password } => {
            let mut nav = Navigator::new(Route::Login);
            if login::on_mount(&credentials, &mut nav) {
                println!("Already logged in.");
                return Ok(());
            }
            let password = match password {
                Some(password) => password,
                None => tui::read_password("Password: ")?,
            };
            match login::submit(api.as_ref(), &mut credentials, &mut nav, &username, &password).await? {
                LoginOutcome::LoggedIn => {
                    if let Some(credential) = credentials.credential() {
                        println!(
                            "Logged in as {}. Session valid until {}.",
                            username,
                            credential.expires_at.format("%Y-%m-%d %H:%M UTC")
                        );
                    }
                }
                LoginOutcome::Rejected(message) => return Err(anyhow!("*{}", message)),
            }
        }

        Commands::Logout => {
            let mut nav = Navigator::new(Route::Home);
            login::logout(&mut credentials, &mut nav)?;
            println!("Logged out.");
        }

        Commands::Status => match credentials.credential() {
            Some(credential) => println!(
                "Logged in. Session valid until {}.",
                credential.expires_at.format("%Y-%m-%d %H:%M UTC")
            ),
            None => println!("Not logged in."),
        },

        Commands::Jobs {
            employment_types,
            salary,
            search,
        } => {
            let session = require_session(&credentials, Route::Jobs)?;

            let mut query = JobQuery::default();
            query.search = search;
            for id in employment_types.iter().flat_map(|t| t.split(',')) {
                query.set_employment_type(EmploymentType::parse(id.trim())?, true);
            }
            if let Some(id) = salary {
                query.minimum_package = Some(salary_range(&id)?);
            }

            let mut jobs = JobSearch::new(query);
            let ticket = jobs.load();
            jobs.fetch(api.as_ref(), &session, ticket).await;
            print_lines(views::jobs_lines(&views::jobs_view(jobs.state())));
        }

        Commands::Show { id } => {
            let session = require_session(&credentials, Route::JobDetail(id.clone()))?;
            let api = api.as_ref();
            let session = &session;

            let mut details: StatusMachine<String, JobDetails> = StatusMachine::new();
            let state = details
                .trigger(id, |id| async move { api.job_details(session, &id).await })
                .await;
            print_lines(views::detail_lines(&views::detail_view(state)));
        }

        Commands::Profile => {
            let session = require_session(&credentials, Route::Jobs)?;
            let api = api.as_ref();
            let session = &session;

            let mut profile: StatusMachine<(), Profile> = StatusMachine::new();
            let state = profile
                .trigger((), |_| async move { api.profile(session).await })
                .await;
            print_lines(views::profile_lines(&views::profile_view(state)));
        }

        Commands::Browse { path } => {
            config.init_file_logging(&config.log_path())?;
            tui::run_browse(api, credentials, Route::parse(&path)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_password_is_optional() {
        let cli = Cli::try_parse_from(["jobby", "login", "-u", "rahul"]).unwrap();
        match cli.command {
            Commands::Login { username, password } => {
                assert_eq!(username, "rahul");
                if std::env::var_os("JOBBY_PASSWORD").is_none() {
                    assert!(password.is_none());
                }
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_login_password_flag_is_used() {
        let cli = Cli::try_parse_from(["jobby", "login", "-u", "rahul", "-p", "rahul@2021"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { password: Some(ref p), .. } if p == "rahul@2021"
        ));
    }
}
