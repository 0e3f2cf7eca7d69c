#![allow(dead_code)]

use actix_web::{
    App,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use std::env;
use uuid::Uuid;

use timesheets::database::memory::{
    InMemoryDelegationDirectory, InMemoryDocumentStore, InMemoryTimesheetStore,
};
use timesheets::database::models::{ApproverIdentity, Entry, Period};
use timesheets::services::{Actor, Claims, Role, SubmissionEligibility};
use timesheets::{AppState, Config, routes};

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory stores plus the state and config a test app is built from.
pub struct TestContext {
    pub config: Config,
    pub timesheets: InMemoryTimesheetStore,
    pub directory: InMemoryDelegationDirectory,
    pub documents: InMemoryDocumentStore,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(Config::test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let timesheets = InMemoryTimesheetStore::new();
        let directory = InMemoryDelegationDirectory::new();
        let documents = InMemoryDocumentStore::new();
        let state = AppState::in_memory(
            timesheets.clone(),
            directory.clone(),
            documents.clone(),
            &config,
        );
        Self {
            config,
            timesheets,
            directory,
            documents,
            state,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .configure(routes::configure)
    }

    pub fn token(&self, actor: &Actor) -> String {
        Claims::new(actor.id, &actor.email, &actor.name, actor.roles.clone())
            .encode(&self.config)
            .expect("token encodes")
    }

    pub fn bearer(&self, actor: &Actor) -> (String, String) {
        ("Authorization".to_string(), format!("Bearer {}", self.token(actor)))
    }

    pub async fn assign_supervisor(&self, employee: &Actor, supervisor: &Actor) {
        self.directory
            .set_supervisor(employee.id, identity(supervisor))
            .await;
    }
}

pub fn person(roles: Vec<Role>) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        name: Name().fake(),
        email: SafeEmail().fake(),
        roles,
    }
}

pub fn identity(actor: &Actor) -> ApproverIdentity {
    ApproverIdentity {
        id: actor.id,
        name: actor.name.clone(),
        email: actor.email.clone(),
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn current_period() -> Period {
    Period::containing(Utc::now().date_naive())
}

pub fn working_days(period: Period) -> Vec<NaiveDate> {
    SubmissionEligibility::default().working_days(period)
}

pub fn office_hours(day: NaiveDate) -> Entry {
    Entry::working_hours(
        day,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    )
}
