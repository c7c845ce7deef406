use std::sync::Arc;

use mongodb::Database;
use sitedesk_config::Settings;
use sitedesk_services::{
    AuthService,
    dao::{
        expense::ExpenseDao, material::MaterialDao, phase::PhaseDao, profile::ProfileDao,
        project::ProjectDao, user::UserDao,
    },
    notify::{
        ChangeHub, Directory, FallbackStyle, MongoDirectory, MongoNotificationRepo,
        NameResolver, NotificationDispatcher, NotificationRepo, RecipientResolver,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub profiles: Arc<ProfileDao>,
    pub projects: Arc<ProjectDao>,
    pub expenses: Arc<ExpenseDao>,
    pub phases: Arc<PhaseDao>,
    pub materials: Arc<MaterialDao>,
    pub notifications: Arc<dyn NotificationRepo>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let profiles = Arc::new(ProfileDao::new(&db));
        let projects = Arc::new(ProjectDao::new(&db));
        let expenses = Arc::new(ExpenseDao::new(&db));
        let phases = Arc::new(PhaseDao::new(&db));
        let materials = Arc::new(MaterialDao::new(&db));

        let hub = Arc::new(ChangeHub::new());
        let notifications: Arc<dyn NotificationRepo> =
            Arc::new(MongoNotificationRepo::new(&db, hub));
        let directory: Arc<dyn Directory> = Arc::new(MongoDirectory::new(&db));
        let fallback = FallbackStyle::parse(&settings.notifications.fallback_style);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifications.clone(),
            NameResolver::new(directory.clone(), fallback),
            RecipientResolver::new(directory),
        ));

        Self {
            db,
            settings,
            auth,
            users,
            profiles,
            projects,
            expenses,
            phases,
            materials,
            notifications,
            dispatcher,
        }
    }
}
