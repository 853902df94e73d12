use std::{process, sync::Arc};

use storefront_edge::{
    application::{
        context::{ContextResolver, SalesChannelContextService},
        error::AppError,
        error_page::{CachedErrorResponse, ErrorPageService, ErrorRenderer},
        events::EventBus,
        info::InfoService,
        not_found::NotFoundSubscriber,
        repos::{CategoryRepo, IndexerRegistry, SalesChannelRepo, SeoUrlUpdater, SystemConfigRepo},
        sales_channels::SalesChannelWriteService,
        seo::SeoUrlUpdateListener,
        system_config::SystemConfigService,
    },
    cache::{CacheConfig, CacheInvalidator, CacheTracer, TagInvalidation, TaggedCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, StorefrontState},
        telemetry,
    },
};
use tokio::try_join;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

const ERROR_PAGE_CACHE: &str = "error_page";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings).await?;
    info!(target = "storefront::migrate", "Migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    let app = build_application_context(repositories, &settings);
    serve_http(&settings, app.storefront_state, app.admin_state).await
}

struct ApplicationContext {
    storefront_state: StorefrontState,
    admin_state: AdminState,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> ApplicationContext {
    let sales_channel_repo: Arc<dyn SalesChannelRepo> = repositories.clone();
    let system_config_repo: Arc<dyn SystemConfigRepo> = repositories.clone();
    let category_repo: Arc<dyn CategoryRepo> = repositories.clone();
    let seo_url_updater: Arc<dyn SeoUrlUpdater> = repositories.clone();
    let indexer_registry: Arc<dyn IndexerRegistry> = repositories.clone();

    let bus = Arc::new(EventBus::new());

    let cache_config = CacheConfig::from(&settings.cache);
    let error_pages = Arc::new(TaggedCache::<CachedErrorResponse>::new(
        ERROR_PAGE_CACHE,
        &cache_config,
    ));
    let invalidator = CacheInvalidator::new(vec![error_pages.clone() as Arc<dyn TagInvalidation>]);

    let renderer: Arc<dyn ErrorRenderer> =
        Arc::new(ErrorPageService::new(system_config_repo.clone()));
    let contexts: Arc<dyn ContextResolver> =
        Arc::new(SalesChannelContextService::new(sales_channel_repo.clone()));

    let not_found = Arc::new(NotFoundSubscriber::new(
        renderer,
        contexts,
        settings.storefront.kernel_debug,
        error_pages,
        Arc::new(CacheTracer::new()),
        invalidator,
        &bus,
    ));
    not_found.register(&bus, settings.storefront.cache_not_found_on_exception);

    let seo = Arc::new(SeoUrlUpdateListener::new(
        seo_url_updater,
        category_repo,
        indexer_registry,
    ));
    seo.register(&bus);

    info!(
        target = "storefront::bootstrap",
        cache_not_found_on_exception = settings.storefront.cache_not_found_on_exception,
        kernel_debug = settings.storefront.kernel_debug,
        error_page_cache = cache_config.enable_error_page_cache,
        "Event handlers registered"
    );

    let storefront_state = StorefrontState {
        bus: bus.clone(),
        sales_channels: sales_channel_repo.clone(),
    };

    let admin_state = AdminState {
        system_config: Arc::new(SystemConfigService::new(system_config_repo, bus.clone())),
        sales_channels: Arc::new(SalesChannelWriteService::new(sales_channel_repo, bus)),
        info: Arc::new(InfoService::new(
            settings.storefront.shop_version.clone(),
            None,
        )),
    };

    ApplicationContext {
        storefront_state,
        admin_state,
    }
}

async fn serve_http(
    settings: &config::Settings,
    storefront_state: StorefrontState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_storefront_router(storefront_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "storefront::serve",
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "Listening"
    );

    let public_server = axum::serve(public_listener, public_router.into_make_service());
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service());

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
