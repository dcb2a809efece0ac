use std::sync::Arc;

use task_manager_server::{
    app_state::{AppState, SharedState},
    authentication::auth::TokenService,
    data_access::{
        data_context::DataContext,
        memory_repository::{MemoryTaskRepository, MemoryUserRepository},
    },
    map_routes,
    settings::{Settings, StorageBackend},
    TaskRepository, TaskUsecase, UserRepository, UserUsecase,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    init_tracing(&settings.log_level);

    if let Err(e) = run(settings).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

#[cfg(feature = "profile-console")]
fn init_tracing(_log_level: &str) {
    console_subscriber::init();
}

#[cfg(not(feature = "profile-console"))]
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    // ── Storage ────────────────────────────────────────────────
    let task_repository: Arc<dyn TaskRepository>;
    let user_repository: Arc<dyn UserRepository>;
    match settings.storage {
        StorageBackend::Memory => {
            task_repository = Arc::new(MemoryTaskRepository::new());
            user_repository = Arc::new(MemoryUserRepository::new());
        }
        StorageBackend::Redb => {
            let data_context = DataContext::open(&settings.database_path)?;
            tracing::info!(path = %settings.database_path, "opened redb store");
            task_repository = Arc::new(data_context.clone());
            user_repository = Arc::new(data_context);
        }
    }

    // ── Usecases ───────────────────────────────────────────────
    let task_usecase = TaskUsecase::new(task_repository, user_repository.clone(), settings.timeouts);
    let user_usecase = UserUsecase::new(
        user_repository,
        task_usecase.clone(),
        TokenService::new(&settings.jwt_secret, settings.jwt_expiration_in_minutes),
        settings.timeouts,
    );

    if user_usecase
        .ensure_default_admin(&settings.default_admin_email, &settings.default_admin_password)
        .await?
    {
        tracing::warn!(email = %settings.default_admin_email, "seeded default admin; change its password");
    }

    let state: SharedState = Arc::new(AppState {
        task_usecase,
        user_usecase,
    });

    // ── Router ─────────────────────────────────────────────────
    let app = map_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // ── Start ──────────────────────────────────────────────────
    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, storage = ?settings.storage, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
