use sea_orm::Database;
use tracing::info;

use registrar::config::RegistrarConfig;
use registrar::domain::types::StudentNotice;
use registrar::infra::credential::BcryptCredentialStore;
use registrar::infra::file_store::LocalFileStore;
use registrar::router::build_router;
use registrar::state::AppState;
use registrar::usecase::seed::EnsureAdminUseCase;
use registrar_core::tracing::init_tracing;
use registrar_events::EventBus;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = RegistrarConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let student_events = EventBus::<StudentNotice>::new();
    student_events
        .on_student_change(|change, notice| {
            info!(
                event = change.event_name(),
                student_id = notice.student_id(),
                "student changed"
            );
            Ok(())
        })
        .detach();

    let state = AppState {
        db,
        credentials: BcryptCredentialStore {
            cost: config.bcrypt_cost,
        },
        file_store: LocalFileStore {
            root: config.upload_dir.clone(),
        },
        student_events,
    };

    if let Some(password) = config.seed_admin_password.as_deref() {
        let seed = EnsureAdminUseCase {
            repo: state.user_repo(),
            credentials: state.credentials(),
        };
        seed.execute(password)
            .await
            .expect("failed to seed admin account");
    }

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("registrar service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
