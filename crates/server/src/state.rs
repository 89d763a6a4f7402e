use std::path::PathBuf;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::catalog::CatalogService;
use service::documents::{DocumentService, LocalFileStore, UploadPolicy};
use service::jobs::{export::EXPORTS_DIR, ExportJobs};
use service::lifecycle::LifecycleEngine;
use service::professionals::ProfessionalService;
use service::users::UserService;

/// Everything the handlers need, cloned per request.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub users: UserService,
    pub professionals: ProfessionalService,
    pub catalog: CatalogService,
    pub documents: DocumentService,
    pub lifecycle: LifecycleEngine,
    pub exports: ExportJobs,
    pub export_dir: PathBuf,
    /// Request body cap for the multipart upload route.
    pub upload_body_limit: usize,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: &configs::AppConfig) -> Self {
        let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        let auth = Arc::new(AuthService::new(repo, AuthConfig::from_app(cfg)));
        let root = PathBuf::from(&cfg.uploads.root);
        let store = Arc::new(LocalFileStore::new(root.clone()));
        let policy = UploadPolicy::from_config(&cfg.uploads);
        // 多文件上传：留出表单字段与边界的余量
        let upload_body_limit = cfg.uploads.max_file_bytes.saturating_mul(4).saturating_add(64 * 1024);
        Self {
            users: UserService::new(db.clone()),
            professionals: ProfessionalService::new(db.clone()),
            catalog: CatalogService::new(db.clone()),
            documents: DocumentService::new(db.clone(), store, policy),
            lifecycle: LifecycleEngine::new(db.clone()),
            exports: ExportJobs::new(),
            export_dir: root.join(EXPORTS_DIR),
            upload_body_limit,
            auth,
            db,
        }
    }
}
