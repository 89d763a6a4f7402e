use std::sync::Arc;

use chrono::Utc;
use models::{professional, professional_document};
use sea_orm::{sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::store::{sanitize_file_name, FileStore};
use crate::errors::ServiceError;
use crate::principal::Principal;
use crate::uow::UnitOfWork;

pub const DOCUMENTS_DIR: &str = "professional_documents";

/// Upload limits, taken from `uploads.*`.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(cfg: &configs::UploadConfig) -> Self {
        Self {
            max_file_bytes: cfg.max_file_bytes,
            allowed_extensions: cfg.allowed_extensions.iter().map(|e| e.trim().trim_start_matches('.').to_lowercase()).collect(),
        }
    }

    pub fn check(&self, file: &UploadedFile) -> Result<(), ServiceError> {
        let name = file.file_name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("File name is required"));
        }
        let ext = name.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default();
        if ext.is_empty() || !self.allowed_extensions.iter().any(|a| *a == ext) {
            return Err(ServiceError::validation(format!(
                "File type not allowed: {name} (allowed: {})",
                self.allowed_extensions.join(", ")
            )));
        }
        if file.bytes.is_empty() {
            return Err(ServiceError::validation(format!("File is empty: {name}")));
        }
        if file.bytes.len() > self.max_file_bytes {
            return Err(ServiceError::validation(format!("File too large: {name} (max {} bytes)", self.max_file_bytes)));
        }
        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self { Self::from_config(&configs::UploadConfig::default()) }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub id: i32,
    pub document_type: String,
    pub status: &'static str,
}

#[derive(Clone)]
pub struct DocumentService {
    db: DatabaseConnection,
    store: Arc<dyn FileStore>,
    policy: UploadPolicy,
}

impl DocumentService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn FileStore>, policy: UploadPolicy) -> Self { Self { db, store, policy } }

    /// Store the caller's files and append one unverified row per file.
    ///
    /// Every file is checked before anything is written.
    #[instrument(skip(self, principal, files), fields(by = %principal.label(), count = files.len()))]
    pub async fn upload(&self, principal: &Principal, files: Vec<UploadedFile>, document_type: Option<String>) -> Result<Vec<UploadedDocument>, ServiceError> {
        let professional_id = principal.require_professional()?;
        if files.is_empty() {
            return Err(ServiceError::validation("No documents provided"));
        }
        for f in &files {
            self.policy.check(f)?;
        }
        let document_type = document_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| professional_document::DEFAULT_DOCUMENT_TYPE.to_string());

        let mut locators = Vec::with_capacity(files.len());
        for f in &files {
            let relative = format!("{DOCUMENTS_DIR}/{professional_id}/{}_{}", Uuid::new_v4(), sanitize_file_name(&f.file_name));
            match self.store.save(&relative, &f.bytes).await {
                Ok(loc) => locators.push(loc),
                Err(e) => {
                    self.discard(&locators).await;
                    return Err(e);
                }
            }
        }

        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let mut out = Vec::with_capacity(locators.len());
            for loc in &locators {
                let doc = professional_document::create(uow.conn(), professional_id, &document_type, loc).await?;
                out.push(UploadedDocument { id: doc.id, document_type: doc.document_type, status: "pending_verification" });
            }
            Ok::<_, ServiceError>(out)
        }
        .await;
        let docs = match uow.finish(result).await {
            Ok(docs) => docs,
            Err(e) => {
                // 没有记录指向的文件不保留
                self.discard(&locators).await;
                return Err(e);
            }
        };
        info!(professional_id, count = docs.len(), "documents_uploaded");
        Ok(docs)
    }

    async fn discard(&self, locators: &[String]) {
        for loc in locators {
            if let Err(e) = self.store.remove(loc).await {
                warn!(locator = %loc, error = %e, "orphan_file_not_removed");
            }
        }
    }

    pub async fn list_own(&self, principal: &Principal) -> Result<Vec<professional_document::Model>, ServiceError> {
        let professional_id = principal.require_professional()?;
        Ok(professional_document::list_for_professional(&self.db, professional_id).await?)
    }

    /// Owner or admin.
    pub async fn list_for(&self, principal: &Principal, professional_id: i32) -> Result<Vec<professional_document::Model>, ServiceError> {
        match principal {
            Principal::Admin { .. } => {}
            Principal::Professional { professional_id: own, .. } if *own == professional_id => {}
            _ => return Err(ServiceError::forbidden("Not allowed to view these documents")),
        }
        professional::Entity::find_by_id(professional_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Professional"))?;
        Ok(professional_document::list_for_professional(&self.db, professional_id).await?)
    }

    /// Mark every unverified document verified and activate the professional.
    /// All-or-nothing; fails when nothing is pending.
    #[instrument(skip(self, principal), fields(by = %principal.label()))]
    pub async fn verify(&self, principal: &Principal, professional_id: i32) -> Result<usize, ServiceError> {
        principal.require_admin()?;
        let verifier = principal.label();
        let uow = UnitOfWork::begin(&self.db).await?;
        let result = async {
            let conn = uow.conn();
            professional::Entity::find_by_id(professional_id)
                .one(conn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Professional"))?;
            let pending = professional_document::list_unverified(conn, professional_id).await?;
            if pending.is_empty() {
                return Err(ServiceError::validation("No unverified documents found"));
            }
            let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
            let ids: Vec<i32> = pending.iter().map(|d| d.id).collect();
            professional_document::Entity::update_many()
                .col_expr(professional_document::Column::IsVerified, Expr::value(true))
                .col_expr(professional_document::Column::VerifiedBy, Expr::value(verifier.clone()))
                .col_expr(professional_document::Column::VerificationDate, Expr::value(now))
                .filter(professional_document::Column::Id.is_in(ids))
                .filter(professional_document::Column::IsVerified.eq(false))
                .exec(conn)
                .await?;
            professional::Entity::update_many()
                .col_expr(professional::Column::DocumentVerified, Expr::value(true))
                .col_expr(professional::Column::IsVerified, Expr::value(true))
                .col_expr(professional::Column::UpdatedAt, Expr::value(now))
                .filter(professional::Column::Id.eq(professional_id))
                .exec(conn)
                .await?;
            Ok::<_, ServiceError>(pending.len())
        }
        .await;
        let count = uow.finish(result).await?;
        info!(professional_id, documents = count, verifier = %verifier, "professional_verified");
        Ok(count)
    }

    /// Clear `is_verified` only; documents are left untouched.
    pub async fn reject(&self, principal: &Principal, professional_id: i32) -> Result<(), ServiceError> {
        self.clear_verification(principal, professional_id, "rejected").await
    }

    pub async fn reset(&self, principal: &Principal, professional_id: i32) -> Result<(), ServiceError> {
        self.clear_verification(principal, professional_id, "reset").await
    }

    async fn clear_verification(&self, principal: &Principal, professional_id: i32, action: &str) -> Result<(), ServiceError> {
        principal.require_admin()?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let res = professional::Entity::update_many()
            .col_expr(professional::Column::IsVerified, Expr::value(false))
            .col_expr(professional::Column::UpdatedAt, Expr::value(now))
            .filter(professional::Column::Id.eq(professional_id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("Professional"));
        }
        info!(professional_id, action, by = %principal.label(), "verification_cleared");
        Ok(())
    }
}
