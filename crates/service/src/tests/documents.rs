use std::sync::Arc;

use models::professional_document;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::documents::{DocumentService, FileStore, LocalFileStore, UploadPolicy, UploadedFile};
use crate::errors::ServiceError;
use crate::test_support::{admin, memory_db, professional_row, seed_customer, seed_professional, seed_service};

fn pdf(name: &str) -> UploadedFile {
    UploadedFile { file_name: name.into(), bytes: b"%PDF-1.4 test".to_vec() }
}

fn policy() -> UploadPolicy {
    UploadPolicy { max_file_bytes: 64, allowed_extensions: vec!["pdf".into(), "jpg".into()] }
}

#[tokio::test]
async fn upload_then_verify_flips_professional_flags() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let dir = tempfile::tempdir()?;
    let store = Arc::new(LocalFileStore::new(dir.path()));
    let docs = DocumentService::new(db.clone(), store.clone(), policy());
    let svc = seed_service(&db, "Electrical").await?;
    let pro = seed_professional(&db, "pro@example.com", svc.id, false).await?;

    let uploaded = docs.upload(&pro, vec![pdf("id card.pdf"), pdf("licence.jpg")], None).await?;
    assert_eq!(uploaded.len(), 2);
    assert!(uploaded.iter().all(|d| d.document_type == professional_document::DEFAULT_DOCUMENT_TYPE && d.status == "pending_verification"));

    let own = docs.list_own(&pro).await?;
    assert_eq!(own.len(), 2);
    for d in &own {
        assert!(!d.is_verified);
        assert!(d.document_url.starts_with("professional_documents/"));
        assert!(store.resolve(&d.document_url)?.exists());
    }

    let n = docs.verify(&admin(), pro.require_professional()?).await?;
    assert_eq!(n, 2);
    let row = professional_row(&db, &pro).await?;
    assert!(row.is_verified && row.document_verified);
    let verified = docs.list_for(&admin(), row.id).await?;
    assert!(verified.iter().all(|d| d.is_verified && d.verified_by.as_deref() == Some("admin:admin@example.com") && d.verification_date.is_some()));
    Ok(())
}

#[tokio::test]
async fn verify_without_pending_documents_changes_nothing() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let dir = tempfile::tempdir()?;
    let docs = DocumentService::new(db.clone(), Arc::new(LocalFileStore::new(dir.path())), policy());
    let svc = seed_service(&db, "Electrical").await?;
    let pro = seed_professional(&db, "pro@example.com", svc.id, false).await?;

    let err = docs.verify(&admin(), pro.require_professional()?).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref m) if m == "No unverified documents found"));
    let row = professional_row(&db, &pro).await?;
    assert!(!row.is_verified && !row.document_verified);

    assert!(matches!(docs.verify(&admin(), 4242).await, Err(ServiceError::NotFound(_))));
    assert!(matches!(docs.verify(&pro, pro.require_professional()?).await, Err(ServiceError::Forbidden(_))));
    Ok(())
}

#[tokio::test]
async fn reject_and_reset_leave_documents_alone() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let dir = tempfile::tempdir()?;
    let docs = DocumentService::new(db.clone(), Arc::new(LocalFileStore::new(dir.path())), policy());
    let svc = seed_service(&db, "Electrical").await?;
    let pro = seed_professional(&db, "pro@example.com", svc.id, false).await?;
    let pid = pro.require_professional()?;

    docs.upload(&pro, vec![pdf("id.pdf")], Some("licence".into())).await?;
    docs.verify(&admin(), pid).await?;

    docs.reject(&admin(), pid).await?;
    let row = professional_row(&db, &pro).await?;
    assert!(!row.is_verified);
    assert!(row.document_verified);
    assert!(docs.list_own(&pro).await?.iter().all(|d| d.is_verified && d.document_type == "licence"));

    // 重新审核需要新上传的文件
    assert!(matches!(docs.verify(&admin(), pid).await, Err(ServiceError::Validation(_))));
    docs.reset(&admin(), pid).await?;
    assert!(matches!(docs.reset(&admin(), 9999).await, Err(ServiceError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn bad_files_are_rejected_before_anything_is_written() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let dir = tempfile::tempdir()?;
    let docs = DocumentService::new(db.clone(), Arc::new(LocalFileStore::new(dir.path())), policy());
    let svc = seed_service(&db, "Electrical").await?;
    let pro = seed_professional(&db, "pro@example.com", svc.id, false).await?;

    let exe = UploadedFile { file_name: "run.exe".into(), bytes: vec![1, 2, 3] };
    assert!(matches!(docs.upload(&pro, vec![pdf("ok.pdf"), exe], None).await, Err(ServiceError::Validation(_))));
    let big = UploadedFile { file_name: "big.pdf".into(), bytes: vec![0; 65] };
    assert!(matches!(docs.upload(&pro, vec![big], None).await, Err(ServiceError::Validation(_))));
    assert!(matches!(docs.upload(&pro, vec![], None).await, Err(ServiceError::Validation(_))));

    assert_eq!(professional_document::Entity::find().count(&db).await?, 0);
    assert!(!dir.path().join("professional_documents").exists());
    Ok(())
}

#[tokio::test]
async fn only_owner_or_admin_sees_documents() -> Result<(), anyhow::Error> {
    let db = memory_db().await?;
    let dir = tempfile::tempdir()?;
    let docs = DocumentService::new(db.clone(), Arc::new(LocalFileStore::new(dir.path())), policy());
    let svc = seed_service(&db, "Electrical").await?;
    let pro = seed_professional(&db, "pro@example.com", svc.id, false).await?;
    let other = seed_professional(&db, "other@example.com", svc.id, false).await?;
    let customer = seed_customer(&db, "cust@example.com").await?;
    let pid = pro.require_professional()?;

    docs.upload(&pro, vec![pdf("id.pdf")], None).await?;
    assert_eq!(docs.list_for(&pro, pid).await?.len(), 1);
    assert!(matches!(docs.list_for(&other, pid).await, Err(ServiceError::Forbidden(_))));
    assert!(matches!(docs.list_for(&customer, pid).await, Err(ServiceError::Forbidden(_))));
    assert!(matches!(docs.upload(&customer, vec![pdf("id.pdf")], None).await, Err(ServiceError::Forbidden(_))));
    Ok(())
}

#[tokio::test]
async fn failed_insert_removes_saved_files() -> Result<(), anyhow::Error> {
    use sea_orm::ConnectionTrait;

    let db = memory_db().await?;
    let dir = tempfile::tempdir()?;
    let docs = DocumentService::new(db.clone(), Arc::new(LocalFileStore::new(dir.path())), policy());
    let svc = seed_service(&db, "Electrical").await?;
    let pro = seed_professional(&db, "pro@example.com", svc.id, false).await?;
    let pid = pro.require_professional()?;

    // 让插入失败：文件已写入，记录写不进去
    db.execute_unprepared("DROP TABLE professional_documents").await?;
    assert!(docs.upload(&pro, vec![pdf("id.pdf"), pdf("licence.jpg")], None).await.is_err());

    let pro_dir = dir.path().join(crate::documents::service::DOCUMENTS_DIR).join(pid.to_string());
    let left = match std::fs::read_dir(&pro_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    };
    assert_eq!(left, 0);
    Ok(())
}
