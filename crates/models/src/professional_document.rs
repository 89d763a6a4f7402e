use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::professional;

pub const DEFAULT_DOCUMENT_TYPE: &str = "identity_document";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "professional_documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub professional_id: i32,
    pub document_type: String,
    /// Storage locator relative to the upload root.
    pub document_url: String,
    pub is_verified: bool,
    pub verified_by: Option<String>,
    pub verification_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Professional }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Professional => Entity::belongs_to(professional::Entity)
                .from(Column::ProfessionalId)
                .to(professional::Column::Id)
                .into(),
        }
    }
}

impl Related<professional::Entity> for Entity {
    fn to() -> RelationDef { Relation::Professional.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// 新上传的文档总是追加一行，未验证
pub async fn create<C: ConnectionTrait>(
    db: &C,
    professional_id: i32,
    document_type: &str,
    locator: &str,
) -> Result<Model, ModelError> {
    let document_type = document_type.trim();
    if document_type.chars().count() > 50 {
        return Err(ModelError::validation("document type too long (<=50)"));
    }
    let am = ActiveModel {
        professional_id: Set(professional_id),
        document_type: Set(if document_type.is_empty() { DEFAULT_DOCUMENT_TYPE.to_string() } else { document_type.to_string() }),
        document_url: Set(locator.to_string()),
        is_verified: Set(false),
        verified_by: Set(None),
        verification_date: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn list_for_professional<C: ConnectionTrait>(db: &C, professional_id: i32) -> Result<Vec<Model>, ModelError> {
    Entity::find()
        .filter(Column::ProfessionalId.eq(professional_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn list_unverified<C: ConnectionTrait>(db: &C, professional_id: i32) -> Result<Vec<Model>, ModelError> {
    Entity::find()
        .filter(Column::ProfessionalId.eq(professional_id))
        .filter(Column::IsVerified.eq(false))
        .order_by_asc(Column::Id)
        .all(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}
