//! `SeaORM` Entity for movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub description: String,
    pub occurred_at: DateTimeWithTimeZone,
    pub sequence: i64,
    pub balance_after: Decimal,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub direction: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub line_items: Option<Json>,
    pub state: String,
    pub cancel_reason: Option<String>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
    pub cancelled_by_id: Option<Uuid>,
    pub cancelled_by_name: Option<String>,
    pub modify_reason: Option<String>,
    pub modified_at: Option<DateTimeWithTimeZone>,
    pub modified_by_id: Option<Uuid>,
    pub modified_by_name: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub prior_snapshot: Option<Json>,
    pub replaces: Option<Uuid>,
    pub replaced_by: Option<Uuid>,
    pub idempotency_key: Option<String>,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
