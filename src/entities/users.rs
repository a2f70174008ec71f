use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    pub display_name: String,

    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Base32 TOTP secret, present once the user is enrolled in 2FA
    pub totp_secret: Option<String>,

    /// otpauth:// provisioning URL matching the secret
    pub totp_url: Option<String>,

    pub is_two_fa: bool,

    pub is_active: bool,

    /// Single live rotation token; overwritten on every login
    pub rotation_token: Option<String>,

    pub created_at: String,

    pub updated_at: String,

    pub created_by: Option<i32>,

    pub updated_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_roles::Entity")]
    UserRoles,
}

impl Related<super::user_roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
