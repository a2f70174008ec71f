pub use super::activity_logs::Entity as ActivityLogs;
pub use super::approval_histories::Entity as ApprovalHistories;
pub use super::approval_levels::Entity as ApprovalLevels;
pub use super::approval_users::Entity as ApprovalUsers;
pub use super::approvals::Entity as Approvals;
pub use super::currencies::Entity as Currencies;
pub use super::departments::Entity as Departments;
pub use super::machines::Entity as Machines;
pub use super::menus::Entity as Menus;
pub use super::reset_tokens::Entity as ResetTokens;
pub use super::role_menus::Entity as RoleMenus;
pub use super::role_permissions::Entity as RolePermissions;
pub use super::roles::Entity as Roles;
pub use super::user_roles::Entity as UserRoles;
pub use super::users::Entity as Users;
