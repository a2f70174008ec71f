pub mod approval;
pub mod authorizer;
pub mod mailer;
pub mod menu_tree;
pub mod session;
pub mod sync;
pub mod token;
pub mod totp;

pub use approval::ApprovalEngine;
pub use authorizer::Authorizer;
pub use mailer::{Mailer, NoopMailer, SmtpMailer};
pub use menu_tree::MenuTreeService;
pub use session::SessionService;
pub use token::TokenService;
pub use totp::TotpService;
