pub mod audit_event;
pub mod board;
pub mod card;
pub mod column;
pub mod membership;
pub mod organization;
pub mod project;
pub mod signoff_request;
pub mod token;
pub mod user;

pub use audit_event::AuditEvent;
pub use board::Board;
pub use card::{Card, Priority};
pub use column::BoardColumn;
pub use membership::{Member, Membership, OrganizationWithRole, Role};
pub use organization::Organization;
pub use project::Project;
pub use signoff_request::{SignoffRequest, SignoffRequestStatus};
pub use token::{PasswordResetToken, RefreshToken};
pub use user::User;
