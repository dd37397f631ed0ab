pub mod audit;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod hierarchy;
pub mod memberships;
pub mod organizations;
pub mod password_reset_tokens;
pub mod projects;
pub mod refresh_tokens;
pub mod signoff;
pub mod users;
