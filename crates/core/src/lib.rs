//! `userman-core` — domain foundation for the user-management service.
//!
//! This crate contains **pure domain** primitives (no IO): identity records,
//! RBAC entities, the session model, the error taxonomy, and the async store
//! contracts the auth engine is written against.

pub mod error;
pub mod id;
pub mod rbac;
pub mod session;
pub mod store;
pub mod user;

pub use error::{AuthError, AuthResult, StoreError};
pub use id::{PermissionId, RoleId, SessionId, UserId};
pub use rbac::{Permission, RbacSnapshot, Role, RoleWithPermissions};
pub use session::{NewSession, Session};
pub use store::{RbacStore, SessionStore, UserStore};
pub use user::{NewUser, ProfileUpdate, User};
