//! Application services.
//!
//! Services sit between the HTTP routes and the backend clients: the session
//! service owns authentication state, the profile service owns per-user
//! profile documents, and the member directory drives the admin panel.

pub mod directory;
pub mod profiles;
pub mod session;

pub use directory::{DirectoryError, MemberDirectory, MemberPage};
pub use profiles::ProfileService;
pub use session::{AuthState, SessionService};
