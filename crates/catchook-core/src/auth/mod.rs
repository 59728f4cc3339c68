//! Session lifecycle: cookie storage, credential schemes, the route guard and
//! the current-user loader.

pub mod cookies;
pub mod guard;
pub mod loader;
pub mod scheme;
pub mod session;

pub use cookies::{CookieJar, FileCookieJar, MemoryCookieJar};
pub use guard::{GuardDecision, RouteGuard};
pub use loader::{load_current_user, CurrentUserOutcome};
pub use scheme::{CredentialScheme, SessionIdScheme, TokenPairScheme};
pub use session::{Credential, SessionEvent, SessionStore, StoredCredential};
