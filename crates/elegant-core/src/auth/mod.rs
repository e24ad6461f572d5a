//! Authentication: the identity capability the store consults, and the
//! Supabase client that produces sessions for it.

mod identity;
mod supabase;

pub use identity::{AuthProvider, AuthState};
pub use supabase::{
    normalize_auth_url, AuthError, AuthResult, AuthSession, AuthUser, SessionPersistence,
    SupabaseAuthClient,
};
