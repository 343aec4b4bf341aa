// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every route here sits behind `jwt_auth_middleware`, which injects the
// caller as `Extension<AuthUser>`. Material and chat handlers pass the raw
// path id to `MaterialService`, which applies the existence then ownership
// gate before anything else runs.

pub mod chat;
pub mod material;
pub mod user;

pub use chat::ask_question;
pub use user::user_me;
