pub mod generated_content;
pub mod material;
pub mod user;

pub use generated_content::{ContentKind, GeneratedContent, NewGeneratedContent};
pub use material::{FileType, Material, MaterialWithContent, NewMaterial};
pub use user::{NewUser, User};

/// A stored enum column held a value outside its allowed set.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
