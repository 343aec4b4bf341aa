pub mod content;
pub mod generate;
pub mod record;

// Re-export handler functions for use in routing
pub use content::content_get;
pub use generate::{quiz_post, summarize_post};
pub use record::{
    material_delete, material_get, material_list, material_list_with_content, material_post,
};
