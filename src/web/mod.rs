//! Web form - upload a schema and a payload, get the verdict as a page

pub mod page;
pub mod server;
pub mod upload;

pub use page::{PageContext, PageRenderer, TemplateError};
pub use server::{build_router, FormServer, FormState, ServerConfig};
pub use upload::{sanitize_filename, UploadError, UploadPair};
