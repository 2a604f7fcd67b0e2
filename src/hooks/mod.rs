/// Signal receivers
///
/// This module handles:
/// - Assigning student identifiers after creation (identifier.rs)
/// - Generating image thumbnails after creation (thumbnail.rs)
/// - Rejecting students without a name before saving (validate.rs)
/// - Logging every lifecycle and migration signal (audit.rs)
pub mod audit;
pub mod identifier;
pub mod thumbnail;
pub mod validate;

pub use audit::AuditLog;
pub use identifier::{student_identifier, IdentifierAssigner};
pub use thumbnail::{fit_within, thumbnail_name, DerivedAssetGenerator};
pub use validate::NameValidator;
