pub mod capabilities;
pub mod file;
pub mod model;
pub mod net;
pub mod process;
pub mod validate;

// Re-export main types for convenience
pub use model::{Action, HostPolicy, HostPolicySpec, ObjectMeta, ObjectRef, SourceRef, Verdict};
pub use validate::{PolicyViolation, Section, ViolationKind, validate};
