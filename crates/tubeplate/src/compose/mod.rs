//! Description composition.
//!
//! Templates are plain text fragments containing `{{name}}` placeholders. A
//! container orders templates and supplies a separator; the builder resolves
//! each placeholder against the video's bound variables (or a built-in
//! default) and joins the results.
//!
//! Everything in this module is pure: no I/O, no clock, no randomness.

mod builder;
mod variables;

pub use builder::{
    Fragment, MAX_DESCRIPTION_CHARS, VariableBindings, build_description, builtin_default,
    exceeds_platform_limit,
};
pub use variables::extract_variables;
