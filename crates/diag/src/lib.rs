pub mod diagnostic;
pub mod report;
mod snippet;
pub mod source;
mod style;
mod util;

pub use diagnostic::{Diagnostic, Location};
pub use report::Report;
pub use source::Source;
