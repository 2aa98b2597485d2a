//! Next/previous selection under shuffle and repeat.

mod policy;

pub use policy::*;
