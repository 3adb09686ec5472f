pub mod grading;
pub mod options;
pub mod search;
pub mod shuffle;

pub use options::OptionLayout;
