pub mod tefas;
pub mod util;

pub use tefas::TefasProvider;
