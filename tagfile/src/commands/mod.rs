pub mod check;
pub mod dump;

pub use check::run as check;
pub use dump::run as dump;
