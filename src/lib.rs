pub mod clock;
pub mod lifecycle;
