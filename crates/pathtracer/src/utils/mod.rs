pub mod counter;
pub mod timer;
