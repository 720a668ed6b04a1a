pub mod hiring;
pub mod intake;
