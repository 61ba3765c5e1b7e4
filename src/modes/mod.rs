pub mod human;

pub use human::{AdapterReport, HumanMode};
