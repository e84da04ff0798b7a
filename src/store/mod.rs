pub mod demo_store;
pub mod fixtures;
pub mod preferences;

pub use demo_store::{Change, DemoStore, StoreState, Stored};
