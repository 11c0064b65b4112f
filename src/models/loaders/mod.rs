pub mod target_loader;

pub use target_loader::{FileTargetLoader, StaticTargetLoader, TargetLoader};
