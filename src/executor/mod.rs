pub mod capability;
pub mod coordinator;
pub mod desktop;
pub mod input;
pub mod mock;
