pub mod prompt;
pub mod provider;
pub mod providers;
pub mod tools;
pub mod translator;
pub mod types;
