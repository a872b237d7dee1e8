pub mod diagnostics;
pub mod health;
pub mod oauth;
pub mod posts;
pub mod settings;
pub mod validate;
