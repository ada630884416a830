pub mod health;
pub mod schemas;
pub mod submit;
pub mod subscribe;
pub mod tokens;
