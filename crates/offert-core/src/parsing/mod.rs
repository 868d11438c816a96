pub mod delimiter;
pub mod tokens;
