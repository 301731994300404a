pub mod body;
pub mod validation;
