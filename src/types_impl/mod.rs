pub mod daytime;
pub mod decimal;
pub mod lob;
