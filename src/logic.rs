pub mod converter;
pub mod decompiler;
pub mod navigate;
pub mod parser;
