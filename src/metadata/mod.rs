pub mod method;
pub mod streams;
pub mod symbols;
pub mod tableid;
pub mod tables;
pub mod token;
