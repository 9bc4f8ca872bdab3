pub mod movie;
pub mod page;

pub use movie::*;
pub use page::*;
