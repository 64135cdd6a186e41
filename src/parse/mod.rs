pub mod markup;
pub mod response;
