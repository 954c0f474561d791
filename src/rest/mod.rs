pub mod resource;
pub mod response;
