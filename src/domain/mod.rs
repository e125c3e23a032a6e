pub mod engagement;
pub mod fms;
pub mod post;
