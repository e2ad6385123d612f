pub mod web;

pub use web::{cookie_header, Method, WebRequest, WebRequestError};
