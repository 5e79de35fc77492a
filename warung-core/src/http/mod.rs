//! HTTP surface of the edge: request view, responses, rendering and the
//! server loop

pub mod render;
pub mod request;
pub mod response;
pub mod server;

pub use render::{BasicRenderer, Page, PageRenderer, Rendered};
pub use request::RequestInfo;
pub use response::{EdgeBody, EdgeResponse};
pub use server::{handle, serve};
