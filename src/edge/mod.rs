//! Edge fabric wire types: the viewer-request event in, the decision out.
pub mod event;
pub mod response;

pub use event::{EdgeEvent, EdgeRequest, HeaderEntry, Headers};
pub use response::{Decision, EdgeOutput, EdgeResponse, ResponseTemplates};
