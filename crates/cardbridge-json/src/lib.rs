pub mod frame;
pub mod number;
pub mod parser;
pub mod serializer;
pub mod value;
pub mod wire;

pub use frame::FrameCodec;
pub use parser::parse;
pub use serializer::to_string;
pub use value::{JsonValue, ObjectBuilder};
pub use wire::{event, incomplete_response, parse_request, response, Request};
