pub mod decode;
pub mod font;
pub mod source;
