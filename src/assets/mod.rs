pub mod background;
pub mod decode;
pub mod normalize;
pub mod rotation;
pub mod weekly;
