//! Wire framing and the per-operation packet layer.

pub(crate) mod error_code;
pub mod frame;
pub mod function_code;
pub mod packet;

pub use function_code::FunctionCode;
