//! 공시 모니터링 도메인 모델.

mod filing;
mod purchase;
mod window;

pub use filing::*;
pub use purchase::*;
pub use window::*;
