//! 工具箱：Tool trait、注册表、函数适配器与带重试的执行器

pub mod echo;
pub mod executor;
pub mod function;
pub mod input;
pub mod registry;

pub use echo::EchoTool;
pub use executor::{Backoff, CancellationPolicy, InvocationScope, RetryPolicy, ToolExecutor};
pub use function::FnTool;
pub use input::ToolInput;
pub use registry::{Tool, ToolNameConflict, ToolRegistry};
