//! # CLI Commands / 命令行命令
//!
//! - `run` - preflight, execute test modules and print the summary
//! - `init` - write the default configuration and reference test modules
//!
//! - `run` - 预检、执行测试模块并打印摘要
//! - `init` - 写出默认配置和参考测试模块

pub mod init;
pub mod run;
