//! ascii-bridge
//!
//! 把任意 Unicode 文本规范化为尽力而为的 ASCII，并桥接到文本接收服务端。
//!
//! ## 处理流程
//! 1. NFKD 兼容分解 + 删除组合变音符（U+0300-U+036F）
//! 2. 剩余非 ASCII 字符查用户维护的替换表兜底
//! 3. 粘贴拦截：剪贴板文本规范化后才进入输入框
//! 4. 替换表经编辑器 -> 存储 -> 服务端的生命周期维护

pub mod config;
pub mod editor;
pub mod normalizer;
pub mod paste;
pub mod replacement_map;
pub mod store;
pub mod submit;

pub use config::AppConfig;
pub use editor::{Banner, BannerKind, EditRow, EditorState, TableEditor};
pub use normalizer::normalize;
pub use paste::{PasteInterceptor, SystemClipboard, TextField};
pub use replacement_map::ReplacementMap;
pub use store::{HttpBackend, ReplacementBackend, ReplacementStore, StoreError};
pub use submit::{first_non_ascii, SubmitClient};
