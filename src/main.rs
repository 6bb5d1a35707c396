// ascii-bridge 入口
//
// 用法：
//   ascii-bridge           # 剪贴板文本经粘贴拦截器规范化后提交
//   ascii-bridge "文本"    # 参数文本视为键入内容，原样提交（不再规范化）

use anyhow::Result;

use ascii_bridge::config::AppConfig;
use ascii_bridge::paste::{PasteInterceptor, SystemClipboard, TextField};
use ascii_bridge::store::{HttpBackend, ReplacementStore};
use ascii_bridge::submit::{first_non_ascii, SubmitClient};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;
    tracing::info!("服务端: {}", config.server_base_url);

    let timeout = config.request_timeout();
    let store = ReplacementStore::new(HttpBackend::new(&config.server_base_url, timeout));

    // 加载失败不致命：退化为仅分解的规范化（空表），与页面未加载表时的行为一致
    if let Err(e) = store.load().await {
        tracing::warn!("加载替换表失败，使用空表继续: {}", e);
    }

    let text = match std::env::args().nth(1) {
        // 键入的文本按约定原样发送
        Some(typed) => typed,
        None => {
            let mut field = TextField::new();
            let mut paste = PasteInterceptor::new(SystemClipboard::new()?);
            let inserted = paste.intercept(&mut field, &store.snapshot())?;
            if inserted.is_empty() {
                anyhow::bail!("剪贴板为空");
            }
            field.value().to_string()
        }
    };

    if let Some(ch) = first_non_ascii(&text) {
        tracing::warn!("文本仍含非 ASCII 字符 {:?}，接收端可能拒绝", ch);
    }

    let submit = SubmitClient::new(&config.server_base_url, timeout);
    match submit.submit(&text).await {
        Ok(()) => {
            println!("✓ 已发送 {} 字符", text.chars().count());
            Ok(())
        }
        Err(e) => {
            anyhow::bail!("发送失败: {}", e);
        }
    }
}
