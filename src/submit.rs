// 文本提交（文本接收端协作方边界）
//
// 输入框内容原样发送：规范化已在粘贴时完成，键入的文本按约定不再处理。

use std::time::Duration;

use reqwest::Client;

use crate::store::StoreError;

/// 提交客户端：POST {base}/submit，Content-Type: text/plain
pub struct SubmitClient {
    endpoint: String,
    client: Client,
}

impl SubmitClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            endpoint: format!("{}/submit", base_url.trim_end_matches('/')),
            client,
        }
    }

    /// 提交原始文本
    ///
    /// 2xx 成功；非 2xx 时响应体作为人类可读错误消息原样上抛
    pub async fn submit(&self, text: &str) -> Result<(), StoreError> {
        tracing::info!("提交文本 ({} 字符)", text.chars().count());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/plain")
            .body(text.to_string())
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::rejected(status.as_u16(), body));
        }

        Ok(())
    }
}

/// 找出第一个非 ASCII 字符
///
/// 接收端可能拒绝非 ASCII 输入（无分解且无表条目的字符会透传到这里），
/// 提交前可用于提前提醒；提交本身仍发送原文。
pub fn first_non_ascii(text: &str) -> Option<char> {
    text.chars().find(|ch| !ch.is_ascii())
}
