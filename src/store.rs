// 替换表存储
//
// live map（生效中的替换表）的唯一写入方，同时是与持久化服务端之间的桥。
// 规范化与粘贴拦截只读取快照，不直接改表。
//
// 单线程协作式模型：所有操作在一个执行线程上运行，仅在网络 I/O 处挂起，
// 因此用 RefCell/Cell 即可，无需锁。

use std::cell::{Cell, RefCell};
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::replacement_map::{ReplacementMap, WireMap};

/// 持久化/提交操作的失败分类
#[derive(Debug, Error)]
pub enum StoreError {
    /// 请求未能到达服务端（网络层）
    #[error("无法连接服务端: {0}")]
    Transport(String),
    /// 服务端返回非成功状态；消息为响应体原文（为空时用通用兜底文案）
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl StoreError {
    /// 构造服务端拒绝错误，响应体为空时填入通用文案
    pub fn rejected(status: u16, body: String) -> Self {
        let message = if body.trim().is_empty() {
            format!("服务端返回错误状态 {}", status)
        } else {
            body
        };
        StoreError::Rejected { status, message }
    }

    fn transport(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// 持久化协作方接口
///
/// 生产实现为 HTTP 服务端（`HttpBackend`），测试用内存实现。
#[allow(async_fn_in_trait)]
pub trait ReplacementBackend {
    /// 拉取服务端持久化的完整替换表
    async fn fetch(&self) -> Result<ReplacementMap, StoreError>;
    /// 以整表替换语义写入服务端（非合并）
    async fn store(&self, map: &ReplacementMap) -> Result<(), StoreError>;
}

/// HTTP 持久化服务端
///
/// GET /replacements -> JSON 对象（完整替换表）
/// POST /replacements <- 同形 JSON 对象，整表替换
pub struct HttpBackend {
    endpoint: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            endpoint: format!("{}/replacements", base_url.trim_end_matches('/')),
            client,
        }
    }
}

impl ReplacementBackend for HttpBackend {
    async fn fetch(&self) -> Result<ReplacementMap, StoreError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(StoreError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::rejected(status.as_u16(), body));
        }

        let wire: WireMap = response.json().await.map_err(StoreError::transport)?;
        Ok(ReplacementMap::from_wire(wire))
    }

    async fn store(&self, map: &ReplacementMap) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&map.to_wire())
            .send()
            .await
            .map_err(StoreError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::rejected(status.as_u16(), body));
        }

        Ok(())
    }
}

/// 替换表存储
///
/// 持有 live map 并保证唯一写入路径：只有确认成功的 load/save 才会整表换入。
/// 失败路径不触碰 live map，候选表直接丢弃。
pub struct ReplacementStore<B> {
    backend: B,
    live: RefCell<ReplacementMap>,
    /// 请求序号发号器
    next_token: Cell<u64>,
    /// 已生效响应的最大序号，晚到的旧响应据此丢弃
    applied_token: Cell<u64>,
}

impl<B: ReplacementBackend> ReplacementStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            live: RefCell::new(ReplacementMap::new()),
            next_token: Cell::new(0),
            applied_token: Cell::new(0),
        }
    }

    /// 读取 live map 的快照
    pub fn snapshot(&self) -> ReplacementMap {
        self.live.borrow().clone()
    }

    fn issue_token(&self) -> u64 {
        let token = self.next_token.get() + 1;
        self.next_token.set(token);
        token
    }

    /// 将一次成功响应换入 live map
    ///
    /// 若已有更新的请求先行生效，则丢弃本次结果（last-applied-wins 防护）
    fn apply(&self, token: u64, map: ReplacementMap) -> bool {
        if token <= self.applied_token.get() {
            tracing::warn!(
                "丢弃过期响应（token {} <= 已生效 {}）",
                token,
                self.applied_token.get()
            );
            return false;
        }
        self.applied_token.set(token);
        *self.live.borrow_mut() = map;
        true
    }

    /// 从服务端加载替换表
    ///
    /// 成功时整表替换 live map（不合并）并返回加载结果供展示；
    /// 失败时 live map 原样保留，错误上抛。
    pub async fn load(&self) -> Result<ReplacementMap, StoreError> {
        let token = self.issue_token();
        let fetched = self.backend.fetch().await?;

        tracing::info!("已加载 {} 条替换规则", fetched.len());
        self.apply(token, fetched.clone());
        Ok(fetched)
    }

    /// 保存候选替换表
    ///
    /// 先按表不变量过滤候选，再把过滤后的完整集合发给服务端（整表替换）。
    /// 服务端确认成功后才换入 live map；失败时 live map 不变，候选丢弃。
    /// 返回实际持久化的过滤结果。
    pub async fn save(&self, candidate: ReplacementMap) -> Result<ReplacementMap, StoreError> {
        let filtered = candidate.retain_valid();
        if filtered.len() < candidate.len() {
            tracing::debug!(
                "保存时过滤掉 {} 条非法条目",
                candidate.len() - filtered.len()
            );
        }

        let token = self.issue_token();
        self.backend.store(&filtered).await?;

        tracing::info!("已保存 {} 条替换规则", filtered.len());
        self.apply(token, filtered.clone());
        Ok(filtered)
    }
}
