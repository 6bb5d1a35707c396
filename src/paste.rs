// 粘贴拦截
//
// 剪贴板文本在落入输入框之前先经过规范化引擎，完全绕过平台默认的粘贴插入，
// 因此未规范化的文本不可能进入输入框。

use anyhow::Result;
use arboard::Clipboard;

use crate::normalizer::normalize;
use crate::replacement_map::ReplacementMap;

/// 剪贴板来源接口（测试用假实现，生产用系统剪贴板）
pub trait ClipboardSource {
    /// 读取纯文本剪贴板内容
    fn plain_text(&mut self) -> Result<String>;
}

/// 系统剪贴板
pub struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        Ok(Self {
            clipboard: Clipboard::new()?,
        })
    }
}

impl ClipboardSource for SystemClipboard {
    fn plain_text(&mut self) -> Result<String> {
        Ok(self.clipboard.get_text()?)
    }
}

/// 文本输入框模型
///
/// 选区 `[start, end)` 以字符索引计；start == end 即为光标
#[derive(Debug, Clone, Default)]
pub struct TextField {
    value: String,
    sel_start: usize,
    sel_end: usize,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            sel_start: 0,
            sel_end: 0,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// 当前选区（字符索引）
    pub fn selection(&self) -> (usize, usize) {
        (self.sel_start, self.sel_end)
    }

    /// 设置选区；越界处收敛到文本长度，start > end 时对调
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.value.chars().count();
        let start = start.min(len);
        let end = end.min(len);
        if start <= end {
            self.sel_start = start;
            self.sel_end = end;
        } else {
            self.sel_start = end;
            self.sel_end = start;
        }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// 用 `text` 替换当前选区（有选中内容时覆盖之，与默认粘贴语义一致），
    /// 然后把光标收拢到插入文本之后
    pub fn replace_selection(&mut self, text: &str) {
        let start_byte = self.byte_index(self.sel_start);
        let end_byte = self.byte_index(self.sel_end);
        self.value.replace_range(start_byte..end_byte, text);

        let cursor = self.sel_start + text.chars().count();
        self.sel_start = cursor;
        self.sel_end = cursor;
    }
}

/// 粘贴拦截器
///
/// 消费规范化引擎和 live map 快照，是剪贴板文本进入输入框的唯一路径
pub struct PasteInterceptor<C> {
    source: C,
}

impl<C: ClipboardSource> PasteInterceptor<C> {
    pub fn new(source: C) -> Self {
        Self { source }
    }

    /// 拦截一次粘贴
    ///
    /// 读取剪贴板纯文本，用当前 live map 快照规范化后拼入选区，
    /// 光标落在插入文本之后。返回实际插入的文本。
    pub fn intercept(&mut self, field: &mut TextField, map: &ReplacementMap) -> Result<String> {
        let payload = self.source.plain_text()?;
        let normalized = normalize(&payload, map);

        tracing::debug!(
            "粘贴拦截: {} 字符 -> {} 字符",
            payload.chars().count(),
            normalized.chars().count()
        );

        field.replace_selection(&normalized);
        Ok(normalized)
    }
}
