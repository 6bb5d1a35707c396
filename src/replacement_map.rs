// 替换表数据实体
//
// ReplacementMap：单个 Unicode 字符 -> 非空 ASCII 字符串
// 插入顺序保留（供编辑器展示），查找语义与顺序无关

use indexmap::IndexMap;

/// 线上传输格式：JSON 对象 {"字符": "ASCII 替换串", ...}
pub type WireMap = IndexMap<String, String>;

/// 替换表
///
/// 不变量：键恰好一个码点；值非空且全部为 ASCII（0x00-0x7F）。
/// 违反不变量的条目在保存边界被过滤，不会入表。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMap {
    entries: IndexMap<char, String>,
}

impl ReplacementMap {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入条目（同键覆盖，保留首次插入的位置）
    pub fn insert(&mut self, key: char, value: String) {
        self.entries.insert(key, value);
    }

    /// 查找某字符的替换串
    pub fn lookup(&self, key: char) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按插入顺序遍历条目
    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// 校验一对编辑器字段是否满足表不变量
    ///
    /// 键恰好一个码点、值非空且全为 ASCII
    pub fn entry_is_valid(key: &str, value: &str) -> bool {
        let mut chars = key.chars();
        let single = chars.next().is_some() && chars.next().is_none();
        single && !value.is_empty() && value.bytes().all(|b| b.is_ascii())
    }

    /// 保存边界过滤：仅保留满足不变量的条目
    ///
    /// 键为 `char`，单码点由类型保证，这里只需检查值
    pub fn retain_valid(&self) -> ReplacementMap {
        let entries = self
            .entries
            .iter()
            .filter(|(_, v)| !v.is_empty() && v.bytes().all(|b| b.is_ascii()))
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        ReplacementMap { entries }
    }

    /// 宽松解码线上格式：跳过违反不变量的条目，不报错
    pub fn from_wire(wire: WireMap) -> Self {
        let mut map = ReplacementMap::new();
        for (key, value) in wire {
            if !ReplacementMap::entry_is_valid(&key, &value) {
                tracing::warn!("忽略非法替换条目: {:?} -> {:?}", key, value);
                continue;
            }
            // entry_is_valid 保证恰好一个码点
            if let Some(ch) = key.chars().next() {
                map.insert(ch, value);
            }
        }
        map
    }

    /// 编码为线上传输格式
    pub fn to_wire(&self) -> WireMap {
        self.entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}
