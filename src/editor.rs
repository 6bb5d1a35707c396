// 替换表编辑器
//
// 行编辑缓冲区上的状态机。编辑缓冲区与 live map 彼此独立：
// 任何行操作都不触碰 live map，只有 ReplacementStore.save 确认成功后才生效。

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::replacement_map::ReplacementMap;
use crate::store::StoreError;

/// 横幅默认展示时长
pub const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(3);

/// 编辑器状态
///
/// Empty -> Loaded -> Dirty -> Saving -> (Loaded | SaveError)
/// SaveError 下行数据完整保留，仍可继续编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    #[default]
    Empty,
    Loaded,
    Dirty,
    Saving,
    SaveError,
}

/// 一行可编辑的（字符, 替换串）对
///
/// 仅属于编辑器；在保存完成前不影响 ReplacementMap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRow {
    pub id: u64,
    /// 字符输入框内容（UI 限制单字符，这里保留原始字符串）
    pub character: String,
    /// ASCII 替换串输入框内容
    pub replacement: String,
}

/// 横幅类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Success,
    Error,
}

/// 瞬态消息横幅
///
/// 到期自动消失；展示与消失都不改变编辑器状态
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub kind: BannerKind,
    shown_at: Instant,
    ttl: Duration,
}

impl Banner {
    pub fn is_visible(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) < self.ttl
    }
}

/// 替换表编辑器
pub struct TableEditor {
    rows: Vec<EditRow>,
    next_row_id: u64,
    state: EditorState,
    banner: Option<Banner>,
    banner_ttl: Duration,
}

impl Default for TableEditor {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER_TTL)
    }
}

impl TableEditor {
    pub fn new(banner_ttl: Duration) -> Self {
        Self {
            rows: Vec::new(),
            next_row_id: 0,
            state: EditorState::Empty,
            banner: None,
            banner_ttl,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn rows(&self) -> &[EditRow] {
        &self.rows
    }

    /// 当前可见的横幅（过期后返回 None）
    pub fn banner(&self, now: Instant) -> Option<&Banner> {
        self.banner.as_ref().filter(|b| b.is_visible(now))
    }

    fn show_banner(&mut self, text: String, kind: BannerKind, now: Instant) {
        self.banner = Some(Banner {
            text,
            kind,
            shown_at: now,
            ttl: self.banner_ttl,
        });
    }

    /// 加载失败等操作边界错误：只弹横幅，不改状态
    pub fn show_error(&mut self, text: impl Into<String>, now: Instant) {
        self.show_banner(text.into(), BannerKind::Error, now);
    }

    fn push_row(&mut self, character: String, replacement: String) -> u64 {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.push(EditRow {
            id,
            character,
            replacement,
        });
        id
    }

    /// 用一次成功 load 的结果重建行缓冲区
    ///
    /// 持久化表为空时自动补一个空白行（编辑便利），且恰好一个
    pub fn set_loaded(&mut self, map: &ReplacementMap) {
        self.rows.clear();
        for (ch, replacement) in map.iter() {
            self.push_row(ch.to_string(), replacement.to_string());
        }
        if self.rows.is_empty() {
            self.push_row(String::new(), String::new());
        }
        self.state = EditorState::Loaded;
    }

    /// 追加一个空白行；任何状态下均允许
    pub fn add_row(&mut self) -> u64 {
        let id = self.push_row(String::new(), String::new());
        self.state = EditorState::Dirty;
        id
    }

    /// 删除指定行；任何状态下均允许，id 不存在时为 no-op
    pub fn delete_row(&mut self, id: u64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        let removed = self.rows.len() < before;
        if removed {
            self.state = EditorState::Dirty;
        }
        removed
    }

    /// 更新指定行的两个输入框内容
    pub fn update_row(&mut self, id: u64, character: &str, replacement: &str) -> bool {
        let Some(row) = self.rows.iter_mut().find(|row| row.id == id) else {
            return false;
        };
        row.character = character.to_string();
        row.replacement = replacement.to_string();
        self.state = EditorState::Dirty;
        true
    }

    /// 由当前行构建候选替换表
    ///
    /// 任一输入框为空的行被静默跳过（半填行不持久化，不是错误）；
    /// 多码点字符无法成为表键，同样留给保存边界排除。
    /// 同键冲突按行序后者覆盖前者。
    pub fn candidate(&self) -> ReplacementMap {
        let mut map = ReplacementMap::new();
        for row in &self.rows {
            if row.character.is_empty() || row.replacement.is_empty() {
                continue;
            }
            let mut chars = row.character.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                continue;
            };
            map.insert(ch, row.replacement.clone());
        }
        map
    }

    /// 进入 Saving 并返回待保存的候选表
    pub fn begin_save(&mut self) -> ReplacementMap {
        self.state = EditorState::Saving;
        self.candidate()
    }

    /// 保存结束：按结果迁移状态并弹出瞬态横幅，行数据始终保留
    pub fn finish_save(&mut self, result: &Result<ReplacementMap, StoreError>, now: Instant) {
        match result {
            Ok(saved) => {
                self.state = EditorState::Loaded;
                self.show_banner(
                    format!("已保存 {} 条替换规则", saved.len()),
                    BannerKind::Success,
                    now,
                );
            }
            Err(err) => {
                self.state = EditorState::SaveError;
                self.show_banner(err.to_string(), BannerKind::Error, now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(entries: &[(char, &str)]) -> ReplacementMap {
        let mut map = ReplacementMap::new();
        for (k, v) in entries {
            map.insert(*k, v.to_string());
        }
        map
    }

    #[test]
    fn test_empty_load_appends_exactly_one_blank_row() {
        let mut editor = TableEditor::default();
        editor.set_loaded(&ReplacementMap::new());

        assert_eq!(editor.state(), EditorState::Loaded);
        assert_eq!(editor.rows().len(), 1);
        assert!(editor.rows()[0].character.is_empty());
        assert!(editor.rows()[0].replacement.is_empty());

        // 重复加载不会堆积空白行
        editor.set_loaded(&ReplacementMap::new());
        assert_eq!(editor.rows().len(), 1);
    }

    #[test]
    fn test_loaded_rows_mirror_map_order() {
        let mut editor = TableEditor::default();
        editor.set_loaded(&map_of(&[('€', "EUR"), ('ß', "ss")]));

        assert_eq!(editor.rows().len(), 2);
        assert_eq!(editor.rows()[0].character, "€");
        assert_eq!(editor.rows()[1].replacement, "ss");
    }

    #[test]
    fn test_candidate_skips_half_filled_rows() {
        let mut editor = TableEditor::default();
        editor.set_loaded(&ReplacementMap::new());

        let blank = editor.rows()[0].id;
        editor.update_row(blank, "", "x");
        let r2 = editor.add_row();
        editor.update_row(r2, "a", "");
        let r3 = editor.add_row();
        editor.update_row(r3, "b", "ok");

        let candidate = editor.candidate();
        assert_eq!(candidate, map_of(&[('b', "ok")]));
    }

    #[test]
    fn test_candidate_later_duplicate_overwrites() {
        let mut editor = TableEditor::default();
        editor.set_loaded(&ReplacementMap::new());

        let first = editor.rows()[0].id;
        editor.update_row(first, "€", "EU");
        let second = editor.add_row();
        editor.update_row(second, "€", "EUR");

        assert_eq!(editor.candidate().lookup('€'), Some("EUR"));
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut editor = TableEditor::default();
        assert_eq!(editor.state(), EditorState::Empty);

        editor.set_loaded(&map_of(&[('€', "EUR")]));
        assert_eq!(editor.state(), EditorState::Loaded);

        let id = editor.add_row();
        assert_eq!(editor.state(), EditorState::Dirty);

        let candidate = editor.begin_save();
        assert_eq!(editor.state(), EditorState::Saving);

        let now = Instant::now();
        editor.finish_save(&Ok(candidate), now);
        assert_eq!(editor.state(), EditorState::Loaded);

        // 删除行再次进入 Dirty
        editor.delete_row(id);
        assert_eq!(editor.state(), EditorState::Dirty);
    }

    #[test]
    fn test_failed_save_keeps_rows_editable() {
        let mut editor = TableEditor::default();
        editor.set_loaded(&ReplacementMap::new());
        let id = editor.rows()[0].id;
        editor.update_row(id, "€", "EUR");

        editor.begin_save();
        let now = Instant::now();
        let err: Result<ReplacementMap, StoreError> =
            Err(StoreError::rejected(400, "bad table".to_string()));
        editor.finish_save(&err, now);

        assert_eq!(editor.state(), EditorState::SaveError);
        // 行数据完整保留
        assert_eq!(editor.rows().len(), 1);
        assert_eq!(editor.rows()[0].character, "€");
        // 仍可继续编辑
        editor.update_row(id, "€", "E");
        assert_eq!(editor.state(), EditorState::Dirty);
    }

    #[test]
    fn test_delete_unknown_row_is_noop() {
        let mut editor = TableEditor::default();
        assert!(!editor.delete_row(42));
        assert_eq!(editor.state(), EditorState::Empty);
    }

    #[test]
    fn test_banner_expires_without_state_change() {
        let mut editor = TableEditor::default();
        editor.set_loaded(&ReplacementMap::new());
        editor.begin_save();

        let shown = Instant::now();
        editor.finish_save(&Ok(ReplacementMap::new()), shown);

        let banner = editor.banner(shown).expect("保存成功应弹出横幅");
        assert_eq!(banner.kind, BannerKind::Success);
        assert!(editor.banner(shown + Duration::from_millis(2900)).is_some());
        assert!(editor.banner(shown + Duration::from_millis(3100)).is_none());
        // 横幅消失不影响状态
        assert_eq!(editor.state(), EditorState::Loaded);
    }

    #[test]
    fn test_multi_code_point_character_left_for_save_boundary() {
        let mut editor = TableEditor::default();
        editor.set_loaded(&ReplacementMap::new());
        let id = editor.rows()[0].id;
        editor.update_row(id, "ab", "x");

        assert!(editor.candidate().is_empty());
    }
}
