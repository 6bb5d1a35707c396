// 文本规范化引擎
//
// Unicode 任意文本 -> 尽力而为的 ASCII：
// 1. NFKD 兼容分解（拆出基字 + 组合变音符，展开连字/全角等兼容变体）
// 2. 删除组合变音符区块 U+0300-U+036F（去掉分解剩下的重音，保留基字）
// 3. 其余超出 U+007F 的码点查替换表；无条目则原样保留（按约定透传，非错误）

use unicode_normalization::UnicodeNormalization;

use crate::replacement_map::ReplacementMap;

/// 组合变音符区块
const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// 规范化文本
///
/// 纯函数：给定同一 `map` 快照结果确定；输出长度可能与输入不同
/// （多字符替换串、多个变音符被删除）。
///
/// 无分解且不在表中的字符在输出中保持非 ASCII，这是契约而非缺陷。
pub fn normalize(text: &str, map: &ReplacementMap) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.nfkd() {
        if COMBINING_MARKS.contains(&ch) {
            continue;
        }
        if !ch.is_ascii() {
            if let Some(replacement) = map.lookup(ch) {
                result.push_str(replacement);
                continue;
            }
        }
        result.push(ch);
    }

    result
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
    fn test_decomposition_strips_accents() {
        let map = ReplacementMap::new();
        assert_eq!(normalize("café", &map), "cafe");
        assert_eq!(normalize("àéîõü", &map), "aeiou");
    }

    #[test]
    fn test_compatibility_variants_expand() {
        let map = ReplacementMap::new();
        // 连字
        assert_eq!(normalize("ﬁle", &map), "file");
        // 全角
        assert_eq!(normalize("Ｈｅｌｌｏ", &map), "Hello");
    }

    #[test]
    fn test_fallback_substitution() {
        let map = map_of(&[('€', "EUR")]);
        assert_eq!(normalize("100€", &map), "100EUR");
    }

    #[test]
    fn test_pass_through_without_entry() {
        // '€' 无 NFKD 分解且不在表中：原样保留
        let map = ReplacementMap::new();
        assert_eq!(normalize("100€", &map), "100€");
    }

    #[test]
    fn test_substitution_after_decomposition() {
        // 'ß' 不会被 NFKD 分解，需要表条目兜底
        let map = map_of(&[('ß', "ss")]);
        assert_eq!(normalize("Straße", &map), "Strasse");
    }

    #[test]
    fn test_idempotence() {
        let map = map_of(&[('€', "EUR"), ('ß', "ss")]);
        for text in ["café 100€", "Straße", "naïve ﬁancée", "中文混排 é€"] {
            let once = normalize(text, &map);
            let twice = normalize(&once, &map);
            assert_eq!(twice, once, "规范化应当幂等: {:?}", text);
        }
    }

    #[test]
    fn test_empty_input() {
        let map = ReplacementMap::new();
        assert_eq!(normalize("", &map), "");
    }

    #[test]
    fn test_multi_char_replacement_changes_length() {
        let map = map_of(&[('©', "(c)")]);
        let result = normalize("©2024", &map);
        assert_eq!(result, "(c)2024");
        assert!(result.chars().count() > "©2024".chars().count());
    }

    #[test]
    fn test_ascii_input_unchanged() {
        let map = map_of(&[('€', "EUR")]);
        let text = "plain ASCII stays as-is, even with $ and ~";
        assert_eq!(normalize(text, &map), text);
    }
}
