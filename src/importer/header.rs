// ==========================================
// 食堂数据导入系统 - 表头规范化
// ==========================================
// 规则: 全角括号转半角,去除所有空白（含内嵌与全角空格）
// ==========================================

/// 规范化表头,用于与映射源列名比较
///
/// 两个表头规范形式相同即视为同一列
pub fn canonicalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            other => other,
        })
        .collect()
}

/// 两个表头是否等价
pub fn headers_equivalent(a: &str, b: &str) -> bool {
    canonicalize_header(a) == canonicalize_header(b)
}
