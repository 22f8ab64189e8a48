//! Section tagging: which series the rows below a line belong to

/// Series a table row is routed to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Section {
    /// No keyword seen yet; rows are ignored
    #[default]
    None,
    Sales,
    Growth,
    Category,
}

const GROWTH_KEYWORDS: &[&str] = &["增长率", "增长", "同比", "环比", "growth"];
const CATEGORY_KEYWORDS: &[&str] = &["产品", "类别", "品类", "分类", "category", "product"];
const SALES_KEYWORDS: &[&str] = &["销售额", "销售", "营收", "收入", "营业额", "revenue", "sales"];

/// Section announced by `line`, if any
///
/// A line naming several series is tagged by the most specific one:
/// growth, then category, then sales. Matching is case-insensitive.
pub(crate) fn detect_section(line: &str) -> Option<Section> {
    let lower = line.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if mentions(GROWTH_KEYWORDS) {
        Some(Section::Growth)
    } else if mentions(CATEGORY_KEYWORDS) {
        Some(Section::Category)
    } else if mentions(SALES_KEYWORDS) {
        Some(Section::Sales)
    } else {
        None
    }
}
