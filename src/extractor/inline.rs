//! `label: value unit` lines such as `1月: 4200万元` or `- **华东**：1,200 万`

use std::sync::LazyLock;

use regex::Regex;

use super::numeric::parse_number;
use crate::types::DataPoint;

/// Optional list marker or heading hashes, optional bold label, ASCII or
/// full-width colon, a number and a unit without digits. The match ends at the
/// end of the line or at a separator, so trailing clauses such as `，同比增长12%`
/// or `(预估)` are ignored while `10:30` and `2024-05-01` never qualify.
const INLINE_PATTERN: &str = r"^\s*(?:[-*+]\s+|\d+\.\s+)?#*\s*(?:\*\*)?(?P<label>[^:：|*]+?)(?:\*\*)?\s*[:：]\s*(?:\*\*)?(?P<value>[\d０-９][\d０-９,，.．]*)\s*(?P<unit>[^\d０-９\s|*:：,，;；()（）]*)(?:\*\*)?(?:\s*$|[\s,，;；(（)）])";

static INLINE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(INLINE_PATTERN)
        .map_err(|e| tracing::error!(error = %e, "invalid inline value pattern"))
        .ok()
});

/// Parse a single `label: value` line into a point
pub(crate) fn parse_inline(line: &str) -> Option<DataPoint> {
    let captures = INLINE_RE.as_ref()?.captures(line)?;
    let label = captures.name("label")?.as_str().trim();
    if label.is_empty() {
        return None;
    }
    let value = parse_number(captures.name("value")?.as_str())?;
    Some(DataPoint::new(label, value))
}
