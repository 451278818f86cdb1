use crate::core::CandidateLine;

/// 每行欄位分隔符號
pub const FIELD_DELIMITER: char = '|';

/// 將原始文字拆成候選行。空白行會被略過，但行號仍對應原始文字 (1 起算)。
pub fn parse(text: &str) -> Vec<CandidateLine> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| CandidateLine {
            line_number: index + 1,
            raw_text: line.to_string(),
        })
        .collect()
}
