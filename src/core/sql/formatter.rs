use crate::core::types::{RowSet, Value};

pub struct TableFormatter;

impl TableFormatter {
    /// 格式化结果集
    /// 每列宽度取列名与最长单元格中的较大者，至少为3；内容左对齐，左右各留1个空格，NULL 显示为空白
    pub fn format(set: &RowSet) -> String {
        let cells: Vec<Vec<String>> = set
            .rows
            .iter()
            .map(|row| row.iter().map(Self::cell).collect())
            .collect();

        let mut widths: Vec<usize> = set.columns.iter().map(|h| h.chars().count().max(3)).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut result = String::new();
        result.push_str(&Self::format_row(&set.columns, &widths));
        result.push('\n');

        // 分隔线
        result.push('|');
        for width in &widths {
            result.push(' ');
            result.push_str(&"-".repeat(*width));
            result.push_str(" |");
        }
        result.push('\n');

        for row in &cells {
            result.push_str(&Self::format_row(row, &widths));
            result.push('\n');
        }
        result
    }

    fn cell(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// 格式化单行数据
    fn format_row(cells: &[String], widths: &[usize]) -> String {
        let mut line = String::from("|");
        for (cell, width) in cells.iter().zip(widths) {
            let padding = width - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(padding + 1));
            line.push('|');
        }
        line
    }
}
