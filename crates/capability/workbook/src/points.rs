//! xlsx 点表读取。
//!
//! 约定：第一个工作表、第一列（A 列），第 1 行为表头，从第 2 行起每行一个点名；
//! 空单元格跳过，数值单元格按文本处理。

use calamine::{Data, Range, Reader, open_workbook_auto};
use pointcheck_engine::{PointSource, PointSourceError};
use std::path::{Path, PathBuf};
use tracing::info;

/// 从 xlsx 文件读取点表
#[derive(Debug, Clone)]
pub struct XlsxPointSource {
    path: PathBuf,
}

impl XlsxPointSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PointSource for XlsxPointSource {
    fn load(&self) -> Result<Vec<String>, PointSourceError> {
        load_points(&self.path)
    }
}

/// 读取点表，保持原始顺序与重复项。
pub fn load_points(path: &Path) -> Result<Vec<String>, PointSourceError> {
    if !path.is_file() {
        return Err(PointSourceError::NotFound(path.display().to_string()));
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| PointSourceError::Read(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PointSourceError::Read("workbook has no worksheet".to_string()))?
        .map_err(|e| PointSourceError::Read(e.to_string()))?;

    let points = first_column(&range);
    if points.is_empty() {
        return Err(PointSourceError::Empty);
    }
    info!(path = %path.display(), count = points.len(), "point list loaded");
    Ok(points)
}

fn first_column(range: &Range<Data>) -> Vec<String> {
    let (Some((start_row, start_col)), Some((end_row, _))) = (range.start(), range.end()) else {
        return Vec::new();
    };
    // A 列整列为空时，已用区域不从第 0 列开始
    if start_col > 0 {
        return Vec::new();
    }

    (start_row.max(1)..=end_row)
        .filter_map(|row| range.get_value((row, 0)))
        .filter_map(cell_text)
        .collect()
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        Data::Float(v) => format!("{v}"),
        Data::Int(v) => format!("{v}"),
        other => other.to_string().trim().to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  ".to_string())), None);
        assert_eq!(
            cell_text(&Data::String(" ns=2;s=A ".to_string())),
            Some("ns=2;s=A".to_string())
        );
        assert_eq!(cell_text(&Data::Float(1001.0)), Some("1001".to_string()));
        assert_eq!(cell_text(&Data::Float(2.5)), Some("2.5".to_string()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".to_string()));
    }

    #[test]
    fn test_first_column_skips_header_and_blanks() {
        let mut range = Range::new((0, 0), (4, 1));
        range.set_value((0, 0), Data::String("点名".to_string()));
        range.set_value((1, 0), Data::String("ns=2;s=A".to_string()));
        range.set_value((2, 1), Data::String("ignored".to_string()));
        range.set_value((3, 0), Data::Int(12));
        range.set_value((4, 0), Data::String("ns=2;s=A".to_string()));

        assert_eq!(first_column(&range), vec!["ns=2;s=A", "12", "ns=2;s=A"]);
    }

    #[test]
    fn test_first_column_without_column_a() {
        let mut range = Range::new((0, 1), (2, 1));
        range.set_value((1, 1), Data::String("x".to_string()));
        assert!(first_column(&range).is_empty());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_points(Path::new("/nonexistent/points.xlsx")).unwrap_err();
        assert!(matches!(err, PointSourceError::NotFound(_)));
    }
}
