// ==========================================
// 食堂数据导入系统 - 值规范化器
// ==========================================
// 职责: 原始单元格值 → 目标字段类型
// 规则: 转换失败一律降级为 NULL,整行仍然写入
// ==========================================

use crate::domain::record::{CellValue, FieldValue};
use crate::domain::types::FieldType;
use crate::importer::error::CoercionError;
use chrono::{FixedOffset, LocalResult, TimeZone};
use tracing::debug;

/// 宽松转换结果
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub value: Option<FieldValue>,
    pub degraded: bool, // 值存在但转换失败,已置为 NULL
}

pub struct ValueNormalizer {
    offset: FixedOffset, // 无时区的日期时间单元格按此偏移解释
}

impl ValueNormalizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// 严格转换
    ///
    /// # 返回
    /// - Ok(Some(v)): 转换成功
    /// - Ok(None): 值为空,或字段为主键（由数据库分配）
    /// - Err: 值无法转换为目标类型
    pub fn coerce(
        &self,
        raw: Option<&CellValue>,
        field_type: FieldType,
    ) -> Result<Option<FieldValue>, CoercionError> {
        let raw = match raw {
            Some(v) if !v.is_empty() => v,
            _ => return Ok(None),
        };

        match field_type {
            FieldType::Identifier => Ok(None),
            FieldType::Timestamp => match raw {
                CellValue::DateTime(ndt) => match self.offset.from_local_datetime(ndt) {
                    LocalResult::Single(ts) => Ok(Some(FieldValue::Timestamp(ts))),
                    _ => Err(CoercionError::NotATimestamp {
                        found: raw.to_string(),
                    }),
                },
                CellValue::Error(e) => Err(CoercionError::CellError(e.clone())),
                other => Err(CoercionError::NotATimestamp {
                    found: other.to_string(),
                }),
            },
            FieldType::Text => match raw {
                CellValue::Error(e) => Err(CoercionError::CellError(e.clone())),
                other => Ok(Some(FieldValue::Text(other.to_string()))),
            },
        }
    }

    /// 宽松转换: 失败时值为 None 并标记 degraded（不抛错）
    pub fn normalize(
        &self,
        field: &str,
        raw: Option<&CellValue>,
        field_type: FieldType,
    ) -> Normalized {
        match self.coerce(raw, field_type) {
            Ok(value) => Normalized {
                value,
                degraded: false,
            },
            Err(e) => {
                debug!(field, error = %e, "字段值转换失败,置为 NULL");
                Normalized {
                    value: None,
                    degraded: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn normalizer() -> ValueNormalizer {
        ValueNormalizer::new(FixedOffset::east_opt(8 * 3600).unwrap())
    }

    #[test]
    fn test_timestamp_from_datetime_cell() {
        let ndt = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let result = normalizer().normalize(
            "record_date",
            Some(&CellValue::DateTime(ndt)),
            FieldType::Timestamp,
        );
        assert!(!result.degraded);

        match result.value {
            Some(FieldValue::Timestamp(ts)) => {
                assert_eq!(ts.naive_local(), ndt);
                assert_eq!(ts.to_rfc3339(), "2024-01-15T12:00:00+08:00");
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_rejects_non_datetime_without_panic() {
        let n = normalizer();
        let text = CellValue::Text("2024-01-15 12:00".to_string());
        assert!(matches!(
            n.coerce(Some(&text), FieldType::Timestamp),
            Err(CoercionError::NotATimestamp { .. })
        ));
        for raw in [text, CellValue::Float(45306.5), CellValue::Bool(true)] {
            let result = n.normalize("record_date", Some(&raw), FieldType::Timestamp);
            assert_eq!(result.value, None);
            assert!(result.degraded);
        }
    }

    #[test]
    fn test_missing_value_is_null_not_error() {
        let n = normalizer();
        assert_eq!(n.coerce(None, FieldType::Timestamp), Ok(None));
        assert_eq!(n.coerce(Some(&CellValue::Empty), FieldType::Text), Ok(None));
        assert_eq!(
            n.coerce(Some(&CellValue::Text(String::new())), FieldType::Timestamp),
            Ok(None)
        );

        let result = n.normalize("name", None, FieldType::Text);
        assert_eq!(result.value, None);
        assert!(!result.degraded);
    }

    #[test]
    fn test_text_pass_through_and_empty_is_null() {
        let n = normalizer();
        assert_eq!(
            n.coerce(Some(&CellValue::Text(" 午餐 ".to_string())), FieldType::Text),
            Ok(Some(FieldValue::Text(" 午餐 ".to_string())))
        );
        assert_eq!(
            n.coerce(Some(&CellValue::Text(String::new())), FieldType::Text),
            Ok(None)
        );
    }

    #[test]
    fn test_text_renders_scalars() {
        let n = normalizer();
        assert_eq!(
            n.coerce(Some(&CellValue::Float(1001.0)), FieldType::Text),
            Ok(Some(FieldValue::Text("1001".to_string())))
        );
        assert_eq!(
            n.coerce(Some(&CellValue::Int(42)), FieldType::Text),
            Ok(Some(FieldValue::Text("42".to_string())))
        );
    }

    #[test]
    fn test_cell_error_is_null() {
        let n = normalizer();
        let err = CellValue::Error("#DIV/0!".to_string());
        assert!(n.coerce(Some(&err), FieldType::Text).is_err());
        let result = n.normalize("meal_type", Some(&err), FieldType::Text);
        assert_eq!(result.value, None);
        assert!(result.degraded);
    }

    #[test]
    fn test_identifier_always_null() {
        let n = normalizer();
        assert_eq!(n.coerce(Some(&CellValue::Int(5)), FieldType::Identifier), Ok(None));
    }
}
