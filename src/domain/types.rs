// ==========================================
// 食堂数据导入系统 - 领域类型定义
// ==========================================
// 记录类别 / 字段类型 / 表结构 / Excel 列映射
// 红线: 表结构与映射为静态数据,运行期不可变
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 字段语义类型 (Field Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Identifier, // 自增主键,由数据库分配
    Timestamp,  // 带时区时间戳
    Text,       // 短文本
}

/// 目标表字段定义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl FieldSpec {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }

    /// 是否由导入管道写入（主键由数据库分配,不写入）
    pub fn is_writable(&self) -> bool {
        self.field_type != FieldType::Identifier
    }
}

// 三类记录共用同一表结构
const RECORD_SCHEMA: [FieldSpec; 4] = [
    FieldSpec::new("id", FieldType::Identifier),
    FieldSpec::new("record_date", FieldType::Timestamp),
    FieldSpec::new("name", FieldType::Text),
    FieldSpec::new("type", FieldType::Text),
];

const CONSUMPTION_MAPPING: [(&str, &str); 3] = [
    ("消费时间", "record_date"),
    ("姓名", "name"),
    ("餐别", "type"),
];

const VEHICLE_CHECKPOINT_MAPPING: [(&str, &str); 3] = [
    ("打卡时间", "record_date"),
    ("姓名", "name"),
    ("打卡类型", "type"),
];

const DOOR_ACCESS_MAPPING: [(&str, &str); 3] = [
    ("事件时间", "record_date"),
    ("人员姓名", "name"),
    ("控制器", "type"),
];

// ==========================================
// 记录类别 (Record Category)
// ==========================================
// 每个类别携带固定的表名、文件名标记、表结构与 Excel 列映射
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    Consumption,       // 食堂消费记录
    VehicleCheckpoint, // 车辆打卡记录
    DoorAccess,        // 门禁事件记录
}

impl RecordCategory {
    /// 全部类别（顺序即文件名识别优先级,先匹配者胜出）
    pub const ALL: [RecordCategory; 3] = [
        RecordCategory::Consumption,
        RecordCategory::VehicleCheckpoint,
        RecordCategory::DoorAccess,
    ];

    /// 目标表名
    pub fn table_name(&self) -> &'static str {
        match self {
            RecordCategory::Consumption => "canteen_records",
            RecordCategory::VehicleCheckpoint => "vehicle_records",
            RecordCategory::DoorAccess => "door_records",
        }
    }

    /// 文件名标记（小写,子串匹配）
    pub fn file_marker(&self) -> &'static str {
        match self {
            RecordCategory::Consumption => "consumelog",
            RecordCategory::VehicleCheckpoint => "打卡明细数据",
            RecordCategory::DoorAccess => "dooreventinfo",
        }
    }

    /// 目标表结构（有序）
    pub fn schema(&self) -> &'static [FieldSpec] {
        &RECORD_SCHEMA
    }

    /// Excel 列映射: (源列名, 目标字段)
    pub fn excel_mapping(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            RecordCategory::Consumption => &CONSUMPTION_MAPPING,
            RecordCategory::VehicleCheckpoint => &VEHICLE_CHECKPOINT_MAPPING,
            RecordCategory::DoorAccess => &DOOR_ACCESS_MAPPING,
        }
    }

    /// 查询字段定义
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.schema().iter().find(|f| f.name == name)
    }

    /// 中文显示名（日志用）
    pub fn label(&self) -> &'static str {
        match self {
            RecordCategory::Consumption => "食堂消费",
            RecordCategory::VehicleCheckpoint => "车辆打卡",
            RecordCategory::DoorAccess => "门禁事件",
        }
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

impl FromStr for RecordCategory {
    type Err = String;

    /// 支持表名或类别名两种写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "canteen_records" | "consumption" => Ok(RecordCategory::Consumption),
            "vehicle_records" | "vehicle_checkpoint" => Ok(RecordCategory::VehicleCheckpoint),
            "door_records" | "door_access" => Ok(RecordCategory::DoorAccess),
            other => Err(format!(
                "未知记录表: {}（可选: canteen_records, vehicle_records, door_records）",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mapping_target_is_in_schema() {
        for category in RecordCategory::ALL {
            for (_, target) in category.excel_mapping() {
                let field = category.field(target);
                assert!(field.is_some(), "{} 缺少字段 {}", category, target);
                assert!(field.unwrap().is_writable());
            }
        }
    }

    #[test]
    fn test_identifier_not_writable() {
        let id = RecordCategory::Consumption.field("id").unwrap();
        assert_eq!(id.field_type, FieldType::Identifier);
        assert!(!id.is_writable());
    }

    #[test]
    fn test_from_str_accepts_table_and_category_names() {
        assert_eq!(
            "canteen_records".parse::<RecordCategory>(),
            Ok(RecordCategory::Consumption)
        );
        assert_eq!(
            "Door_Access".parse::<RecordCategory>(),
            Ok(RecordCategory::DoorAccess)
        );
        assert!("payroll".parse::<RecordCategory>().is_err());
    }
}
