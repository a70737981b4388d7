use serde::Serialize;
use std::fmt;

/// 点位值的数据类型。
///
/// 由协议层的原始值（如 OPC UA Variant）转换而来，仅用于展示与报告。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PointValueData {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<PointValueData>),
}

impl fmt::Display for PointValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointValueData::Null => write!(f, "null"),
            PointValueData::Bool(v) => write!(f, "{}", v),
            PointValueData::I64(v) => write!(f, "{}", v),
            PointValueData::U64(v) => write!(f, "{}", v),
            PointValueData::F64(v) => write!(f, "{}", v),
            PointValueData::String(v) => write!(f, "{}", v),
            PointValueData::Bytes(v) => {
                write!(f, "0x")?;
                for byte in v {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            PointValueData::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
