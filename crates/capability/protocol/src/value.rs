//! DataValue → 展示用值与质量标签

use domain::PointValueData;
use opcua::types::{StatusCode, Variant};

/// 质量标签：状态码主码的符号名（忽略低 16 位信息位），如 `Good`、`UncertainLastUsableValue`。
pub fn status_label(status: StatusCode) -> String {
    StatusCode::from(status.bits() & 0xFFFF_0000).to_string()
}

/// Variant 转展示用的值。
pub fn to_point_value(value: Option<Variant>) -> PointValueData {
    match value {
        None => PointValueData::Null,
        Some(value) => variant_value(value),
    }
}

fn variant_value(value: Variant) -> PointValueData {
    match value {
        Variant::Empty => PointValueData::Null,
        Variant::Boolean(v) => PointValueData::Bool(v),
        Variant::SByte(v) => PointValueData::I64(i64::from(v)),
        Variant::Int16(v) => PointValueData::I64(i64::from(v)),
        Variant::Int32(v) => PointValueData::I64(i64::from(v)),
        Variant::Int64(v) => PointValueData::I64(v),
        Variant::Byte(v) => PointValueData::U64(u64::from(v)),
        Variant::UInt16(v) => PointValueData::U64(u64::from(v)),
        Variant::UInt32(v) => PointValueData::U64(u64::from(v)),
        Variant::UInt64(v) => PointValueData::U64(v),
        Variant::Float(v) => PointValueData::F64(f64::from(v)),
        Variant::Double(v) => PointValueData::F64(v),
        Variant::String(v) => v
            .value()
            .clone()
            .map(PointValueData::String)
            .unwrap_or(PointValueData::Null),
        Variant::ByteString(v) => v
            .value
            .map(PointValueData::Bytes)
            .unwrap_or(PointValueData::Null),
        Variant::DateTime(v) => PointValueData::String(v.as_chrono().to_rfc3339()),
        Variant::Guid(v) => PointValueData::String(v.to_string()),
        Variant::NodeId(v) => PointValueData::String(v.to_string()),
        Variant::StatusCode(v) => PointValueData::String(status_label(v)),
        Variant::LocalizedText(v) => PointValueData::String(
            v.text.value().clone().unwrap_or_default(),
        ),
        Variant::DataValue(v) => to_point_value(v.value),
        Variant::Array(array) => {
            PointValueData::Array(array.values.into_iter().map(variant_value).collect())
        }
        other => PointValueData::String(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua::types::UAString;

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(StatusCode::Good), "Good");
        assert_eq!(status_label(StatusCode::BadNodeIdUnknown), "BadNodeIdUnknown");
        assert_eq!(
            status_label(StatusCode::UncertainLastUsableValue),
            "UncertainLastUsableValue"
        );
    }

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(to_point_value(None), PointValueData::Null);
        assert_eq!(to_point_value(Some(Variant::Empty)), PointValueData::Null);
        assert_eq!(
            to_point_value(Some(Variant::Int16(-3))),
            PointValueData::I64(-3)
        );
        assert_eq!(
            to_point_value(Some(Variant::UInt32(7))),
            PointValueData::U64(7)
        );
        assert_eq!(
            to_point_value(Some(Variant::Float(1.5))),
            PointValueData::F64(1.5)
        );
        assert_eq!(
            to_point_value(Some(Variant::String(UAString::from("on")))),
            PointValueData::String("on".to_string())
        );
        assert_eq!(
            to_point_value(Some(Variant::String(UAString::null()))),
            PointValueData::Null
        );
        assert_eq!(
            to_point_value(Some(Variant::StatusCode(StatusCode::BadNodeIdUnknown))),
            PointValueData::String("BadNodeIdUnknown".to_string())
        );
    }
}
