use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 原始輸入列：Value 尚未轉型，仍是儲存格文字
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub category: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub category: String,
    pub value: f64,
}

impl RawRecord {
    /// 清洗：Value 能解析成有限數字才保留，失敗回傳 None
    pub fn clean(&self) -> Option<CleanRecord> {
        let value = self.value.trim().parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(CleanRecord {
            category: self.category.clone(),
            value,
        })
    }
}

/// 聚合輸出的數值欄位：Number 或 JSON null，不用哨兵值
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    Number(f64),
    Null,
}

impl Serialize for AggregateValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            // 整數和保持整數輸出（150 而非 150.0）
            AggregateValue::Number(v) if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*v as i64)
            }
            AggregateValue::Number(v) => serializer.serialize_f64(*v),
            AggregateValue::Null => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for AggregateValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<f64>::deserialize(deserializer)? {
            Some(v) => AggregateValue::Number(v),
            None => AggregateValue::Null,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Value")]
    pub value: AggregateValue,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub rows: Vec<AggregateRow>,
    pub input_records: usize,
    pub dropped_records: usize,
}
