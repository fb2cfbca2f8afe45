use std::cmp::Ordering;

/// Data types a field can carry on disk.
///
/// `Unknown` exists so a definition page with an unrecognized type code can
/// still be decoded and inspected; the record engine refuses to derive a
/// layout from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FieldType {
    Unknown,
    Integer,
    Text,
}

impl FieldType {
    /// On-disk type code as stored in a definition page.
    pub fn code(self) -> u32 {
        match self {
            FieldType::Unknown => 0,
            FieldType::Integer => 1,
            FieldType::Text => 2,
        }
    }

    /// Decode an on-disk type code. Unrecognized codes map to `Unknown`.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => FieldType::Integer,
            2 => FieldType::Text,
            _ => FieldType::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i32),
    Text(String),
}

impl Value {
    /// The field type this value would occupy.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Int(_) => FieldType::Integer,
            Value::Text(_) => FieldType::Text,
        }
    }

    /// Compare two values of the same type. Cross-type operands yield `None`.
    ///
    /// Text ordering is byte-wise unsigned, which matches the ordering of the
    /// NUL-stripped bytes stored in a record slot.
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            _ => None,
        }
    }

    pub fn eq_same_type(&self, other: &Value) -> Option<bool> {
        self.cmp_same_type(other).map(|ord| ord == Ordering::Equal)
    }
}
