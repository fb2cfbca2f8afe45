//! Conditions over records: the predicate form used by select and delete.


use catalog::TableInfo;
use common::{DbError, DbResult, Row};
use std::cmp::Ordering;
use types::Value;

/// Comparison operators a condition can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
}

/// A predicate of the form `field <op> literal`.
///
/// The expected data type of the field is implied by the `Value` variant.
/// `distinct` asks select to drop records that are field-by-field equal to
/// one already in the result set.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
    pub distinct: bool,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Resolve the field name against a schema once, so the per-record hot
    /// loop is an array index plus one comparison.
    ///
    /// A field name the schema does not know is an error, never a silent
    /// non-match.
    pub fn bind<'a>(&'a self, schema: &TableInfo) -> DbResult<BoundCondition<'a>> {
        let ordinal = self.field_ordinal(schema)?;
        Ok(BoundCondition {
            ordinal,
            op: self.op,
            value: &self.value,
        })
    }

    fn field_ordinal(&self, schema: &TableInfo) -> DbResult<usize> {
        schema.field_index(&self.field).ok_or_else(|| {
            DbError::Schema(format!("unknown field '{}' in condition", self.field))
        })
    }
}

/// A condition resolved against a schema.
#[derive(Clone, Copy, Debug)]
pub struct BoundCondition<'a> {
    ordinal: usize,
    op: CompareOp,
    value: &'a Value,
}

impl BoundCondition<'_> {
    /// Whether a record satisfies the condition.
    ///
    /// A record field whose type differs from the condition's literal makes
    /// the predicate false. Text comparison is byte-wise unsigned.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(field) = row.values.get(self.ordinal) else {
            return false;
        };
        let Some(ord) = field.cmp_same_type(self.value) else {
            return false;
        };
        match self.op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Lt => ord == Ordering::Less,
        }
    }
}
