//! Reply values handed back by the native client.

use bytes::Bytes;

/// A decoded command reply.
///
/// The native client owns protocol decoding; replies cross the boundary
/// already shaped. Accessors below are what the command layer uses to pull
/// the one shape each command expects.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null reply
    Nil,
    /// Simple "OK" status
    Ok,
    /// Integer reply
    Int(i64),
    /// Double reply
    Float(f64),
    /// Boolean reply
    Bool(bool),
    /// Binary-safe bulk string
    Bulk(Bytes),
    /// Array reply
    Array(Vec<Value>),
    /// Map reply (RESP3), in server order
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Integer view of the reply, if it is one.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Bulk-string view of the reply, if it is one.
    #[inline]
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            Value::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// Consumes an array reply into its elements.
    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes an array-of-bulk reply into the raw strings.
    ///
    /// Non-bulk elements disqualify the whole reply.
    pub fn into_bulk_vec(self) -> Option<Vec<Bytes>> {
        let items = self.into_array()?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Bulk(b) => out.push(b),
                _ => return None,
            }
        }
        Some(out)
    }

    /// Consumes a map reply into its entries.
    ///
    /// A flat even-length array is accepted too; RESP2 servers report
    /// NUMSUB results that way.
    pub fn into_pairs(self) -> Option<Vec<(Value, Value)>> {
        match self {
            Value::Map(entries) => Some(entries),
            Value::Array(items) if items.len() % 2 == 0 => {
                let mut out = Vec::with_capacity(items.len() / 2);
                let mut iter = items.into_iter();
                while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
                    out.push((k, v));
                }
                Some(out)
            }
            _ => None,
        }
    }
}
