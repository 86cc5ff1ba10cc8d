//! `IdList` is a denormalized list of entity ids stored in a JSONB column.
//! The list keeps insertion order and never holds duplicates.

use std::io::Write;
use std::iter::FromIterator;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Jsonb;
use serde_json::{self, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "::diesel::sql_types::Jsonb"]
pub struct IdList(Vec<i32>);

impl IdList {
    pub fn new() -> Self {
        IdList(Vec::new())
    }

    /// Reads a list from JSON. Older rows keep the array serialized into a string,
    /// both forms are accepted and non-integer entries are skipped.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Number(n) => n.as_i64().map(|n| n as i32),
                    Value::String(s) => s.trim().parse::<i32>().ok(),
                    _ => None,
                }).collect(),
            Value::String(s) => serde_json::from_str::<Value>(s)
                .map(|inner| match inner {
                    Value::String(_) => IdList::new(),
                    inner => IdList::from_json(&inner),
                }).unwrap_or_default(),
            _ => IdList::new(),
        }
    }

    pub fn contains<I: Into<i32>>(&self, id: I) -> bool {
        self.0.contains(&id.into())
    }

    /// Appends the id unless already present. Returns true when the list changed.
    pub fn add<I: Into<i32>>(&mut self, id: I) -> bool {
        let id = id.into();
        if self.0.contains(&id) {
            false
        } else {
            self.0.push(id);
            true
        }
    }

    /// Removes the id. Returns true when the list changed.
    pub fn remove<I: Into<i32>>(&mut self, id: I) -> bool {
        let id = id.into();
        let before = self.0.len();
        self.0.retain(|value| *value != id);
        before != self.0.len()
    }

    pub fn union(&self, other: &IdList) -> IdList {
        let mut result = self.clone();
        for id in &other.0 {
            result.add(*id);
        }
        result
    }

    pub fn intersects(&self, other: &IdList) -> bool {
        self.0.iter().any(|id| other.0.contains(id))
    }

    /// Sorted copy without duplicates
    pub fn normalized(&self) -> IdList {
        let mut ids = self.0.clone();
        ids.sort();
        ids.dedup();
        IdList(ids)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    /// Ids converted into a typed newtype
    pub fn ids<T: From<i32>>(&self) -> Vec<T> {
        self.0.iter().cloned().map(T::from).collect()
    }
}

impl<I: Into<i32>> FromIterator<I> for IdList {
    fn from_iter<It: IntoIterator<Item = I>>(iter: It) -> Self {
        let mut list = IdList::new();
        for id in iter {
            list.add(id);
        }
        list
    }
}

impl ToSql<Jsonb, Pg> for IdList {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        let value = serde_json::to_value(&self.0)?;
        <Value as ToSql<Jsonb, Pg>>::to_sql(&value, out)
    }
}

impl FromSql<Jsonb, Pg> for IdList {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        let value = <Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
        Ok(IdList::from_json(&value))
    }
}

#[cfg(test)]
mod tests {
    use serde_json;

    use super::*;
    use types::AutoTypeId;

    #[test]
    fn add_keeps_ids_unique() {
        let mut list = IdList::new();
        assert!(list.add(AutoTypeId(1)));
        assert!(list.add(AutoTypeId(2)));
        assert!(!list.add(AutoTypeId(1)));
        assert_eq!(list.as_slice(), &[1, 2]);
    }

    #[test]
    fn remove_reports_changes() {
        let mut list: IdList = vec![3, 1, 2].into_iter().collect();
        assert!(list.remove(1));
        assert!(!list.remove(1));
        assert_eq!(list.as_slice(), &[3, 2]);
    }

    #[test]
    fn collect_drops_duplicates() {
        let list: IdList = vec![5, 5, 4, 5].into_iter().collect();
        assert_eq!(list.as_slice(), &[5, 4]);
    }

    #[test]
    fn normalized_sorts() {
        let list: IdList = vec![9, 2, 7].into_iter().collect();
        assert_eq!(list.normalized().as_slice(), &[2, 7, 9]);
    }

    #[test]
    fn union_and_intersection() {
        let left: IdList = vec![1, 2].into_iter().collect();
        let right: IdList = vec![2, 3].into_iter().collect();
        assert_eq!(left.union(&right).as_slice(), &[1, 2, 3]);
        assert!(left.intersects(&right));
        assert!(!left.intersects(&IdList::new()));
    }

    #[test]
    fn reads_plain_arrays() {
        let value = json!([1, 2, 3]);
        assert_eq!(IdList::from_json(&value).as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn reads_string_encoded_arrays() {
        let value = Value::String("[4, 5, 4]".to_string());
        assert_eq!(IdList::from_json(&value).as_slice(), &[4, 5]);
    }

    #[test]
    fn skips_garbage_entries() {
        let value = json!([1, "2", null, {"id": 3}, "x"]);
        assert_eq!(IdList::from_json(&value).as_slice(), &[1, 2]);
        assert!(IdList::from_json(&Value::Null).is_empty());
        assert!(IdList::from_json(&Value::String("nope".to_string())).is_empty());
    }

    #[test]
    fn typed_ids() {
        let list: IdList = vec![AutoTypeId(8)].into_iter().collect();
        let ids: Vec<AutoTypeId> = list.ids();
        assert_eq!(ids, vec![AutoTypeId(8)]);
        assert!(list.contains(AutoTypeId(8)));
    }
}
