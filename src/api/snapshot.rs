//! Enveloped record snapshots, as re-fetched by the [`Poller`](crate::poll::Poller).

use serde_json::Value;

use crate::client::BackendClient;
use crate::error::Result;

impl BackendClient {
    /// GET an enveloped endpoint whose `data` is a list of records.
    ///
    /// A single object is accepted as a one-element list, since several
    /// dashboard endpoints answer that way when only one symbol is requested.
    pub async fn fetch_records(&self, path: &str) -> Result<Vec<Value>> {
        let data: Value = self.get_data(path).await?;
        Ok(into_records(data))
    }
}

fn into_records(data: Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn record_shapes() {
        assert_eq!(into_records(json!([{"a": 1}, {"a": 2}])).len(), 2);
        assert_eq!(into_records(json!({"a": 1})), vec![json!({"a": 1})]);
        assert!(into_records(Value::Null).is_empty());
    }
}
